use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};

use crate::{
    db_types::OrderNumber,
    traits::{AccrualOracle, AccrualRecord, OracleError, OracleResponse, MAX_ACCRUAL},
};

/// The back-off used when the accrual system rate limits us without saying for how long.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Queries the accrual system at `GET {base_url}/api/orders/{number}`.
#[derive(Clone)]
pub struct AccrualClient {
    base_url: String,
    request_timeout: Duration,
    client: Arc<Client>,
}

impl AccrualClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| OracleError::Transport(format!("Could not initialize client: {e}")))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { base_url, request_timeout, client: Arc::new(client) })
    }

    pub fn url(&self, number: &OrderNumber) -> String {
        format!("{}/api/orders/{}", self.base_url, number.as_str())
    }
}

impl AccrualOracle for AccrualClient {
    async fn fetch_accrual(&self, order_number: &OrderNumber) -> Result<OracleResponse, OracleError> {
        let url = self.url(order_number);
        trace!("🔄️ Querying accrual system: {url}");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout(self.request_timeout)
            } else {
                OracleError::Transport(e.to_string())
            }
        })?;
        let status = response.status();
        let retry_after = response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()).map(String::from);
        let body = response.bytes().await.map_err(|e| OracleError::Transport(e.to_string()))?;
        classify_response(status, retry_after.as_deref(), &body)
    }
}

/// Interprets a response from the accrual system.
///
/// * 200 with a valid JSON record: the accrual system knows about the order.
/// * 204: the accrual system has never heard of the order.
/// * 429: rate limited, for `Retry-After` seconds (or [`DEFAULT_RETRY_AFTER`]).
/// * anything else is an error that says nothing about the order itself.
pub fn classify_response(
    status: StatusCode,
    retry_after: Option<&str>,
    body: &[u8],
) -> Result<OracleResponse, OracleError> {
    match status {
        StatusCode::OK => {
            let record = serde_json::from_slice::<AccrualRecord>(body)
                .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;
            match record.accrual {
                Some(accrual) if accrual > MAX_ACCRUAL => Err(OracleError::MalformedResponse(format!(
                    "An accrual of {accrual} for order {} exceeds the limit of {MAX_ACCRUAL}",
                    record.order
                ))),
                _ => Ok(OracleResponse::Registered(record)),
            }
        },
        StatusCode::NO_CONTENT => Ok(OracleResponse::NotRegistered),
        StatusCode::TOO_MANY_REQUESTS => {
            let delay = retry_after
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RETRY_AFTER);
            Err(OracleError::RateLimited(delay))
        },
        s => {
            debug!("🔄️ Accrual system replied with {s}: {}", String::from_utf8_lossy(body));
            Err(OracleError::UnexpectedStatus(s.as_u16()))
        },
    }
}

use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use loyalty_common::{parse_boolean_flag, Secret};
use loyalty_engine::{sqlite::db::db_url, AccrualPollerConfig};
use rand::{thread_rng, RngCore};

const DEFAULT_LPG_HOST: &str = "127.0.0.1";
const DEFAULT_LPG_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_ACCRUAL_SYSTEM_ADDRESS: &str = "http://127.0.0.1:8081";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_millis(1000);
const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_ACCRUAL_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub accrual: AccrualConfig,
    /// The time between ledger reconciliation cycles.
    pub reconcile_interval: Duration,
    /// When false, this process only serves HTTP requests, and the accrual and reconciliation workers must run
    /// elsewhere.
    pub run_workers: bool,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LPG_HOST.to_string(),
            port: DEFAULT_LPG_PORT,
            database_url: String::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            accrual: AccrualConfig::default(),
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            run_workers: true,
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("LPG_HOST").ok().unwrap_or_else(|| DEFAULT_LPG_HOST.into());
        let port = parse_env("LPG_PORT", DEFAULT_LPG_PORT);
        let database_url = db_url();
        let db_max_connections = parse_env("LPG_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let accrual = AccrualConfig::from_env_or_default();
        let reconcile_interval = parse_millis("LPG_RECONCILE_INTERVAL_MS", DEFAULT_RECONCILE_INTERVAL);
        let run_workers = parse_boolean_flag(env::var("LPG_RUN_WORKERS").ok(), true);
        if !run_workers {
            warn!("🪛️ LPG_RUN_WORKERS is off. Orders will not be resolved or credited by this instance.");
        }
        let auth = AuthConfig::try_from_env().unwrap_or_else(|| {
            warn!("🪛️ LPG_TOKEN_SECRET is not set. Reverting to the default authentication configuration.");
            AuthConfig::default()
        });
        Self { host, port, database_url, db_max_connections, accrual, reconcile_interval, run_workers, auth }
    }
}

//-------------------------------------------------  AccrualConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct AccrualConfig {
    /// The base URL of the accrual system, e.g. `http://accrual:8081`.
    pub system_address: String,
    pub poll_interval: Duration,
    pub batch_size: usize,
    pub concurrency: usize,
    pub request_timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            system_address: DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: DEFAULT_ACCRUAL_TIMEOUT,
        }
    }
}

impl AccrualConfig {
    pub fn from_env_or_default() -> Self {
        let system_address = env::var("LPG_ACCRUAL_SYSTEM_ADDRESS").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ LPG_ACCRUAL_SYSTEM_ADDRESS is not set. Using the default, {DEFAULT_ACCRUAL_SYSTEM_ADDRESS}, instead."
            );
            DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string()
        });
        let poll_interval = parse_millis("LPG_ACCRUAL_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL);
        let batch_size = parse_env("LPG_ACCRUAL_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1);
        let concurrency = parse_env("LPG_ACCRUAL_CONCURRENCY", DEFAULT_CONCURRENCY).max(1);
        let request_timeout = parse_millis("LPG_ACCRUAL_TIMEOUT_MS", DEFAULT_ACCRUAL_TIMEOUT);
        Self { system_address, poll_interval, batch_size, concurrency, request_timeout }
    }

    pub fn poller_config(&self) -> AccrualPollerConfig {
        AccrualPollerConfig {
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            request_timeout: self.request_timeout,
        }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared secret used to sign and verify access tokens.
    pub token_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The access token secret has not been set. I'm using a random value for this session. No token \
             issued before this session will be accepted. DO NOT operate on production like this. 🚨️🚨️🚨️"
        );
        let mut key = [0u8; 32];
        thread_rng().fill_bytes(&mut key);
        let token_secret = Secret::new(base64::encode_config(key, base64::URL_SAFE_NO_PAD));
        Self { token_secret }
    }
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self { token_secret: Secret::new(secret.to_string()) }
    }

    pub fn try_from_env() -> Option<Self> {
        env::var("LPG_TOKEN_SECRET").ok().filter(|s| !s.trim().is_empty()).map(|s| Self::new(&s))
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => parse_or_default(name, &s, default),
        Err(_) => {
            info!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

fn parse_or_default<T>(name: &str, value: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    value.trim().parse::<T>().unwrap_or_else(|e| {
        error!("🪛️ {value} is not a valid value for {name}. {e} Using the default, {default}, instead.");
        default
    })
}

fn parse_millis(name: &str, default: Duration) -> Duration {
    let millis = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(parse_env(name, millis).max(1))
}

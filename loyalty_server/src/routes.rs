//! Request handler definitions
//!
//! Define each route and its handler here. Every handler under `/api/user` acts on behalf of the owner named in the
//! caller's access token (see [`crate::auth`]).
//!
//! Since each worker thread processes its requests sequentially, handlers must never block the current thread.
//! Storage access is asynchronous throughout, so the handlers below only ever `await`.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use loyalty_engine::{
    traits::{LedgerManagement, OrderManagement},
    LedgerApi,
    OrderIntakeApi,
    SubmitOrderResult,
};

use crate::{
    auth::AccessClaims,
    data_objects::{OrderResponse, WithdrawalRequest, WithdrawalResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/orders" impl OrderManagement);
/// Route handler for order submission
///
/// The request body is the bare order number. Surrounding whitespace is ignored.
/// * `202 Accepted` - the order is new and has been queued for accrual.
/// * `200 OK` - the caller has already submitted this order.
/// * `409 Conflict` - another user has already submitted this order.
/// * `422 Unprocessable Entity` - the order number fails the Luhn check.
pub async fn submit_order<B: OrderManagement>(
    claims: AccessClaims,
    body: web::Bytes,
    api: web::Data<OrderIntakeApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = std::str::from_utf8(&body)
        .map_err(|e| ServerError::CouldNotDeserializePayload(e.to_string()))?
        .trim()
        .to_string();
    if number.is_empty() {
        return Err(ServerError::EmptyRequestBody);
    }
    debug!("💻️ POST order {number} for {}", claims.sub);
    let response = match api.submit_order(&claims.sub, &number).await? {
        SubmitOrderResult::Accepted(order) => HttpResponse::Accepted().json(OrderResponse::from(order)),
        SubmitOrderResult::AlreadyOwned(order) => HttpResponse::Ok().json(OrderResponse::from(order)),
    };
    Ok(response)
}

route!(my_orders => Get "/orders" impl OrderManagement);
/// Route handler for the orders endpoint
///
/// Lists the caller's orders, newest first. Responds with `204 No Content` if the caller has not submitted any.
pub async fn my_orders<B: OrderManagement>(
    claims: AccessClaims,
    api: web::Data<OrderIntakeApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", claims.sub);
    let orders = api.orders_for_owner(&claims.sub).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/balance" impl LedgerManagement);
pub async fn my_balance<B: LedgerManagement>(
    claims: AccessClaims,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_balance for {}", claims.sub);
    let balance = api.balance(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(withdraw => Post "/balance/withdraw" impl LedgerManagement);
/// Route handler for withdrawals
///
/// Expects a JSON body of the form `{"order": "<order number>", "sum": <points>}`.
/// * `200 OK` - the points were spent.
/// * `402 Payment Required` - the balance does not cover the sum.
/// * `422 Unprocessable Entity` - the order number fails the Luhn check, or the sum is not positive.
pub async fn withdraw<B: LedgerManagement>(
    claims: AccessClaims,
    body: web::Bytes,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    if body.is_empty() {
        return Err(ServerError::EmptyRequestBody);
    }
    let request: WithdrawalRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!("💻️ Could not deserialize withdrawal request. {e}");
        ServerError::CouldNotDeserializePayload(e.to_string())
    })?;
    debug!("💻️ POST withdraw {} for order {} by {}", request.sum, request.order, claims.sub);
    let withdrawal = api.withdraw(&claims.sub, &request.order, request.sum).await?;
    Ok(HttpResponse::Ok().json(WithdrawalResponse::from(withdrawal)))
}

route!(my_withdrawals => Get "/withdrawals" impl LedgerManagement);
/// Route handler for the withdrawals endpoint
///
/// Lists the caller's withdrawals, newest first. Responds with `204 No Content` if there are none.
pub async fn my_withdrawals<B: LedgerManagement>(
    claims: AccessClaims,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_withdrawals for {}", claims.sub);
    let withdrawals = api.withdrawals(&claims.sub).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let withdrawals = withdrawals.into_iter().map(WithdrawalResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(withdrawals))
}

//----------------------------------------------   Account  ----------------------------------------------------
route!(open_account => Post "/account" impl LedgerManagement);
/// Route handler for account opening
///
/// The identity system calls this once a user has signed up. Calling it again is harmless, and the current balance is
/// returned either way.
pub async fn open_account<B: LedgerManagement>(
    claims: AccessClaims,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST open_account for {}", claims.sub);
    let balance = api.open_account(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(balance))
}

use actix_web::{http::StatusCode, test, web, web::ServiceConfig, App};
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{Balance, OrderNumber, OwnerId, Withdrawal},
    traits::LedgerManagementError,
    LedgerApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, issue_token, post_request, test_time},
    mocks::MockLedgerManager,
};
use crate::routes::{health, MyBalanceRoute, MyWithdrawalsRoute, OpenAccountRoute, WithdrawRoute};

fn balance(owner: &str, current: i64, withdrawn: i64) -> Balance {
    Balance {
        owner_id: OwnerId::from(owner),
        current: Points::from_points(current),
        withdrawn: Points::from_points(withdrawn),
        created_at: test_time(1, 9),
        updated_at: test_time(2, 9),
    }
}

fn withdrawal(owner: &str, number: &str, sum: i64, day: u32) -> Withdrawal {
    Withdrawal {
        id: i64::from(day),
        owner_id: OwnerId::from(owner),
        order_number: OrderNumber::from(number),
        sum: Points::from_points(sum),
        processed_at: test_time(day, 12),
    }
}

fn configure_with(ledger: MockLedgerManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(MyBalanceRoute::<MockLedgerManager>::new())
            .service(WithdrawRoute::<MockLedgerManager>::new())
            .service(MyWithdrawalsRoute::<MockLedgerManager>::new())
            .service(OpenAccountRoute::<MockLedgerManager>::new())
            .app_data(web::Data::new(LedgerApi::new(ledger)));
    }
}

fn untouched() -> MockLedgerManager {
    let mut ledger = MockLedgerManager::new();
    ledger.expect_apply_withdrawal().never();
    ledger
}

#[actix_web::test]
async fn health_check() {
    let app = test::init_service(App::new().service(health)).await;
    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn fetch_my_balance() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerManager::new();
    ledger
        .expect_fetch_balance()
        .withf(|owner| owner.as_str() == "alice")
        .returning(|_| Ok(Some(balance("alice", 300, 200))));
    let token = issue_token("alice");
    let (status, body) = get_request(&token, "/balance", configure_with(ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({"current": 300.0, "withdrawn": 200.0}));
}

#[actix_web::test]
async fn fetch_balance_before_account_is_opened() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerManager::new();
    ledger.expect_fetch_balance().returning(|_| Ok(None));
    let token = issue_token("alice");
    let (status, body) = get_request(&token, "/balance", configure_with(ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({"current": 0.0, "withdrawn": 0.0}));
}

#[actix_web::test]
async fn fetch_balance_without_a_token() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerManager::new();
    ledger.expect_fetch_balance().never();
    let (status, _) = get_request("", "/balance", configure_with(ledger)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn withdraw_points() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerManager::new();
    ledger
        .expect_apply_withdrawal()
        .withf(|w| {
            w.owner_id.as_str() == "alice" && w.order_number.as_str() == "79927398713" && w.sum == Points::from_points(200)
        })
        .times(1)
        .returning(|_| Ok((balance("alice", 300, 200), withdrawal("alice", "79927398713", 200, 3))));
    let token = issue_token("alice");
    let (status, body) =
        post_request(&token, "/balance/withdraw", r#"{"order":"79927398713","sum":200}"#, configure_with(ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({"order": "79927398713", "sum": 200.0, "processed_at": "2024-03-03T12:00:00Z"}));
}

#[actix_web::test]
async fn withdraw_more_than_the_balance() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerManager::new();
    ledger.expect_apply_withdrawal().times(1).returning(|w| {
        Err(LedgerManagementError::InsufficientFunds { available: Points::from_points(300), requested: w.sum })
    });
    let token = issue_token("alice");
    let (status, body) =
        post_request(&token, "/balance/withdraw", r#"{"order":"79927398713","sum":400}"#, configure_with(ledger)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        body,
        r#"{"error":"Insufficient funds. Requested 400.00pts, but only 300.00pts is available"}"#
    );
}

#[actix_web::test]
async fn withdraw_without_an_account() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerManager::new();
    ledger
        .expect_apply_withdrawal()
        .returning(|w| Err(LedgerManagementError::AccountNotFound(w.owner_id)));
    let token = issue_token("alice");
    let (status, _) =
        post_request(&token, "/balance/withdraw", r#"{"order":"79927398713","sum":1}"#, configure_with(ledger)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn invalid_withdrawals() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice");
    let cases = [
        (r#"{"order":"79927398710","sum":200}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (r#"{"order":"79927398713","sum":0}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (r#"{"order":"79927398713","sum":-5}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (r#"{"order":"79927398713"}"#, StatusCode::BAD_REQUEST),
        (r#"{"order": 79927398713, "sum": 5}"#, StatusCode::BAD_REQUEST),
        ("not json", StatusCode::BAD_REQUEST),
        ("", StatusCode::BAD_REQUEST),
    ];
    for (payload, expected) in cases {
        let (status, body) = post_request(&token, "/balance/withdraw", payload, configure_with(untouched())).await;
        assert_eq!(status, expected, "payload: {payload}, response: {body}");
    }
}

#[actix_web::test]
async fn fetch_my_withdrawals() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerManager::new();
    ledger.expect_fetch_withdrawals().returning(|_| {
        Ok(vec![withdrawal("alice", "2377225624", 50, 4), withdrawal("alice", "79927398713", 200, 3)])
    });
    let token = issue_token("alice");
    let (status, body) = get_request(&token, "/withdrawals", configure_with(ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        json!([
            {"order": "2377225624", "sum": 50.0, "processed_at": "2024-03-04T12:00:00Z"},
            {"order": "79927398713", "sum": 200.0, "processed_at": "2024-03-03T12:00:00Z"}
        ])
    );
}

#[actix_web::test]
async fn fetch_my_withdrawals_when_there_are_none() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerManager::new();
    ledger.expect_fetch_withdrawals().returning(|_| Ok(vec![]));
    let token = issue_token("alice");
    let (status, _) = get_request(&token, "/withdrawals", configure_with(ledger)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn open_my_account() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerManager::new();
    ledger.expect_open_account().withf(|owner| owner.as_str() == "carol").times(1).returning(|o| Ok(balance(o.as_str(), 0, 0)));
    let token = issue_token("carol");
    let (status, body) = post_request(&token, "/account", "", configure_with(ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({"current": 0.0, "withdrawn": 0.0}));
}

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{Order, OrderNumber, OrderStatusType, OwnerId},
    traits::{InsertOrderResult, OrderManagementError},
    OrderIntakeApi,
};
use serde_json::json;

use super::{
    helpers::{expired_token, get_request, issue_token, post_request, test_time},
    mocks::MockOrderManager,
};
use crate::routes::{MyOrdersRoute, SubmitOrderRoute};

fn order(number: &str, owner: &str, status: OrderStatusType, accrual: Points, day: u32) -> Order {
    Order {
        id: i64::from(day),
        order_number: OrderNumber::from(number),
        owner_id: OwnerId::from(owner),
        status,
        accrual,
        credited: false,
        created_at: test_time(day, 10),
        updated_at: test_time(day, 11),
    }
}

fn configure_with(orders: MockOrderManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(SubmitOrderRoute::<MockOrderManager>::new())
            .service(MyOrdersRoute::<MockOrderManager>::new())
            .app_data(web::Data::new(OrderIntakeApi::new(orders)));
    }
}

fn untouched() -> MockOrderManager {
    let mut orders = MockOrderManager::new();
    orders.expect_insert_order().never();
    orders.expect_fetch_orders_for_owner().never();
    orders
}

#[actix_web::test]
async fn submit_order_without_a_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/orders", "6231543915765652", configure_with(untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No access token was provided."}"#);
}

#[actix_web::test]
async fn submit_order_with_an_expired_token() {
    let _ = env_logger::try_init().ok();
    let token = expired_token("alice");
    let (status, _) = post_request(&token, "/orders", "6231543915765652", configure_with(untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn submit_order_with_a_forged_token() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token("alice");
    let n = token.len();
    token.replace_range(n - 6..n - 1, "AAAAA");
    let (status, _) = post_request(&token, "/orders", "6231543915765652", configure_with(untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn submit_new_order() {
    let _ = env_logger::try_init().ok();
    let mut orders = MockOrderManager::new();
    orders
        .expect_insert_order()
        .withf(|o| o.order_number.as_str() == "6231543915765652" && o.owner_id.as_str() == "alice")
        .times(1)
        .returning(|o| {
            Ok(InsertOrderResult::Inserted(order(
                o.order_number.as_str(),
                o.owner_id.as_str(),
                OrderStatusType::New,
                Points::default(),
                1,
            )))
        });
    let token = issue_token("alice");
    let (status, body) = post_request(&token, "/orders", " 6231543915765652\n", configure_with(orders)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({"number": "6231543915765652", "status": "NEW", "uploaded_at": "2024-03-01T10:00:00Z"}));
}

#[actix_web::test]
async fn resubmit_own_order() {
    let _ = env_logger::try_init().ok();
    let mut orders = MockOrderManager::new();
    orders.expect_insert_order().times(1).returning(|_| {
        Ok(InsertOrderResult::AlreadyExists(order(
            "6231543915765652",
            "alice",
            OrderStatusType::Processing,
            Points::default(),
            1,
        )))
    });
    let token = issue_token("alice");
    let (status, body) = post_request(&token, "/orders", "6231543915765652", configure_with(orders)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"PROCESSING""#));
}

#[actix_web::test]
async fn submit_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut orders = MockOrderManager::new();
    orders.expect_insert_order().times(1).returning(|_| {
        Ok(InsertOrderResult::AlreadyExists(order(
            "6231543915765652",
            "alice",
            OrderStatusType::New,
            Points::default(),
            1,
        )))
    });
    let token = issue_token("bob");
    let (status, body) = post_request(&token, "/orders", "6231543915765652", configure_with(orders)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"Order 6231543915765652 has already been submitted by another user"}"#);
}

#[actix_web::test]
async fn submit_invalid_order_numbers() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice");
    let (status, _) = post_request(&token, "/orders", "6231543915765653", configure_with(untouched())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = post_request(&token, "/orders", "12a4", configure_with(untouched())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = post_request(&token, "/orders", "  ", configure_with(untouched())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn submit_order_when_the_database_fails() {
    let _ = env_logger::try_init().ok();
    let mut orders = MockOrderManager::new();
    orders.expect_insert_order().returning(|_| Err(OrderManagementError::DatabaseError("disk full".into())));
    let token = issue_token("alice");
    let (status, _) = post_request(&token, "/orders", "6231543915765652", configure_with(orders)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let mut orders = MockOrderManager::new();
    orders.expect_fetch_orders_for_owner().withf(|owner| owner.as_str() == "alice").returning(|_| {
        Ok(vec![
            order("79927398713", "alice", OrderStatusType::Processed, Points::from(72_998), 2),
            order("6231543915765652", "alice", OrderStatusType::Invalid, Points::default(), 1),
        ])
    });
    let token = issue_token("alice");
    let (status, body) = get_request(&token, "/orders", configure_with(orders)).await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        json!([
            {"number": "79927398713", "status": "PROCESSED", "accrual": 729.98, "uploaded_at": "2024-03-02T10:00:00Z"},
            {"number": "6231543915765652", "status": "INVALID", "uploaded_at": "2024-03-01T10:00:00Z"}
        ])
    );
}

#[actix_web::test]
async fn fetch_my_orders_when_there_are_none() {
    let _ = env_logger::try_init().ok();
    let mut orders = MockOrderManager::new();
    orders.expect_fetch_orders_for_owner().returning(|_| Ok(vec![]));
    let token = issue_token("alice");
    let (status, body) = get_request(&token, "/orders", configure_with(orders)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

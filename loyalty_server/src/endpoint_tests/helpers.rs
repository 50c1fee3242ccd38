use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use loyalty_engine::db_types::OwnerId;

use crate::{
    auth::{AccessClaims, TokenIssuer},
    config::AuthConfig,
};

// Only ever used to sign tokens in tests.
const TEST_TOKEN_SECRET: &str = "a5d2c8e0b7f14e3c9a1d6b4f8e2c7a9d";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_TOKEN_SECRET)
}

pub fn issue_token(owner: &str) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(&OwnerId::from(owner), None).expect("Failed to sign token")
}

pub fn expired_token(owner: &str) -> String {
    let claims = AccessClaims { sub: OwnerId::from(owner), exp: Utc::now().timestamp() - 60 };
    TokenIssuer::new(&get_auth_config()).sign(&claims).expect("Failed to sign token")
}

pub fn test_time(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

async fn send_request<F>(req: TestRequest, token: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = if token.is_empty() { req } else { req.insert_header(("Authorization", format!("Bearer {token}"))) };
    let app = App::new().app_data(web::Data::new(TokenIssuer::new(&get_auth_config()))).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub async fn get_request<F>(token: &str, path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), token, configure).await
}

pub async fn post_request<F>(token: &str, path: &str, body: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::post().uri(path).set_payload(body.to_string()), token, configure).await
}

use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use loyalty_engine::{AccrualClient, LedgerApi, OrderIntakeApi, SqliteDatabase};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        OpenAccountRoute,
        SubmitOrderRoute,
        WithdrawRoute,
    },
    workers::{start_accrual_worker, start_reconciliation_worker},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    if config.run_workers {
        let accrual = &config.accrual;
        let oracle = AccrualClient::new(&accrual.system_address, accrual.request_timeout)
            .map_err(|e| ServerError::InitializeError(e.to_string()))?;
        // The workers run until the process exits.
        let _ = start_accrual_worker(db.clone(), oracle, accrual.poller_config(), accrual.poll_interval);
        let _ = start_reconciliation_worker(db.clone(), config.reconcile_interval);
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let intake_api = OrderIntakeApi::new(db.clone());
        let ledger_api = LedgerApi::new(db.clone());
        let token_issuer = TokenIssuer::new(&config.auth);
        let user_scope = web::scope("/api/user")
            .service(SubmitOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyBalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(MyWithdrawalsRoute::<SqliteDatabase>::new())
            .service(OpenAccountRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lpg::access_log"))
            .app_data(web::Data::new(intake_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(token_issuer))
            .service(health)
            .service(user_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

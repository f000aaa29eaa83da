use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{http, web, App, HttpServer};
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

pub mod broadcast;
pub mod config;
pub mod db;
pub mod errors;
mod handlers;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod telemetry;

use crate::broadcast::MatchBroadcaster;
use crate::config::settings::Settings;
use crate::db::postgres::PgMatchRepository;
use crate::routes::init_routes;
use crate::runtime::MatchTimerRuntime;
use crate::services::{HttpTeamsClient, MatchOrchestrationService};

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    settings: &Settings,
) -> Result<Server, std::io::Error> {
    let runtime = Arc::new(MatchTimerRuntime::new());
    let broadcaster = Arc::new(MatchBroadcaster::new());

    let teams_client = HttpTeamsClient::new(
        settings.teams_service.base_url.clone(),
        Duration::from_secs(settings.teams_service.request_timeout_seconds),
    );
    let service = MatchOrchestrationService::new(
        PgMatchRepository::new(db_pool.clone()),
        teams_client,
        runtime,
        broadcaster.clone(),
    );

    // Wrap using web::Data, which boils down to an Arc smart pointer
    let db_pool_data = web::Data::new(db_pool);
    let service_data = web::Data::new(service);
    let broadcaster_data = web::Data::new(broadcaster);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:3001")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
                http::header::UPGRADE,
                http::header::CONNECTION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(db_pool_data.clone())
            .app_data(service_data.clone())
            .app_data(broadcaster_data.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the incident map application.
//!
//! Serves the filtered incident set, danger zones, statistics, and exports
//! to the dashboard frontend, and proxies new incident submissions to the
//! write endpoint. The normalized incident cache refreshes from the feed in
//! the background; the API starts serving immediately with an empty state
//! and fills in once the first fetch lands.

mod handlers;

use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use incident_map_feed::FeedClient;
use incident_map_feed_models::FeedConfig;
use incident_map_incident_models::Incident;

/// Shared application state.
pub struct AppState {
    /// Normalized incident cache, replaced wholesale on every refresh.
    pub incidents: RwLock<Vec<Incident>>,
    /// Feed client shared by the refresh loop and the submission endpoint.
    pub client: FeedClient,
}

impl AppState {
    /// Snapshot of the incident cache. Empty when the cache is poisoned or
    /// not yet loaded.
    pub fn snapshot(&self) -> Vec<Incident> {
        self.incidents.read().map(|g| g.clone()).unwrap_or_default()
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let mut config = FeedConfig::default();
    if let Ok(endpoint) = std::env::var("FEED_ENDPOINT") {
        config.endpoint = endpoint;
    }
    if let Ok(endpoint) = std::env::var("SUBMIT_ENDPOINT") {
        config.submit_endpoint = endpoint;
    }

    let state = web::Data::new(AppState {
        incidents: RwLock::new(Vec::new()),
        client: FeedClient::new(config),
    });

    let refresher = state.clone();
    actix_web::rt::spawn(async move {
        run_refresh_loop(&refresher).await;
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/incidents", web::get().to(handlers::incidents))
                    .route("/zones", web::get().to(handlers::zones))
                    .route("/stats", web::get().to(handlers::stats))
                    .route("/export/csv", web::get().to(handlers::export_csv))
                    .route("/export/geojson", web::get().to(handlers::export_geojson))
                    .route("/export/kml", web::get().to(handlers::export_kml))
                    .route("/reports", web::post().to(handlers::submit_report)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Loads the feed immediately, then re-fetches on the configured interval.
///
/// `fetch_incidents_with_retry` already retries a failed fetch indefinitely
/// after the fixed delay, so this loop only has to pace the refreshes. An
/// overlapping manual fetch is short-circuited by the client's busy flag
/// rather than cancelled.
async fn run_refresh_loop(state: &web::Data<AppState>) {
    loop {
        let incidents = state.client.fetch_incidents_with_retry().await;
        match state.incidents.write() {
            Ok(mut cache) => {
                log::info!("Incident cache refreshed: {} records", incidents.len());
                *cache = incidents;
            }
            Err(e) => log::error!("Incident cache poisoned, refresh dropped: {e}"),
        }
        tokio::time::sleep(state.client.config().refresh_interval).await;
    }
}

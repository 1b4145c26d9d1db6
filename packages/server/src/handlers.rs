//! HTTP handler functions for the incident map API.
//!
//! Every read endpoint runs the same pipeline: snapshot the cache, apply the
//! per-request filter criteria once, and feed the filtered set to whatever
//! the endpoint renders (records, zones, aggregates, exports).

use actix_web::{HttpResponse, web};
use incident_map_analytics as analytics;
use incident_map_feed::FeedError;
use incident_map_feed::submit::{IncidentReport, PhotoAsset, SubmitOutcome};
use incident_map_filter::apply_filters;
use incident_map_incident_models::{Incident, SeverityTier};
use incident_map_server_models::{
    ApiHealth, ApiStats, ApiZone, IncidentQueryParams, ReportRequest,
};
use incident_map_spatial::{diversify, find_clusters};

use crate::AppState;

/// Trailing trend window when the query does not specify one.
const DEFAULT_TREND_MONTHS: u32 = 6;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let cached_incidents = state.incidents.read().map(|g| g.len()).unwrap_or(0);
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_incidents,
    })
}

/// `GET /api/incidents`
///
/// Returns the filtered incident set in feed order.
pub async fn incidents(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filtered = filtered_snapshot(&state, &params);
    HttpResponse::Ok().json(filtered)
}

/// `GET /api/zones`
///
/// Returns the danger zones of the filtered set, largest first. With
/// `diversified=true` the list is capped per municipality for display.
pub async fn zones(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filtered = filtered_snapshot(&state, &params);
    let clusters = find_clusters(&filtered);

    let selected = if params.diversified.unwrap_or(false) {
        diversify(&clusters)
    } else {
        clusters
    };

    let zones: Vec<ApiZone> = selected.iter().map(ApiZone::from).collect();
    HttpResponse::Ok().json(zones)
}

/// `GET /api/stats`
///
/// Returns everything the statistics view renders, computed over the
/// filtered set.
pub async fn stats(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filtered = filtered_snapshot(&state, &params);
    let stats = recompute(&filtered, &params, chrono::Utc::now().date_naive());
    HttpResponse::Ok().json(stats)
}

/// `GET /api/export/csv`
pub async fn export_csv(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filtered = filtered_snapshot(&state, &params);
    match incident_map_export::to_csv(&filtered) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(attachment_header(&params, "csv"))
            .body(bytes),
        Err(e) => {
            log::error!("CSV export failed: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to render CSV export"
            }))
        }
    }
}

/// `GET /api/export/geojson`
pub async fn export_geojson(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filtered = filtered_snapshot(&state, &params);
    let collection = incident_map_export::to_geojson(&filtered);
    HttpResponse::Ok()
        .content_type("application/geo+json")
        .insert_header(attachment_header(&params, "geojson"))
        .json(collection)
}

/// `GET /api/export/kml`
pub async fn export_kml(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filtered = filtered_snapshot(&state, &params);
    let name = format!("Siniestros Viales - {}", filter_label(&params));
    let kml = incident_map_export::to_kml(&filtered, &name);
    HttpResponse::Ok()
        .content_type("application/vnd.google-earth.kml+xml")
        .insert_header(attachment_header(&params, "kml"))
        .body(kml)
}

/// `POST /api/reports`
///
/// Proxies a new incident submission to the write endpoint. A detected
/// duplicate answers `409 Conflict` with the reported similarity; the
/// client may re-submit with `forceInsert`.
pub async fn submit_report(
    state: web::Data<AppState>,
    body: web::Json<ReportRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    let report = IncidentReport {
        municipality: request.municipality,
        reporter_email: request.reporter_email,
        occurred_on: request.occurred_on,
        incident_type: request.incident_type,
        cause: request.cause,
        address: request.address,
        coordinates: request.coordinates,
        description: request.description,
        force_insert: request.force_insert,
        photos: request
            .photos
            .into_iter()
            .map(|photo| PhotoAsset {
                url: photo.url,
                public_id: photo.public_id,
                filename: photo.filename,
                bytes: photo.bytes,
                format: photo.format,
                width: photo.width,
                height: photo.height,
            })
            .collect(),
    };

    match state.client.submit_report(report).await {
        Ok(SubmitOutcome::Accepted) => {
            HttpResponse::Ok().json(serde_json::json!({ "status": "exito" }))
        }
        Ok(SubmitOutcome::Duplicate { similarity_pct }) => {
            HttpResponse::Conflict().json(serde_json::json!({
                "status": "duplicado",
                "similitud": similarity_pct,
            }))
        }
        Err(FeedError::InvalidReport { message }) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
        }
        Err(e) => {
            log::error!("Report submission failed: {e}");
            HttpResponse::BadGateway().json(serde_json::json!({
                "error": "Failed to submit report"
            }))
        }
    }
}

/// Snapshots the cache and applies the request's filter criteria.
fn filtered_snapshot(
    state: &web::Data<AppState>,
    params: &web::Query<IncidentQueryParams>,
) -> Vec<Incident> {
    let incidents = state.snapshot();
    apply_filters(&incidents, &params.criteria())
}

/// Computes the full statistics payload from the filtered set.
fn recompute(
    filtered: &[Incident],
    params: &IncidentQueryParams,
    today: chrono::NaiveDate,
) -> ApiStats {
    let clusters = find_clusters(filtered);
    let danger_zones: Vec<ApiZone> = diversify(&clusters).iter().map(ApiZone::from).collect();
    let critical_zones = clusters
        .iter()
        .filter(|c| c.severity == SeverityTier::Critica)
        .count();
    let high_zones = clusters
        .iter()
        .filter(|c| c.severity == SeverityTier::Alta)
        .count();

    ApiStats {
        summary: analytics::summarize(filtered),
        by_incident_type: analytics::count_by_incident_type(filtered),
        by_cause: analytics::count_by_cause(filtered),
        by_road_type: analytics::count_by_road_type(filtered),
        top_municipalities: analytics::count_by_municipality(filtered)
            .into_iter()
            .take(10)
            .collect(),
        fatalities_by_classification: analytics::fatalities_by_classification(filtered),
        involved: analytics::involved_tally(filtered),
        weekdays: analytics::weekday_distribution(filtered),
        most_dangerous_day: analytics::most_dangerous_day(filtered),
        distribution: analytics::group_by_period(filtered, params.distribution_granularity()),
        trend: analytics::monthly_trend(
            filtered,
            params.trend_months.unwrap_or(DEFAULT_TREND_MONTHS),
            today,
        ),
        danger_zones,
        critical_zones,
        high_zones,
    }
}

/// Label used in export filenames and document names: the active category
/// or `"todos"`.
fn filter_label(params: &IncidentQueryParams) -> String {
    params
        .category
        .clone()
        .unwrap_or_else(|| "todos".to_string())
}

fn attachment_header(
    params: &IncidentQueryParams,
    extension: &str,
) -> (&'static str, String) {
    let today = chrono::Utc::now().date_naive();
    (
        "Content-Disposition",
        format!(
            "attachment; filename=\"siniestros-{}-{today}.{extension}\"",
            filter_label(params),
        ),
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use incident_map_incident_models::{Coordinates, defaults};

    use super::*;

    fn incident(lat: f64, lng: f64, cause: &str, fatalities: u32) -> Incident {
        Incident {
            municipality: "Tuxtla Gutiérrez".to_string(),
            occurred_at: NaiveDate::from_ymd_opt(2024, 3, 15),
            incident_type: "Choque".to_string(),
            cause: cause.to_string(),
            road_type: "Avenida".to_string(),
            involved_users: [Some("Automovilista".to_string()), None],
            total_users: 1,
            total_fatalities: fatalities,
            fatality_classification: defaults::UNSPECIFIED_CLASSIFICATION.to_string(),
            coordinates: Some(Coordinates { lat, lng }),
            news_link: None,
            description: defaults::NO_DESCRIPTION.to_string(),
        }
    }

    #[test]
    fn recompute_runs_the_whole_pipeline() {
        let incidents = vec![
            incident(16.7500, -93.1200, "Exceso de velocidad", 1),
            incident(16.7501, -93.1201, "Exceso de velocidad", 1),
            incident(16.7502, -93.1202, "Distracción", 1),
        ];

        let stats = recompute(
            &incidents,
            &IncidentQueryParams::default(),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        );

        assert_eq!(stats.summary.total_incidents, 3);
        assert_eq!(stats.summary.total_fatalities, 3);
        assert_eq!(stats.by_cause[0].key, "Exceso de velocidad");
        // One zone of 3 members: score 3 + 3×3 = 12 → Alta
        assert_eq!(stats.danger_zones.len(), 1);
        assert_eq!(stats.danger_zones[0].severity, SeverityTier::Alta);
        assert_eq!(stats.high_zones, 1);
        assert_eq!(stats.critical_zones, 0);
        assert_eq!(stats.distribution.len(), 1);
        assert_eq!(stats.distribution[0].key, "2024-03");
    }

    #[test]
    fn filter_label_defaults_to_todos() {
        assert_eq!(filter_label(&IncidentQueryParams::default()), "todos");

        let params = IncidentQueryParams {
            category: Some("Choque".to_string()),
            ..IncidentQueryParams::default()
        };
        assert_eq!(filter_label(&params), "Choque");
    }

    #[actix_web::test]
    async fn health_reports_cache_size() {
        use std::sync::RwLock;

        use actix_web::App;
        use incident_map_feed::FeedClient;
        use incident_map_feed_models::FeedConfig;

        let state = web::Data::new(AppState {
            incidents: RwLock::new(vec![incident(16.75, -93.12, "Choque", 0)]),
            client: FeedClient::new(FeedConfig::default()),
        });

        let app = actix_web::test::init_service(
            App::new()
                .app_data(state)
                .route("/api/health", web::get().to(health)),
        )
        .await;

        let request = actix_web::test::TestRequest::get()
            .uri("/api/health")
            .to_request();
        let response: ApiHealth = actix_web::test::call_and_read_body_json(&app, request).await;

        assert!(response.healthy);
        assert_eq!(response.cached_incidents, 1);
    }

    #[actix_web::test]
    async fn incidents_endpoint_applies_filters() {
        use std::sync::RwLock;

        use actix_web::App;
        use incident_map_feed::FeedClient;
        use incident_map_feed_models::FeedConfig;

        let state = web::Data::new(AppState {
            incidents: RwLock::new(vec![
                incident(16.7500, -93.1200, "Exceso de velocidad", 1),
                incident(16.7501, -93.1201, "Distracción", 0),
            ]),
            client: FeedClient::new(FeedConfig::default()),
        });

        let app = actix_web::test::init_service(
            App::new()
                .app_data(state)
                .route("/api/incidents", web::get().to(incidents)),
        )
        .await;

        let request = actix_web::test::TestRequest::get()
            .uri("/api/incidents?minFatalities=1")
            .to_request();
        let response: Vec<Incident> = actix_web::test::call_and_read_body_json(&app, request).await;

        assert_eq!(response.len(), 1);
        assert_eq!(response[0].cause, "Exceso de velocidad");
    }
}

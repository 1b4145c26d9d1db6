//! Row normalization: raw positional feed rows into [`Incident`] records.
//!
//! Normalization is total and pure — every row yields an incident, with
//! per-field defaults where the feed is empty. Validity (a parsed date, a
//! coordinate inside the bounding box) is a property of the result that
//! callers check, not a reason to drop the row here.

use incident_map_feed_models::{FeedColumn, RawRow};
use incident_map_incident_models::{GeoBounds, Incident, defaults};

use crate::parsing::{cell_text, parse_coordinates, parse_count, parse_incident_date};

/// Normalizes one raw feed row.
#[must_use]
pub fn normalize_row(row: &RawRow, bounds: &GeoBounds) -> Incident {
    let text_or = |column: FeedColumn, default: &str| {
        cell_text(column.cell(row)).unwrap_or_else(|| default.to_string())
    };

    let occurred_at = cell_text(FeedColumn::OccurredAt.cell(row))
        .as_deref()
        .and_then(parse_incident_date);

    let coordinates = FeedColumn::Coordinates
        .cell(row)
        .and_then(|value| parse_coordinates(value, bounds));

    Incident {
        municipality: text_or(FeedColumn::Municipality, defaults::UNKNOWN_MUNICIPALITY),
        occurred_at,
        incident_type: text_or(FeedColumn::IncidentType, defaults::UNSPECIFIED_TYPE),
        cause: text_or(FeedColumn::Cause, defaults::UNSPECIFIED_CAUSE),
        road_type: text_or(FeedColumn::RoadType, defaults::UNSPECIFIED_ROAD_TYPE),
        involved_users: [
            cell_text(FeedColumn::UserOne.cell(row)),
            cell_text(FeedColumn::UserTwo.cell(row)),
        ],
        total_users: parse_count(FeedColumn::TotalUsers.cell(row)),
        total_fatalities: parse_count(FeedColumn::TotalFatalities.cell(row)),
        fatality_classification: text_or(
            FeedColumn::FatalityClassification,
            defaults::UNSPECIFIED_CLASSIFICATION,
        ),
        coordinates,
        news_link: cell_text(FeedColumn::NewsLink.cell(row)),
        description: text_or(FeedColumn::Description, defaults::NO_DESCRIPTION),
    }
}

/// Normalizes a full feed payload, logging how many records carry valid
/// coordinates.
#[must_use]
pub fn normalize_rows(rows: &[RawRow], bounds: &GeoBounds) -> Vec<Incident> {
    let incidents: Vec<Incident> = rows.iter().map(|row| normalize_row(row, bounds)).collect();

    let with_coordinates = incidents.iter().filter(|i| i.has_coordinates()).count();
    log::info!(
        "Normalized {} incidents from {} raw rows ({with_coordinates} with valid coordinates)",
        incidents.len(),
        rows.len(),
    );

    incidents
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    fn row_with(entries: &[(FeedColumn, serde_json::Value)]) -> RawRow {
        let mut row: RawRow = vec![json!(""); FeedColumn::COUNT];
        for (column, value) in entries {
            row[column.index()] = value.clone();
        }
        row
    }

    #[test]
    fn empty_row_gets_all_defaults() {
        let incident = normalize_row(&RawRow::new(), &GeoBounds::CHIAPAS);

        assert_eq!(incident.municipality, "Desconocido");
        assert_eq!(incident.incident_type, "No especificado");
        assert_eq!(incident.cause, "No especificada");
        assert_eq!(incident.road_type, "No especificada");
        assert_eq!(incident.fatality_classification, "No especificada");
        assert_eq!(incident.description, "Sin descripción");
        assert_eq!(incident.involved_users, [None, None]);
        assert_eq!(incident.total_users, 0);
        assert_eq!(incident.total_fatalities, 0);
        assert!(incident.occurred_at.is_none());
        assert!(incident.coordinates.is_none());
        assert!(incident.news_link.is_none());
    }

    #[test]
    fn populated_row_maps_every_field() {
        let row = row_with(&[
            (FeedColumn::Municipality, json!("Tuxtla Gutiérrez")),
            (FeedColumn::OccurredAt, json!("15/3/2024 10:45:00")),
            (FeedColumn::IncidentType, json!("Choque")),
            (FeedColumn::Cause, json!("Exceso de velocidad")),
            (FeedColumn::UserOne, json!("Automovilista")),
            (FeedColumn::UserTwo, json!("Motociclista")),
            (FeedColumn::TotalUsers, json!("3")),
            (FeedColumn::TotalFatalities, json!(1)),
            (FeedColumn::FatalityClassification, json!("Conductor")),
            (FeedColumn::RoadType, json!("Carretera federal")),
            (FeedColumn::Coordinates, json!("16.75, -93.12")),
            (FeedColumn::NewsLink, json!("https://example.com/nota")),
            (FeedColumn::Description, json!("Colisión frontal")),
        ]);

        let incident = normalize_row(&row, &GeoBounds::CHIAPAS);

        assert_eq!(incident.municipality, "Tuxtla Gutiérrez");
        assert_eq!(incident.occurred_at, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(incident.incident_type, "Choque");
        assert_eq!(incident.cause, "Exceso de velocidad");
        assert_eq!(incident.road_type, "Carretera federal");
        assert_eq!(
            incident.involved_users,
            [
                Some("Automovilista".to_string()),
                Some("Motociclista".to_string())
            ]
        );
        assert_eq!(incident.total_users, 3);
        assert_eq!(incident.total_fatalities, 1);
        assert_eq!(incident.fatality_classification, "Conductor");
        assert_eq!(incident.news_link, Some("https://example.com/nota".to_string()));
        assert_eq!(incident.description, "Colisión frontal");

        let coords = incident.coordinates.unwrap();
        assert!((coords.lat - 16.75).abs() < f64::EPSILON);
        assert!((coords.lng - -93.12).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_bounds_coordinates_are_dropped_not_fatal() {
        let row = row_with(&[
            (FeedColumn::Municipality, json!("Tuxtla Gutiérrez")),
            (FeedColumn::Coordinates, json!("19.43, -99.13")),
        ]);

        let incident = normalize_row(&row, &GeoBounds::CHIAPAS);
        assert!(incident.coordinates.is_none());
        assert_eq!(incident.municipality, "Tuxtla Gutiérrez");
    }

    #[test]
    fn end_to_end_feed_scenario() {
        // Five rows: a trio within ~50 m, a pair near the box edge, and one
        // row with no coordinates at all.
        let rows: Vec<RawRow> = vec![
            row_with(&[(FeedColumn::Coordinates, json!("16.7500, -93.1200"))]),
            row_with(&[(FeedColumn::Coordinates, json!("16.7503, -93.1202"))]),
            row_with(&[(FeedColumn::Coordinates, json!("16.7501, -93.1198"))]),
            row_with(&[(FeedColumn::Coordinates, json!("17.79, -90.25"))]),
            row_with(&[(FeedColumn::Coordinates, json!(""))]),
        ];

        let incidents = normalize_rows(&rows, &GeoBounds::CHIAPAS);

        assert_eq!(incidents.len(), 5);
        assert_eq!(incidents.iter().filter(|i| i.has_coordinates()).count(), 4);
        assert!(incidents.iter().all(|i| i.description == "Sin descripción"));
        assert!(incidents.iter().all(|i| i.cause == "No especificada"));
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Download formats for the filtered incident set.
//!
//! All three formats carry only coordinate-valid incidents. The `ID` column
//! is the 1-based position within the full filtered set, so identifiers stay
//! stable whether or not coordinate-less rows sit between exported ones.

use incident_map_incident_models::Incident;

/// Errors that can occur while rendering an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV writer could not be flushed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// UTF-8 byte-order mark, prepended so spreadsheet applications detect the
/// encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const CSV_HEADERS: [&str; 10] = [
    "ID",
    "Fecha",
    "Municipio",
    "Tipo",
    "Causa",
    "Vialidad",
    "Usuarios",
    "Fallecidos",
    "Latitud",
    "Longitud",
];

fn formatted_date(incident: &Incident) -> String {
    incident
        .occurred_at
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Renders the coordinate-valid incidents as UTF-8 CSV with a BOM.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization fails.
pub fn to_csv(incidents: &[Incident]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for (index, incident) in incidents.iter().enumerate() {
        let Some(coords) = incident.coordinates else {
            continue;
        };
        writer.write_record([
            (index + 1).to_string(),
            formatted_date(incident),
            incident.municipality.clone(),
            incident.incident_type.clone(),
            incident.cause.clone(),
            incident.road_type.clone(),
            incident.total_users.to_string(),
            incident.total_fatalities.to_string(),
            coords.lat.to_string(),
            coords.lng.to_string(),
        ])?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;

    let mut out = Vec::with_capacity(UTF8_BOM.len() + body.len());
    out.extend_from_slice(UTF8_BOM);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Renders the coordinate-valid incidents as a `GeoJSON`
/// `FeatureCollection` of `Point` features (longitude first).
#[must_use]
pub fn to_geojson(incidents: &[Incident]) -> geojson::FeatureCollection {
    let features = incidents
        .iter()
        .enumerate()
        .filter_map(|(index, incident)| {
            let coords = incident.coordinates?;

            let mut properties = geojson::JsonObject::new();
            properties.insert("id".to_string(), serde_json::json!(index + 1));
            properties.insert("fecha".to_string(), serde_json::json!(formatted_date(incident)));
            properties.insert(
                "municipio".to_string(),
                serde_json::json!(incident.municipality),
            );
            properties.insert("tipo".to_string(), serde_json::json!(incident.incident_type));
            properties.insert("causa".to_string(), serde_json::json!(incident.cause));
            properties.insert("vialidad".to_string(), serde_json::json!(incident.road_type));
            properties.insert(
                "usuarios".to_string(),
                serde_json::json!(incident.total_users),
            );
            properties.insert(
                "fallecidos".to_string(),
                serde_json::json!(incident.total_fatalities),
            );

            Some(geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
                    coords.lng, coords.lat,
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect();

    geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Renders the coordinate-valid incidents as a KML document.
///
/// Placemark coordinates use the KML `longitude,latitude,0` order.
#[must_use]
pub fn to_kml(incidents: &[Incident], document_name: &str) -> String {
    let mut kml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    kml.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n");
    kml.push_str("  <Document>\n");
    kml.push_str(&format!("    <name>{}</name>\n", escape_xml(document_name)));

    for (index, incident) in incidents.iter().enumerate() {
        let Some(coords) = incident.coordinates else {
            continue;
        };
        kml.push_str("    <Placemark>\n");
        kml.push_str(&format!("      <name>Siniestro {}</name>\n", index + 1));
        kml.push_str(&format!(
            "      <description>{}</description>\n",
            escape_xml(&incident.description)
        ));
        kml.push_str("      <Point>\n");
        kml.push_str(&format!(
            "        <coordinates>{},{},0</coordinates>\n",
            coords.lng, coords.lat
        ));
        kml.push_str("      </Point>\n");
        kml.push_str("    </Placemark>\n");
    }

    kml.push_str("  </Document>\n");
    kml.push_str("</kml>\n");
    kml
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

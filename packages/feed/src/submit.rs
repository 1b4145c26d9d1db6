//! Submission of new incident reports to the write endpoint.
//!
//! The write endpoint accepts a multipart form. Photos are never uploaded
//! here — the capture widget uploads them to the external asset host first
//! and the form carries only the resulting asset descriptors (at most two).

use incident_map_incident_models::Coordinates;

use crate::{FeedClient, FeedError};

/// Maximum number of photo descriptors per report.
pub const MAX_PHOTOS: usize = 2;

/// Descriptor of a photo already uploaded to the external asset host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoAsset {
    /// Public HTTPS URL of the stored asset.
    pub url: String,
    /// Asset-host public identifier.
    pub public_id: String,
    /// Original filename as captured.
    pub filename: String,
    /// Size in bytes.
    pub bytes: u64,
    /// Image format (e.g. `"jpg"`).
    pub format: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// A new incident report to submit.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentReport {
    /// Municipality (required by the endpoint).
    pub municipality: String,
    /// Reporter e-mail (required by the endpoint).
    pub reporter_email: String,
    /// Incident date as entered, e.g. `"2024-03-15"` (required).
    pub occurred_on: String,
    /// Incident type.
    pub incident_type: Option<String>,
    /// Reported cause.
    pub cause: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Coordinates picked on the map.
    pub coordinates: Option<Coordinates>,
    /// Free-text description.
    pub description: Option<String>,
    /// Re-submit even when the endpoint flagged the report as a duplicate.
    pub force_insert: bool,
    /// Photo descriptors, at most [`MAX_PHOTOS`].
    pub photos: Vec<PhotoAsset>,
}

/// Outcome of a submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitOutcome {
    /// The report was stored.
    Accepted,
    /// The endpoint detected a likely duplicate and did not store the
    /// report. Re-submit with `force_insert` to override.
    Duplicate {
        /// Similarity percentage reported by the endpoint.
        similarity_pct: f64,
    },
}

impl IncidentReport {
    fn validate(&self) -> Result<(), FeedError> {
        for (field, value) in [
            ("Municipio", &self.municipality),
            ("Correo_Electronico", &self.reporter_email),
            ("Fecha_del_siniestro", &self.occurred_on),
        ] {
            if value.trim().is_empty() {
                return Err(FeedError::InvalidReport {
                    message: format!("required field {field} is empty"),
                });
            }
        }
        if self.photos.len() > MAX_PHOTOS {
            return Err(FeedError::InvalidReport {
                message: format!("at most {MAX_PHOTOS} photos are allowed"),
            });
        }
        Ok(())
    }

    fn into_form(self) -> reqwest::multipart::Form {
        let mut form = reqwest::multipart::Form::new()
            .text("Municipio", self.municipality)
            .text("Correo_Electronico", self.reporter_email)
            .text("Fecha_del_siniestro", self.occurred_on);

        if let Some(incident_type) = self.incident_type {
            form = form.text("Tipo_de_siniestro", incident_type);
        }
        if let Some(cause) = self.cause {
            form = form.text("Causa_del_siniestro", cause);
        }
        if let Some(address) = self.address {
            form = form.text("Direccion", address);
        }
        if let Some(coordinates) = self.coordinates {
            form = form.text(
                "Coordenadas",
                format!("{:.6}, {:.6}", coordinates.lat, coordinates.lng),
            );
        }
        if let Some(description) = self.description {
            form = form.text("Descripcion", description);
        }
        if self.force_insert {
            form = form.text("forzar_insercion", "true");
        }

        let photo_count = self.photos.len();
        for (index, photo) in self.photos.into_iter().enumerate() {
            form = form
                .text(format!("cloudinary_url_{index}"), photo.url)
                .text(format!("cloudinary_public_id_{index}"), photo.public_id)
                .text(format!("cloudinary_filename_{index}"), photo.filename)
                .text(format!("cloudinary_size_{index}"), photo.bytes.to_string())
                .text(format!("cloudinary_format_{index}"), photo.format)
                .text(format!("cloudinary_width_{index}"), photo.width.to_string())
                .text(
                    format!("cloudinary_height_{index}"),
                    photo.height.to_string(),
                );
        }
        form = form.text("numeroFotografias", photo_count.to_string());
        form.text("origen_fotos", "cloudinary")
    }
}

impl FeedClient {
    /// Submits a new incident report.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidReport`] when a required field is empty or
    /// too many photos are attached, and transport-level [`FeedError`]
    /// variants when the POST fails.
    pub async fn submit_report(&self, report: IncidentReport) -> Result<SubmitOutcome, FeedError> {
        report.validate()?;

        let forced = report.force_insert;
        log::info!(
            "Submitting incident report for {} ({} photos{})",
            report.municipality,
            report.photos.len(),
            if forced { ", forced" } else { "" },
        );

        let response = self
            .http()
            .post(&self.config().submit_endpoint)
            .multipart(report.into_form())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        parse_submit_response(status, &body)
    }
}

/// Interprets the write endpoint's response.
///
/// The endpoint answers JSON when it can (`{"status": "duplicado", ...}` or
/// `{"status": "exito"}`), but legacy deployments answer plain text
/// containing `OK` on success.
fn parse_submit_response(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<SubmitOutcome, FeedError> {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        match json.get("status").and_then(serde_json::Value::as_str) {
            Some("duplicado") => {
                let similarity_pct = json
                    .get("similitud")
                    .and_then(serde_json::Value::as_f64)
                    .unwrap_or(0.0);
                return Ok(SubmitOutcome::Duplicate { similarity_pct });
            }
            Some("exito") => return Ok(SubmitOutcome::Accepted),
            _ => {}
        }
    }

    if status.is_success() && body.contains("OK") {
        return Ok(SubmitOutcome::Accepted);
    }
    if status.is_success() {
        return Err(FeedError::UnexpectedPayload {
            message: format!("unrecognized submit response: {body:.80}"),
        });
    }
    Err(FeedError::Status { status })
}

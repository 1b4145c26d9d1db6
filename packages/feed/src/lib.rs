#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident feed client and normalization logic.
//!
//! Fetches the raw positional rows from the spreadsheet-backed endpoint,
//! parses the loosely-typed fields (coordinates, dates, counts), and
//! normalizes each row into the canonical
//! [`Incident`](incident_map_incident_models::Incident) model. Also submits
//! new incident reports back to the write endpoint.
//!
//! Field-level failures never surface as errors: a malformed field degrades
//! to its documented default and a malformed coordinate excludes the record
//! from spatial views only.

pub mod fetch;
pub mod normalize;
pub mod parsing;
pub mod submit;

pub use fetch::FeedClient;

/// Errors that can occur while talking to the feed endpoints.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint answered with a non-success status.
    #[error("HTTP status {status}")]
    Status {
        /// The status code returned by the endpoint.
        status: reqwest::StatusCode,
    },

    /// The endpoint answered with a body of an unexpected shape.
    #[error("unexpected feed payload: {message}")]
    UnexpectedPayload {
        /// Description of the shape mismatch.
        message: String,
    },

    /// A fetch is already in flight; this one was not started.
    #[error("a feed fetch is already in progress")]
    Busy,

    /// A submission was rejected before leaving the client.
    #[error("invalid report: {message}")]
    InvalidReport {
        /// Description of what is wrong with the report.
        message: String,
    },
}

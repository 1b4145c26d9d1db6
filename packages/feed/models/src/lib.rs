#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Positional schema and configuration for the incident feed.
//!
//! The feed endpoint returns a JSON array of rows, each an array of 31
//! loosely-typed fields addressed by position. That position-to-meaning
//! mapping is an external contract with the spreadsheet backend: it lives
//! here, in exactly one place, and every normalization call site reads
//! through it. Changing an index means versioning the feed.

use std::time::Duration;

use incident_map_incident_models::GeoBounds;
use serde::{Deserialize, Serialize};

/// One raw feed row: 31 positional fields of mixed type (string, number,
/// or empty). Short rows are tolerated — missing positions read as absent.
pub type RawRow = Vec<serde_json::Value>;

/// Semantic name for each positional field of a feed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedColumn {
    /// Municipality name.
    Municipality,
    /// Incident date, optionally followed by a time component.
    OccurredAt,
    /// Reporting agency.
    Agency,
    /// Free-text agency when "other" was selected.
    OtherAgency,
    /// Reporter e-mail address.
    ReporterEmail,
    /// Kind of news source.
    NewsSourceType,
    /// Link to press coverage.
    NewsLink,
    /// Incident type.
    IncidentType,
    /// Reported cause.
    Cause,
    /// First involved-party role slot.
    UserOne,
    /// Second involved-party role slot.
    UserTwo,
    /// Transport type.
    TransportType,
    /// Whether the vehicle is concessioned.
    Concessioned,
    /// Economic number of the unit.
    EconomicNumber,
    /// Concession identifier.
    ConcessionId,
    /// Transport modality.
    Modality,
    /// License plate.
    Plate,
    /// Vehicle brand.
    Brand,
    /// Vehicle type.
    VehicleType,
    /// Engine number.
    Engine,
    /// Serial number.
    Serial,
    /// Vehicle model.
    Model,
    /// Total people involved.
    TotalUsers,
    /// Total fatalities.
    TotalFatalities,
    /// Classification of the fatalities.
    FatalityClassification,
    /// Road type.
    RoadType,
    /// Street address.
    Address,
    /// Coordinates as `"lat, lng"` or `"lat lng"`.
    Coordinates,
    /// Case status.
    Status,
    /// Follow-up notes.
    FollowUp,
    /// Free-text description.
    Description,
}

impl FeedColumn {
    /// Number of positional fields in a well-formed feed row.
    pub const COUNT: usize = 31;

    /// The position of this field within a raw row.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Municipality => 0,
            Self::OccurredAt => 1,
            Self::Agency => 2,
            Self::OtherAgency => 3,
            Self::ReporterEmail => 4,
            Self::NewsSourceType => 5,
            Self::NewsLink => 6,
            Self::IncidentType => 7,
            Self::Cause => 8,
            Self::UserOne => 9,
            Self::UserTwo => 10,
            Self::TransportType => 11,
            Self::Concessioned => 12,
            Self::EconomicNumber => 13,
            Self::ConcessionId => 14,
            Self::Modality => 15,
            Self::Plate => 16,
            Self::Brand => 17,
            Self::VehicleType => 18,
            Self::Engine => 19,
            Self::Serial => 20,
            Self::Model => 21,
            Self::TotalUsers => 22,
            Self::TotalFatalities => 23,
            Self::FatalityClassification => 24,
            Self::RoadType => 25,
            Self::Address => 26,
            Self::Coordinates => 27,
            Self::Status => 28,
            Self::FollowUp => 29,
            Self::Description => 30,
        }
    }

    /// Reads this field from a row, if present.
    #[must_use]
    pub fn cell(self, row: &RawRow) -> Option<&serde_json::Value> {
        row.get(self.index())
    }
}

/// Configuration for the feed client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    /// Endpoint returning the full incident table as a JSON array of rows.
    pub endpoint: String,
    /// Endpoint accepting new incident submissions.
    pub submit_endpoint: String,
    /// Bounding box applied to coordinate validation.
    pub bounds: GeoBounds,
    /// How often the background refresh re-fetches the feed.
    pub refresh_interval: Duration,
    /// Fixed delay before retrying a failed fetch. No backoff growth and no
    /// attempt limit — acceptable for a low-traffic dashboard.
    pub retry_delay: Duration,
}

impl FeedConfig {
    /// Production Apps Script endpoint for reading the incident table.
    pub const DEFAULT_ENDPOINT: &'static str =
        "https://script.google.com/macros/s/AKfycbzLTG8Zo1ayJMapz6rHXK0mUrnLhs6Ar0uk_06DBqhxww0fySCUgZa_u0yubKCbV1deJA/exec";

    /// Production Apps Script endpoint for submitting new reports.
    pub const DEFAULT_SUBMIT_ENDPOINT: &'static str =
        "https://script.google.com/macros/s/AKfycbyMXD3ZSFCE_GrZ0ahuT3b2w9zKJysAAsHdyJn-l1NvF4wOn6p43B6mVaOqg5V5oahFrQ/exec";
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            submit_endpoint: Self::DEFAULT_SUBMIT_ENDPOINT.to_string(),
            bounds: GeoBounds::CHIAPAS,
            refresh_interval: Duration::from_secs(5 * 60),
            retry_delay: Duration::from_secs(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_indices_match_the_feed_contract() {
        assert_eq!(FeedColumn::Municipality.index(), 0);
        assert_eq!(FeedColumn::OccurredAt.index(), 1);
        assert_eq!(FeedColumn::NewsLink.index(), 6);
        assert_eq!(FeedColumn::IncidentType.index(), 7);
        assert_eq!(FeedColumn::Cause.index(), 8);
        assert_eq!(FeedColumn::TotalUsers.index(), 22);
        assert_eq!(FeedColumn::TotalFatalities.index(), 23);
        assert_eq!(FeedColumn::RoadType.index(), 25);
        assert_eq!(FeedColumn::Coordinates.index(), 27);
        assert_eq!(FeedColumn::Description.index(), 30);
    }

    #[test]
    fn cell_tolerates_short_rows() {
        let row: RawRow = vec![serde_json::json!("Tuxtla Gutiérrez")];
        assert_eq!(
            FeedColumn::Municipality.cell(&row),
            Some(&serde_json::json!("Tuxtla Gutiérrez"))
        );
        assert_eq!(FeedColumn::Coordinates.cell(&row), None);
    }

    #[test]
    fn default_config_uses_canonical_constants() {
        let config = FeedConfig::default();
        assert_eq!(config.bounds, GeoBounds::CHIAPAS);
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
        assert_eq!(config.retry_delay, Duration::from_secs(3));
    }
}

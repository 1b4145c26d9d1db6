#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical road-incident model shared across the entire incident-map system.
//!
//! The feed normalizer produces [`Incident`] records that every downstream
//! consumer (filtering, clustering, analytics, exports, API) reads. This crate
//! also defines the geographic bounding box used for coordinate validation,
//! the danger-zone severity tiers, the fixed road-user role vocabulary, and
//! the period-key derivation used for time-series bucketing.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Literal defaults substituted for absent or empty feed fields.
///
/// These are the values the dashboard displays, so they stay in the feed's
/// own language rather than being translated.
pub mod defaults {
    /// Municipality when field 0 is absent.
    pub const UNKNOWN_MUNICIPALITY: &str = "Desconocido";
    /// Incident type when field 7 is absent.
    pub const UNSPECIFIED_TYPE: &str = "No especificado";
    /// Cause when field 8 is absent.
    pub const UNSPECIFIED_CAUSE: &str = "No especificada";
    /// Road type when field 25 is absent.
    pub const UNSPECIFIED_ROAD_TYPE: &str = "No especificada";
    /// Fatality classification when field 24 is absent.
    pub const UNSPECIFIED_CLASSIFICATION: &str = "No especificada";
    /// Description when field 30 is absent.
    pub const NO_DESCRIPTION: &str = "Sin descripción";
}

/// A validated WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Rectangular geographic bounding box used to validate feed coordinates.
///
/// The historical frontends carried three slightly different boxes for the
/// same region; [`GeoBounds::CHIAPAS`] is the canonical one (the widest),
/// and the narrower variants are treated as drift, not intentional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBounds {
    /// Southern limit in degrees latitude.
    pub lat_min: f64,
    /// Northern limit in degrees latitude.
    pub lat_max: f64,
    /// Western limit in degrees longitude.
    pub lng_min: f64,
    /// Eastern limit in degrees longitude.
    pub lng_max: f64,
}

impl GeoBounds {
    /// Chiapas plus a safety margin into neighboring states.
    pub const CHIAPAS: Self = Self {
        lat_min: 14.0,
        lat_max: 18.0,
        lng_min: -95.0,
        lng_max: -90.0,
    };

    /// Returns `true` if the point lies inside the box (limits inclusive).
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lng >= self.lng_min && lng <= self.lng_max
    }
}

/// Severity tier assigned to a danger zone from its size and fatality count.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum SeverityTier {
    /// Score below 5.
    Baja,
    /// Score 5-9.
    Media,
    /// Score 10-19.
    Alta,
    /// Score 20 or more.
    #[serde(rename = "Crítica")]
    #[strum(serialize = "Crítica")]
    Critica,
}

impl SeverityTier {
    /// Derives the tier from a danger-zone severity score
    /// (`member count + 3 × total fatalities`).
    #[must_use]
    pub const fn from_score(score: u32) -> Self {
        match score {
            20.. => Self::Critica,
            10..=19 => Self::Alta,
            5..=9 => Self::Media,
            _ => Self::Baja,
        }
    }
}

/// The fixed road-user role vocabulary for the two involved-party slots.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RoadUserRole {
    /// Car driver.
    Automovilista,
    /// Motorcyclist.
    Motociclista,
    /// Public transit driver.
    #[serde(rename = "Chofer de transporte público")]
    #[strum(serialize = "Chofer de transporte público")]
    ChoferTransportePublico,
    /// Heavy vehicle driver.
    #[serde(rename = "Chofer de vehículo pesado")]
    #[strum(serialize = "Chofer de vehículo pesado")]
    ChoferVehiculoPesado,
    /// Cyclist.
    Ciclista,
    /// Pedestrian.
    #[serde(rename = "Peatón")]
    #[strum(serialize = "Peatón")]
    Peaton,
    /// Any non-empty value that matches no other role.
    Otro,
}

impl RoadUserRole {
    /// Returns all variants in vocabulary order.
    ///
    /// Matching order matters: [`Self::matches`] takes the first hit, so
    /// broader labels must not precede narrower ones.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Automovilista,
            Self::Motociclista,
            Self::ChoferTransportePublico,
            Self::ChoferVehiculoPesado,
            Self::Ciclista,
            Self::Peaton,
            Self::Otro,
        ]
    }

    /// Matches a raw involved-party value against the vocabulary.
    ///
    /// Returns `None` for empty, `"N/A"`, and `"no aplica"` slots. A
    /// non-empty value that matches no label (case-insensitive substring in
    /// either direction) falls into [`Self::Otro`].
    #[must_use]
    pub fn matches(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "N/A" {
            return None;
        }
        let lowered = trimmed.to_lowercase();
        if lowered == "no aplica" {
            return None;
        }
        for role in Self::all() {
            if *role == Self::Otro {
                continue;
            }
            let label = role.as_ref().to_lowercase();
            if lowered.contains(&label) || label.contains(&lowered) {
                return Some(*role);
            }
        }
        Some(Self::Otro)
    }
}

/// Granularity for period bucketing and period filters.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PeriodGranularity {
    /// One bucket per calendar month.
    Monthly,
    /// One bucket per calendar quarter.
    Quarterly,
    /// One bucket per calendar year.
    Annual,
}

/// Derives the period bucket key for a date at the given granularity.
///
/// Monthly keys look like `"2024-03"`, quarterly like `"2024-T1"`, annual
/// like `"2024"`. Zero-padding makes keys of the same granularity sort
/// lexicographically in chronological order.
#[must_use]
pub fn period_key(date: NaiveDate, granularity: PeriodGranularity) -> String {
    match granularity {
        PeriodGranularity::Monthly => format!("{}-{:02}", date.year(), date.month()),
        PeriodGranularity::Quarterly => {
            format!("{}-T{}", date.year(), (date.month0() / 3) + 1)
        }
        PeriodGranularity::Annual => date.year().to_string(),
    }
}

/// One normalized road-incident record.
///
/// Produced once per feed row by the normalizer and immutable afterwards.
/// Every field carries a documented default, so normalization is total — a
/// record without valid coordinates still participates in non-spatial
/// aggregates and is only excluded from map and clustering views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Municipality where the incident occurred.
    pub municipality: String,
    /// Calendar date of the incident. `None` when the feed value is missing
    /// or unparsable.
    pub occurred_at: Option<NaiveDate>,
    /// Incident type (e.g. "Choque", "Volcadura").
    pub incident_type: String,
    /// Reported cause.
    pub cause: String,
    /// Road type (e.g. "Carretera federal").
    pub road_type: String,
    /// The two raw involved-party slots, kept verbatim; interpreted lazily
    /// against [`RoadUserRole`].
    pub involved_users: [Option<String>; 2],
    /// Total people involved.
    pub total_users: u32,
    /// Total fatalities.
    pub total_fatalities: u32,
    /// Classification of the fatalities (e.g. "Conductor", "Peatón").
    pub fatality_classification: String,
    /// Validated coordinates, when field 27 parsed and fell inside the
    /// configured [`GeoBounds`].
    pub coordinates: Option<Coordinates>,
    /// Link to press coverage, when present.
    pub news_link: Option<String>,
    /// Free-text description.
    pub description: String,
}

impl Incident {
    /// Returns `true` when the incident can appear on map-based views.
    #[must_use]
    pub const fn has_coordinates(&self) -> bool {
        self.coordinates.is_some()
    }

    /// Period bucket key for this incident, or `None` when the date did not
    /// parse.
    #[must_use]
    pub fn period_key(&self, granularity: PeriodGranularity) -> Option<String> {
        self.occurred_at.map(|date| period_key(date, granularity))
    }

    /// Iterates the matched road-user roles of both involved-party slots.
    ///
    /// Each slot is interpreted independently; empty and "no aplica" slots
    /// yield nothing.
    pub fn involved_roles(&self) -> impl Iterator<Item = RoadUserRole> + '_ {
        self.involved_users
            .iter()
            .flatten()
            .filter_map(|raw| RoadUserRole::matches(raw))
    }
}

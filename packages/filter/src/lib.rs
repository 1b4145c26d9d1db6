#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter criteria and the pure incident filter.
//!
//! [`FilterCriteria`] is a plain value owned by whoever drives the UI — the
//! core never reads ambient state. Mutators implement the interaction rules
//! (toggle on re-select, cross-filter dimensions mutually exclusive) and
//! [`apply_filters`] evaluates the whole set in a single stable pass.

use incident_map_incident_models::{Incident, PeriodGranularity};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The chart dimension a cross-filter selects on.
///
/// At most one dimension may be active at a time; selecting a value on a new
/// dimension replaces whatever was active before.
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
pub enum CrossDimension {
    /// Filter on the incident type (clicked in the type chart).
    IncidentType,
    /// Filter on the cause (clicked in the cause chart).
    Cause,
    /// Filter on the road type (clicked in the road-type chart).
    RoadType,
}

/// A chart-click-driven filter: one dimension, one selected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossFilter {
    /// The dimension being filtered.
    pub dimension: CrossDimension,
    /// The selected value on that dimension.
    pub value: String,
}

/// A period filter: granularity plus one selected bucket key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodFilter {
    /// Bucket granularity.
    pub granularity: PeriodGranularity,
    /// Selected bucket key, e.g. `"2024-03"` or `"2024-T1"`.
    pub key: String,
}

/// The full set of active filter criteria.
///
/// All predicates compose with logical AND. An unset predicate matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Map-legend category selection, matched against the incident cause.
    /// `None` means "all".
    pub category: Option<String>,
    /// Municipality selection. `None` means all municipalities.
    pub municipality: Option<String>,
    /// Minimum fatality count. 0 disables the predicate.
    pub min_fatalities: u32,
    /// Period selection. Requires the incident's date to parse; incidents
    /// without a date are excluded while a period filter is active.
    pub period: Option<PeriodFilter>,
    /// The single active cross-filter, if any. Mutual exclusivity across
    /// dimensions is structural: there is only one slot.
    pub cross_filter: Option<CrossFilter>,
}

impl FilterCriteria {
    /// Criteria that match every incident.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns `true` when no predicate is active.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.municipality.is_none()
            && self.min_fatalities == 0
            && self.period.is_none()
            && self.cross_filter.is_none()
    }

    /// Selects a category, or clears it when the same value is already
    /// active (toggle semantics).
    pub fn toggle_category(&mut self, value: &str) {
        if self.category.as_deref() == Some(value) {
            self.category = None;
        } else {
            self.category = Some(value.to_string());
        }
    }

    /// Selects a cross-filter value, replacing any active cross-filter on
    /// another dimension. Re-selecting the active value clears it.
    pub fn toggle_cross_filter(&mut self, dimension: CrossDimension, value: &str) {
        let already_active = self
            .cross_filter
            .as_ref()
            .is_some_and(|cf| cf.dimension == dimension && cf.value == value);

        if already_active {
            self.cross_filter = None;
        } else {
            self.cross_filter = Some(CrossFilter {
                dimension,
                value: value.to_string(),
            });
        }
    }

    /// Selects a period bucket.
    pub fn select_period(&mut self, granularity: PeriodGranularity, key: &str) {
        self.period = Some(PeriodFilter {
            granularity,
            key: key.to_string(),
        });
    }

    /// Clears every active predicate.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Evaluates all active predicates against one incident.
    #[must_use]
    pub fn matches(&self, incident: &Incident) -> bool {
        if let Some(category) = &self.category
            && incident.cause != *category
        {
            return false;
        }

        if let Some(municipality) = &self.municipality
            && incident.municipality != *municipality
        {
            return false;
        }

        if self.min_fatalities > 0 && incident.total_fatalities < self.min_fatalities {
            return false;
        }

        if let Some(period) = &self.period {
            match incident.period_key(period.granularity) {
                Some(key) if key == period.key => {}
                _ => return false,
            }
        }

        if let Some(cross) = &self.cross_filter {
            let field = match cross.dimension {
                CrossDimension::IncidentType => &incident.incident_type,
                CrossDimension::Cause => &incident.cause,
                CrossDimension::RoadType => &incident.road_type,
            };
            if *field != cross.value {
                return false;
            }
        }

        true
    }
}

/// Filters an incident set against the given criteria.
///
/// Single pass, stable: output preserves the relative input order. Pure: the
/// same criteria applied twice to the same set yield identical results.
#[must_use]
pub fn apply_filters(incidents: &[Incident], criteria: &FilterCriteria) -> Vec<Incident> {
    incidents
        .iter()
        .filter(|incident| criteria.matches(incident))
        .cloned()
        .collect()
}

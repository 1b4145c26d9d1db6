#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the incident map server.
//!
//! These types are serialized to JSON for the REST API. Query parameters map
//! onto a per-request [`FilterCriteria`] value — the server holds no mutable
//! global filter state.

use incident_map_analytics::{
    CategoryCount, InvolvedTally, PeriodBucket, Summary, Trend, WeekdayCount,
};
use incident_map_filter::{CrossDimension, CrossFilter, FilterCriteria, PeriodFilter};
use incident_map_incident_models::{Coordinates, PeriodGranularity, SeverityTier};
use incident_map_spatial::{Cluster, RoadTypeShare};
use serde::{Deserialize, Serialize};

/// Health-check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is up.
    pub healthy: bool,
    /// Crate version.
    pub version: String,
    /// Incidents currently cached from the feed.
    pub cached_incidents: usize,
}

/// Query parameters shared by the read endpoints.
///
/// All filter fields are optional; omitted fields leave the corresponding
/// predicate inactive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentQueryParams {
    /// Map-legend category (matched against the incident cause).
    pub category: Option<String>,
    /// Municipality name.
    pub municipality: Option<String>,
    /// Minimum fatality count.
    pub min_fatalities: Option<u32>,
    /// Period granularity: `monthly`, `quarterly`, or `annual`. Only
    /// effective together with `periodKey`.
    pub period: Option<String>,
    /// Selected period bucket, e.g. `2024-03` or `2024-T1`.
    pub period_key: Option<String>,
    /// Cross-filter dimension: `incident_type`, `cause`, or `road_type`.
    /// Only effective together with `crossValue`.
    pub cross_dimension: Option<String>,
    /// Cross-filter value.
    pub cross_value: Option<String>,
    /// For the zones endpoint: return the diversified top list instead of
    /// the full ranking.
    pub diversified: Option<bool>,
    /// For the stats endpoint: granularity of the temporal distribution
    /// (defaults to monthly).
    pub distribution: Option<String>,
    /// For the stats endpoint: trailing window of the trend in months
    /// (defaults to 6).
    pub trend_months: Option<u32>,
}

impl IncidentQueryParams {
    /// Builds the filter criteria these parameters describe.
    ///
    /// Unrecognized granularity or dimension names leave the corresponding
    /// predicate inactive rather than failing the request.
    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        let period = match (&self.period, &self.period_key) {
            (Some(granularity), Some(key)) => granularity
                .parse::<PeriodGranularity>()
                .ok()
                .map(|granularity| PeriodFilter {
                    granularity,
                    key: key.clone(),
                }),
            _ => None,
        };

        let cross_filter = match (&self.cross_dimension, &self.cross_value) {
            (Some(dimension), Some(value)) => dimension
                .parse::<CrossDimension>()
                .ok()
                .map(|dimension| CrossFilter {
                    dimension,
                    value: value.clone(),
                }),
            _ => None,
        };

        FilterCriteria {
            category: self.category.clone(),
            municipality: self.municipality.clone(),
            min_fatalities: self.min_fatalities.unwrap_or(0),
            period,
            cross_filter,
        }
    }

    /// Granularity for the temporal distribution panel.
    #[must_use]
    pub fn distribution_granularity(&self) -> PeriodGranularity {
        self.distribution
            .as_deref()
            .and_then(|value| value.parse().ok())
            .unwrap_or(PeriodGranularity::Monthly)
    }
}

/// A danger zone as returned by the API: the cluster without its full
/// member list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZone {
    /// Seed coordinate of the zone.
    pub center: Coordinates,
    /// Number of incidents in the zone.
    pub incident_count: usize,
    /// Summed fatalities.
    pub total_fatalities: u32,
    /// Municipality of the seed incident.
    pub municipality: String,
    /// Dominant road type and its share.
    pub dominant_road_type: RoadTypeShare,
    /// Severity score.
    pub score: u32,
    /// Severity tier.
    pub severity: SeverityTier,
}

impl From<&Cluster> for ApiZone {
    fn from(cluster: &Cluster) -> Self {
        Self {
            center: cluster.center,
            incident_count: cluster.len(),
            total_fatalities: cluster.total_fatalities,
            municipality: cluster.municipality.clone(),
            dominant_road_type: cluster.dominant_road_type.clone(),
            score: cluster.score,
            severity: cluster.severity,
        }
    }
}

/// Everything the statistics view renders, computed in one pass over the
/// filtered incident set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStats {
    /// Headline numbers.
    pub summary: Summary,
    /// Incident counts by incident type.
    pub by_incident_type: Vec<CategoryCount>,
    /// Incident counts by cause.
    pub by_cause: Vec<CategoryCount>,
    /// Incident counts by road type.
    pub by_road_type: Vec<CategoryCount>,
    /// Top-10 municipalities by incident count.
    pub top_municipalities: Vec<CategoryCount>,
    /// Fatalities by classification.
    pub fatalities_by_classification: Vec<CategoryCount>,
    /// Involved-person tally by road-user role.
    pub involved: InvolvedTally,
    /// Weekday distribution, Sunday first.
    pub weekdays: Vec<WeekdayCount>,
    /// The weekday with the most incidents.
    pub most_dangerous_day: WeekdayCount,
    /// Temporal distribution at the requested granularity.
    pub distribution: Vec<PeriodBucket>,
    /// Month-over-month trend.
    pub trend: Trend,
    /// Danger zones, diversified for display.
    pub danger_zones: Vec<ApiZone>,
    /// Zones in the Crítica tier.
    pub critical_zones: usize,
    /// Zones in the Alta tier.
    pub high_zones: usize,
}

/// Photo-asset descriptor attached to a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPhoto {
    /// Public HTTPS URL of the stored asset.
    pub url: String,
    /// Asset-host public identifier.
    pub public_id: String,
    /// Original filename.
    pub filename: String,
    /// Size in bytes.
    pub bytes: u64,
    /// Image format.
    pub format: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// Request body for submitting a new incident report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// Municipality (required).
    pub municipality: String,
    /// Reporter e-mail (required).
    pub reporter_email: String,
    /// Incident date as entered (required).
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
    /// Override the endpoint's duplicate detection.
    #[serde(default)]
    pub force_insert: bool,
    /// Photo descriptors, at most 2.
    #[serde(default)]
    pub photos: Vec<ApiPhoto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_build_full_criteria() {
        let params = IncidentQueryParams {
            category: Some("Choque".to_string()),
            municipality: Some("Tapachula".to_string()),
            min_fatalities: Some(2),
            period: Some("quarterly".to_string()),
            period_key: Some("2024-T1".to_string()),
            cross_dimension: Some("road_type".to_string()),
            cross_value: Some("Avenida".to_string()),
            ..IncidentQueryParams::default()
        };

        let criteria = params.criteria();
        assert_eq!(criteria.category.as_deref(), Some("Choque"));
        assert_eq!(criteria.municipality.as_deref(), Some("Tapachula"));
        assert_eq!(criteria.min_fatalities, 2);

        let period = criteria.period.unwrap();
        assert_eq!(period.granularity, PeriodGranularity::Quarterly);
        assert_eq!(period.key, "2024-T1");

        let cross = criteria.cross_filter.unwrap();
        assert_eq!(cross.dimension, CrossDimension::RoadType);
        assert_eq!(cross.value, "Avenida");
    }

    #[test]
    fn incomplete_period_params_leave_predicate_inactive() {
        let params = IncidentQueryParams {
            period: Some("monthly".to_string()),
            ..IncidentQueryParams::default()
        };
        assert!(params.criteria().period.is_none());

        let params = IncidentQueryParams {
            period: Some("cada_luna_llena".to_string()),
            period_key: Some("2024-03".to_string()),
            ..IncidentQueryParams::default()
        };
        assert!(params.criteria().period.is_none());
    }

    #[test]
    fn empty_params_build_empty_criteria() {
        let criteria = IncidentQueryParams::default().criteria();
        assert!(criteria.is_empty());
    }

    #[test]
    fn distribution_granularity_defaults_to_monthly() {
        assert_eq!(
            IncidentQueryParams::default().distribution_granularity(),
            PeriodGranularity::Monthly
        );

        let params = IncidentQueryParams {
            distribution: Some("annual".to_string()),
            ..IncidentQueryParams::default()
        };
        assert_eq!(params.distribution_granularity(), PeriodGranularity::Annual);
    }
}

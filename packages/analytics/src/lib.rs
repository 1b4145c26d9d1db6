#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chart-ready aggregations over an incident set.
//!
//! Every function here is a pure reducer over the slice it is given —
//! filtering happens upstream, so the map view, the statistics view, and the
//! exports all aggregate the exact same records. Incidents without valid
//! coordinates participate in every aggregate here; only the spatial views
//! exclude them.

pub mod aggregate;
pub mod temporal;

pub use aggregate::{
    CategoryCount, CauseCrossTab, CrossTabSeries, InvolvedTally, LethalityEntry, RoleCount,
    Summary, count_by, count_by_cause, count_by_incident_type, count_by_municipality,
    count_by_road_type, fatalities_by_classification, fatality_rate, involved_tally,
    lethality_by_municipality, lethality_by_road_type, municipality_cause_crosstab,
    road_type_cause_crosstab, summarize,
};
pub use temporal::{
    PeriodBucket, SPANISH_DAYS, Trend, TrendClass, WeekdayCount, group_by_period, monthly_trend,
    most_dangerous_day, weekday_cause_crosstab, weekday_distribution,
};

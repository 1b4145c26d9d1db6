//! Temporal reducers: weekday distribution, period bucketing, trend.

use chrono::{Datelike, NaiveDate};
use incident_map_incident_models::{Incident, PeriodGranularity};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::aggregate::{CauseCrossTab, cause_crosstab};

/// Day names in feed order: index 0 is Sunday.
pub const SPANISH_DAYS: [&str; 7] = [
    "Domingo",
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
];

/// One weekday with its incident count and share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayCount {
    /// Day name, Sunday first.
    pub day: String,
    /// Incidents on that day.
    pub count: u64,
    /// Share of all dated incidents, in percent.
    pub share_pct: f64,
}

/// Distribution of incidents across the days of the week.
///
/// Always returns seven entries in Sunday-first order. Incidents without a
/// parsed date are excluded from both counts and shares.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn weekday_distribution(incidents: &[Incident]) -> Vec<WeekdayCount> {
    let mut counts = [0_u64; 7];
    for incident in incidents {
        if let Some(date) = incident.occurred_at {
            counts[date.weekday().num_days_from_sunday() as usize] += 1;
        }
    }

    let total: u64 = counts.iter().sum();
    SPANISH_DAYS
        .iter()
        .zip(counts)
        .map(|(day, count)| WeekdayCount {
            day: (*day).to_string(),
            count,
            share_pct: if total == 0 {
                0.0
            } else {
                (count as f64 / total as f64) * 100.0
            },
        })
        .collect()
}

/// The weekday with the most incidents. Earlier days win ties.
#[must_use]
pub fn most_dangerous_day(incidents: &[Incident]) -> WeekdayCount {
    let distribution = weekday_distribution(incidents);
    distribution
        .into_iter()
        .reduce(|max, day| if day.count > max.count { day } else { max })
        .unwrap_or(WeekdayCount {
            day: SPANISH_DAYS[0].to_string(),
            count: 0,
            share_pct: 0.0,
        })
}

/// Per-period totals for the temporal distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBucket {
    /// Period bucket key, e.g. `"2024-03"`.
    pub key: String,
    /// Incidents in the bucket.
    pub incidents: u64,
    /// Summed fatalities in the bucket.
    pub fatalities: u64,
    /// Involved people in the bucket (per the role-slot rules).
    pub involved: u64,
}

/// Groups incidents into period buckets, sorted chronologically.
///
/// Incidents without a parsed date fall into no bucket.
#[must_use]
pub fn group_by_period(incidents: &[Incident], granularity: PeriodGranularity) -> Vec<PeriodBucket> {
    let mut buckets: Vec<PeriodBucket> = Vec::new();

    for incident in incidents {
        let Some(key) = incident.period_key(granularity) else {
            continue;
        };
        let involved = incident.involved_roles().count() as u64;

        match buckets.iter_mut().find(|b| b.key == key) {
            Some(bucket) => {
                bucket.incidents += 1;
                bucket.fatalities += u64::from(incident.total_fatalities);
                bucket.involved += involved;
            }
            None => buckets.push(PeriodBucket {
                key,
                incidents: 1,
                fatalities: u64::from(incident.total_fatalities),
                involved,
            }),
        }
    }

    buckets.sort_by(|a, b| a.key.cmp(&b.key));
    buckets
}

/// Month-over-month trend classification.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TrendClass {
    /// Last bucket exceeds the first by more than 20 %.
    Creciente,
    /// Last bucket falls short of the first by more than 20 %.
    Decreciente,
    /// Change within ±20 % of the first bucket.
    Estable,
    /// Fewer than two monthly buckets in the window.
    Insuficiente,
}

/// Trend over a trailing monthly window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    /// Classification of the first-versus-last bucket comparison.
    pub classification: TrendClass,
    /// Percent change from the first to the last bucket; 0 when the first
    /// bucket is empty or the data is insufficient.
    pub change_pct: f64,
    /// Monthly buckets inside the window, chronological.
    pub buckets: Vec<PeriodBucket>,
}

/// Classifies the incident trend over the `window_months` before
/// `reference`.
///
/// The window starts at the first day of the month `window_months` before
/// the reference date. The reference is explicit so the computation stays
/// pure.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn monthly_trend(incidents: &[Incident], window_months: u32, reference: NaiveDate) -> Trend {
    let cutoff = month_start_before(reference, window_months);

    let recent: Vec<Incident> = incidents
        .iter()
        .filter(|i| i.occurred_at.is_some_and(|date| date >= cutoff))
        .cloned()
        .collect();

    let buckets = group_by_period(&recent, PeriodGranularity::Monthly);
    if buckets.len() < 2 {
        return Trend {
            classification: TrendClass::Insuficiente,
            change_pct: 0.0,
            buckets,
        };
    }

    let first = buckets[0].incidents as f64;
    let last = buckets[buckets.len() - 1].incidents as f64;
    let difference = last - first;

    let classification = if difference > first * 0.2 {
        TrendClass::Creciente
    } else if difference < -(first * 0.2) {
        TrendClass::Decreciente
    } else {
        TrendClass::Estable
    };

    Trend {
        classification,
        change_pct: if first > 0.0 {
            (difference / first) * 100.0
        } else {
            0.0
        },
        buckets,
    }
}

/// First day of the month `months` before `reference`.
fn month_start_before(reference: NaiveDate, months: u32) -> NaiveDate {
    #[allow(clippy::cast_possible_wrap)]
    let total = reference.year() * 12 + reference.month0() as i32 - months as i32;
    let year = total.div_euclid(12);
    #[allow(clippy::cast_sign_loss)]
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(reference)
}

/// Weekdays × top-5 causes.
#[must_use]
pub fn weekday_cause_crosstab(incidents: &[Incident]) -> CauseCrossTab {
    let rows: Vec<String> = SPANISH_DAYS.iter().map(|d| (*d).to_string()).collect();
    cause_crosstab(
        incidents,
        rows,
        |i| {
            i.occurred_at
                .map(|date| SPANISH_DAYS[date.weekday().num_days_from_sunday() as usize].to_string())
        },
        5,
    )
}

#[cfg(test)]
mod tests {
    use incident_map_incident_models::defaults;

    use super::*;

    fn incident_on(date: Option<NaiveDate>, fatalities: u32) -> Incident {
        Incident {
            municipality: "Tuxtla Gutiérrez".to_string(),
            occurred_at: date,
            incident_type: "Choque".to_string(),
            cause: "Exceso de velocidad".to_string(),
            road_type: "Avenida".to_string(),
            involved_users: [Some("Automovilista".to_string()), None],
            total_users: 1,
            total_fatalities: fatalities,
            fatality_classification: defaults::UNSPECIFIED_CLASSIFICATION.to_string(),
            coordinates: None,
            news_link: None,
            description: defaults::NO_DESCRIPTION.to_string(),
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn weekday_distribution_is_sunday_first() {
        // 2024-03-17 was a Sunday, 2024-03-18 a Monday.
        let incidents = vec![
            incident_on(Some(date(2024, 3, 17)), 0),
            incident_on(Some(date(2024, 3, 18)), 0),
            incident_on(Some(date(2024, 3, 25)), 0),
            incident_on(None, 0),
        ];

        let distribution = weekday_distribution(&incidents);
        assert_eq!(distribution.len(), 7);
        assert_eq!(distribution[0].day, "Domingo");
        assert_eq!(distribution[0].count, 1);
        assert_eq!(distribution[1].day, "Lunes");
        assert_eq!(distribution[1].count, 2);
        // Undated incident excluded from shares
        assert!((distribution[1].share_pct - (2.0 / 3.0) * 100.0).abs() < 1e-9);

        let top = most_dangerous_day(&incidents);
        assert_eq!(top.day, "Lunes");
    }

    #[test]
    fn period_buckets_sort_chronologically() {
        let incidents = vec![
            incident_on(Some(date(2024, 4, 2)), 1),
            incident_on(Some(date(2023, 12, 25)), 0),
            incident_on(Some(date(2024, 4, 9)), 0),
            incident_on(None, 5),
        ];

        let buckets = group_by_period(&incidents, PeriodGranularity::Monthly);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, "2023-12");
        assert_eq!(buckets[1].key, "2024-04");
        assert_eq!(buckets[1].incidents, 2);
        assert_eq!(buckets[1].fatalities, 1);
        assert_eq!(buckets[1].involved, 2);
    }

    #[test]
    fn quarterly_buckets() {
        let incidents = vec![
            incident_on(Some(date(2024, 1, 10)), 0),
            incident_on(Some(date(2024, 2, 10)), 0),
            incident_on(Some(date(2024, 10, 10)), 0),
        ];

        let buckets = group_by_period(&incidents, PeriodGranularity::Quarterly);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, "2024-T1");
        assert_eq!(buckets[0].incidents, 2);
        assert_eq!(buckets[1].key, "2024-T4");
    }

    #[test]
    fn trend_insufficient_with_single_bucket() {
        let incidents = vec![incident_on(Some(date(2024, 5, 2)), 0)];
        let trend = monthly_trend(&incidents, 6, date(2024, 6, 15));
        assert_eq!(trend.classification, TrendClass::Insuficiente);
        assert!((trend.change_pct - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trend_growing_when_last_exceeds_first_by_over_20_pct() {
        let mut incidents = vec![
            incident_on(Some(date(2024, 2, 5)), 0),
            incident_on(Some(date(2024, 2, 12)), 0),
        ];
        for day in 1..=5 {
            incidents.push(incident_on(Some(date(2024, 5, day)), 0));
        }

        let trend = monthly_trend(&incidents, 6, date(2024, 6, 15));
        assert_eq!(trend.classification, TrendClass::Creciente);
        assert!((trend.change_pct - 150.0).abs() < 1e-9);
    }

    #[test]
    fn trend_declining_and_stable() {
        let mut declining = Vec::new();
        for day in 1..=5 {
            declining.push(incident_on(Some(date(2024, 2, day)), 0));
        }
        declining.push(incident_on(Some(date(2024, 5, 3)), 0));

        let trend = monthly_trend(&declining, 6, date(2024, 6, 15));
        assert_eq!(trend.classification, TrendClass::Decreciente);

        let stable = vec![
            incident_on(Some(date(2024, 2, 5)), 0),
            incident_on(Some(date(2024, 5, 3)), 0),
        ];
        let trend = monthly_trend(&stable, 6, date(2024, 6, 15));
        assert_eq!(trend.classification, TrendClass::Estable);
    }

    #[test]
    fn trend_window_excludes_older_incidents() {
        let incidents = vec![
            // Outside a 6-month window ending 2024-06-15
            incident_on(Some(date(2023, 10, 1)), 0),
            incident_on(Some(date(2024, 3, 1)), 0),
            incident_on(Some(date(2024, 5, 1)), 0),
        ];

        let trend = monthly_trend(&incidents, 6, date(2024, 6, 15));
        assert_eq!(trend.buckets.len(), 2);
        assert_eq!(trend.buckets[0].key, "2024-03");
    }

    #[test]
    fn weekday_crosstab_uses_fixed_rows() {
        let incidents = vec![
            incident_on(Some(date(2024, 3, 17)), 0),
            incident_on(Some(date(2024, 3, 18)), 0),
        ];

        let tab = weekday_cause_crosstab(&incidents);
        assert_eq!(tab.rows.len(), 7);
        assert_eq!(tab.series.len(), 1);
        assert_eq!(tab.series[0].cause, "Exceso de velocidad");
        assert_eq!(tab.series[0].counts[0], 1);
        assert_eq!(tab.series[0].counts[1], 1);
    }
}

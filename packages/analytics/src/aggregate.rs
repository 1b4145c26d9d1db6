//! Categorical reducers: counts, tallies, lethality, cross-tabulations.

use incident_map_incident_models::{Incident, RoadUserRole};
use serde::{Deserialize, Serialize};

/// One key with its incident count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// The categorical value.
    pub key: String,
    /// How many incidents carry it.
    pub count: u64,
}

/// Counts incidents by an arbitrary key, sorted by count descending.
///
/// Ties break alphabetically so results are deterministic.
#[must_use]
pub fn count_by<F>(incidents: &[Incident], key_fn: F) -> Vec<CategoryCount>
where
    F: Fn(&Incident) -> &str,
{
    let mut counts: Vec<CategoryCount> = Vec::new();
    for incident in incidents {
        let key = key_fn(incident);
        match counts.iter_mut().find(|c| c.key == key) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                key: key.to_string(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    counts
}

/// Incident counts by incident type.
#[must_use]
pub fn count_by_incident_type(incidents: &[Incident]) -> Vec<CategoryCount> {
    count_by(incidents, |i| &i.incident_type)
}

/// Incident counts by cause.
#[must_use]
pub fn count_by_cause(incidents: &[Incident]) -> Vec<CategoryCount> {
    count_by(incidents, |i| &i.cause)
}

/// Incident counts by road type.
#[must_use]
pub fn count_by_road_type(incidents: &[Incident]) -> Vec<CategoryCount> {
    count_by(incidents, |i| &i.road_type)
}

/// Incident counts by municipality.
#[must_use]
pub fn count_by_municipality(incidents: &[Incident]) -> Vec<CategoryCount> {
    count_by(incidents, |i| &i.municipality)
}

/// Fatalities summed by fatality classification.
///
/// Rows with no fatalities and the literal `"No aplica"` classification are
/// skipped, mirroring the fatality-breakdown chart.
#[must_use]
pub fn fatalities_by_classification(incidents: &[Incident]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for incident in incidents {
        if incident.total_fatalities == 0 || incident.fatality_classification == "No aplica" {
            continue;
        }
        let key = incident.fatality_classification.as_str();
        match counts.iter_mut().find(|c| c.key == key) {
            Some(entry) => entry.count += u64::from(incident.total_fatalities),
            None => counts.push(CategoryCount {
                key: key.to_string(),
                count: u64::from(incident.total_fatalities),
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    counts
}

/// One road-user role with its person count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCount {
    /// The role.
    pub role: RoadUserRole,
    /// People counted for it across both slots.
    pub count: u64,
}

/// Involved-person tally across both role slots of every incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvolvedTally {
    /// Counts per role, in vocabulary order.
    pub by_role: Vec<RoleCount>,
    /// Total people counted.
    pub total: u64,
}

/// Tallies involved people by road-user role.
///
/// The two slots of each incident count independently; empty, `"N/A"`, and
/// `"no aplica"` slots are ignored, and an unmatched non-empty slot counts
/// toward [`RoadUserRole::Otro`].
#[must_use]
pub fn involved_tally(incidents: &[Incident]) -> InvolvedTally {
    let mut by_role: Vec<RoleCount> = RoadUserRole::all()
        .iter()
        .map(|role| RoleCount {
            role: *role,
            count: 0,
        })
        .collect();

    for incident in incidents {
        for role in incident.involved_roles() {
            if let Some(entry) = by_role.iter_mut().find(|c| c.role == role) {
                entry.count += 1;
            }
        }
    }

    let total = by_role.iter().map(|c| c.count).sum();
    InvolvedTally { by_role, total }
}

/// Fatality rate as a percentage: `fatalities / involved × 100`, 0 when
/// nobody was involved.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fatality_rate(fatalities: u64, involved: u64) -> f64 {
    if involved == 0 {
        0.0
    } else {
        (fatalities as f64 / involved as f64) * 100.0
    }
}

/// Headline numbers for the summary panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Incidents in the set.
    pub total_incidents: u64,
    /// Summed fatalities.
    pub total_fatalities: u64,
    /// Summed involved people (per the role tally).
    pub total_involved: u64,
    /// Fatality rate percentage.
    pub fatality_rate_pct: f64,
    /// Mean involved people per incident.
    pub avg_involved_per_incident: f64,
}

/// Computes the summary panel numbers.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(incidents: &[Incident]) -> Summary {
    let total_incidents = incidents.len() as u64;
    let total_fatalities: u64 = incidents
        .iter()
        .map(|i| u64::from(i.total_fatalities))
        .sum();
    let total_involved = involved_tally(incidents).total;

    Summary {
        total_incidents,
        total_fatalities,
        total_involved,
        fatality_rate_pct: fatality_rate(total_fatalities, total_involved),
        avg_involved_per_incident: if total_incidents == 0 {
            0.0
        } else {
            total_involved as f64 / total_incidents as f64
        },
    }
}

/// One key ranked by fatalities per incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LethalityEntry {
    /// The categorical value.
    pub key: String,
    /// Incidents carrying it.
    pub incidents: u64,
    /// Fatalities across those incidents.
    pub fatalities: u64,
    /// Fatalities per incident.
    pub rate: f64,
}

fn lethality_by<F>(incidents: &[Incident], key_fn: F) -> Vec<LethalityEntry>
where
    F: Fn(&Incident) -> &str,
{
    let mut entries: Vec<LethalityEntry> = Vec::new();
    for incident in incidents {
        let key = key_fn(incident);
        match entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.incidents += 1;
                entry.fatalities += u64::from(incident.total_fatalities);
            }
            None => entries.push(LethalityEntry {
                key: key.to_string(),
                incidents: 1,
                fatalities: u64::from(incident.total_fatalities),
                rate: 0.0,
            }),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    for entry in &mut entries {
        entry.rate = if entry.incidents == 0 {
            0.0
        } else {
            entry.fatalities as f64 / entry.incidents as f64
        };
    }

    entries.sort_by(|a, b| {
        b.rate
            .partial_cmp(&a.rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    entries
}

/// Municipalities ranked by fatalities per incident.
#[must_use]
pub fn lethality_by_municipality(incidents: &[Incident]) -> Vec<LethalityEntry> {
    lethality_by(incidents, |i| &i.municipality)
}

/// Road types ranked by fatalities per incident.
#[must_use]
pub fn lethality_by_road_type(incidents: &[Incident]) -> Vec<LethalityEntry> {
    lethality_by(incidents, |i| &i.road_type)
}

/// One cause series across the rows of a cross-tabulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossTabSeries {
    /// The cause this series counts.
    pub cause: String,
    /// One count per row, aligned with [`CauseCrossTab::rows`].
    pub counts: Vec<u64>,
}

/// Incident counts broken down by some row dimension and the most common
/// causes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CauseCrossTab {
    /// Row labels.
    pub rows: Vec<String>,
    /// One series per cause, capped at the most common causes.
    pub series: Vec<CrossTabSeries>,
}

/// Builds a rows × causes cross-tabulation.
///
/// Causes keep their first-seen order and are capped at `max_causes`.
/// Incidents whose row key is `None` or not in `rows` are skipped.
#[must_use]
pub fn cause_crosstab<F>(
    incidents: &[Incident],
    rows: Vec<String>,
    row_fn: F,
    max_causes: usize,
) -> CauseCrossTab
where
    F: Fn(&Incident) -> Option<String>,
{
    let mut causes: Vec<String> = Vec::new();
    for incident in incidents {
        if !causes.contains(&incident.cause) {
            causes.push(incident.cause.clone());
        }
    }
    causes.truncate(max_causes);

    let mut series: Vec<CrossTabSeries> = causes
        .iter()
        .map(|cause| CrossTabSeries {
            cause: cause.clone(),
            counts: vec![0; rows.len()],
        })
        .collect();

    for incident in incidents {
        let Some(row_key) = row_fn(incident) else {
            continue;
        };
        let Some(row_idx) = rows.iter().position(|r| *r == row_key) else {
            continue;
        };
        if let Some(serie) = series.iter_mut().find(|s| s.cause == incident.cause) {
            serie.counts[row_idx] += 1;
        }
    }

    CauseCrossTab { rows, series }
}

/// Top-10 municipalities × top-5 causes.
#[must_use]
pub fn municipality_cause_crosstab(incidents: &[Incident]) -> CauseCrossTab {
    let rows: Vec<String> = count_by_municipality(incidents)
        .into_iter()
        .take(10)
        .map(|c| c.key)
        .collect();
    cause_crosstab(incidents, rows, |i| Some(i.municipality.clone()), 5)
}

/// Road types × top-5 causes.
#[must_use]
pub fn road_type_cause_crosstab(incidents: &[Incident]) -> CauseCrossTab {
    let mut rows: Vec<String> = Vec::new();
    for incident in incidents {
        if !rows.contains(&incident.road_type) {
            rows.push(incident.road_type.clone());
        }
    }
    cause_crosstab(incidents, rows, |i| Some(i.road_type.clone()), 5)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use incident_map_incident_models::defaults;

    use super::*;

    fn incident(cause: &str, municipality: &str, fatalities: u32) -> Incident {
        Incident {
            municipality: municipality.to_string(),
            occurred_at: NaiveDate::from_ymd_opt(2024, 3, 15),
            incident_type: "Choque".to_string(),
            cause: cause.to_string(),
            road_type: "Avenida".to_string(),
            involved_users: [Some("Automovilista".to_string()), None],
            total_users: 1,
            total_fatalities: fatalities,
            fatality_classification: if fatalities > 0 {
                "Conductor".to_string()
            } else {
                "No aplica".to_string()
            },
            coordinates: None,
            news_link: None,
            description: defaults::NO_DESCRIPTION.to_string(),
        }
    }

    #[test]
    fn count_by_sorts_descending_then_alphabetically() {
        let incidents = vec![
            incident("Volcadura", "Tuxtla Gutiérrez", 0),
            incident("Choque", "Tuxtla Gutiérrez", 0),
            incident("Choque", "Tapachula", 0),
            incident("Atropello", "Comitán", 0),
        ];

        let counts = count_by_cause(&incidents);
        assert_eq!(counts[0].key, "Choque");
        assert_eq!(counts[0].count, 2);
        // Tie between Atropello and Volcadura resolves alphabetically
        assert_eq!(counts[1].key, "Atropello");
        assert_eq!(counts[2].key, "Volcadura");
    }

    #[test]
    fn involved_tally_counts_both_slots() {
        let mut two_users = incident("Choque", "Tuxtla Gutiérrez", 0);
        two_users.involved_users = [
            Some("Automovilista".to_string()),
            Some("Peatón".to_string()),
        ];
        let mut one_skipped = incident("Choque", "Tuxtla Gutiérrez", 0);
        one_skipped.involved_users = [Some("no aplica".to_string()), Some("Taxista".to_string())];

        let tally = involved_tally(&[two_users, one_skipped]);
        assert_eq!(tally.total, 3);

        let count_for = |role: RoadUserRole| {
            tally
                .by_role
                .iter()
                .find(|c| c.role == role)
                .map_or(0, |c| c.count)
        };
        assert_eq!(count_for(RoadUserRole::Automovilista), 1);
        assert_eq!(count_for(RoadUserRole::Peaton), 1);
        assert_eq!(count_for(RoadUserRole::Otro), 1);
    }

    #[test]
    fn fatality_rate_handles_zero_denominator() {
        assert!((fatality_rate(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((fatality_rate(3, 0) - 0.0).abs() < f64::EPSILON);
        assert!((fatality_rate(1, 4) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summarize_headline_numbers() {
        let incidents = vec![
            incident("Choque", "Tuxtla Gutiérrez", 1),
            incident("Choque", "Tuxtla Gutiérrez", 0),
        ];

        let summary = summarize(&incidents);
        assert_eq!(summary.total_incidents, 2);
        assert_eq!(summary.total_fatalities, 1);
        assert_eq!(summary.total_involved, 2);
        assert!((summary.fatality_rate_pct - 50.0).abs() < f64::EPSILON);
        assert!((summary.avg_involved_per_incident - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn lethality_ranks_by_rate() {
        let incidents = vec![
            incident("Choque", "Tuxtla Gutiérrez", 0),
            incident("Choque", "Tuxtla Gutiérrez", 0),
            incident("Choque", "Ocozocoautla", 2),
        ];

        let ranking = lethality_by_municipality(&incidents);
        assert_eq!(ranking[0].key, "Ocozocoautla");
        assert!((ranking[0].rate - 2.0).abs() < f64::EPSILON);
        assert_eq!(ranking[1].key, "Tuxtla Gutiérrez");
        assert!((ranking[1].rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fatalities_by_classification_skips_no_aplica() {
        let incidents = vec![
            incident("Choque", "Tuxtla Gutiérrez", 2),
            incident("Choque", "Tuxtla Gutiérrez", 0),
            incident("Choque", "Tapachula", 1),
        ];

        let counts = fatalities_by_classification(&incidents);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].key, "Conductor");
        assert_eq!(counts[0].count, 3);
    }

    #[test]
    fn crosstab_caps_causes_and_aligns_counts() {
        let incidents = vec![
            incident("Choque", "Tuxtla Gutiérrez", 0),
            incident("Choque", "Tapachula", 0),
            incident("Volcadura", "Tuxtla Gutiérrez", 0),
        ];

        let tab = municipality_cause_crosstab(&incidents);
        assert_eq!(tab.rows.len(), 2);
        assert_eq!(tab.series.len(), 2);

        let choque = tab.series.iter().find(|s| s.cause == "Choque").unwrap();
        let tuxtla_idx = tab
            .rows
            .iter()
            .position(|r| r == "Tuxtla Gutiérrez")
            .unwrap();
        assert_eq!(choque.counts[tuxtla_idx], 1);
        assert_eq!(choque.counts.iter().sum::<u64>(), 2);
    }
}

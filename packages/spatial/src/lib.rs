#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Danger-zone detection over the filtered incident set.
//!
//! Groups coordinate-valid incidents into proximity clusters with a greedy
//! single-pass sweep: each unvisited incident seeds a cluster centered on
//! its own coordinate (not a centroid) and absorbs every other unvisited
//! incident within the radius. The sweep is seed-order dependent — an
//! incident consumed as a member never seeds its own cluster, so a point can
//! miss a cluster it is geometrically near. Downstream consumers rely on
//! this exact grouping; do not replace it with transitive connected
//! components.
//!
//! Clusters are transient: recomputed from scratch on every filter change,
//! never persisted or updated incrementally.

use incident_map_incident_models::{Coordinates, Incident, SeverityTier};
use serde::{Deserialize, Serialize};

/// Cluster radius in kilometers.
pub const CLUSTER_RADIUS_KM: f64 = 0.5;

/// Minimum members for a group to count as a danger zone.
pub const MIN_CLUSTER_SIZE: usize = 3;

/// Mean Earth radius in kilometers, for the haversine formula.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Maximum zones kept per municipality when diversifying ranked results.
pub const MAX_ZONES_PER_MUNICIPALITY: usize = 2;

/// Maximum zones kept overall when diversifying ranked results.
pub const MAX_RANKED_ZONES: usize = 5;

/// The dominant road type within a cluster and its share of members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadTypeShare {
    /// Most frequent road type among the members.
    pub road_type: String,
    /// How many members carry it.
    pub count: usize,
    /// Its share of the member count, rounded to whole percent.
    pub share_pct: u32,
}

/// A proximity cluster of incidents judged to indicate a hazardous location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// The seed incident's coordinate.
    pub center: Coordinates,
    /// Member incidents, seed first, in input order.
    pub members: Vec<Incident>,
    /// Sum of member fatalities.
    pub total_fatalities: u32,
    /// The first member's municipality.
    pub municipality: String,
    /// Dominant road type among members.
    pub dominant_road_type: RoadTypeShare,
    /// Severity score: `member count + 3 × total fatalities`.
    pub score: u32,
    /// Tier derived from the score.
    pub severity: SeverityTier,
}

impl Cluster {
    /// Number of member incidents.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.members.len()
    }

    /// A finalized cluster is never empty; present for API symmetry.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Great-circle distance between two coordinates in kilometers (haversine).
#[must_use]
pub fn haversine_distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Detects danger zones among the given incidents.
///
/// Only incidents with valid coordinates participate. Groups smaller than
/// [`MIN_CLUSTER_SIZE`] are discarded; the survivors come back sorted by
/// member count, largest first.
#[must_use]
pub fn find_clusters(incidents: &[Incident]) -> Vec<Cluster> {
    find_clusters_within(incidents, CLUSTER_RADIUS_KM, MIN_CLUSTER_SIZE)
}

/// [`find_clusters`] with explicit radius and minimum size.
#[must_use]
pub fn find_clusters_within(
    incidents: &[Incident],
    radius_km: f64,
    min_size: usize,
) -> Vec<Cluster> {
    let mut visited = vec![false; incidents.len()];
    let mut clusters = Vec::new();

    for (i, seed) in incidents.iter().enumerate() {
        if visited[i] {
            continue;
        }
        let Some(center) = seed.coordinates else {
            continue;
        };

        let mut member_indices = vec![i];
        for (j, other) in incidents.iter().enumerate() {
            if j == i || visited[j] {
                continue;
            }
            let Some(other_coords) = other.coordinates else {
                continue;
            };
            if haversine_distance_km(center, other_coords) <= radius_km {
                member_indices.push(j);
                visited[j] = true;
            }
        }
        visited[i] = true;

        if member_indices.len() >= min_size {
            clusters.push(build_cluster(center, &member_indices, incidents));
        }
    }

    clusters.sort_by(|a, b| b.len().cmp(&a.len()));

    log::debug!(
        "Detected {} danger zones among {} incidents",
        clusters.len(),
        incidents.len()
    );
    clusters
}

fn build_cluster(center: Coordinates, member_indices: &[usize], incidents: &[Incident]) -> Cluster {
    let members: Vec<Incident> = member_indices
        .iter()
        .map(|&idx| incidents[idx].clone())
        .collect();

    let total_fatalities: u32 = members.iter().map(|m| m.total_fatalities).sum();
    #[allow(clippy::cast_possible_truncation)]
    let score = members.len() as u32 + 3 * total_fatalities;

    Cluster {
        center,
        municipality: members[0].municipality.clone(),
        dominant_road_type: dominant_road_type(&members),
        total_fatalities,
        score,
        severity: SeverityTier::from_score(score),
        members,
    }
}

/// Finds the most frequent road type among members with its percentage
/// share. Ties break toward the road type seen first in member order.
fn dominant_road_type(members: &[Incident]) -> RoadTypeShare {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for member in members {
        match counts
            .iter_mut()
            .find(|(name, _)| *name == member.road_type)
        {
            Some((_, count)) => *count += 1,
            None => counts.push((&member.road_type, 1)),
        }
    }

    let (road_type, count) = counts
        .iter()
        .max_by_key(|(_, count)| *count)
        .copied()
        .unwrap_or(("No especificada", 0));

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    let share_pct = if members.is_empty() {
        0
    } else {
        ((count as f64 / members.len() as f64) * 100.0).round() as u32
    };

    RoadTypeShare {
        road_type: road_type.to_string(),
        count,
        share_pct,
    }
}

/// Diversifies a ranked zone list for display: at most
/// [`MAX_ZONES_PER_MUNICIPALITY`] zones from any one municipality and
/// [`MAX_RANKED_ZONES`] overall, preserving rank order.
#[must_use]
pub fn diversify(clusters: &[Cluster]) -> Vec<Cluster> {
    let mut seen: Vec<(&str, usize)> = Vec::new();
    let mut picked = Vec::new();

    for cluster in clusters {
        if picked.len() >= MAX_RANKED_ZONES {
            break;
        }
        let municipality = cluster.municipality.as_str();
        let count = match seen.iter_mut().find(|(name, _)| *name == municipality) {
            Some(entry) => {
                entry.1 += 1;
                entry.1
            }
            None => {
                seen.push((municipality, 1));
                1
            }
        };
        if count <= MAX_ZONES_PER_MUNICIPALITY {
            picked.push(cluster.clone());
        }
    }

    picked
}

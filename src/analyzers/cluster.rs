//! Spatial clustering of stations for map display.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::analyzers::types::{ClusterAssignment, ClusterResult, GeoPoint, SnapshotRow};

/// Cluster count used when the caller asks for fewer than one.
pub const DEFAULT_CLUSTERS: usize = 10;

/// Partitions station coordinates into clusters.
pub trait SpatialClusterer {
    /// Assigns every row to a cluster and returns the cluster centers.
    ///
    /// `k == 0` falls back to [`DEFAULT_CLUSTERS`]; `k` is clamped to the number
    /// of distinct coordinates. Empty input yields an empty result.
    fn cluster(&self, rows: &[SnapshotRow], k: usize) -> ClusterResult;
}

/// Lloyd's k-means over (latitude, longitude) with k-means++ seeding.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub max_iterations: usize,
    /// Stop once no center moves by more than this (in degrees).
    pub tolerance: f64,
    seed: Option<u64>,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            tolerance: 1e-9,
            seed: None,
        }
    }
}

impl KMeans {
    /// A clusterer whose seeding is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

type Point = [f64; 2];

/// Squared Euclidean distance.
fn squared_dist(p1: &Point, p2: &Point) -> f64 {
    let dlat = p1[0] - p2[0];
    let dlon = p1[1] - p2[1];
    dlat * dlat + dlon * dlon
}

/// Index of the nearest center; the lowest index wins ties.
fn nearest(point: &Point, centers: &[Point]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centers.iter().enumerate() {
        let d = squared_dist(point, c);
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

fn distinct(points: &[Point]) -> Vec<Point> {
    let mut seen: Vec<Point> = Vec::new();
    for p in points {
        if !seen
            .iter()
            .any(|q| q[0].to_bits() == p[0].to_bits() && q[1].to_bits() == p[1].to_bits())
        {
            seen.push(*p);
        }
    }
    seen
}

/// k-means++: first center uniform, then proportional to squared distance to
/// the closest chosen center. Already chosen points have weight zero, so the
/// centers are distinct as long as `k <= candidates.len()`.
fn seed_centers(candidates: &[Point], k: usize, rng: &mut impl Rng) -> Vec<Point> {
    let mut centers = vec![candidates[rng.gen_range(0..candidates.len())]];

    while centers.len() < k {
        let weights: Vec<f64> = candidates
            .iter()
            .map(|p| squared_dist(p, &centers[nearest(p, &centers)]))
            .collect();
        let next = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(rng),
            // Every candidate already sits on a center.
            Err(_) => break,
        };
        centers.push(candidates[next]);
    }

    centers
}

impl SpatialClusterer for KMeans {
    fn cluster(&self, rows: &[SnapshotRow], k: usize) -> ClusterResult {
        if rows.is_empty() {
            return ClusterResult::default();
        }

        let points: Vec<Point> = rows.iter().map(|r| [r.latitude, r.longitude]).collect();
        let candidates = distinct(&points);
        let requested = if k < 1 { DEFAULT_CLUSTERS } else { k };
        let k = requested.min(candidates.len());

        let mut rng = self.rng();
        let mut centers = seed_centers(&candidates, k, &mut rng);
        let mut labels: Vec<usize> = points.iter().map(|p| nearest(p, &centers)).collect();

        let mut iterations = 0;
        while iterations < self.max_iterations {
            iterations += 1;

            let mut sums = vec![[0.0, 0.0]; centers.len()];
            let mut counts = vec![0usize; centers.len()];
            for (p, &label) in points.iter().zip(&labels) {
                sums[label][0] += p[0];
                sums[label][1] += p[1];
                counts[label] += 1;
            }

            let mut shift: f64 = 0.0;
            for (i, center) in centers.iter_mut().enumerate() {
                // An emptied cluster keeps its previous center.
                if counts[i] == 0 {
                    continue;
                }
                let n = counts[i] as f64;
                let moved = [sums[i][0] / n, sums[i][1] / n];
                shift = shift.max(squared_dist(center, &moved).sqrt());
                *center = moved;
            }

            let relabeled: Vec<usize> = points.iter().map(|p| nearest(p, &centers)).collect();
            let stable = relabeled == labels;
            labels = relabeled;
            if stable && shift <= self.tolerance {
                break;
            }
        }

        debug!(rows = rows.len(), clusters = centers.len(), iterations, "Stations clustered");

        ClusterResult {
            assignments: rows
                .iter()
                .zip(labels)
                .map(|(r, cluster)| ClusterAssignment {
                    station_id: r.station_id.clone(),
                    cluster,
                })
                .collect(),
            centers: centers
                .into_iter()
                .map(|c| GeoPoint {
                    latitude: c[0],
                    longitude: c[1],
                })
                .collect(),
        }
    }
}

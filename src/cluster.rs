use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Destination;

// ── Feature schema ──────────────────────────────────────────────────────────

/// Number of numeric features used for clustering.
pub const FEATURE_DIM: usize = 4;

/// Feature names corresponding to feature vector indices. The order is part
/// of the persisted model; changing it invalidates saved models.
pub const FEATURE_NAMES: [&str; FEATURE_DIM] =
    ["rating", "preference_score", "latitude", "longitude"];

/// Extract a destination's raw feature vector, rejecting non-finite values.
fn feature_vector(d: &Destination) -> Result<[f64; FEATURE_DIM], ClusterError> {
    let values = [d.rating, d.preference_score, d.latitude, d.longitude];
    for (j, v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(ClusterError::InvalidFeature {
                id: d.id,
                feature: FEATURE_NAMES[j],
            });
        }
    }
    Ok(values)
}

// ── Errors ──────────────────────────────────────────────────────────────────

/// Errors raised by training, assignment, and model load. All are fatal to
/// the operation; an invalid feature rejects the whole batch.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cannot form {k} clusters from {distinct} distinct destinations")]
    InsufficientData { distinct: usize, k: usize },
    #[error("destination {id} has a non-finite {feature} value")]
    InvalidFeature { id: u32, feature: &'static str },
    #[error("model feature schema [{found}] does not match [{expected}]")]
    SchemaMismatch { found: String, expected: String },
    #[error("model has {centroids} centroids but k = {k}")]
    CentroidMismatch { centroids: usize, k: usize },
    #[error("failed to read or write model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed model file: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Configuration ───────────────────────────────────────────────────────────

/// Configuration for offline model training.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of clusters. Fixed a priori, never learned.
    pub k: usize,
    /// Maximum Lloyd iterations before giving up on convergence.
    pub max_iter: usize,
    /// RNG seed for the k-means++ initialization. Identical data, k, and
    /// seed reproduce the exact same model.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iter: 100,
            seed: 42,
        }
    }
}

// ── Model ───────────────────────────────────────────────────────────────────

/// Per-feature z-score scaling parameters captured at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub means: [f64; FEATURE_DIM],
    pub stddevs: [f64; FEATURE_DIM],
}

impl FeatureScaler {
    /// Fit scaling parameters to a training set. Constant features get unit
    /// stddev to avoid near-zero division.
    fn fit(vectors: &[[f64; FEATURE_DIM]]) -> Self {
        let n = vectors.len() as f64;
        let mut means = [0.0f64; FEATURE_DIM];
        let mut stddevs = [0.0f64; FEATURE_DIM];

        for v in vectors {
            for (j, &x) in v.iter().enumerate() {
                means[j] += x;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        for v in vectors {
            for (j, &x) in v.iter().enumerate() {
                stddevs[j] += (x - means[j]).powi(2);
            }
        }
        for s in &mut stddevs {
            *s = (*s / n).sqrt();
            if *s < 1e-12 {
                *s = 1.0;
            }
        }

        Self { means, stddevs }
    }

    fn transform(&self, v: &[f64; FEATURE_DIM]) -> [f64; FEATURE_DIM] {
        let mut out = [0.0f64; FEATURE_DIM];
        for j in 0..FEATURE_DIM {
            out[j] = (v[j] - self.means[j]) / self.stddevs[j];
        }
        out
    }
}

/// A trained partitioning model: `k` centroids in standardized feature
/// space, in canonical order (ascending by first coordinate), plus the
/// scaling parameters needed to map destinations into that space.
///
/// Produced once by [`train`] and treated as read-only for the lifetime of
/// the serving process; retraining is an explicit offline operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterModel {
    pub k: usize,
    /// One centroid per cluster; index = cluster id.
    pub centroids: Vec<[f64; FEATURE_DIM]>,
    pub scaler: FeatureScaler,
    /// Feature schema the model was trained on, for load-time validation.
    pub feature_names: Vec<String>,
}

impl ClusterModel {
    /// Persist the model as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ClusterError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a model from JSON, validating its structural invariants.
    pub fn load(path: &Path) -> Result<Self, ClusterError> {
        let json = fs::read_to_string(path)?;
        let model: ClusterModel = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ClusterError> {
        if self.centroids.len() != self.k {
            return Err(ClusterError::CentroidMismatch {
                centroids: self.centroids.len(),
                k: self.k,
            });
        }
        if self.feature_names != FEATURE_NAMES {
            return Err(ClusterError::SchemaMismatch {
                found: self.feature_names.join(", "),
                expected: FEATURE_NAMES.join(", "),
            });
        }
        Ok(())
    }
}

// ── Training ────────────────────────────────────────────────────────────────

/// Train a k-means model over the destinations' feature vectors.
///
/// Features are z-score standardized, centroids initialized with seeded
/// k-means++, then refined by Lloyd iterations until assignments stop
/// changing or `max_iter` is reached. The converged centroids are sorted
/// ascending by their first coordinate so that cluster indices are stable
/// across retrainings of identical data.
pub fn train(
    destinations: &[Destination],
    config: &TrainConfig,
) -> Result<ClusterModel, ClusterError> {
    let vectors = extract_all(destinations)?;
    let distinct = count_distinct(&vectors);
    if config.k == 0 || distinct < config.k {
        return Err(ClusterError::InsufficientData {
            distinct,
            k: config.k,
        });
    }

    let scaler = FeatureScaler::fit(&vectors);
    let points: Vec<[f64; FEATURE_DIM]> = vectors.iter().map(|v| scaler.transform(v)).collect();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut centroids = init_centroids(&points, config.k, &mut rng);

    let n = points.len();
    let k = config.k;
    let mut assignments = vec![0usize; n];

    for _iter in 0..config.max_iter {
        // Assign each point to nearest centroid.
        let mut changed = false;
        for (i, point) in points.iter().enumerate() {
            let nearest = nearest_centroid(point, &centroids);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        // Recompute centroids as member means. An empty cluster keeps its
        // previous centroid.
        let mut sums = vec![[0.0f64; FEATURE_DIM]; k];
        let mut counts = vec![0usize; k];
        for (i, point) in points.iter().enumerate() {
            let c = assignments[i];
            counts[c] += 1;
            for (j, &v) in point.iter().enumerate() {
                sums[c][j] += v;
            }
        }
        for c in 0..k {
            if counts[c] > 0 {
                for j in 0..FEATURE_DIM {
                    centroids[c][j] = sums[c][j] / counts[c] as f64;
                }
            }
        }
    }

    // Canonical labeling: cluster 0 is the centroid with the lowest first
    // coordinate, ties broken by the remaining coordinates.
    centroids.sort_by(cmp_vectors);

    Ok(ClusterModel {
        k,
        centroids,
        scaler,
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
    })
}

fn extract_all(destinations: &[Destination]) -> Result<Vec<[f64; FEATURE_DIM]>, ClusterError> {
    destinations.iter().map(feature_vector).collect()
}

fn count_distinct(vectors: &[[f64; FEATURE_DIM]]) -> usize {
    let mut seen: HashSet<[u64; FEATURE_DIM]> = HashSet::new();
    for v in vectors {
        let mut bits = [0u64; FEATURE_DIM];
        for (j, &x) in v.iter().enumerate() {
            bits[j] = x.to_bits();
        }
        seen.insert(bits);
    }
    seen.len()
}

/// K-means++ initialization: first centroid uniform, each further centroid
/// picked with probability proportional to squared distance from the
/// nearest one already chosen.
fn init_centroids(
    points: &[[f64; FEATURE_DIM]],
    k: usize,
    rng: &mut StdRng,
) -> Vec<[f64; FEATURE_DIM]> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)]);

    while centroids.len() < k {
        let dists: Vec<f64> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| squared_dist(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();

        let total: f64 = dists.iter().sum();
        if total < 1e-15 {
            // All remaining points coincide with chosen centroids.
            centroids.push(points[rng.gen_range(0..n)]);
            continue;
        }

        let threshold = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        let mut chosen = 0;
        for (i, d) in dists.iter().enumerate() {
            cumulative += d;
            if cumulative >= threshold {
                chosen = i;
                break;
            }
        }
        centroids.push(points[chosen]);
    }

    centroids
}

fn nearest_centroid(point: &[f64; FEATURE_DIM], centroids: &[[f64; FEATURE_DIM]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let dist = squared_dist(point, c);
        // Strict `<` keeps the lowest index on exact ties.
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

fn squared_dist(a: &[f64; FEATURE_DIM], b: &[f64; FEATURE_DIM]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn cmp_vectors(a: &[f64; FEATURE_DIM], b: &[f64; FEATURE_DIM]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.partial_cmp(y) {
            Some(Ordering::Equal) | None => continue,
            Some(order) => return order,
        }
    }
    Ordering::Equal
}

// ── Assignment ──────────────────────────────────────────────────────────────

/// Label every destination with the index of its nearest centroid.
///
/// Pure and idempotent: re-running on an already-labeled set with the same
/// model yields identical labels. Exact distance ties go to the lowest
/// cluster index.
pub fn assign(
    mut destinations: Vec<Destination>,
    model: &ClusterModel,
) -> Result<Vec<Destination>, ClusterError> {
    model.validate()?;
    for d in &mut destinations {
        let raw = feature_vector(d)?;
        let point = model.scaler.transform(&raw);
        d.cluster = Some(nearest_centroid(&point, &model.centroids));
    }
    Ok(destinations)
}

// ── Tests ───────────────────────────────────────────────────────────────────

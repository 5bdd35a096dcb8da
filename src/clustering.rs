//! Unsupervised grouping of a document collection.
//!
//! Documents are vectorized with TF-IDF, partitioned with k-means
//! (k-means++ seeding, Lloyd iterations, best of several restarts) and
//! projected onto their first two principal components for plotting.
//!
//! All randomness comes from a [`StdRng`] seeded from the configuration,
//! so the same texts and seed always produce the same assignments.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use tracing::debug;

use crate::{
    config::ClusteringConfig,
    error::{Error, Result},
    tfidf::TfidfVectorizer,
};

/// Independent k-means restarts; the lowest-inertia run wins.
const N_INIT: usize = 10;

const POWER_ITERATIONS: usize = 500;
const POWER_TOLERANCE: f64 = 1e-12;

/// Cluster count actually used for a corpus of `n_docs` documents.
///
/// `min(requested, max(2, n_docs / 3))`, then capped at `n_docs` so a
/// corpus never has more clusters than documents.
///
/// # Examples
///
/// ```
/// use reportscope::clustering::effective_cluster_count;
///
/// assert_eq!(effective_cluster_count(3, 30), 3);
/// assert_eq!(effective_cluster_count(3, 7), 2);
/// assert_eq!(effective_cluster_count(3, 1), 1);
/// ```
pub fn effective_cluster_count(requested: usize, n_docs: usize) -> usize {
    requested.min((n_docs / 3).max(2)).min(n_docs)
}

/// Output of a clustering run, aligned with the input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterResult {
    /// Cluster id per document, in `0..n_clusters`.
    pub assignments: Vec<usize>,
    /// 2-D principal-component coordinates per document.
    pub projection: Vec<[f64; 2]>,
    pub n_clusters: usize,
}

#[derive(Debug, Clone)]
pub struct DocumentClusterer {
    vectorizer: TfidfVectorizer,
    seed: u64,
    max_iterations: usize,
}

impl Default for DocumentClusterer {
    fn default() -> Self {
        Self::new(&ClusteringConfig::default())
    }
}

impl DocumentClusterer {
    pub fn new(config: &ClusteringConfig) -> Self {
        Self {
            vectorizer: TfidfVectorizer::new(config.max_features),
            seed: config.seed,
            max_iterations: config.max_iterations.max(1),
        }
    }

    pub fn with_vectorizer(mut self, vectorizer: TfidfVectorizer) -> Self {
        self.vectorizer = vectorizer;
        self
    }

    /// Partition `texts` into at most `n_clusters` groups.
    ///
    /// Asking for more clusters than there are documents is not an error:
    /// the count is capped at the number of documents, and duplicate
    /// documents may leave some ids unused.
    pub fn cluster<S: AsRef<str>>(
        &self,
        texts: &[S],
        n_clusters: usize,
    ) -> Result<ClusterResult> {
        if texts.is_empty() {
            return Err(Error::Clustering(
                "cannot cluster an empty document list".into(),
            ));
        }
        if n_clusters == 0 {
            return Err(Error::Clustering(
                "cluster count must be positive".into(),
            ));
        }

        let tfidf = self.vectorizer.fit_transform(texts);
        let data = tfidf.matrix;
        let k = n_clusters.min(data.nrows());
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut best: Option<(Vec<usize>, f64)> = None;
        for _ in 0..N_INIT {
            let run = kmeans(&data, k, self.max_iterations, &mut rng);
            if best.as_ref().is_none_or(|(_, inertia)| run.1 < *inertia) {
                best = Some(run);
            }
        }
        let (assignments, inertia) = best.unwrap_or_default();

        debug!(
            documents = data.nrows(),
            terms = data.ncols(),
            clusters = k,
            inertia,
            "k-means finished"
        );

        let projection = project_2d(&data, &mut rng);

        Ok(ClusterResult {
            assignments,
            projection,
            n_clusters: k,
        })
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the closest centroid; ties go to the lower index.
fn nearest_centroid(point: ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best_dist {
            best = c;
            best_dist = dist;
        }
    }
    best
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen one.
fn init_centroids(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::zeros((k, data.ncols()));

    let first = rng.random_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));
    let mut closest: Vec<f64> = data
        .rows()
        .into_iter()
        .map(|row| squared_distance(row, data.row(first)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            closest
                .iter()
                .position(|&d| {
                    target -= d;
                    d > 0.0 && target < 0.0
                })
                .or_else(|| closest.iter().rposition(|&d| d > 0.0))
                .unwrap_or(0)
        } else {
            // Every point coincides with a chosen centroid.
            rng.random_range(0..n)
        };

        centroids.row_mut(c).assign(&data.row(pick));
        for (i, row) in data.rows().into_iter().enumerate() {
            closest[i] = closest[i].min(squared_distance(row, data.row(pick)));
        }
    }

    centroids
}

/// One seeded k-means run. Returns the assignments and their inertia.
fn kmeans(
    data: &Array2<f64>,
    k: usize,
    max_iterations: usize,
    rng: &mut StdRng,
) -> (Vec<usize>, f64) {
    let n = data.nrows();
    let mut centroids = init_centroids(data, k, rng);
    let mut assignments = vec![usize::MAX; n];

    for _ in 0..max_iterations {
        let mut changed = false;
        for (i, row) in data.rows().into_iter().enumerate() {
            let nearest = nearest_centroid(row, &centroids);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = Array2::<f64>::zeros(centroids.dim());
        let mut counts = vec![0usize; k];
        for (row, &cluster) in data.rows().into_iter().zip(&assignments) {
            let mut sum = sums.row_mut(cluster);
            sum += &row;
            counts[cluster] += 1;
        }
        // An emptied cluster keeps its previous centroid.
        for (c, &count) in counts.iter().enumerate() {
            if count > 0 {
                let mean = &sums.row(c) / count as f64;
                centroids.row_mut(c).assign(&mean);
            }
        }
    }

    let inertia = data
        .rows()
        .into_iter()
        .zip(&assignments)
        .map(|(row, &c)| squared_distance(row, centroids.row(c)))
        .sum();
    (assignments, inertia)
}

/// Project rows onto the first two principal components.
///
/// Works on the Gram matrix of the centred data, so the cost depends on
/// the number of documents rather than the vocabulary size. Components
/// with no variance come out as zeros. Each component's sign is fixed so
/// its largest-magnitude coordinate is positive.
fn project_2d(data: &Array2<f64>, rng: &mut StdRng) -> Vec<[f64; 2]> {
    let n = data.nrows();
    let mut projection = vec![[0.0; 2]; n];
    let Some(mean) = data.mean_axis(Axis(0)) else {
        return projection;
    };
    if n < 2 {
        return projection;
    }

    let centred = data - &mean;
    let mut gram = centred.dot(&centred.t());

    for component in 0..2 {
        let Some((eigenvalue, vector)) = top_eigenpair(&gram, rng) else {
            break;
        };
        let scale = eigenvalue.sqrt();
        for (i, point) in projection.iter_mut().enumerate() {
            point[component] = vector[i] * scale;
        }

        // Deflate so the next pass finds the following component.
        let outer = outer_product(&vector);
        gram = gram - outer * eigenvalue;
    }

    projection
}

fn outer_product(v: &Array1<f64>) -> Array2<f64> {
    let column = v.view().insert_axis(Axis(1));
    let row = v.view().insert_axis(Axis(0));
    column.dot(&row)
}

/// Dominant eigenpair of a symmetric positive semi-definite matrix by
/// power iteration. `None` when the remaining spectrum is numerically zero.
fn top_eigenpair(
    matrix: &Array2<f64>,
    rng: &mut StdRng,
) -> Option<(f64, Array1<f64>)> {
    let n = matrix.nrows();
    let mut vector: Array1<f64> =
        (0..n).map(|_| rng.random::<f64>() - 0.5).collect();
    let norm = vector.dot(&vector).sqrt();
    if norm == 0.0 {
        return None;
    }
    vector /= norm;

    let mut eigenvalue = 0.0;
    for _ in 0..POWER_ITERATIONS {
        let next = matrix.dot(&vector);
        let norm = next.dot(&next).sqrt();
        if norm <= POWER_TOLERANCE {
            return None;
        }
        let next = next / norm;
        let delta = (&next - &vector).mapv(f64::abs).sum();
        vector = next;
        eigenvalue = norm;
        if delta < 1e-10 {
            break;
        }
    }

    if eigenvalue <= POWER_TOLERANCE {
        return None;
    }

    let pivot = vector
        .iter()
        .copied()
        .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
        vector.mapv_inplace(|x| -x);
    }
    Some((eigenvalue, vector))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusterer() -> DocumentClusterer {
        DocumentClusterer::default()
    }

    #[test]
    fn effective_count_follows_corpus_size() {
        assert_eq!(effective_cluster_count(3, 0), 0);
        assert_eq!(effective_cluster_count(3, 1), 1);
        assert_eq!(effective_cluster_count(3, 2), 2);
        assert_eq!(effective_cluster_count(3, 5), 2);
        assert_eq!(effective_cluster_count(3, 9), 3);
        assert_eq!(effective_cluster_count(5, 12), 4);
        assert_eq!(effective_cluster_count(2, 100), 2);
    }

    #[test]
    fn empty_input_is_an_error() {
        let texts: [&str; 0] = [];
        let err = clusterer().cluster(&texts, 2).unwrap_err();
        assert!(matches!(err, Error::Clustering(_)));
    }

    #[test]
    fn separates_distinct_topics() {
        let texts = [
            "trade tariffs exports imports trade tariffs",
            "tariffs exports trade imports markets",
            "football match goal striker football",
            "striker goal football match league",
        ];
        let result = clusterer().cluster(&texts, 2).unwrap();
        assert_eq!(result.n_clusters, 2);
        let a = &result.assignments;
        assert_eq!(a[0], a[1]);
        assert_eq!(a[2], a[3]);
        assert_ne!(a[0], a[2]);
    }

    #[test]
    fn same_seed_same_assignments() {
        let texts = [
            "port shipping cargo",
            "cargo vessel port",
            "election ballot vote",
            "vote campaign ballot",
            "rain storm flood",
            "flood river storm",
        ];
        let first = clusterer().cluster(&texts, 3).unwrap();
        let second = clusterer().cluster(&texts, 3).unwrap();
        assert_eq!(first.assignments, second.assignments);
    }

    #[test]
    fn single_document_gets_one_cluster() {
        let result = clusterer().cluster(&["only one text here"], 2).unwrap();
        assert_eq!(result.n_clusters, 1);
        assert_eq!(result.assignments, vec![0]);
        assert_eq!(result.projection, vec![[0.0, 0.0]]);
    }

    #[test]
    fn identical_documents_do_not_crash() {
        let texts = ["same words here"; 4];
        let result = clusterer().cluster(&texts, 3).unwrap();
        assert_eq!(result.assignments.len(), 4);
        assert!(result.assignments.iter().all(|&c| c < 3));
        assert!(result.assignments.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn stop_word_only_corpus_still_clusters() {
        let texts = ["the and of", "it is", "a an the"];
        let result = clusterer().cluster(&texts, 2).unwrap();
        assert_eq!(result.assignments.len(), 3);
    }

    #[test]
    fn projection_spreads_distinct_documents() {
        let texts = ["alpha beta", "gamma delta", "epsilon zeta"];
        let result = clusterer().cluster(&texts, 2).unwrap();
        assert_eq!(result.projection.len(), 3);
        assert!(result.projection.iter().any(|p| p[0].abs() > 1e-6));
        let sum: f64 = result.projection.iter().map(|p| p[0]).sum();
        assert!(sum.abs() < 1e-6, "projection should be centred");
    }
}

//! Cluster-quality scoring.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusteringMetrics {
    pub sample_count: usize,
    /// Mean silhouette coefficient in [-1, 1]; 0.0 when fewer than two
    /// clusters are populated.
    pub silhouette: f64,
    /// Member count per cluster id.
    pub cluster_sizes: Vec<usize>,
}

/// Scores an assignment of points to clusters.
pub fn evaluate(points: &[Vec<f64>], assignments: &[usize]) -> ClusteringMetrics {
    debug_assert_eq!(points.len(), assignments.len());
    let n = points.len();
    if n == 0 {
        return ClusteringMetrics::default();
    }

    let cluster_count = assignments.iter().max().map_or(0, |m| m + 1);
    let mut cluster_sizes = vec![0usize; cluster_count];
    for &a in assignments {
        cluster_sizes[a] += 1;
    }
    let populated = cluster_sizes.iter().filter(|&&s| s > 0).count();
    if populated < 2 {
        return ClusteringMetrics {
            sample_count: n,
            silhouette: 0.0,
            cluster_sizes,
        };
    }

    let mut total = 0.0;
    for (i, point) in points.iter().enumerate() {
        let own = assignments[i];
        // Singleton clusters score 0 for their lone member.
        if cluster_sizes[own] <= 1 {
            continue;
        }

        let mut intra_sum = 0.0;
        let mut inter_sums = vec![0.0; cluster_count];
        for (j, other) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            let d = euclidean(point, other);
            if assignments[j] == own {
                intra_sum += d;
            } else {
                inter_sums[assignments[j]] += d;
            }
        }

        let a = intra_sum / (cluster_sizes[own] - 1) as f64;
        let b = inter_sums
            .iter()
            .enumerate()
            .filter(|(c, _)| *c != own && cluster_sizes[*c] > 0)
            .map(|(c, sum)| sum / cluster_sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    ClusteringMetrics {
        sample_count: n,
        silhouette: total / n as f64,
        cluster_sizes,
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

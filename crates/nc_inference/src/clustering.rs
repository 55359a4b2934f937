//! Average-linkage agglomerative clustering over cosine distance.
//!
//! Two clusters merge while their mean pairwise distance is strictly below
//! `1 - similarity_threshold`. The number of clusters falls out of the
//! threshold; it is never fixed up front.

use nc_core::{cosine_distance, Cluster, Error, Result};

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.6;

/// Group `items` by the similarity of their `embeddings` (one per item).
///
/// Groups are returned in order of their first member's position in the
/// input and members keep input order, so every item lands in exactly one
/// group. A single item comes back alone without any distance computation;
/// no items yields no groups.
pub fn cluster<T>(
    embeddings: &[Vec<f32>],
    items: Vec<T>,
    similarity_threshold: f32,
) -> Result<Vec<Cluster<T>>> {
    if embeddings.len() != items.len() {
        return Err(Error::InvalidInput(format!(
            "got {} embeddings for {} items",
            embeddings.len(),
            items.len()
        )));
    }
    if items.len() <= 1 {
        return Ok(if items.is_empty() { Vec::new() } else { vec![items] });
    }

    let labels = cluster_labels(embeddings, similarity_threshold);
    let group_count = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut groups: Vec<Cluster<T>> = (0..group_count).map(|_| Vec::new()).collect();
    for (label, item) in labels.into_iter().zip(items) {
        groups[label].push(item);
    }
    Ok(groups)
}

/// Cluster label for each embedding. Labels are numbered by first
/// occurrence: the first embedding is always label 0.
pub fn cluster_labels(embeddings: &[Vec<f32>], similarity_threshold: f32) -> Vec<usize> {
    let n = embeddings.len();
    let cutoff = 1.0 - f64::from(similarity_threshold);

    let mut distance = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = f64::from(cosine_distance(&embeddings[i], &embeddings[j]));
            distance[i][j] = d;
            distance[j][i] = d;
        }
    }

    // root[i] is the cluster slot item i currently belongs to
    let mut root: Vec<usize> = (0..n).collect();
    let mut size = vec![1usize; n];
    let mut active = vec![true; n];

    loop {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !active[j] {
                    continue;
                }
                let d = distance[i][j];
                if best.map_or(true, |(_, _, b)| d < b) {
                    best = Some((i, j, d));
                }
            }
        }

        let Some((i, j, d)) = best else { break };
        if d >= cutoff {
            break;
        }

        // Lance-Williams update for average linkage
        let (si, sj) = (size[i] as f64, size[j] as f64);
        for k in 0..n {
            if !active[k] || k == i || k == j {
                continue;
            }
            let merged = (si * distance[i][k] + sj * distance[j][k]) / (si + sj);
            distance[i][k] = merged;
            distance[k][i] = merged;
        }
        size[i] += size[j];
        active[j] = false;
        for r in root.iter_mut() {
            if *r == j {
                *r = i;
            }
        }
    }

    let mut label_of_root = vec![usize::MAX; n];
    let mut next = 0;
    root.into_iter()
        .map(|r| {
            if label_of_root[r] == usize::MAX {
                label_of_root[r] = next;
                next += 1;
            }
            label_of_root[r]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_angle(degrees: f32) -> Vec<f32> {
        let radians = degrees.to_radians();
        vec![radians.cos(), radians.sin()]
    }

    #[test]
    fn test_near_duplicates_group_together() {
        let embeddings = vec![
            vec![0.9, 0.1, 0.2],
            vec![0.88, 0.12, 0.18],
            vec![0.1, 0.8, 0.5],
        ];
        let titles = vec![
            "FAA cuts flights due to shutdown",
            "Government shutdown impacts air travel",
            "New AI model released",
        ];

        let groups = cluster(&embeddings, titles, DEFAULT_SIMILARITY_THRESHOLD).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[0],
            vec!["FAA cuts flights due to shutdown", "Government shutdown impacts air travel"]
        );
        assert_eq!(groups[1], vec!["New AI model released"]);
    }

    #[test]
    fn test_average_linkage_does_not_chain() {
        // a-b ~0.18 apart, b-c ~0.29: single linkage would chain all three
        let embeddings = vec![at_angle(0.0), at_angle(35.0), at_angle(80.0)];
        let groups = cluster(&embeddings, vec!['a', 'b', 'c'], 0.6).unwrap();
        assert_eq!(groups, vec![vec!['a', 'b'], vec!['c']]);
    }

    #[test]
    fn test_groups_follow_first_occurrence() {
        let embeddings = vec![at_angle(90.0), at_angle(0.0), at_angle(88.0), at_angle(2.0)];
        let groups = cluster(&embeddings, vec![0, 1, 2, 3], 0.6).unwrap();
        assert_eq!(groups, vec![vec![0, 2], vec![1, 3]]);
    }

    #[test]
    fn test_threshold_controls_granularity() {
        let embeddings = vec![at_angle(0.0), at_angle(30.0), at_angle(60.0)];
        // cos 30 ~ 0.866: strict threshold keeps them apart
        assert_eq!(cluster(&embeddings, vec![1, 2, 3], 0.95).unwrap().len(), 3);
        // loose threshold merges everything
        assert_eq!(cluster(&embeddings, vec![1, 2, 3], 0.1).unwrap().len(), 1);
    }

    #[test]
    fn test_small_inputs() {
        let none: Vec<&str> = Vec::new();
        assert!(cluster(&[], none, 0.6).unwrap().is_empty());

        let one = cluster(&[vec![0.0, 0.0]], vec!["only"], 0.6).unwrap();
        assert_eq!(one, vec![vec!["only"]]);
    }

    #[test]
    fn test_zero_vectors_stay_apart() {
        let embeddings = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        assert_eq!(cluster(&embeddings, vec![1, 2], 0.6).unwrap().len(), 2);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let result = cluster(&[vec![1.0]], vec![1, 2], 0.6);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_labels_start_at_zero() {
        let labels = cluster_labels(&[at_angle(0.0), at_angle(90.0), at_angle(1.0)], 0.6);
        assert_eq!(labels, vec![0, 1, 0]);
    }
}

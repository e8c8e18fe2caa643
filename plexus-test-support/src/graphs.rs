//! Graph fixtures shared by unit tests, integration tests and benchmarks.
//!
//! Fixtures are plain `(node_count, pairs)` so callers can build whichever
//! adjacency representation they need.

use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Undirected graph as a node count and a list of node pairs.
pub type Pairs = (usize, Vec<(usize, usize)>);

/// Two disjoint triangles `{0, 1, 2}` and `{3, 4, 5}`.
#[must_use]
pub fn two_triangles() -> Pairs {
    (6, vec![(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)])
}

/// Two disjoint triangles plus node 6 without any edge.
#[must_use]
pub fn two_triangles_and_isolated_node() -> Pairs {
    let (_, pairs) = two_triangles();
    (7, pairs)
}

/// Two disjoint complete bipartite `K(2,2)` blocks over eight nodes.
///
/// Nodes `0, 1, 4, 5` form one side and `2, 3, 6, 7` the other, matching
/// [`two_bicliques_partitions`].
#[must_use]
pub fn two_bicliques() -> Pairs {
    (
        8,
        vec![
            (0, 2),
            (0, 3),
            (1, 2),
            (1, 3),
            (4, 6),
            (4, 7),
            (5, 6),
            (5, 7),
        ],
    )
}

/// Partition of every node of [`two_bicliques`].
#[must_use]
pub fn two_bicliques_partitions() -> Vec<usize> {
    vec![0, 0, 1, 1, 0, 0, 1, 1]
}

/// Deterministic Erdős–Rényi style graph.
///
/// Each unordered pair is kept with probability `density`; the same seed
/// always yields the same pairs.
///
/// # Examples
/// ```
/// use plexus_test_support::graphs::random_graph;
///
/// let (nodes, pairs) = random_graph(20, 0.2, 7);
/// assert_eq!(nodes, 20);
/// assert_eq!(pairs, random_graph(20, 0.2, 7).1);
/// assert!(pairs.iter().all(|&(a, b)| a < b && b < nodes));
/// ```
#[must_use]
pub fn random_graph(nodes: usize, density: f64, seed: u64) -> Pairs {
    let mut rng = SmallRng::seed_from_u64(seed);
    let density = density.clamp(0.0, 1.0);
    let mut pairs = Vec::new();
    for left in 0..nodes {
        for right in left + 1..nodes {
            if rng.gen_bool(density) {
                pairs.push((left, right));
            }
        }
    }
    (nodes, pairs)
}

/// `communities` dense clusters of `size` nodes chained by one bridge edge.
///
/// Every cluster is a clique; cluster `c` is joined to cluster `c + 1` by an
/// edge between their first nodes.
#[must_use]
pub fn bridged_cliques(communities: usize, size: usize) -> Pairs {
    let mut pairs = Vec::new();
    for community in 0..communities {
        let base = community * size;
        for left in 0..size {
            for right in left + 1..size {
                pairs.push((base + left, base + right));
            }
        }
        if community + 1 < communities {
            pairs.push((base, base + size));
        }
    }
    (communities * size, pairs)
}

//! Saturation-degree (DSATUR) greedy vertex colouring.
//!
//! Used to estimate the chromatic number that fixes the default number of
//! decomposition levels, and as the colouring behind the Harary split.
//! Ties on saturation are broken by larger degree, then by smaller index, so
//! the colouring is deterministic.

use std::collections::BTreeSet;

use log::debug;

use crate::graph::WeightedGraph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coloring {
    /// Colour of every vertex, `0..n_color`.
    pub colors: Vec<usize>,
    pub n_color: usize,
}

impl Coloring {
    /// True if no edge joins two vertices of the same colour.
    pub fn is_proper(&self, graph: &WeightedGraph) -> bool {
        graph
            .edges()
            .iter()
            .all(|&(i, j, _)| self.colors[i] != self.colors[j])
    }
}

pub fn dsatur(graph: &WeightedGraph) -> Coloring {
    let n = graph.nnodes;
    let neighbours: Vec<Vec<usize>> = (0..n)
        .map(|i| graph.neighbours(i).into_iter().map(|(j, _)| j).collect())
        .collect();
    let degree: Vec<usize> = neighbours.iter().map(|nb| nb.len()).collect();

    let mut colors: Vec<Option<usize>> = vec![None; n];
    let mut seen: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];

    for _ in 0..n {
        let mut pick: Option<usize> = None;
        for v in 0..n {
            if colors[v].is_some() {
                continue;
            }
            pick = match pick {
                None => Some(v),
                Some(u) => {
                    let better = (seen[v].len(), degree[v]) > (seen[u].len(), degree[u]);
                    if better {
                        Some(v)
                    } else {
                        Some(u)
                    }
                }
            };
        }
        let Some(v) = pick else { break };

        let mut c = 0;
        while seen[v].contains(&c) {
            c += 1;
        }
        colors[v] = Some(c);
        for &u in &neighbours[v] {
            seen[u].insert(c);
        }
    }

    let colors: Vec<usize> = colors.into_iter().map(|c| c.unwrap_or(0)).collect();
    let n_color = colors.iter().max().map(|&c| c + 1).unwrap_or(0);
    debug!("DSATUR coloured {} vertices with {} colours", n, n_color);
    Coloring { colors, n_color }
}

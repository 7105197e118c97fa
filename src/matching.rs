//! Maximum matching of a bipartite cut graph that grows one vertex at a time.
//!
//! The structural rank of a symmetric bipartite mask `[0 B; Bᵀ 0]` is twice
//! the maximum matching of the cut graph. Adding one vertex raises the maximum
//! matching by at most one, and it does so exactly when an augmenting path
//! starts at the new vertex, so one alternating BFS per candidate keeps the
//! rank exact.

use std::collections::VecDeque;

/// Matching state over local vertex indices (insertion order).
#[derive(Debug, Clone, Default)]
pub struct IncrementalMatching {
    adj: Vec<Vec<usize>>,
    mate: Vec<Option<usize>>,
    size: usize,
}

impl IncrementalMatching {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    /// Number of matched pairs.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Structural rank of the cut's symmetric mask.
    pub fn structural_rank(&self) -> usize {
        2 * self.size
    }

    /// Size the matching would reach if a new vertex joined with edges to `neighbours`.
    pub fn size_with(&self, neighbours: &[usize]) -> usize {
        match self.augmenting_path(neighbours) {
            Some(_) => self.size + 1,
            None => self.size,
        }
    }

    /// Insert a new vertex adjacent to `neighbours` and re-maximize; returns its local index.
    pub fn push_vertex(&mut self, neighbours: &[usize]) -> usize {
        let path = self.augmenting_path(neighbours);
        let v = self.adj.len();
        self.adj.push(neighbours.to_vec());
        self.mate.push(None);
        for &u in neighbours {
            self.adj[u].push(v);
        }

        if let Some(path) = path {
            // path alternates v, u1, w1, u2, w2, ..., uk with uk free
            let mut prev = v;
            for pair in path.chunks(2) {
                let u = pair[0];
                self.mate[prev] = Some(u);
                self.mate[u] = Some(prev);
                if let Some(&w) = pair.get(1) {
                    prev = w;
                }
            }
            self.size += 1;
        }
        v
    }

    /// Alternating BFS from a virtual free vertex adjacent to `neighbours`.
    ///
    /// Returns the path without its start vertex: `u1, w1, u2, ..., uk`, where
    /// every `w` is the current mate of the preceding `u` and `uk` is free.
    fn augmenting_path(&self, neighbours: &[usize]) -> Option<Vec<usize>> {
        let n = self.adj.len();
        // parent[u] = Some(w): u reached from the matched vertex w; Some(n) marks the root
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut queue = VecDeque::new();

        for &u in neighbours {
            if parent[u].is_none() {
                parent[u] = Some(n);
                queue.push_back(u);
            }
        }

        while let Some(u) = queue.pop_front() {
            match self.mate[u] {
                None => {
                    let mut path = vec![u];
                    let mut cur = u;
                    while let Some(p) = parent[cur] {
                        if p == n {
                            break;
                        }
                        // p is matched to some earlier u'
                        path.push(p);
                        let Some(prev_u) = self.mate[p] else { break };
                        path.push(prev_u);
                        cur = prev_u;
                    }
                    path.reverse();
                    return Some(path);
                }
                Some(w) => {
                    for &next in &self.adj[w] {
                        if next != u && parent[next].is_none() {
                            parent[next] = Some(w);
                            queue.push_back(next);
                        }
                    }
                }
            }
        }
        None
    }
}

//! Channel bookkeeping: which vertices each filter-bank channel keeps.
//!
//! With `M` levels there are `Co = 2^M` channels. Channel `c` is low at level
//! `m` when bit `m` of `c` is 0, so channel 0 is all-low. A vertex belongs to
//! the one channel whose pattern equals its row of `β`.

use ndarray::Array2;

/// `(channel_mask, beta_dist)`: `Co x N` membership and `Co x M` patterns.
pub fn beta_to_channel_mask(beta: &Array2<bool>) -> (Array2<bool>, Array2<bool>) {
    let (n, m) = beta.dim();
    let co = 1usize << m;
    let beta_dist = Array2::from_shape_fn((co, m), |(c, level)| (c >> level) & 1 == 0);
    let channel_mask = Array2::from_shape_fn((co, n), |(c, v)| {
        (0..m).all(|level| beta[[v, level]] == beta_dist[[c, level]])
    });
    (channel_mask, beta_dist)
}

/// Names over `{L, H}`, level 0 first.
pub fn channel_names(beta_dist: &Array2<bool>) -> Vec<String> {
    beta_dist
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|&low| if low { 'L' } else { 'H' }).collect())
        .collect()
}

/// Channel of every vertex.
pub fn vertex_channels(beta: &Array2<bool>) -> Vec<usize> {
    beta.rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|&(_, &low)| !low)
                .map(|(level, _)| 1usize << level)
                .sum()
        })
        .collect()
}

//! Sparse feature vectors.

use serde::{Deserialize, Serialize};

/// A sparse `f64` vector of fixed dimension with strictly increasing indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<u32>,
    values: Vec<f64>,
}

impl SparseVector {
    /// An all-zero vector of dimension `dim`.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a vector from `(index, value)` entries in any order.
    ///
    /// Entries are sorted by index and duplicate indices are summed. Returns
    /// `None` if an index is out of bounds.
    pub fn from_entries(dim: usize, mut entries: Vec<(u32, f64)>) -> Option<Self> {
        entries.sort_unstable_by_key(|&(i, _)| i);
        let mut indices = Vec::with_capacity(entries.len());
        let mut values: Vec<f64> = Vec::with_capacity(entries.len());
        for (i, v) in entries {
            if i as usize >= dim {
                return None;
            }
            match indices.last() {
                Some(&last) if last == i => {
                    if let Some(acc) = values.last_mut() {
                        *acc += v;
                    }
                }
                _ => {
                    indices.push(i);
                    values.push(v);
                }
            }
        }
        Some(Self {
            dim,
            indices,
            values,
        })
    }

    /// Builds a vector from a dense slice, keeping non-zero components.
    pub fn from_dense(dense: &[f64]) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i as u32, v))
            .unzip();
        Self {
            dim: dense.len(),
            indices,
            values,
        }
    }

    /// Dimension of the vector (vocabulary size).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (non-zero) components.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if every component is zero.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    /// Stored indices, strictly increasing.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Stored values, parallel to [`indices`](Self::indices).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterates stored `(index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Component at `index` (zero when not stored).
    pub fn get(&self, index: u32) -> f64 {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }

    /// Dot product with a dense vector. Components past `dense.len()` count as zero.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter()
            .filter_map(|(i, v)| dense.get(i as usize).map(|w| v * w))
            .sum()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Multiplies every stored component by `f(index)`.
    pub(crate) fn scale_each(&mut self, f: impl Fn(u32) -> f64) {
        for (i, v) in self.indices.iter().zip(self.values.iter_mut()) {
            *v *= f(*i);
        }
    }

    /// Divides by the Euclidean norm; a zero vector is left unchanged.
    pub(crate) fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    /// Expands to a dense vector of length [`dim`](Self::dim).
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (i, v) in self.iter() {
            dense[i as usize] = v;
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries_sorts_and_merges() {
        let v = SparseVector::from_entries(5, vec![(3, 1.0), (1, 2.0), (3, 4.0)]).unwrap();
        assert_eq!(v.indices(), &[1, 3]);
        assert_eq!(v.values(), &[2.0, 5.0]);
        assert_eq!(v.get(3), 5.0);
        assert_eq!(v.get(0), 0.0);
    }

    #[test]
    fn test_from_entries_rejects_out_of_bounds() {
        assert!(SparseVector::from_entries(2, vec![(2, 1.0)]).is_none());
    }

    #[test]
    fn test_dot_and_norm() {
        let v = SparseVector::from_dense(&[3.0, 0.0, 4.0]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.norm(), 5.0);
        assert_eq!(v.dot(&[1.0, 10.0, 2.0]), 11.0);
    }

    #[test]
    fn test_l2_normalize_keeps_zero_vector() {
        let mut zero = SparseVector::zeros(4);
        zero.l2_normalize();
        assert!(zero.is_zero());

        let mut v = SparseVector::from_dense(&[3.0, 4.0]);
        v.l2_normalize();
        assert!((v.norm() - 1.0).abs() < 1e-12);
        assert_eq!(v.to_dense(), vec![0.6, 0.8]);
    }
}

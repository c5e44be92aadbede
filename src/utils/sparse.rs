use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::sort::radix_sort_u32_soa;

/// Errors raised when building a [`SparseVector`] from raw parts.
#[derive(Debug, Error, PartialEq)]
pub enum SparseError {
    #[error("indices and values differ in length ({indices} != {values})")]
    LengthMismatch { indices: usize, values: usize },

    #[error("index {index} out of range for dimension {dim}")]
    IndexOutOfRange { index: u32, dim: u32 },

    #[error("duplicate index {0}")]
    DuplicateIndex(u32),
}

/// SparseVector is a single row of a TF-IDF matrix.
/// Only non-zero entries are stored.
///
/// `indices` are strictly ascending and every index is `< dim`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSparseVector")]
pub struct SparseVector {
    dim: u32,
    indices: Vec<u32>,
    values: Vec<f32>,
}

/// unchecked wire form, validated through [`SparseVector::new`]
#[derive(Deserialize)]
struct RawSparseVector {
    dim: u32,
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl TryFrom<RawSparseVector> for SparseVector {
    type Error = SparseError;

    fn try_from(raw: RawSparseVector) -> Result<Self, Self::Error> {
        SparseVector::new(raw.dim, raw.indices, raw.values)
    }
}

impl SparseVector {
    /// Build from unsorted (index, value) parts.
    /// Entries are sorted; duplicates and out-of-range indices are rejected.
    pub fn new(dim: u32, mut indices: Vec<u32>, mut values: Vec<f32>) -> Result<Self, SparseError> {
        if indices.len() != values.len() {
            return Err(SparseError::LengthMismatch {
                indices: indices.len(),
                values: values.len(),
            });
        }
        radix_sort_u32_soa(&mut indices, &mut values);
        for w in indices.windows(2) {
            if w[0] == w[1] {
                return Err(SparseError::DuplicateIndex(w[0]));
            }
        }
        if let Some(&last) = indices.last() {
            if last >= dim {
                return Err(SparseError::IndexOutOfRange { index: last, dim });
            }
        }
        Ok(Self { dim, indices, values })
    }

    /// Build from parts whose indices are already known to be distinct and `< dim`.
    pub(crate) fn from_unique_parts(dim: u32, mut indices: Vec<u32>, mut values: Vec<f32>) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        radix_sort_u32_soa(&mut indices, &mut values);
        Self { dim, indices, values }
    }

    /// All-zero vector of the given dimension.
    pub fn zeros(dim: u32) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    #[inline]
    pub fn dim(&self) -> u32 {
        self.dim
    }

    /// number of stored (non-zero) entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at `index`, zero when not stored.
    pub fn get(&self, index: u32) -> f32 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate stored entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![0.0; self.dim as usize];
        for (i, v) in self.iter() {
            dense[i as usize] = v;
        }
        dense
    }

    pub fn norm_l2(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Dot product by merging both index lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut a, mut b) = (0usize, 0usize);
        let mut acc = 0.0f32;
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    acc += self.values[a] * other.values[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        acc
    }
}

use std::sync::Arc;

use lattix_types::TypeRef;

use super::{Sequence, Vector};
use crate::error::{Result, ValueError, check_index};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightMode {
    /// The given weight replaces the backing weight.
    Override,
    /// The given weight scales the backing weight.
    Multiply,
}

/// Re-weights a backing vector without touching its elements.
pub struct Weighted {
    backing: Vector,
    weights: Arc<[f64]>,
    mode: WeightMode,
}

impl Weighted {
    pub fn new(backing: Vector, weights: Vec<f64>, mode: WeightMode) -> Result<Self> {
        if weights.len() != backing.len() {
            return Err(ValueError::LengthMismatch {
                expected: backing.len(),
                found: weights.len(),
            });
        }
        Ok(Self {
            backing,
            weights: weights.into(),
            mode,
        })
    }
}

impl Sequence for Weighted {
    fn ty(&self) -> TypeRef {
        self.backing.ty()
    }

    fn len(&self) -> usize {
        self.weights.len()
    }

    fn element(&self, idx: usize) -> Result<Value> {
        self.backing.element(idx)
    }

    fn int_at(&self, idx: usize) -> Result<i64> {
        self.backing.int_at(idx)
    }

    fn double_at(&self, idx: usize) -> Result<f64> {
        self.backing.double_at(idx)
    }

    fn weight(&self, idx: usize) -> Result<f64> {
        check_index(idx, self.weights.len())?;
        match self.mode {
            WeightMode::Override => Ok(self.weights[idx]),
            WeightMode::Multiply => Ok(self.backing.weight(idx)? * self.weights[idx]),
        }
    }

    fn column(&self, col: usize) -> Option<Result<Vector>> {
        let column = match self.backing.column(col) {
            Ok(column) => column,
            Err(err) => return Some(Err(err)),
        };
        let weights: Result<Vec<f64>> = (0..self.weights.len()).map(|i| self.weight(i)).collect();
        Some(weights.and_then(|ws| column.weighted(ws)))
    }
}

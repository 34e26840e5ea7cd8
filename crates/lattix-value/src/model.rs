//! The probabilistic model contract.
//!
//! Concrete models live outside this crate. The vectorized operations
//! default to iterating the scalar forms; models override them when they
//! can do better.

use std::fmt;
use std::sync::Arc;

use lattix_types::TypeRef;
use rand::RngCore;

use crate::error::{Result, ValueError};
use crate::value::Value;
use crate::vector::Vector;

pub trait Model: Send + Sync {
    /// A `Model(data|param,shared)` type.
    fn ty(&self) -> TypeRef;

    fn log_probability(&self, x: &Value, params: &Value, shared: &Value) -> Result<f64>;

    fn generate(
        &self,
        rng: &mut dyn RngCore,
        n: usize,
        params: &Value,
        shared: &Value,
    ) -> Result<Vector>;

    fn predict(&self, params: &Value, shared: &Value) -> Result<Value>;

    fn sufficient_statistic(&self, xs: &Vector, shared: &Vector) -> Result<Value>;

    /// Log likelihood from a `sufficient_statistic` result. Models without
    /// a closed form leave this unsupported.
    fn log_probability_sufficient(&self, _stats: &Value, _params: &Value) -> Result<f64> {
        Err(ValueError::Unsupported {
            operation: "log_probability_sufficient",
            by: self.ty().to_string(),
        })
    }

    /// Sum of `log_probability` over paired data and shared elements.
    fn log_probability_vector(&self, xs: &Vector, params: &Value, shared: &Vector) -> Result<f64> {
        if xs.len() != shared.len() {
            return Err(ValueError::LengthMismatch {
                expected: xs.len(),
                found: shared.len(),
            });
        }
        let mut total = 0.0;
        for i in 0..xs.len() {
            total += self.log_probability(&xs.element(i)?, params, &shared.element(i)?)?;
        }
        Ok(total)
    }

    /// One draw per shared element.
    fn generate_each(
        &self,
        rng: &mut dyn RngCore,
        params: &Value,
        shared: &Vector,
    ) -> Result<Vector> {
        let mut draws = Vec::with_capacity(shared.len());
        for z in shared.iter() {
            draws.push(self.generate(rng, 1, params, &z?)?.element(0)?);
        }
        Ok(Vector::from_values(draws))
    }

    fn predict_vector(&self, params: &Value, shared: &Vector) -> Result<Vector> {
        let predictions = shared
            .iter()
            .map(|z| self.predict(params, &z?))
            .collect::<Result<Vec<_>>>()?;
        Ok(Vector::from_values(predictions))
    }
}

#[derive(Clone)]
pub struct ModelValue(Arc<dyn Model>);

impl ModelValue {
    pub fn new<M: Model + 'static>(model: M) -> Self {
        ModelValue(Arc::new(model))
    }

    pub fn ty(&self) -> TypeRef {
        self.0.ty()
    }

    pub fn model(&self) -> &dyn Model {
        &*self.0
    }

    pub fn ptr_eq(&self, other: &ModelValue) -> bool {
        self.addr() == other.addr()
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelValue({})", self.ty())
    }
}

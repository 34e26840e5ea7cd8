use std::collections::HashMap;
use std::sync::Mutex;

use lattix_types::{ANY, TypeRef};

use super::{Sequence, Vector, vector_of};
use crate::error::{Result, check_index};
use crate::function::FnValue;
use crate::value::Value;

/// Applies a function to each element on first access and caches the
/// result. Construction allocates nothing per element.
pub struct LazyMap {
    backing: Vector,
    f: FnValue,
    cache: Mutex<HashMap<usize, Value>>,
    ty: TypeRef,
}

impl LazyMap {
    pub fn new(backing: Vector, f: FnValue) -> Self {
        let result = f
            .ty()
            .as_function()
            .map(|ft| ft.result.ty.clone())
            .unwrap_or_else(|| ANY.clone());
        Self {
            backing,
            f,
            cache: Mutex::new(HashMap::new()),
            ty: vector_of(result),
        }
    }

    fn cached(&self, idx: usize) -> Option<Value> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(&idx).cloned()
    }
}

impl Sequence for LazyMap {
    fn ty(&self) -> TypeRef {
        self.ty.clone()
    }

    fn len(&self) -> usize {
        self.backing.len()
    }

    fn element(&self, idx: usize) -> Result<Value> {
        check_index(idx, self.backing.len())?;
        if let Some(hit) = self.cached(idx) {
            return Ok(hit);
        }
        // Computed outside the lock; a racing thread may compute the same
        // element, the first insert wins.
        let value = self.f.apply(&self.backing.element(idx)?)?;
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        Ok(cache.entry(idx).or_insert(value).clone())
    }

    fn weight(&self, idx: usize) -> Result<f64> {
        self.backing.weight(idx)
    }
}

//! Index-remapping views: sub-ranges, column projections and zips.

use lattix_types::{ANY, STRUCTURED, Slot, StructuredType, Type, TypeRef};
use std::sync::Arc;

use super::{Sequence, Vector, elt_of, vector_of};
use crate::error::{Result, ValueError, check_index};
use crate::value::{Tuple, Value};

/// Elements `lo..=hi` of a backing vector.
pub struct SubVector {
    backing: Vector,
    lo: usize,
    len: usize,
}

impl SubVector {
    /// Requires `lo <= hi < backing.len()`.
    pub fn new(backing: Vector, lo: usize, hi: usize) -> Result<Self> {
        check_index(hi, backing.len())?;
        if lo > hi {
            return Err(ValueError::IndexOutOfRange {
                index: lo,
                len: hi + 1,
            });
        }
        Ok(Self {
            backing,
            lo,
            len: hi - lo + 1,
        })
    }
}

impl Sequence for SubVector {
    fn ty(&self) -> TypeRef {
        self.backing.ty()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn element(&self, idx: usize) -> Result<Value> {
        check_index(idx, self.len)?;
        self.backing.element(self.lo + idx)
    }

    fn int_at(&self, idx: usize) -> Result<i64> {
        check_index(idx, self.len)?;
        self.backing.int_at(self.lo + idx)
    }

    fn double_at(&self, idx: usize) -> Result<f64> {
        check_index(idx, self.len)?;
        self.backing.double_at(self.lo + idx)
    }

    fn weight(&self, idx: usize) -> Result<f64> {
        check_index(idx, self.len)?;
        self.backing.weight(self.lo + idx)
    }
}

/// One component of every tuple in a backing vector.
pub struct ColumnView {
    backing: Vector,
    col: usize,
    ty: TypeRef,
}

impl ColumnView {
    /// Fails eagerly when the backing element type has a known arity
    /// that `col` exceeds.
    pub fn new(backing: Vector, col: usize) -> Result<Self> {
        let elt = backing.elt_type();
        let component = match elt.as_structured().and_then(StructuredType::arity) {
            Some(arity) => {
                check_index(col, arity)?;
                elt.as_structured()
                    .and_then(|st| st.component(col))
                    .cloned()
                    .unwrap_or_else(|| ANY.clone())
            }
            None => ANY.clone(),
        };
        Ok(Self {
            backing,
            col,
            ty: vector_of(component),
        })
    }
}

impl Sequence for ColumnView {
    fn ty(&self) -> TypeRef {
        self.ty.clone()
    }

    fn len(&self) -> usize {
        self.backing.len()
    }

    fn element(&self, idx: usize) -> Result<Value> {
        let row = self.backing.element(idx)?;
        row.as_tuple()?.component(self.col).cloned()
    }

    fn weight(&self, idx: usize) -> Result<f64> {
        self.backing.weight(idx)
    }
}

/// Presents several columns as one vector of tuples.
pub struct ZipVector {
    columns: Vec<Vector>,
    elt: TypeRef,
    len: usize,
}

impl ZipVector {
    pub fn new(columns: Vec<Vector>) -> Self {
        let elt = Type::structured(columns.iter().map(Vector::elt_type).collect());
        Self::build(columns, elt)
    }

    pub fn labeled<S: Into<String>>(columns: Vec<(S, Vector)>) -> Self {
        let (fields, columns): (Vec<_>, Vec<_>) = columns
            .into_iter()
            .map(|(label, col)| ((label.into(), col.elt_type()), col))
            .unzip();
        Self::build(columns, Type::labeled(fields))
    }

    fn build(columns: Vec<Vector>, elt: TypeRef) -> Self {
        let len = columns.iter().map(Vector::len).min().unwrap_or(0);
        let elt = if columns.is_empty() {
            STRUCTURED.clone()
        } else {
            elt
        };
        Self { columns, elt, len }
    }

    pub fn columns(&self) -> &[Vector] {
        &self.columns
    }
}

impl Sequence for ZipVector {
    fn ty(&self) -> TypeRef {
        vector_of(self.elt.clone())
    }

    fn len(&self) -> usize {
        self.len
    }

    fn element(&self, idx: usize) -> Result<Value> {
        check_index(idx, self.len)?;
        let components = self
            .columns
            .iter()
            .map(|c| c.element(idx))
            .collect::<Result<Vec<_>>>()?;
        Ok(Tuple::from_parts(self.elt.clone(), Arc::from(components)).into())
    }

    fn column(&self, col: usize) -> Option<Result<Vector>> {
        Some(match self.columns.get(col) {
            Some(column) => column.prefix(self.len),
            None => Err(ValueError::IndexOutOfRange {
                index: col,
                len: self.columns.len(),
            }),
        })
    }
}

/// The component slots of a tuple type, when its arity is known.
pub(crate) fn component_slots(elt: &TypeRef) -> Option<&[Slot]> {
    elt.as_structured()?.components.as_deref()
}

/// The element type of `backing` projected onto `cols`, when known.
pub(crate) fn project_elt(backing: &TypeRef, cols: &[usize]) -> Option<TypeRef> {
    let elt = elt_of(backing);
    let st = elt.as_structured()?;
    let slots = st.components.as_ref()?;
    let picked = cols
        .iter()
        .map(|&c| slots.get(c).cloned())
        .collect::<Option<Vec<_>>>()?;
    let labels = st
        .labels
        .as_ref()
        .map(|ls| cols.iter().map(|&c| ls.get(c).cloned().flatten()).collect());
    Some(Arc::new(Type::Structured(StructuredType::from_slots(
        picked, labels,
    ))))
}

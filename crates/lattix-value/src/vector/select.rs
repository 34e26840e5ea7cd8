//! Row/column selection.
//!
//! A selection over a selection is collapsed into one pair of index arrays
//! against the innermost backing vector, so indirection depth stays at one
//! however many selections are stacked.

use std::sync::Arc;

use lattix_types::{STRUCTURED, TypeRef};
use tracing::debug;

use super::view::{component_slots, project_elt};
use super::{Sequence, Vector, vector_of};
use crate::error::{Result, ValueError, check_index};
use crate::value::{Tuple, Value};

pub struct Selection {
    backing: Vector,
    rows: Option<Arc<[usize]>>,
    cols: Option<Arc<[usize]>>,
    /// Element type after projecting onto `cols`, when the backing arity
    /// is known.
    projected: Option<TypeRef>,
}

/// `outer[i]` for every `i` in `inner`, checked against `outer`'s length.
fn compose(outer: &[usize], inner: &[usize]) -> Result<Arc<[usize]>> {
    inner
        .iter()
        .map(|&i| {
            check_index(i, outer.len())?;
            Ok(outer[i])
        })
        .collect()
}

fn collapse(
    existing: &Option<Arc<[usize]>>,
    requested: Option<Vec<usize>>,
) -> Result<Option<Arc<[usize]>>> {
    Ok(match (existing, requested) {
        (Some(outer), Some(inner)) => Some(compose(outer, &inner)?),
        (Some(outer), None) => Some(outer.clone()),
        (None, requested) => requested.map(Arc::from),
    })
}

impl Selection {
    /// Select `rows` and `cols` of `backing`. Indices are validated here,
    /// not on access.
    pub fn over(
        backing: &Vector,
        rows: Option<Vec<usize>>,
        cols: Option<Vec<usize>>,
    ) -> Result<Vector> {
        if let Some(inner) = backing.as_selection() {
            let rows = collapse(&inner.rows, rows)?;
            let cols = collapse(&inner.cols, cols)?;
            debug!(
                rows = rows.as_ref().map(|r| r.len()),
                cols = cols.as_ref().map(|c| c.len()),
                "collapsed nested selection"
            );
            return Self::build(inner.backing.clone(), rows, cols).map(Vector::new);
        }
        Self::build(backing.clone(), rows.map(Arc::from), cols.map(Arc::from)).map(Vector::new)
    }

    fn build(
        backing: Vector,
        rows: Option<Arc<[usize]>>,
        cols: Option<Arc<[usize]>>,
    ) -> Result<Self> {
        if let Some(rows) = &rows {
            let len = backing.len();
            for &r in rows.iter() {
                check_index(r, len)?;
            }
        }
        let mut projected = None;
        if let Some(cols) = &cols {
            let backing_ty = backing.ty();
            if let Some(slots) = component_slots(&super::elt_of(&backing_ty)) {
                for &c in cols.iter() {
                    check_index(c, slots.len())?;
                }
            }
            projected = project_elt(&backing_ty, cols);
        }
        Ok(Self {
            backing,
            rows,
            cols,
            projected,
        })
    }

    pub fn backing(&self) -> &Vector {
        &self.backing
    }

    /// Selected row indices into the backing vector; `None` keeps every row.
    pub fn rows(&self) -> Option<&[usize]> {
        self.rows.as_deref()
    }

    pub fn columns(&self) -> Option<&[usize]> {
        self.cols.as_deref()
    }

    /// The same row selection applied to `other`, keeping all its columns.
    pub fn copy_row_split(&self, other: &Vector) -> Result<Vector> {
        Self::build(other.clone(), self.rows.clone(), None).map(Vector::new)
    }

    fn row(&self, idx: usize) -> Result<usize> {
        match &self.rows {
            Some(rows) => {
                check_index(idx, rows.len())?;
                Ok(rows[idx])
            }
            None => {
                check_index(idx, self.backing.len())?;
                Ok(idx)
            }
        }
    }

    fn project(&self, row: Value, cols: &[usize]) -> Result<Value> {
        let tuple = row.as_tuple()?;
        let components = cols
            .iter()
            .map(|&c| tuple.component(c).cloned())
            .collect::<Result<Vec<_>>>()?;
        let ty = match &self.projected {
            Some(ty) => ty.clone(),
            None => project_elt(&vector_of(tuple.ty().clone()), cols).ok_or_else(|| {
                ValueError::shape("a tuple with the selected components", tuple.ty())
            })?,
        };
        Ok(Tuple::from_parts(ty, Arc::from(components)).into())
    }
}

impl Sequence for Selection {
    fn ty(&self) -> TypeRef {
        match (&self.cols, &self.projected) {
            (None, _) => self.backing.ty(),
            (Some(_), Some(elt)) => vector_of(elt.clone()),
            (Some(_), None) => vector_of(STRUCTURED.clone()),
        }
    }

    fn len(&self) -> usize {
        match &self.rows {
            Some(rows) => rows.len(),
            None => self.backing.len(),
        }
    }

    fn element(&self, idx: usize) -> Result<Value> {
        let row = self.backing.element(self.row(idx)?)?;
        match &self.cols {
            Some(cols) => self.project(row, cols),
            None => Ok(row),
        }
    }

    fn int_at(&self, idx: usize) -> Result<i64> {
        match self.cols {
            Some(_) => self.element(idx)?.as_int(),
            None => self.backing.int_at(self.row(idx)?),
        }
    }

    fn double_at(&self, idx: usize) -> Result<f64> {
        match self.cols {
            Some(_) => self.element(idx)?.as_double(),
            None => self.backing.double_at(self.row(idx)?),
        }
    }

    fn weight(&self, idx: usize) -> Result<f64> {
        self.backing.weight(self.row(idx)?)
    }

    fn as_selection(&self) -> Option<&Selection> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vector {
        Vector::zip_labeled(vec![
            ("a", Vector::ints(vec![0, 1, 2, 3, 4])),
            ("b", Vector::ints(vec![10, 11, 12, 13, 14])),
            ("c", Vector::ints(vec![20, 21, 22, 23, 24])),
        ])
    }

    #[test]
    fn rows_and_columns() {
        let t = table();
        let s = t.select(Some(vec![4, 0, 2]), Some(vec![2, 0])).expect("valid");
        assert_eq!(s.len(), 3);
        assert_eq!(s.to_string(), "[(c = 24,a = 4),(c = 20,a = 0),(c = 22,a = 2)]");
        for (k, &r) in [4usize, 0, 2].iter().enumerate() {
            let got = s.element(k).expect("row");
            let want = t.element(r).expect("row");
            for (m, &c) in [2usize, 0].iter().enumerate() {
                assert_eq!(
                    got.as_tuple().and_then(|t| t.component(m).cloned()),
                    want.as_tuple().and_then(|t| t.component(c).cloned())
                );
            }
        }
    }

    #[test]
    fn nested_selection_collapses() {
        let t = table();
        let once = t.select(Some(vec![4, 3, 2, 1]), Some(vec![1, 2])).expect("valid");
        let twice = once.select(Some(vec![3, 0]), Some(vec![1])).expect("valid");
        let sel = twice.as_selection().expect("selection");
        assert_eq!(sel.rows(), Some(&[1usize, 4][..]));
        assert_eq!(sel.columns(), Some(&[2usize][..]));
        assert!(sel.backing().as_selection().is_none());
        assert_eq!(twice.to_string(), "[(c = 21),(c = 24)]");
    }

    #[test]
    fn indices_are_validated_eagerly() {
        let t = table();
        assert_eq!(
            t.select(Some(vec![0, 5]), None).map(|_| ()),
            Err(ValueError::IndexOutOfRange { index: 5, len: 5 })
        );
        assert_eq!(
            t.select(None, Some(vec![3])).map(|_| ()),
            Err(ValueError::IndexOutOfRange { index: 3, len: 3 })
        );
        let once = t.select(Some(vec![1, 2]), None).expect("valid");
        assert_eq!(
            once.select(Some(vec![2]), None).map(|_| ()),
            Err(ValueError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn row_split_is_reused() {
        let t = table();
        let train = t.select(Some(vec![0, 2, 4]), None).expect("valid");
        let labels = Vector::from_values(
            ["x", "y", "z", "w", "v"].into_iter().map(Value::str).collect(),
        );
        let split = train
            .as_selection()
            .expect("selection")
            .copy_row_split(&labels)
            .expect("same length");
        assert_eq!(split.to_string(), "[x,z,v]");
    }

    #[test]
    fn weights_follow_rows() {
        let w = Vector::ints(vec![1, 2, 3])
            .weighted(vec![0.1, 0.2, 0.3])
            .expect("lengths match");
        let s = w.select(Some(vec![2, 0]), None).expect("valid");
        assert_eq!(s.weight(0), Ok(0.3));
        assert_eq!(s.int_at(1), Ok(1));
    }
}

use std::sync::Arc;

use lattix_types::TypeRef;

use super::{Sequence, Vector, common_type, vector_of};
use crate::error::{Result, check_index};
use crate::value::Value;

/// Several vectors presented end to end.
pub struct Concat {
    parts: Vec<Vector>,
    /// Global index of the first element of each part.
    starts: Vec<usize>,
    len: usize,
    ty: TypeRef,
}

impl Concat {
    pub fn new(parts: Vec<Vector>) -> Self {
        let mut starts = Vec::with_capacity(parts.len());
        let mut len = 0;
        for part in &parts {
            starts.push(len);
            len += part.len();
        }
        let elts: Vec<TypeRef> = parts.iter().map(Vector::elt_type).collect();
        Self {
            ty: vector_of(common_type(elts.iter())),
            parts,
            starts,
            len,
        }
    }

    /// The part holding global index `idx` and the index within it.
    pub fn locate(&self, idx: usize) -> Result<(usize, usize)> {
        check_index(idx, self.len)?;
        // Empty parts share their start with the next part; the last
        // start not past `idx` is the non-empty one.
        let part = self.starts.partition_point(|&start| start <= idx) - 1;
        Ok((part, idx - self.starts[part]))
    }

    pub fn parts(&self) -> &[Vector] {
        &self.parts
    }
}

impl Sequence for Concat {
    fn ty(&self) -> TypeRef {
        Arc::clone(&self.ty)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn element(&self, idx: usize) -> Result<Value> {
        let (part, local) = self.locate(idx)?;
        self.parts[part].element(local)
    }

    fn int_at(&self, idx: usize) -> Result<i64> {
        let (part, local) = self.locate(idx)?;
        self.parts[part].int_at(local)
    }

    fn double_at(&self, idx: usize) -> Result<f64> {
        let (part, local) = self.locate(idx)?;
        self.parts[part].double_at(local)
    }

    fn weight(&self, idx: usize) -> Result<f64> {
        let (part, local) = self.locate(idx)?;
        self.parts[part].weight(local)
    }
}

#[cfg(test)]
mod tests {
    use lattix_types::DISCRETE;

    use super::*;
    use crate::error::ValueError;

    #[test]
    fn index_mapping_over_three_parts() {
        let c = Concat::new(vec![
            Vector::ints(vec![0, 1, 2]),
            Vector::ints(vec![3, 4, 5, 6, 7]),
            Vector::ints(vec![8, 9]),
        ]);
        assert_eq!(c.len(), 10);
        let expected = [
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 0),
            (1, 1),
            (1, 2),
            (1, 3),
            (1, 4),
            (2, 0),
            (2, 1),
        ];
        for (i, want) in expected.into_iter().enumerate() {
            assert_eq!(c.locate(i), Ok(want), "index {i}");
            assert_eq!(c.int_at(i), Ok(i as i64));
        }
        assert_eq!(
            c.locate(10),
            Err(ValueError::IndexOutOfRange { index: 10, len: 10 })
        );
    }

    #[test]
    fn empty_parts_are_skipped() {
        let c = Concat::new(vec![
            Vector::empty(DISCRETE.clone()),
            Vector::ints(vec![1]),
            Vector::empty(DISCRETE.clone()),
            Vector::empty(DISCRETE.clone()),
            Vector::ints(vec![2, 3]),
            Vector::empty(DISCRETE.clone()),
        ]);
        assert_eq!(c.locate(0), Ok((1, 0)));
        assert_eq!(c.locate(1), Ok((4, 0)));
        assert_eq!(c.locate(2), Ok((4, 1)));
        assert_eq!(Vector::new(c).to_string(), "[1,2,3]");
        assert_eq!(Concat::new(vec![]).len(), 0);
    }

    #[test]
    fn element_type_is_shared_or_any() {
        let same = Concat::new(vec![Vector::ints(vec![1]), Vector::ints(vec![2])]);
        assert_eq!(same.ty().to_string(), format!("[{}]", *DISCRETE));
        let mixed = Concat::new(vec![Vector::ints(vec![1]), Vector::doubles(vec![2.0])]);
        assert_eq!(mixed.ty().to_string(), "[Type]");
    }
}

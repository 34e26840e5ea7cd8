//! Serializable descriptors for types.
//!
//! Standard singletons are written by name so that reading them back yields
//! the very same `TypeRef`, which keeps name-equivalence checks against them
//! working across a save/load. Everything else is written structurally.

use std::collections::BTreeMap;
use std::sync::Arc;

use lattix_diag::{Category, Diagnostic, DiagnosticError};
use serde::{Deserialize, Serialize};

use crate::{
    ContinuousType, DiscreteType, FunctionType, ModelType, ObjectType, ScalarType, Slot,
    StructuredType, Symbols, Type, TypeRef, UnionType, VectorType, standard_name, standard_type,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolsDescriptor {
    Unspecified,
    Known(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    pub ty: TypeDescriptor,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub check_name: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    Standard {
        name: String,
    },
    Any,
    Triv,
    Str,
    Scalar {
        lwb: f64,
        upb: f64,
        cyclic: Option<bool>,
    },
    Discrete {
        lwb: i64,
        upb: i64,
        cyclic: Option<bool>,
        ordered: Option<bool>,
        symbols: Option<SymbolsDescriptor>,
    },
    Continuous {
        lwb: f64,
        upb: f64,
        cyclic: Option<bool>,
    },
    Structured {
        components: Option<Vec<SlotDescriptor>>,
        labels: Option<Vec<Option<String>>>,
    },
    Union {
        alternatives: Vec<SlotDescriptor>,
    },
    Vector {
        elt: Box<SlotDescriptor>,
        index: Box<SlotDescriptor>,
        is_sequence: Option<bool>,
    },
    Function {
        param: Box<SlotDescriptor>,
        result: Box<SlotDescriptor>,
    },
    Object {
        class: Option<String>,
        exact: bool,
        supertypes: Vec<String>,
    },
    Model {
        data: Box<TypeDescriptor>,
        param: Box<TypeDescriptor>,
        shared: Box<TypeDescriptor>,
        sufficient: Box<TypeDescriptor>,
    },
    Variable {
        id: u32,
    },
}

fn describe_slot(slot: &Slot) -> SlotDescriptor {
    SlotDescriptor {
        ty: describe(&slot.ty),
        check_name: slot.check_name,
    }
}

/// Build the descriptor for `ty`.
pub fn describe(ty: &TypeRef) -> TypeDescriptor {
    if let Some(name) = standard_name(ty) {
        return TypeDescriptor::Standard {
            name: name.to_string(),
        };
    }
    match &**ty {
        Type::Any => TypeDescriptor::Any,
        Type::Triv => TypeDescriptor::Triv,
        Type::Str => TypeDescriptor::Str,
        Type::Scalar(s) => TypeDescriptor::Scalar {
            lwb: s.lwb,
            upb: s.upb,
            cyclic: s.cyclic,
        },
        Type::Discrete(d) => TypeDescriptor::Discrete {
            lwb: d.lwb,
            upb: d.upb,
            cyclic: d.cyclic,
            ordered: d.ordered,
            symbols: d.symbols.as_ref().map(|s| match s {
                Symbols::Unspecified => SymbolsDescriptor::Unspecified,
                Symbols::Known(names) => SymbolsDescriptor::Known(names.clone()),
            }),
        },
        Type::Continuous(c) => TypeDescriptor::Continuous {
            lwb: c.lwb,
            upb: c.upb,
            cyclic: c.cyclic,
        },
        Type::Structured(s) => TypeDescriptor::Structured {
            components: s
                .components
                .as_ref()
                .map(|slots| slots.iter().map(describe_slot).collect()),
            labels: s.labels.clone(),
        },
        Type::Union(u) => TypeDescriptor::Union {
            alternatives: u.alternatives.iter().map(describe_slot).collect(),
        },
        Type::Vector(v) => TypeDescriptor::Vector {
            elt: Box::new(describe_slot(&v.elt)),
            index: Box::new(describe_slot(&v.index)),
            is_sequence: v.is_sequence,
        },
        Type::Function(f) => TypeDescriptor::Function {
            param: Box::new(describe_slot(&f.param)),
            result: Box::new(describe_slot(&f.result)),
        },
        Type::Object(o) => TypeDescriptor::Object {
            class: o.class.clone(),
            exact: o.exact,
            supertypes: o.supertypes.clone(),
        },
        Type::Model(m) => TypeDescriptor::Model {
            data: Box::new(describe(&m.data)),
            param: Box::new(describe(&m.param)),
            shared: Box::new(describe(&m.shared)),
            sufficient: Box::new(describe(&m.sufficient)),
        },
        Type::Variable(v) => TypeDescriptor::Variable { id: v.0 },
    }
}

impl TypeDescriptor {
    /// Rebuild the type. Each distinct variable id becomes one fresh
    /// variable, shared by every place the id occurs.
    pub fn resolve(&self) -> Result<TypeRef, DiagnosticError> {
        let mut vars = BTreeMap::new();
        self.resolve_with(&mut vars)
    }

    fn resolve_with(&self, vars: &mut BTreeMap<u32, TypeRef>) -> Result<TypeRef, DiagnosticError> {
        let ty = match self {
            TypeDescriptor::Standard { name } => {
                return standard_type(name).ok_or_else(|| {
                    DiagnosticError::single(
                        Diagnostic::error(
                            Category::Unsupported,
                            format!("unknown standard type `{name}`"),
                        )
                        .with_context("name", name),
                    )
                });
            }
            TypeDescriptor::Variable { id } => {
                return Ok(vars.entry(*id).or_insert_with(Type::variable).clone());
            }
            TypeDescriptor::Any => Type::Any,
            TypeDescriptor::Triv => Type::Triv,
            TypeDescriptor::Str => Type::Str,
            TypeDescriptor::Scalar { lwb, upb, cyclic } => Type::Scalar(ScalarType {
                lwb: *lwb,
                upb: *upb,
                cyclic: *cyclic,
            }),
            TypeDescriptor::Discrete {
                lwb,
                upb,
                cyclic,
                ordered,
                symbols,
            } => Type::Discrete(DiscreteType {
                lwb: *lwb,
                upb: *upb,
                cyclic: *cyclic,
                ordered: *ordered,
                symbols: symbols.as_ref().map(|s| match s {
                    SymbolsDescriptor::Unspecified => Symbols::Unspecified,
                    SymbolsDescriptor::Known(names) => Symbols::Known(names.clone()),
                }),
            }),
            TypeDescriptor::Continuous { lwb, upb, cyclic } => Type::Continuous(ContinuousType {
                lwb: *lwb,
                upb: *upb,
                cyclic: *cyclic,
            }),
            TypeDescriptor::Structured { components, labels } => {
                let components = match components {
                    Some(slots) => Some(
                        slots
                            .iter()
                            .map(|s| s.resolve_with(vars))
                            .collect::<Result<Vec<_>, _>>()?,
                    ),
                    None => None,
                };
                Type::Structured(StructuredType {
                    components,
                    labels: labels.clone(),
                })
            }
            TypeDescriptor::Union { alternatives } => Type::Union(UnionType {
                alternatives: alternatives
                    .iter()
                    .map(|s| s.resolve_with(vars))
                    .collect::<Result<Vec<_>, _>>()?,
            }),
            TypeDescriptor::Vector {
                elt,
                index,
                is_sequence,
            } => Type::Vector(VectorType {
                elt: elt.resolve_with(vars)?,
                index: index.resolve_with(vars)?,
                is_sequence: *is_sequence,
            }),
            TypeDescriptor::Function { param, result } => Type::Function(FunctionType {
                param: param.resolve_with(vars)?,
                result: result.resolve_with(vars)?,
            }),
            TypeDescriptor::Object {
                class,
                exact,
                supertypes,
            } => Type::Object(ObjectType {
                class: class.clone(),
                exact: *exact,
                supertypes: supertypes.clone(),
            }),
            TypeDescriptor::Model {
                data,
                param,
                shared,
                sufficient,
            } => Type::Model(ModelType {
                data: data.resolve_with(vars)?,
                param: param.resolve_with(vars)?,
                shared: shared.resolve_with(vars)?,
                sufficient: sufficient.resolve_with(vars)?,
            }),
        };
        Ok(Arc::new(ty))
    }
}

impl SlotDescriptor {
    fn resolve_with(&self, vars: &mut BTreeMap<u32, TypeRef>) -> Result<Slot, DiagnosticError> {
        Ok(Slot {
            ty: self.ty.resolve_with(vars)?,
            check_name: self.check_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BOOLEAN, DISCRETE, DNA, PROBABILITY, STRING, VECTOR, has_member};

    fn round_trip(ty: &TypeRef) -> TypeRef {
        let json = serde_json::to_string(&describe(ty)).expect("serialize");
        let desc: TypeDescriptor = serde_json::from_str(&json).expect("deserialize");
        desc.resolve().expect("resolve")
    }

    #[test]
    fn standard_types_keep_identity() {
        for ty in [&*BOOLEAN, &*DNA, &*PROBABILITY, &*VECTOR] {
            let back = round_trip(ty);
            assert!(Arc::ptr_eq(&back, ty), "{ty} lost identity");
        }
    }

    #[test]
    fn name_checked_slots_survive_when_pointing_at_standard_types() {
        let ty = Arc::new(Type::Vector(VectorType {
            elt: Slot::named(STRING.clone()),
            ..VectorType::new(STRING.clone())
        }));
        let back = round_trip(&ty);
        assert_eq!(*back, *ty);
        assert!(has_member(&back, &Type::vector(STRING.clone())));
    }

    #[test]
    fn structural_types_round_trip() {
        let ty = Type::labeled(vec![
            ("angle", Type::cyclic_continuous(0.0, 360.0)),
            ("base", Type::symbolic(["a", "c"])),
            ("unbounded", DISCRETE.clone()),
        ]);
        let back = round_trip(&ty);
        assert_eq!(*back, *ty);
        assert!(!Arc::ptr_eq(&back, &ty));
    }

    #[test]
    fn variables_map_consistently() {
        let a = Type::variable();
        let ty = Type::function(a.clone(), Type::vector(a.clone()));
        let back = round_trip(&ty);
        let f = back.as_function().expect("function");
        let Type::Variable(param) = &*f.param.ty else {
            panic!("expected variable");
        };
        let elt = &f.result.ty.as_vector().expect("vector").elt.ty;
        assert!(matches!(&**elt, Type::Variable(v) if v == param));
        assert!(!matches!(&*a, Type::Variable(v) if v == param));
    }

    #[test]
    fn descriptor_json_shape() {
        let json = serde_json::to_value(describe(&Type::discrete(3, 8))).expect("serialize");
        assert_eq!(json["kind"], "discrete");
        assert_eq!(json["lwb"], 3);
        let json = serde_json::to_value(describe(&DNA)).expect("serialize");
        assert_eq!(json, serde_json::json!({"kind": "standard", "name": "DNA"}));
    }

    #[test]
    fn unknown_standard_name_is_an_error() {
        let desc = TypeDescriptor::Standard {
            name: "Quaternion".into(),
        };
        let err = desc.resolve().expect_err("unknown");
        assert_eq!(err.category(), Some(Category::Unsupported));
    }
}

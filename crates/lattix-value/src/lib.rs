//! Runtime values for the lattix type lattice.
//!
//! Every [`Value`] carries the [`TypeRef`](lattix_types::TypeRef) it
//! inhabits. Scalars also carry a [`Status`]. Sequences are [`Vector`]
//! handles over the [`Sequence`] contract, with lazily composed views in
//! [`vector`]. Functions take one argument at a time ([`FnValue`]).
//!
//! Shape and resource failures are [`ValueError`]s. Out-of-range scalars
//! are not errors: they are values with `Status::Invalid`.

mod error;
mod function;
mod model;
mod scratch;
mod status;
mod value;

pub mod builtins;
pub mod vector;

#[cfg(test)]
mod prop_tests;

pub use error::{Result, ValueError};
pub use function::{FnValue, Function};
pub use model::{Model, ModelValue};
pub use scratch::{ScratchContinuous, ScratchDiscrete};
pub use status::Status;
pub use value::{Accuracy, Continuous, DEFAULT_DELTA, Discrete, ObjectValue, Range, Tuple, Value};
pub use vector::{Sequence, Vector};

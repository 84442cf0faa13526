//! # mrwick-core
//!
//! A symbolic algebra engine for second-quantized many-body operator
//! expressions. Given a product of normal-ordered operators over a
//! partitioned orbital basis, the engine enumerates every valid Wick
//! contraction (pairwise contractions in occupied/unoccupied spaces,
//! k-body cumulant clusters in general spaces), canonicalizes each one,
//! and returns a sum of tensor terms with exact rational coefficients and
//! correct Fermi signs.
//!
//! ```rust
//! use mrwick_core::{scalar_int, OperatorExpression, OrbitalSpaces, SpaceKind, WickTheorem};
//!
//! let mut spaces = OrbitalSpaces::new();
//! spaces.add_space("o", SpaceKind::Occupied, &["i", "j", "k", "l"]).unwrap();
//! spaces.add_space("v", SpaceKind::Unoccupied, &["a", "b", "c", "d"]).unwrap();
//!
//! let f = OperatorExpression::operator_sum("f", &["v->o"], &spaces).unwrap();
//! let t = OperatorExpression::operator_sum("t", &["o->v"], &spaces).unwrap();
//!
//! let wt = WickTheorem::new(&spaces);
//! let energy = wt.contract_expression(&scalar_int(1), &(&f * &t), 0, 0).unwrap();
//! assert_eq!(energy.len(), 1);
//! println!("{}", energy.display(&spaces));
//! ```

// Algebra layer: scalars, indices, tensors, operators, terms
pub mod error;
pub mod expression;
pub mod index;
pub mod operator;
pub mod scalar;
pub mod space;
pub mod sqop;
pub mod tensor;
pub mod term;

// Contraction engine: combinatorics, enumeration, canonicalization,
// evaluation, and the facade that ties the phases together
pub mod canonical;
pub mod combinatorics;
pub mod contraction;
pub mod evaluate;
pub mod vertex;
pub mod wick;

// Public algebra API
pub use crate::error::WickError;
pub use crate::expression::Expression;
pub use crate::index::{Index, IndexCounter, IndexMap};
pub use crate::operator::{commutator, Operator, OperatorExpression, OperatorProduct};
pub use crate::scalar::{parse_scalar, scalar, scalar_int, Scalar};
pub use crate::space::{OrbitalSpaces, SpaceKind, MAX_SPACES};
pub use crate::sqop::{SQOperator, SQOperatorKind};
pub use crate::tensor::{Tensor, TensorSymmetry};
pub use crate::term::{Equation, SymbolicTerm};

// Public engine API
pub use crate::contraction::{CompositeContraction, ElementaryContraction};
pub use crate::vertex::Vertex;
pub use crate::wick::{PrintLevel, WickTheorem};

use std::collections::BTreeMap;
use std::ops::{Div, Mul, Neg};

use num_traits::{One, Zero};

use crate::combinatorics::factorial;
use crate::error::WickError;
use crate::scalar::{scalar_int, Scalar};
use crate::space::OrbitalSpaces;
use crate::vertex::Vertex;

/// A normal-ordered many-body operator: a label, a scalar prefactor, and
/// the per-space leg counts of its second-quantized operator string.
///
/// Operators built from a space specification carry the conventional
/// normalization `1 / (prod_s cre_s! * prod_s ann_s!)`, so a two-body
/// amplitude `"oo->vv"` comes with a factor of 1/4.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Operator {
    label: String,
    vertex: Vertex,
    factor: Scalar,
}

impl Operator {
    pub fn new(label: impl Into<String>, factor: Scalar, vertex: Vertex) -> Self {
        Self {
            label: label.into(),
            vertex,
            factor,
        }
    }

    /// Build an operator from a component specification such as `"oo->vv"`
    /// (annihilation labels before `->`, creation labels after), with the
    /// factorial normalization applied.
    pub fn from_spec(
        label: impl Into<String>,
        spec: &str,
        spaces: &OrbitalSpaces,
    ) -> Result<Self, WickError> {
        let vertex = spaces.parse_vertex(spec)?;
        let mut norm = Scalar::one();
        for s in 0..spaces.num_spaces() {
            norm = norm * factorial(vertex.cre(s)) * factorial(vertex.ann(s));
        }
        Ok(Self::new(label, Scalar::one() / norm, vertex))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn factor(&self) -> &Scalar {
        &self.factor
    }

    pub fn vertex(&self) -> &Vertex {
        &self.vertex
    }

    pub fn cre(&self, space: usize) -> usize {
        self.vertex.cre(space)
    }

    pub fn ann(&self, space: usize) -> usize {
        self.vertex.ann(space)
    }

    /// Total number of second-quantized operators.
    pub fn rank(&self) -> usize {
        self.vertex.rank()
    }

    /// `f [o->v]`-style rendering (annihilation spaces before the arrow).
    pub fn display(&self, spaces: &OrbitalSpaces) -> String {
        let mut ann = String::new();
        let mut cre = String::new();
        for s in 0..spaces.num_spaces() {
            for _ in 0..self.vertex.ann(s) {
                ann.push_str(spaces.label(s));
            }
            for _ in 0..self.vertex.cre(s) {
                cre.push_str(spaces.label(s));
            }
        }
        format!("{} [{}->{}]", self.label, ann, cre)
    }
}

/// An ordered product of operators; the non-commutative multiplication unit
/// of the engine.
pub type OperatorProduct = Vec<Operator>;

/// A linear combination of operator products with exact coefficients.
///
/// Products are kept in an ordered map so that iteration (and printing) is
/// deterministic; adding a term whose coefficient cancels removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorExpression {
    terms: BTreeMap<OperatorProduct, Scalar>,
}

impl OperatorExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sum of operators sharing one label, one term per component
    /// specification. This is the usual entry point for building `T1 + T2`
    /// style cluster operators.
    pub fn operator_sum(
        label: &str,
        specs: &[&str],
        spaces: &OrbitalSpaces,
    ) -> Result<Self, WickError> {
        let mut expr = Self::new();
        for spec in specs {
            let op = Operator::from_spec(label, spec, spaces)?;
            expr.add(vec![op], Scalar::one());
        }
        Ok(expr)
    }

    /// A single-operator expression.
    pub fn from_operator(op: Operator) -> Self {
        let mut expr = Self::new();
        expr.add(vec![op], Scalar::one());
        expr
    }

    pub fn add(&mut self, product: OperatorProduct, factor: Scalar) {
        if factor.is_zero() {
            return;
        }
        let entry = self.terms.entry(product);
        match entry {
            std::collections::btree_map::Entry::Occupied(mut o) => {
                let updated = o.get().clone() + factor;
                if updated.is_zero() {
                    o.remove();
                } else {
                    *o.get_mut() = updated;
                }
            }
            std::collections::btree_map::Entry::Vacant(v) => {
                v.insert(factor);
            }
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = (&OperatorProduct, &Scalar)> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn display(&self, spaces: &OrbitalSpaces) -> String {
        let mut lines = Vec::new();
        for (product, factor) in &self.terms {
            let ops = product
                .iter()
                .map(|op| op.display(spaces))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(format!("{factor} {ops}"));
        }
        lines.join("\n")
    }
}

impl std::ops::AddAssign<&OperatorExpression> for OperatorExpression {
    fn add_assign(&mut self, rhs: &OperatorExpression) {
        for (product, factor) in &rhs.terms {
            self.add(product.clone(), factor.clone());
        }
    }
}

impl std::ops::SubAssign<&OperatorExpression> for OperatorExpression {
    fn sub_assign(&mut self, rhs: &OperatorExpression) {
        for (product, factor) in &rhs.terms {
            self.add(product.clone(), -factor.clone());
        }
    }
}

impl std::ops::Add for &OperatorExpression {
    type Output = OperatorExpression;
    fn add(self, rhs: &OperatorExpression) -> OperatorExpression {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl std::ops::Sub for &OperatorExpression {
    type Output = OperatorExpression;
    fn sub(self, rhs: &OperatorExpression) -> OperatorExpression {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl Mul for &OperatorExpression {
    type Output = OperatorExpression;

    /// Concatenates operator strings pairwise and multiplies coefficients.
    fn mul(self, rhs: &OperatorExpression) -> OperatorExpression {
        let mut out = OperatorExpression::new();
        for (lhs_product, lhs_factor) in &self.terms {
            for (rhs_product, rhs_factor) in &rhs.terms {
                let mut product = lhs_product.clone();
                product.extend(rhs_product.iter().cloned());
                out.add(product, lhs_factor * rhs_factor);
            }
        }
        out
    }
}

impl Mul<&Scalar> for &OperatorExpression {
    type Output = OperatorExpression;
    fn mul(self, rhs: &Scalar) -> OperatorExpression {
        let mut out = OperatorExpression::new();
        for (product, factor) in &self.terms {
            out.add(product.clone(), factor * rhs);
        }
        out
    }
}

impl Div<&Scalar> for &OperatorExpression {
    type Output = OperatorExpression;
    fn div(self, rhs: &Scalar) -> OperatorExpression {
        let mut out = OperatorExpression::new();
        for (product, factor) in &self.terms {
            out.add(product.clone(), factor / rhs);
        }
        out
    }
}

impl Neg for &OperatorExpression {
    type Output = OperatorExpression;
    fn neg(self) -> OperatorExpression {
        self * &scalar_int(-1)
    }
}

/// `[A, B] = A*B - B*A`.
pub fn commutator(a: &OperatorExpression, b: &OperatorExpression) -> OperatorExpression {
    &(a * b) - &(b * a)
}

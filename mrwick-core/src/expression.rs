use std::collections::BTreeMap;
use std::ops::{Div, Mul};

use num_traits::Zero;

use crate::error::WickError;
use crate::index::Index;
use crate::scalar::{parse_scalar, Scalar};
use crate::space::OrbitalSpaces;
use crate::sqop::SQOperator;
use crate::tensor::{Tensor, TensorSymmetry};
use crate::term::{Equation, SymbolicTerm};

/// A sum of symbolic terms with exact coefficients, the engine's output
/// type.
///
/// Terms are kept in an ordered map keyed by their canonical form;
/// accumulation is `+=` with zero coefficients dropped, so algebraically
/// cancelling contributions disappear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expression {
    terms: BTreeMap<SymbolicTerm, Scalar>,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, term: SymbolicTerm, factor: Scalar) {
        if factor.is_zero() {
            return;
        }
        match self.terms.entry(term) {
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

    pub fn terms(&self) -> impl Iterator<Item = (&SymbolicTerm, &Scalar)> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Coefficient of a term, if present.
    pub fn coefficient(&self, term: &SymbolicTerm) -> Option<&Scalar> {
        self.terms.get(term)
    }

    /// Largest leftover-operator rank over all terms.
    pub fn max_rank(&self) -> usize {
        self.terms.keys().map(SymbolicTerm::rank).max().unwrap_or(0)
    }

    /// Project terms with leftover operators onto many-body equations: the
    /// leftover operator string of each term becomes a residual tensor with
    /// the given label (creation indices lower, annihilation indices
    /// upper), and the term's tensors become the right-hand side.
    pub fn to_manybody_equations(&self, label: &str) -> Vec<Equation> {
        let mut equations = Vec::new();
        for (term, factor) in &self.terms {
            if term.rank() == 0 {
                continue;
            }
            let lower: Vec<_> = term
                .sqops()
                .iter()
                .filter(|op| op.is_creation())
                .map(SQOperator::index)
                .collect();
            let upper: Vec<_> = term
                .sqops()
                .iter()
                .filter(|op| !op.is_creation())
                .map(SQOperator::index)
                .collect();
            let lhs = Tensor::new(label, lower, upper, TensorSymmetry::Antisymmetric);
            let mut rhs = SymbolicTerm::new();
            for tensor in term.tensors() {
                rhs.add_tensor(tensor.clone());
            }
            equations.push(Equation::new(lhs, rhs, factor.clone()));
        }
        equations
    }

    /// Parse an expression, one term per line:
    /// `[rational] tensor... [sqop...]`, e.g.
    /// `1/4 t^{o0,o1}_{v0,v1} v^{v0,v1}_{o0,o1}` or
    /// `-1 f^{o0}_{o1} t^{o1}_{v0} a+(v0) a-(o0)`.
    /// Parsed terms are canonicalized before accumulation.
    pub fn parse(text: &str, spaces: &OrbitalSpaces) -> Result<Self, WickError> {
        let mut expr = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (term, factor) = parse_term_line(line, spaces)?;
            expr.add_term(term, factor);
        }
        Ok(expr)
    }

    pub fn display(&self, spaces: &OrbitalSpaces) -> String {
        self.terms
            .iter()
            .map(|(term, factor)| format!("{} {}", factor, term.display(spaces)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::ops::AddAssign<&Expression> for Expression {
    fn add_assign(&mut self, rhs: &Expression) {
        for (term, factor) in &rhs.terms {
            self.add_term(term.clone(), factor.clone());
        }
    }
}

impl std::ops::SubAssign<&Expression> for Expression {
    fn sub_assign(&mut self, rhs: &Expression) {
        for (term, factor) in &rhs.terms {
            self.add_term(term.clone(), -factor.clone());
        }
    }
}

impl std::ops::Add for &Expression {
    type Output = Expression;
    fn add(self, rhs: &Expression) -> Expression {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl std::ops::Sub for &Expression {
    type Output = Expression;
    fn sub(self, rhs: &Expression) -> Expression {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl Mul<&Scalar> for &Expression {
    type Output = Expression;
    fn mul(self, rhs: &Scalar) -> Expression {
        let mut out = Expression::new();
        for (term, factor) in &self.terms {
            out.add_term(term.clone(), factor * rhs);
        }
        out
    }
}

impl Div<&Scalar> for &Expression {
    type Output = Expression;
    fn div(self, rhs: &Scalar) -> Expression {
        let mut out = Expression::new();
        for (term, factor) in &self.terms {
            out.add_term(term.clone(), factor / rhs);
        }
        out
    }
}

fn parse_term_line(
    line: &str,
    spaces: &OrbitalSpaces,
) -> Result<(SymbolicTerm, Scalar), WickError> {
    let mut factor: Option<Scalar> = None;
    let mut term = SymbolicTerm::new();
    for (i, token) in line.split_whitespace().enumerate() {
        if i == 0 {
            if let Ok(value) = parse_scalar(token) {
                factor = Some(value);
                continue;
            }
        }
        if let Some(rest) = token.strip_prefix("a+(") {
            let name = rest.strip_suffix(')').ok_or_else(|| bad_token(token))?;
            term.add_sqop(SQOperator::creation(spaces.parse_index(name)?));
        } else if let Some(rest) = token.strip_prefix("a-(") {
            let name = rest.strip_suffix(')').ok_or_else(|| bad_token(token))?;
            term.add_sqop(SQOperator::annihilation(spaces.parse_index(name)?));
        } else {
            term.add_tensor(parse_tensor(token, spaces)?);
        }
    }
    if term.tensors().is_empty() && term.sqops().is_empty() {
        return Err(WickError::Parse(format!("empty term in line '{line}'")));
    }
    let mut factor = factor.unwrap_or_else(|| Scalar::from_integer(1.into()));
    factor = factor * term.canonicalize();
    Ok((term, factor))
}

fn parse_tensor(token: &str, spaces: &OrbitalSpaces) -> Result<Tensor, WickError> {
    let (label, rest) = token
        .split_once("^{")
        .ok_or_else(|| bad_token(token))?;
    let (upper_part, rest) = rest.split_once("}_{").ok_or_else(|| bad_token(token))?;
    let lower_part = rest.strip_suffix('}').ok_or_else(|| bad_token(token))?;
    if label.is_empty() {
        return Err(bad_token(token));
    }
    let upper = parse_index_list(upper_part, spaces)?;
    let lower = parse_index_list(lower_part, spaces)?;
    Ok(Tensor::new(
        label,
        lower,
        upper,
        TensorSymmetry::Antisymmetric,
    ))
}

fn parse_index_list(part: &str, spaces: &OrbitalSpaces) -> Result<Vec<Index>, WickError> {
    if part.trim().is_empty() {
        return Ok(Vec::new());
    }
    part.split(',')
        .map(|name| spaces.parse_index(name.trim()))
        .collect()
}

fn bad_token(token: &str) -> WickError {
    WickError::Parse(format!("malformed term token '{token}'"))
}

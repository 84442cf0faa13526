use crate::canonical::canonicalize_contraction;
use crate::contraction::{composite_contractions, elementary_contractions};
use crate::error::WickError;
use crate::evaluate::evaluate_contraction;
use crate::expression::Expression;
use crate::operator::{Operator, OperatorExpression};
use crate::scalar::Scalar;
use crate::space::OrbitalSpaces;
use crate::vertex::vertices_rank;

/// Diagnostic verbosity of the engine. Reporting only: results are
/// identical at every level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrintLevel {
    #[default]
    None,
    Basic,
    Summary,
    Detailed,
    All,
}

/// The contraction engine.
///
/// `contract` runs the three phases in order: enumerate the elementary
/// contractions of the operator string, generate all composite
/// contractions whose leftover rank falls in the requested band by
/// backtracking, then canonicalize and evaluate each composite and
/// accumulate the resulting terms. Nothing is shared between calls except
/// the orbital-space registry, which is read-only.
pub struct WickTheorem<'a> {
    spaces: &'a OrbitalSpaces,
    max_cumulant: usize,
    print: PrintLevel,
}

impl<'a> WickTheorem<'a> {
    pub fn new(spaces: &'a OrbitalSpaces) -> Self {
        Self {
            spaces,
            max_cumulant: 2,
            print: PrintLevel::None,
        }
    }

    /// Cap the cumulant half-rank admitted in general spaces.
    pub fn set_max_cumulant(&mut self, max_cumulant: usize) {
        self.max_cumulant = max_cumulant;
    }

    pub fn set_print(&mut self, print: PrintLevel) {
        self.print = print;
    }

    /// Contract an operator string, keeping terms whose leftover operator
    /// rank lies in `[minrank, maxrank]`. An empty band is not an error:
    /// the result is the empty expression.
    pub fn contract(
        &self,
        factor: &Scalar,
        ops: &[Operator],
        minrank: usize,
        maxrank: usize,
    ) -> Result<Expression, WickError> {
        if self.print >= PrintLevel::Summary {
            let labels: Vec<_> = ops.iter().map(|op| op.display(self.spaces)).collect();
            println!("[contract] operators: {}", labels.join("  "));
        }

        let elementary = elementary_contractions(ops, self.spaces, self.max_cumulant);
        if self.print >= PrintLevel::Summary {
            println!("[contract] {} elementary contractions", elementary.len());
            if self.print >= PrintLevel::Detailed {
                for (i, contraction) in elementary.iter().enumerate() {
                    let cols: Vec<String> =
                        contraction.iter().map(|v| v.to_string()).collect();
                    println!("  {:3}: {}", i, cols.join(" "));
                }
            }
        }

        let composites = composite_contractions(ops, &elementary, minrank, maxrank)?;
        if self.print >= PrintLevel::Summary {
            println!("[contract] {} composite contractions", composites.len());
        }

        let mut result = Expression::new();
        for composite in &composites {
            let (canonical_ops, canonical_contractions) =
                canonicalize_contraction(ops, composite, &elementary)?;

            let (mut term, coefficient) = evaluate_contraction(
                &canonical_ops,
                &canonical_contractions,
                factor,
                self.spaces,
            )?;
            let canonicalize_factor = term.canonicalize();
            let coefficient = coefficient * canonicalize_factor;

            if self.print >= PrintLevel::Basic {
                let free_rank = vertices_rank(
                    &canonical_ops
                        .iter()
                        .map(|op| *op.vertex())
                        .collect::<Vec<_>>(),
                ) - composite
                    .iter()
                    .map(|&c| vertices_rank(&elementary[c]))
                    .sum::<usize>();
                println!(
                    "[contract]   rank {}: {} {}",
                    free_rank,
                    coefficient,
                    term.display(self.spaces)
                );
            }

            result.add_term(term, coefficient);
        }

        if result.is_empty() && self.print >= PrintLevel::Summary {
            println!("[contract] no contractions in the requested rank band");
        }
        Ok(result)
    }

    /// Contract a sum of operator strings, distributing linearly.
    pub fn contract_expression(
        &self,
        factor: &Scalar,
        expr: &OperatorExpression,
        minrank: usize,
        maxrank: usize,
    ) -> Result<Expression, WickError> {
        let mut result = Expression::new();
        for (product, product_factor) in expr.terms() {
            let term_factor = factor * product_factor;
            let contracted = self.contract(&term_factor, product, minrank, maxrank)?;
            result += &contracted;
        }
        Ok(result)
    }
}

use std::collections::HashMap;

use crate::combinatorics::permutation_parity;
use crate::index::{Index, IndexMap};
use crate::scalar::{scalar_int, Scalar};
use crate::space::OrbitalSpaces;
use crate::sqop::SQOperator;
use crate::tensor::{Tensor, TensorSymmetry};

/// A product of tensors and leftover second-quantized operators, the value
/// side of one term in an `Expression`.
///
/// Terms are compared and hashed structurally, so two terms coalesce in an
/// expression only if `canonicalize` has brought them to the same normal
/// form first.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolicTerm {
    tensors: Vec<Tensor>,
    sqops: Vec<SQOperator>,
}

impl SymbolicTerm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tensor(&mut self, tensor: Tensor) {
        self.tensors.push(tensor);
    }

    pub fn add_sqop(&mut self, sqop: SQOperator) {
        self.sqops.push(sqop);
    }

    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    pub fn sqops(&self) -> &[SQOperator] {
        &self.sqops
    }

    /// Number of leftover second-quantized operators.
    pub fn rank(&self) -> usize {
        self.sqops.len()
    }

    /// Apply an index substitution to every tensor and operator.
    pub fn reindex(&mut self, map: &IndexMap) {
        for tensor in &mut self.tensors {
            tensor.reindex(map);
        }
        for sqop in &mut self.sqops {
            sqop.reindex(map);
        }
    }

    /// Bring the term to its normal form and return the induced scalar.
    ///
    /// Antisymmetric tensors get sorted index lists (each inversion flips
    /// the sign), operators normal-order to creators-then-annihilators
    /// ascending by index (their permutation parity flips the sign),
    /// tensors order label-first, and indices relabel per space in order of
    /// first appearance. The returned scalar must be multiplied into the
    /// term's coefficient.
    pub fn canonicalize(&mut self) -> Scalar {
        let mut sign = 1i32;

        sign *= self.sort_tensor_indices();
        sign *= sort_with_parity(&mut self.sqops);
        self.tensors.sort();

        let relabel = self.first_appearance_relabeling();
        self.reindex(&relabel);

        // relabeling can reorder lists that were sorted under the old names
        sign *= self.sort_tensor_indices();
        sign *= sort_with_parity(&mut self.sqops);
        self.tensors.sort();

        scalar_int(sign as i64)
    }

    fn sort_tensor_indices(&mut self) -> i32 {
        let mut sign = 1;
        for tensor in &mut self.tensors {
            if tensor.symmetry() == TensorSymmetry::Antisymmetric {
                sign *= sort_with_parity(tensor.upper_mut());
                sign *= sort_with_parity(tensor.lower_mut());
            }
        }
        sign
    }

    // Fresh per-space numbering in order of first appearance: leftover
    // operators first (they carry the external indices), then tensors.
    fn first_appearance_relabeling(&self) -> IndexMap {
        let mut map = IndexMap::new();
        let mut counters: HashMap<usize, usize> = HashMap::new();
        let visit = |index: Index, map: &mut IndexMap, counters: &mut HashMap<usize, usize>| {
            if !map.contains_key(&index) {
                let counter = counters.entry(index.space).or_insert(0);
                map.insert(index, Index::new(index.space, *counter));
                *counter += 1;
            }
        };
        for sqop in &self.sqops {
            visit(sqop.index(), &mut map, &mut counters);
        }
        for tensor in &self.tensors {
            for &index in tensor.upper() {
                visit(index, &mut map, &mut counters);
            }
            for &index in tensor.lower() {
                visit(index, &mut map, &mut counters);
            }
        }
        map
    }

    pub fn display(&self, spaces: &OrbitalSpaces) -> String {
        let mut parts: Vec<String> = self
            .tensors
            .iter()
            .map(|t| t.display(spaces))
            .collect();
        parts.extend(self.sqops.iter().map(|op| op.display(spaces)));
        parts.join(" ")
    }
}

/// Sort in place, returning the parity (+1/-1) of the rearrangement.
/// The sort is stable so equal elements contribute no sign.
fn sort_with_parity<T: Ord + Clone>(items: &mut Vec<T>) -> i32 {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[a].cmp(&items[b]).then(a.cmp(&b)));
    let parity = permutation_parity(&order);
    *items = order.iter().map(|&i| items[i].clone()).collect();
    parity
}

/// One projected many-body equation: `factor * lhs = rhs`-style rows
/// produced from terms whose leftover operators match a residual label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equation {
    lhs: Tensor,
    rhs: SymbolicTerm,
    factor: Scalar,
}

impl Equation {
    pub fn new(lhs: Tensor, rhs: SymbolicTerm, factor: Scalar) -> Self {
        Self { lhs, rhs, factor }
    }

    pub fn lhs(&self) -> &Tensor {
        &self.lhs
    }

    pub fn rhs(&self) -> &SymbolicTerm {
        &self.rhs
    }

    pub fn factor(&self) -> &Scalar {
        &self.factor
    }

    pub fn display(&self, spaces: &OrbitalSpaces) -> String {
        format!(
            "{} = {} {}",
            self.lhs.display(spaces),
            self.factor,
            self.rhs.display(spaces)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::scalar_int;
    use crate::space::SpaceKind;

    fn spaces() -> OrbitalSpaces {
        let mut spaces = OrbitalSpaces::new();
        spaces.add_space("o", SpaceKind::Occupied, &[]).unwrap();
        spaces.add_space("v", SpaceKind::Unoccupied, &[]).unwrap();
        spaces
    }

    fn o(n: usize) -> Index {
        Index::new(0, n)
    }

    fn v(n: usize) -> Index {
        Index::new(1, n)
    }

    #[test]
    fn antisymmetric_index_sort_flips_sign() {
        let mut term = SymbolicTerm::new();
        term.add_tensor(Tensor::new(
            "v",
            vec![o(0), o(1)],
            vec![v(1), v(0)],
            TensorSymmetry::Antisymmetric,
        ));
        let sign = term.canonicalize();
        assert_eq!(sign, scalar_int(-1));
        assert_eq!(term.tensors()[0].upper(), &[v(0), v(1)]);
    }

    #[test]
    fn double_swap_cancels() {
        let mut term = SymbolicTerm::new();
        term.add_tensor(Tensor::new(
            "v",
            vec![o(1), o(0)],
            vec![v(1), v(0)],
            TensorSymmetry::Antisymmetric,
        ));
        assert_eq!(term.canonicalize(), scalar_int(1));
    }

    #[test]
    fn relabeling_closes_gaps() {
        let mut term = SymbolicTerm::new();
        term.add_tensor(Tensor::new(
            "f",
            vec![v(3)],
            vec![o(2)],
            TensorSymmetry::Antisymmetric,
        ));
        term.canonicalize();
        assert_eq!(term.tensors()[0].upper(), &[o(0)]);
        assert_eq!(term.tensors()[0].lower(), &[v(0)]);
    }

    #[test]
    fn equal_terms_canonicalize_identically() {
        let mut a = SymbolicTerm::new();
        a.add_tensor(Tensor::new(
            "t",
            vec![v(0)],
            vec![o(0)],
            TensorSymmetry::Antisymmetric,
        ));
        a.add_tensor(Tensor::new(
            "f",
            vec![o(0)],
            vec![v(0)],
            TensorSymmetry::Antisymmetric,
        ));
        let mut b = SymbolicTerm::new();
        b.add_tensor(Tensor::new(
            "f",
            vec![o(5)],
            vec![v(2)],
            TensorSymmetry::Antisymmetric,
        ));
        b.add_tensor(Tensor::new(
            "t",
            vec![v(2)],
            vec![o(5)],
            TensorSymmetry::Antisymmetric,
        ));
        a.canonicalize();
        b.canonicalize();
        assert_eq!(a, b);
    }

    #[test]
    fn sqop_normal_ordering_sign() {
        let mut term = SymbolicTerm::new();
        term.add_sqop(SQOperator::annihilation(o(0)));
        term.add_sqop(SQOperator::creation(v(0)));
        let sign = term.canonicalize();
        assert_eq!(sign, scalar_int(-1));
        assert!(term.sqops()[0].is_creation());
    }

    #[test]
    fn display_joins_tensors_and_operators() {
        let mut term = SymbolicTerm::new();
        term.add_tensor(Tensor::new(
            "f",
            vec![v(0)],
            vec![o(0)],
            TensorSymmetry::Antisymmetric,
        ));
        term.add_sqop(SQOperator::creation(v(0)));
        term.add_sqop(SQOperator::annihilation(o(0)));
        assert_eq!(term.display(&spaces()), "f^{o0}_{v0} a+(v0) a-(o0)");
    }
}

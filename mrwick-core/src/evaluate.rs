use std::collections::{BTreeMap, HashMap};

use num_traits::One;

use crate::combinatorics::{binomial, permutation_parity};
use crate::contraction::ElementaryContraction;
use crate::error::WickError;
use crate::index::{Index, IndexCounter, IndexMap};
use crate::operator::Operator;
use crate::scalar::{scalar_int, Scalar};
use crate::space::{OrbitalSpaces, SpaceKind};
use crate::sqop::{SQOperator, SQOperatorKind};
use crate::tensor::{Tensor, TensorSymmetry};
use crate::term::SymbolicTerm;
use crate::vertex::{vertices_rank, vertices_space, Vertex};

// (operator position, space, is_creation, slot) -> position in the sqop
// layout. Slots for annihilation legs are logical slots (the reversed
// physical emission order), so contraction lookups consume slot offsets
// from the left on both sides.
type OpMap = HashMap<(usize, usize, bool, usize), usize>;

/// Evaluate one canonical contraction into a symbolic term and its scalar
/// (Fermi sign x caller/operator factors x combinatorial factor).
pub fn evaluate_contraction(
    ops: &[Operator],
    contractions: &[ElementaryContraction],
    factor: &Scalar,
    spaces: &OrbitalSpaces,
) -> Result<(SymbolicTerm, Scalar), WickError> {
    // 1. lay out the operators' tensors and second-quantized operators
    let (mut tensors, sqops, op_map) = materialize_operators(ops, spaces);

    // 2. walk the contractions, marking contracted sqops in order, and
    // collect the reindexings / cumulant tensors they induce
    let mut ops_offset = vec![Vertex::new(); ops.len()];
    let mut sign_order: Vec<Option<usize>> = vec![None; sqops.len()];
    let mut sorted_position = 0usize;
    let mut nsqops_contracted = 0usize;

    // compensates for pair contractions whose canonical tensor form puts
    // the annihilator before the creator
    let mut unoccupied_sign = 1i64;

    let mut reindex_map = IndexMap::new();

    for contraction in contractions {
        let rank = vertices_rank(contraction);
        let s = vertices_space(contraction).ok_or_else(|| {
            WickError::InvariantViolation("contraction with no active space".into())
        })?;
        nsqops_contracted += rank;

        let pos_cre = contraction_positions(contraction, &mut ops_offset, &op_map, s, true)?;
        let pos_ann = contraction_positions(contraction, &mut ops_offset, &op_map, s, false)?;

        for &c in &pos_cre {
            sign_order[c] = Some(sorted_position);
            sorted_position += 1;
        }
        for &a in &pos_ann {
            sign_order[a] = Some(sorted_position);
            sorted_position += 1;
        }

        match spaces.kind(s) {
            SpaceKind::Occupied => {
                // delta contraction: identify the annihilator's index with
                // the creator's
                reindex_map.insert(sqops[pos_ann[0]].index(), sqops[pos_cre[0]].index());
            }
            SpaceKind::Unoccupied => {
                reindex_map.insert(sqops[pos_cre[0]].index(), sqops[pos_ann[0]].index());
                unoccupied_sign = -unoccupied_sign;
            }
            SpaceKind::General => {
                let upper: Vec<Index> = pos_cre.iter().map(|&c| sqops[c].index()).collect();
                let mut lower: Vec<Index> = pos_ann.iter().map(|&a| sqops[a].index()).collect();
                lower.reverse();
                let label = if rank == 2 {
                    if pos_cre[0] < pos_ann[0] {
                        "gamma1".to_string()
                    } else {
                        unoccupied_sign = -unoccupied_sign;
                        "eta1".to_string()
                    }
                } else {
                    format!("lambda{}", rank / 2)
                };
                tensors.push(Tensor::new(label, lower, upper, TensorSymmetry::Antisymmetric));
            }
        }
    }

    // 3. order the uncontracted operators: creators before annihilators,
    // by ascending space, then by order of appearance
    for kind in [SQOperatorKind::Creation, SQOperatorKind::Annihilation] {
        for s in 0..spaces.num_spaces() {
            for (i, sqop) in sqops.iter().enumerate() {
                if sign_order[i].is_none() && sqop.index().space == s && sqop.kind() == kind {
                    sign_order[i] = Some(sorted_position);
                    sorted_position += 1;
                }
            }
        }
    }

    // 4. Fermi sign from the full permutation, then keep the survivors
    let order: Vec<usize> = sign_order
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| {
                WickError::InvariantViolation(format!("sqop {i} never received a position"))
            })
        })
        .collect::<Result<_, _>>()?;
    let sign = unoccupied_sign * i64::from(permutation_parity(&order));

    let mut sorted_sqops: Vec<(usize, SQOperator)> = order
        .iter()
        .zip(sqops.iter())
        .map(|(&slot, &sqop)| (slot, sqop))
        .collect();
    sorted_sqops.sort_by_key(|&(slot, _)| slot);
    let leftover = sorted_sqops.split_off(nsqops_contracted);

    let comb_factor = combinatorial_factor(ops, contractions, spaces)?;

    // 5. assemble
    let mut term = SymbolicTerm::new();
    for tensor in tensors {
        term.add_tensor(tensor);
    }
    for (_, sqop) in leftover {
        term.add_sqop(sqop);
    }
    term.reindex(&reindex_map);

    let mut coefficient = factor.clone();
    for op in ops {
        coefficient = coefficient * op.factor();
    }
    Ok((term, scalar_int(sign) * coefficient * comb_factor))
}

/// Lay out each operator's second-quantized operators left to right and
/// build its tensor.
///
/// Creators come first in ascending space order (the tensor's lower
/// indices); annihilators follow in descending space and slot order, so
/// the tensor's upper indices are their reverse. The returned map locates
/// the sqop belonging to each (position, space, kind, slot) leg.
fn materialize_operators(
    ops: &[Operator],
    spaces: &OrbitalSpaces,
) -> (Vec<Tensor>, Vec<SQOperator>, OpMap) {
    let mut tensors = Vec::with_capacity(ops.len());
    let mut sqops = Vec::new();
    let mut op_map = OpMap::new();
    let mut counter = IndexCounter::new(spaces.num_spaces());

    for (o, op) in ops.iter().enumerate() {
        let mut lower = Vec::new();
        for s in 0..spaces.num_spaces() {
            for c in 0..op.cre(s) {
                let idx = Index::new(s, counter.next(s));
                op_map.insert((o, s, true, c), sqops.len());
                sqops.push(SQOperator::creation(idx));
                lower.push(idx);
            }
        }

        let mut upper = Vec::new();
        for s in (0..spaces.num_spaces()).rev() {
            for a in (0..op.ann(s)).rev() {
                let idx = Index::new(s, counter.next(s));
                op_map.insert((o, s, false, a), sqops.len());
                sqops.push(SQOperator::annihilation(idx));
                upper.push(idx);
            }
        }
        upper.reverse();

        tensors.push(Tensor::new(
            op.label(),
            lower,
            upper,
            TensorSymmetry::Antisymmetric,
        ));
    }
    (tensors, sqops, op_map)
}

// Resolve the sqop positions consumed by one contraction on one side
// (creation or annihilation), advancing the per-position slot offsets.
fn contraction_positions(
    contraction: &ElementaryContraction,
    ops_offset: &mut [Vertex],
    op_map: &OpMap,
    s: usize,
    creation: bool,
) -> Result<Vec<usize>, WickError> {
    let mut positions = Vec::new();
    for (v, vertex) in contraction.iter().enumerate() {
        let legs = if creation { vertex.cre(s) } else { vertex.ann(s) };
        let offset = if creation {
            ops_offset[v].cre(s)
        } else {
            ops_offset[v].ann(s)
        };
        for i in 0..legs {
            let key = (v, s, creation, offset + i);
            let pos = op_map.get(&key).ok_or_else(|| {
                WickError::InvariantViolation(format!(
                    "no sqop for operator {v}, space {s}, {} slot {}",
                    if creation { "creation" } else { "annihilation" },
                    offset + i
                ))
            })?;
            positions.push(*pos);
        }
        if creation {
            ops_offset[v].set_cre(s, offset + legs);
        } else {
            ops_offset[v].set_ann(s, offset + legs);
        }
    }
    Ok(positions)
}

/// Product of the binomial choices made by each contraction (which of the
/// remaining free legs it takes, per position and space), divided by the
/// multiplicity of every repeated elementary contraction.
fn combinatorial_factor(
    ops: &[Operator],
    contractions: &[ElementaryContraction],
    spaces: &OrbitalSpaces,
) -> Result<Scalar, WickError> {
    let mut factor = Scalar::one();

    let mut free: Vec<Vertex> = ops.iter().map(|op| *op.vertex()).collect();
    for contraction in contractions {
        for (v, vertex) in contraction.iter().enumerate() {
            for s in 0..spaces.num_spaces() {
                factor = factor * binomial(free[v].cre(s), vertex.cre(s));
                factor = factor * binomial(free[v].ann(s), vertex.ann(s));
            }
            free[v] = free[v].checked_sub(vertex)?;
        }
    }

    let mut multiplicity: BTreeMap<&ElementaryContraction, usize> = BTreeMap::new();
    for contraction in contractions {
        *multiplicity.entry(contraction).or_insert(0) += 1;
    }
    for count in multiplicity.values() {
        factor = factor / scalar_int(*count as i64);
    }
    Ok(factor)
}

use itertools::Itertools;

use crate::contraction::{CompositeContraction, ElementaryContraction};
use crate::error::WickError;
use crate::operator::Operator;
use crate::vertex::{vertices_signature, Vertex};

/// Canonicalize one composite contraction: choose, among all joint
/// relabelings of operator positions and contraction order, the
/// representative with the lexicographically smallest signature.
///
/// The operator permutation is constrained by connectivity: two operators
/// joined by a contraction may not change relative order (each position's
/// earlier-connected neighbors must stay to its left), which is what makes
/// the later sign computation well defined. For a given operator
/// permutation, the contraction order is forced: contractions sort by their
/// permuted vertex vectors. The sign consequence of the reordering is not
/// computed here; it falls out of the evaluation step's permutation parity.
///
/// Only operators with an even number of second-quantized operators are
/// supported.
pub fn canonicalize_contraction(
    ops: &[Operator],
    composite: &CompositeContraction,
    elementary: &[ElementaryContraction],
) -> Result<(Vec<Operator>, Vec<ElementaryContraction>), WickError> {
    for op in ops {
        if op.rank() % 2 != 0 {
            return Err(WickError::OddRankOperator {
                label: op.label().to_string(),
                rank: op.rank(),
            });
        }
    }

    let nops = ops.len();
    let contractions: Vec<&ElementaryContraction> =
        composite.iter().map(|&c| &elementary[c]).collect();

    let left_masks = left_connectivity_masks(nops, &contractions);

    let mut best: Option<(String, Vec<usize>, Vec<usize>)> = None;
    for ops_perm in (0..nops).permutations(nops) {
        if !is_allowed(&ops_perm, &left_masks) {
            continue;
        }

        // the contraction order is the stable sort of the permuted vertex
        // vectors; ties keep their original relative order
        let mut sorted: Vec<(Vec<Vertex>, usize)> = contractions
            .iter()
            .enumerate()
            .map(|(i, contraction)| {
                let permuted: Vec<Vertex> =
                    ops_perm.iter().map(|&j| contraction[j]).collect();
                (permuted, i)
            })
            .collect();
        sorted.sort();
        let contr_perm: Vec<usize> = sorted.iter().map(|&(_, i)| i).collect();

        let signature = contraction_signature(ops, &contractions, &ops_perm, &contr_perm);
        let candidate = (signature, ops_perm, contr_perm);
        if best.as_ref().map_or(true, |b| candidate < *b) {
            best = Some(candidate);
        }
    }

    let (_, ops_perm, contr_perm) = best.ok_or_else(|| {
        WickError::InvariantViolation("no allowed operator permutation found".into())
    })?;

    let best_ops: Vec<Operator> = ops_perm.iter().map(|&o| ops[o].clone()).collect();
    let best_contractions: Vec<ElementaryContraction> = contr_perm
        .iter()
        .map(|&c| {
            // rewrite each contraction in the new operator numbering
            ops_perm.iter().map(|&j| contractions[c][j]).collect()
        })
        .collect();

    Ok((best_ops, best_contractions))
}

// left_masks[i] has bit j set iff j < i and operators i and j share a
// contraction. Positions are limited to 64 by the mask width, far above
// any realistic operator string.
fn left_connectivity_masks(nops: usize, contractions: &[&ElementaryContraction]) -> Vec<u64> {
    let mut connected = vec![0u64; nops];
    for contraction in contractions {
        let touched: Vec<usize> = (0..nops)
            .filter(|&i| contraction[i].rank() > 0)
            .collect();
        for (a, &i) in touched.iter().enumerate() {
            for &j in &touched[a + 1..] {
                connected[i] |= 1 << j;
                connected[j] |= 1 << i;
            }
        }
    }
    (0..nops)
        .map(|i| connected[i] & ((1u64 << i) - 1))
        .collect()
}

// A permutation is allowed iff, at every prefix, each placed operator
// already has all of its earlier-connected neighbors placed.
fn is_allowed(ops_perm: &[usize], left_masks: &[u64]) -> bool {
    let mut placed = 0u64;
    for &p in ops_perm {
        if left_masks[p] & !placed != 0 {
            return false;
        }
        placed |= 1 << p;
    }
    true
}

fn contraction_signature(
    ops: &[Operator],
    contractions: &[&ElementaryContraction],
    ops_perm: &[usize],
    contr_perm: &[usize],
) -> String {
    let mut signature = String::new();
    for &o in ops_perm {
        signature.push_str(ops[o].label());
        signature.push_str(&ops[o].vertex().signature());
    }
    for &c in contr_perm {
        let permuted: Vec<Vertex> = ops_perm.iter().map(|&j| contractions[c][j]).collect();
        signature.push_str(&vertices_signature(&permuted));
    }
    signature
}

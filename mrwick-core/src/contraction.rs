use crate::combinatorics::{integer_partitions, next_permutation};
use crate::error::WickError;
use crate::operator::Operator;
use crate::space::{OrbitalSpaces, SpaceKind};
use crate::vertex::{vertices_rank, Vertex};

/// One atomic Wick contraction: per operator position, how many creation
/// and annihilation legs participate. Always supported on a single space.
pub type ElementaryContraction = Vec<Vertex>;

/// Composite contraction: indices into the elementary-contraction list, in
/// non-decreasing order. A repeated index means the elementary contraction
/// is applied with multiplicity.
pub type CompositeContraction = Vec<usize>;

/// Enumerate every elementary contraction compatible with the operator
/// string, in a fixed order: spaces ascending, then per space kind.
///
/// * Occupied: one creation leg on position `i`, one annihilation leg on a
///   later position `j` (hole-line pairing).
/// * Unoccupied: one annihilation leg on position `i`, one creation leg on
///   a later position `j` (particle-line pairing).
/// * General: 2k-legged clusters for k up to `max_cumulant`, k creation
///   legs and k annihilation legs distributed over the positions, at least
///   two positions touched.
pub fn elementary_contractions(
    ops: &[Operator],
    spaces: &OrbitalSpaces,
    max_cumulant: usize,
) -> Vec<ElementaryContraction> {
    let nops = ops.len();
    let mut out: Vec<ElementaryContraction> = Vec::new();

    for s in 0..spaces.num_spaces() {
        match spaces.kind(s) {
            SpaceKind::Occupied => {
                for c in 0..nops {
                    for a in (c + 1)..nops {
                        if ops[c].cre(s) >= 1 && ops[a].ann(s) >= 1 {
                            let mut contraction = vec![Vertex::new(); nops];
                            contraction[c].set_cre(s, 1);
                            contraction[a].set_ann(s, 1);
                            out.push(contraction);
                        }
                    }
                }
            }
            SpaceKind::Unoccupied => {
                for a in 0..nops {
                    for c in (a + 1)..nops {
                        if ops[c].cre(s) >= 1 && ops[a].ann(s) >= 1 {
                            let mut contraction = vec![Vertex::new(); nops];
                            contraction[c].set_cre(s, 1);
                            contraction[a].set_ann(s, 1);
                            out.push(contraction);
                        }
                    }
                }
            }
            SpaceKind::General => {
                general_contractions(ops, s, max_cumulant, &mut out);
            }
        }
    }
    out
}

// 2k-legged cumulant clusters in one general space: for each k, distribute
// k creation legs and (independently) k annihilation legs over the operator
// positions, keeping only distributions the operators can supply and
// clusters touching at least two positions.
fn general_contractions(
    ops: &[Operator],
    s: usize,
    max_cumulant: usize,
    out: &mut Vec<ElementaryContraction>,
) {
    let nops = ops.len();
    let sum_cre: usize = ops.iter().map(|op| op.cre(s)).sum();
    let sum_ann: usize = ops.iter().map(|op| op.ann(s)).sum();
    let max_half_legs = sum_cre.min(sum_ann).min(max_cumulant);

    for half_legs in 1..=max_half_legs {
        // all distinct leg distributions: each partition of k, zero-padded
        // and stepped through its multiset permutations
        let mut cre_legs_vec: Vec<Vec<usize>> = Vec::new();
        let mut ann_legs_vec: Vec<Vec<usize>> = Vec::new();
        for part in integer_partitions(half_legs, nops) {
            let mut perm = vec![0usize; nops];
            perm[..part.len()].copy_from_slice(&part);
            perm.sort_unstable();
            loop {
                let cre_compatible = (0..nops).all(|a| ops[a].cre(s) >= perm[a]);
                let ann_compatible = (0..nops).all(|a| ops[a].ann(s) >= perm[a]);
                if cre_compatible {
                    cre_legs_vec.push(perm.clone());
                }
                if ann_compatible {
                    ann_legs_vec.push(perm.clone());
                }
                if !next_permutation(&mut perm) {
                    break;
                }
            }
        }

        for cre_legs in &cre_legs_vec {
            for ann_legs in &ann_legs_vec {
                let touched = (0..nops)
                    .filter(|&a| cre_legs[a] + ann_legs[a] > 0)
                    .count();
                if touched < 2 {
                    continue;
                }
                let mut contraction = vec![Vertex::new(); nops];
                for a in 0..nops {
                    contraction[a].set_cre(s, cre_legs[a]);
                    contraction[a].set_ann(s, ann_legs[a]);
                }
                out.push(contraction);
            }
        }
    }
}

/// Enumerate all composite contractions whose uncontracted rank lies in
/// `[minrank, maxrank]` by backtracking over the elementary list.
///
/// Composites are emitted as non-decreasing index sequences so that every
/// multiset of elementary contractions appears exactly once; each descent
/// subtracts the chosen contraction from the free legs and restores it on
/// the way back up.
pub fn composite_contractions(
    ops: &[Operator],
    elementary: &[ElementaryContraction],
    minrank: usize,
    maxrank: usize,
) -> Result<Vec<CompositeContraction>, WickError> {
    let mut free: Vec<Vertex> = ops.iter().map(|op| *op.vertex()).collect();
    let mut stack: Vec<usize> = Vec::new();
    let mut out: Vec<CompositeContraction> = Vec::new();
    backtrack(elementary, &mut free, &mut stack, minrank, maxrank, &mut out)?;
    Ok(out)
}

fn backtrack(
    elementary: &[ElementaryContraction],
    free: &mut [Vertex],
    stack: &mut Vec<usize>,
    minrank: usize,
    maxrank: usize,
    out: &mut Vec<CompositeContraction>,
) -> Result<(), WickError> {
    let rank_free = vertices_rank(free);
    if rank_free >= minrank && rank_free <= maxrank {
        out.push(stack.clone());
    }

    let start = stack.last().copied().unwrap_or(0);
    for c in start..elementary.len() {
        if !fits(free, &elementary[c]) {
            continue;
        }
        apply(free, &elementary[c])?;
        stack.push(c);
        backtrack(elementary, free, stack, minrank, maxrank, out)?;
        stack.pop();
        unapply(free, &elementary[c]);
    }
    Ok(())
}

fn fits(free: &[Vertex], contraction: &ElementaryContraction) -> bool {
    free.iter()
        .zip(contraction.iter())
        .all(|(f, c)| f.contains(c))
}

fn apply(free: &mut [Vertex], contraction: &ElementaryContraction) -> Result<(), WickError> {
    for (f, c) in free.iter_mut().zip(contraction.iter()) {
        *f = f.checked_sub(c)?;
    }
    Ok(())
}

fn unapply(free: &mut [Vertex], contraction: &ElementaryContraction) {
    for (f, c) in free.iter_mut().zip(contraction.iter()) {
        *f += c;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::SpaceKind;

    fn ov_spaces() -> OrbitalSpaces {
        let mut spaces = OrbitalSpaces::new();
        spaces
            .add_space("o", SpaceKind::Occupied, &["i", "j", "k", "l"])
            .unwrap();
        spaces
            .add_space("v", SpaceKind::Unoccupied, &["a", "b", "c", "d"])
            .unwrap();
        spaces
    }

    fn general_space() -> OrbitalSpaces {
        let mut spaces = OrbitalSpaces::new();
        spaces
            .add_space("g", SpaceKind::General, &["u", "v", "w", "x"])
            .unwrap();
        spaces
    }

    fn op(label: &str, spec: &str, spaces: &OrbitalSpaces) -> Operator {
        Operator::from_spec(label, spec, spaces).unwrap()
    }

    #[test]
    fn pairwise_contractions_for_f_t1() {
        let spaces = ov_spaces();
        let ops = vec![op("f", "v->o", &spaces), op("t", "o->v", &spaces)];
        let elementary = elementary_contractions(&ops, &spaces, 2);
        assert_eq!(elementary.len(), 2);
        // occupied pairing: creation on the left operator
        assert_eq!(elementary[0][0].cre(0), 1);
        assert_eq!(elementary[0][1].ann(0), 1);
        // unoccupied pairing: annihilation on the left operator
        assert_eq!(elementary[1][0].ann(1), 1);
        assert_eq!(elementary[1][1].cre(1), 1);
    }

    #[test]
    fn no_self_contraction() {
        let spaces = ov_spaces();
        // a single operator cannot contract with itself
        let ops = vec![op("f", "ov->ov", &spaces)];
        assert!(elementary_contractions(&ops, &spaces, 2).is_empty());
    }

    #[test]
    fn every_elementary_contraction_is_single_space() {
        let spaces = ov_spaces();
        let ops = vec![op("v", "vv->oo", &spaces), op("t", "oo->vv", &spaces)];
        for contraction in elementary_contractions(&ops, &spaces, 2) {
            let spaces_touched: std::collections::HashSet<usize> = contraction
                .iter()
                .flat_map(|v| v.active_spaces().collect::<Vec<_>>())
                .collect();
            assert_eq!(spaces_touched.len(), 1);
        }
    }

    #[test]
    fn general_space_contractions_include_cumulants() {
        let spaces = general_space();
        let ops = vec![op("h", "g->g", &spaces), op("t", "g->g", &spaces)];
        let elementary = elementary_contractions(&ops, &spaces, 2);
        // two 2-leg contractions plus the 4-leg cumulant cluster
        assert_eq!(elementary.len(), 3);
        let four_leg: Vec<_> = elementary
            .iter()
            .filter(|c| vertices_rank(c) == 4)
            .collect();
        assert_eq!(four_leg.len(), 1);
        assert_eq!(four_leg[0][0].cre(0), 1);
        assert_eq!(four_leg[0][0].ann(0), 1);
        assert_eq!(four_leg[0][1].cre(0), 1);
        assert_eq!(four_leg[0][1].ann(0), 1);
    }

    #[test]
    fn cumulant_rank_respects_bound() {
        let spaces = general_space();
        let ops = vec![op("h", "gg->gg", &spaces), op("t", "gg->gg", &spaces)];
        for k in 1..=3 {
            let elementary = elementary_contractions(&ops, &spaces, k);
            let max_rank = elementary.iter().map(|c| vertices_rank(c)).max().unwrap();
            assert!(max_rank <= 2 * k);
        }
    }

    #[test]
    fn composites_conserve_legs() {
        let spaces = ov_spaces();
        let ops = vec![op("v", "vv->oo", &spaces), op("t", "oo->vv", &spaces)];
        let elementary = elementary_contractions(&ops, &spaces, 2);
        let composites = composite_contractions(&ops, &elementary, 0, 8).unwrap();
        for composite in &composites {
            let mut used = vec![Vertex::new(); ops.len()];
            for &c in composite {
                for (u, v) in used.iter_mut().zip(elementary[c].iter()) {
                    *u += v;
                }
            }
            for (a, used_vertex) in used.iter().enumerate() {
                assert!(ops[a].vertex().contains(used_vertex));
            }
        }
    }

    #[test]
    fn composites_are_non_decreasing() {
        let spaces = ov_spaces();
        let ops = vec![op("v", "vv->oo", &spaces), op("t", "oo->vv", &spaces)];
        let elementary = elementary_contractions(&ops, &spaces, 2);
        let composites = composite_contractions(&ops, &elementary, 0, 8).unwrap();
        for composite in &composites {
            assert!(composite.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn rank_band_filters_records() {
        let spaces = ov_spaces();
        let ops = vec![op("f", "v->o", &spaces), op("t", "o->v", &spaces)];
        let elementary = elementary_contractions(&ops, &spaces, 2);
        // full contraction only
        let closed = composite_contractions(&ops, &elementary, 0, 0).unwrap();
        assert_eq!(closed, vec![vec![0, 1]]);
        // everything, including the empty composite
        let open = composite_contractions(&ops, &elementary, 0, 4).unwrap();
        assert_eq!(open.len(), 4);
        assert!(open.contains(&vec![]));
    }

    #[test]
    fn repeated_elementary_contraction_uses_remaining_legs() {
        let spaces = ov_spaces();
        let ops = vec![op("v", "vv->oo", &spaces), op("t", "oo->vv", &spaces)];
        let elementary = elementary_contractions(&ops, &spaces, 2);
        assert_eq!(elementary.len(), 2);
        let closed = composite_contractions(&ops, &elementary, 0, 0).unwrap();
        assert_eq!(closed, vec![vec![0, 0, 1, 1]]);
    }
}

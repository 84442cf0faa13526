//! Contractions in a general (multi-reference) space: density and hole
//! density insertions for pair composites, cumulant tensors for 2k-leg
//! clusters, and the cumulant-rank configuration knob.

use mrwick_core::{
    scalar_int, Expression, OperatorExpression, OrbitalSpaces, SpaceKind, WickTheorem,
};

fn general_space() -> OrbitalSpaces {
    let mut spaces = OrbitalSpaces::new();
    spaces
        .add_space("g", SpaceKind::General, &["u", "v", "w", "x", "y", "z"])
        .unwrap();
    spaces
}

fn op(label: &str, spec: &str, spaces: &OrbitalSpaces) -> OperatorExpression {
    OperatorExpression::operator_sum(label, &[spec], spaces).unwrap()
}

#[test]
fn one_body_product_closes_with_densities_and_cumulant() {
    let spaces = general_space();
    let wt = WickTheorem::new(&spaces);
    let h = op("h", "g->g", &spaces);
    let t = op("t", "g->g", &spaces);

    let val = wt
        .contract_expression(&scalar_int(1), &(&h * &t), 0, 0)
        .unwrap();

    // the two pair contractions combine into one gamma/eta term, and the
    // four-leg cluster yields the two-body cumulant
    let expected = Expression::parse(
        "eta1^{g0}_{g1} gamma1^{g2}_{g3} h^{g1}_{g2} t^{g3}_{g0}\n\
         h^{g0}_{g1} lambda2^{g1,g2}_{g0,g3} t^{g3}_{g2}",
        &spaces,
    )
    .unwrap();
    assert_eq!(val, expected);
}

#[test]
fn cumulant_cap_of_one_drops_lambda2() {
    let spaces = general_space();
    let mut wt = WickTheorem::new(&spaces);
    wt.set_max_cumulant(1);
    let h = op("h", "g->g", &spaces);
    let t = op("t", "g->g", &spaces);

    let val = wt
        .contract_expression(&scalar_int(1), &(&h * &t), 0, 0)
        .unwrap();
    let expected = Expression::parse(
        "eta1^{g0}_{g1} gamma1^{g2}_{g3} h^{g1}_{g2} t^{g3}_{g0}",
        &spaces,
    )
    .unwrap();
    assert_eq!(val, expected);
}

#[test]
fn cumulant_tensors_never_exceed_the_cap() {
    let spaces = general_space();
    let h = op("h", "gg->gg", &spaces);
    let t = op("t", "gg->gg", &spaces);
    let ht = &h * &t;

    for cap in 1..=3usize {
        let mut wt = WickTheorem::new(&spaces);
        wt.set_max_cumulant(cap);
        let val = wt.contract_expression(&scalar_int(1), &ht, 0, 4).unwrap();
        for (term, _) in val.terms() {
            for tensor in term.tensors() {
                if let Some(k) = tensor.label().strip_prefix("lambda") {
                    let k: usize = k.parse().unwrap();
                    assert!(k <= cap, "lambda{k} exceeds cumulant cap {cap}");
                }
            }
        }
    }
}

#[test]
fn open_general_contractions_keep_rank_band() {
    let spaces = general_space();
    let wt = WickTheorem::new(&spaces);
    let h = op("h", "g->g", &spaces);
    let t = op("t", "g->g", &spaces);

    let val = wt
        .contract_expression(&scalar_int(1), &(&h * &t), 2, 2)
        .unwrap();
    assert!(!val.is_empty());
    for (term, _) in val.terms() {
        assert_eq!(term.rank(), 2);
    }
}

use clap::{ArgAction, Parser, Subcommand};
use mrwick_core::{
    parse_scalar, OperatorExpression, OrbitalSpaces, PrintLevel, Scalar, SpaceKind, WickTheorem,
};
use num_traits::One;

fn main() {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Demo => run_demo(),
        Command::Contract {
            spaces,
            op,
            factor,
            min_rank,
            max_rank,
            max_cumulant,
            project,
            verbose,
        } => run_contract(
            spaces,
            op,
            factor,
            min_rank,
            max_rank,
            max_cumulant,
            project,
            verbose,
        ),
        Command::Elementary {
            spaces,
            op,
            max_cumulant,
        } => run_elementary(spaces, op, max_cumulant),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "mrwick",
    about = "Symbolic Wick contraction explorer for second-quantized operator products"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Closed-shell coupled-cluster energy demo (F*T1, V*T2, V*T1*T1)
    Demo,

    /// Contract a product of operators and print the resulting expression
    Contract {
        /// Orbital spaces as label:kind:indexletters, comma separated
        #[arg(long, default_value = "o:occupied:ijklmn,v:unoccupied:abcdef")]
        spaces: String,

        /// Operators as label:spec, leftmost first (e.g. f:v->o)
        #[arg(long = "op", num_args = 1.., required = true)]
        op: Vec<String>,

        /// Overall scalar prefactor (rational, e.g. 1/2)
        #[arg(long, default_value = "1")]
        factor: String,

        /// Minimum rank of uncontracted operators to keep
        #[arg(long, default_value_t = 0)]
        min_rank: usize,

        /// Maximum rank of uncontracted operators to keep
        #[arg(long, default_value_t = 0)]
        max_rank: usize,

        /// Largest cumulant half-rank admitted in general spaces
        #[arg(long, default_value_t = 2)]
        max_cumulant: usize,

        /// Also project surviving operators onto many-body equations with
        /// this residual label
        #[arg(long)]
        project: Option<String>,

        /// Increase diagnostic output (repeat for more)
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// List the elementary contractions of a product of operators
    Elementary {
        /// Orbital spaces as label:kind:indexletters, comma separated
        #[arg(long, default_value = "o:occupied:ijklmn,v:unoccupied:abcdef")]
        spaces: String,

        /// Operators as label:spec, leftmost first (e.g. f:v->o)
        #[arg(long = "op", num_args = 1.., required = true)]
        op: Vec<String>,

        /// Largest cumulant half-rank admitted in general spaces
        #[arg(long, default_value_t = 2)]
        max_cumulant: usize,
    },
}

fn run_demo() {
    let mut spaces = OrbitalSpaces::new();
    spaces
        .add_space("o", SpaceKind::Occupied, &["i", "j", "k", "l", "m", "n"])
        .expect("space registration");
    spaces
        .add_space("v", SpaceKind::Unoccupied, &["a", "b", "c", "d", "e", "f"])
        .expect("space registration");

    let f = OperatorExpression::operator_sum("f", &["v->o"], &spaces).expect("operator");
    let v = OperatorExpression::operator_sum("v", &["vv->oo"], &spaces).expect("operator");
    let t1 = OperatorExpression::operator_sum("t", &["o->v"], &spaces).expect("operator");
    let t2 = OperatorExpression::operator_sum("t", &["oo->vv"], &spaces).expect("operator");

    let wt = WickTheorem::new(&spaces);
    let one = Scalar::one();
    let half = parse_scalar("1/2").expect("scalar");

    println!("[demo] <F T1>:");
    let e1 = wt
        .contract_expression(&one, &(&f * &t1), 0, 0)
        .expect("contraction");
    println!("{}", e1.display(&spaces));

    println!("\n[demo] <V T2>:");
    let e2 = wt
        .contract_expression(&one, &(&v * &t2), 0, 0)
        .expect("contraction");
    println!("{}", e2.display(&spaces));

    println!("\n[demo] 1/2 <V T1 T1>:");
    let e3 = wt
        .contract_expression(&half, &(&(&v * &t1) * &t1), 0, 0)
        .expect("contraction");
    println!("{}", e3.display(&spaces));
}

#[allow(clippy::too_many_arguments)]
fn run_contract(
    spaces_spec: String,
    op_specs: Vec<String>,
    factor: String,
    min_rank: usize,
    max_rank: usize,
    max_cumulant: usize,
    project: Option<String>,
    verbose: u8,
) {
    let spaces = parse_spaces(&spaces_spec);
    let product = parse_product(&op_specs, &spaces);
    let factor = parse_scalar(&factor).unwrap_or_else(|e| {
        eprintln!("invalid --factor: {e}");
        std::process::exit(1);
    });

    let mut wt = WickTheorem::new(&spaces);
    wt.set_max_cumulant(max_cumulant);
    wt.set_print(match verbose {
        0 => PrintLevel::None,
        1 => PrintLevel::Basic,
        2 => PrintLevel::Summary,
        3 => PrintLevel::Detailed,
        _ => PrintLevel::All,
    });

    let result = wt
        .contract_expression(&factor, &product, min_rank, max_rank)
        .unwrap_or_else(|e| {
            eprintln!("contraction failed: {e}");
            std::process::exit(1);
        });

    if result.is_empty() {
        println!("[contract] empty result (no contractions in rank band [{min_rank}, {max_rank}])");
        return;
    }
    println!("{}", result.display(&spaces));

    if let Some(residual) = project {
        println!("\n[project] many-body equations for '{residual}':");
        for eq in result.to_manybody_equations(&residual) {
            println!("  {}", eq.display(&spaces));
        }
    }
}

fn run_elementary(spaces_spec: String, op_specs: Vec<String>, max_cumulant: usize) {
    let spaces = parse_spaces(&spaces_spec);
    let product = parse_product(&op_specs, &spaces);

    for (ops, _) in product.terms() {
        let elementary =
            mrwick_core::contraction::elementary_contractions(ops, &spaces, max_cumulant);
        let labels: Vec<_> = ops.iter().map(|op| op.display(&spaces)).collect();
        println!(
            "[elementary] {} contractions for {}",
            elementary.len(),
            labels.join("  ")
        );
        for (i, contraction) in elementary.iter().enumerate() {
            let cols: Vec<String> = contraction.iter().map(|v| v.to_string()).collect();
            println!("  {:3}: {}", i, cols.join(" "));
        }
    }
}

/// Parse `label:kind:indexletters` entries, e.g.
/// `o:occupied:ijklmn,v:unoccupied:abcdef,g:general:uvwxyz`.
fn parse_spaces(spec: &str) -> OrbitalSpaces {
    let mut spaces = OrbitalSpaces::new();
    for entry in spec.split(',') {
        let parts: Vec<&str> = entry.split(':').collect();
        if parts.len() != 3 {
            eprintln!("invalid space entry '{entry}' (expected label:kind:indexletters)");
            std::process::exit(1);
        }
        let kind = match parts[1] {
            "occupied" | "occ" | "hole" => SpaceKind::Occupied,
            "unoccupied" | "uocc" | "particle" => SpaceKind::Unoccupied,
            "general" | "gen" => SpaceKind::General,
            other => {
                eprintln!("unknown space kind '{other}'");
                std::process::exit(1);
            }
        };
        let letters: Vec<String> = parts[2].chars().map(|c| c.to_string()).collect();
        let letter_refs: Vec<&str> = letters.iter().map(|s| s.as_str()).collect();
        if let Err(e) = spaces.add_space(parts[0], kind, &letter_refs) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
    spaces
}

/// Parse `label:spec` operator entries into a single-product expression.
fn parse_product(op_specs: &[String], spaces: &OrbitalSpaces) -> OperatorExpression {
    let mut product: Option<OperatorExpression> = None;
    for entry in op_specs {
        let Some((label, spec)) = entry.split_once(':') else {
            eprintln!("invalid operator entry '{entry}' (expected label:spec, e.g. f:v->o)");
            std::process::exit(1);
        };
        let expr = OperatorExpression::operator_sum(label, &[spec], spaces).unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(1);
        });
        product = Some(match product {
            Some(acc) => &acc * &expr,
            None => expr,
        });
    }
    product.unwrap_or_else(|| {
        eprintln!("at least one --op is required");
        std::process::exit(1);
    })
}

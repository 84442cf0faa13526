use num_bigint::BigInt;
use num_rational::BigRational;

use crate::error::WickError;

/// Exact rational coefficient used throughout the engine.
///
/// All bookkeeping (operator normalizations, combinatorial factors, signs)
/// stays in `BigRational`; there is no floating point anywhere in the core,
/// and tests compare coefficients like `1/4` exactly.
pub type Scalar = BigRational;

/// An integer scalar.
pub fn scalar_int(n: i64) -> Scalar {
    BigRational::from_integer(BigInt::from(n))
}

/// The rational scalar `n/d`.
pub fn scalar(n: i64, d: i64) -> Scalar {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

/// Parse a scalar literal: `"3"`, `"-1"`, or `"1/4"`.
pub fn parse_scalar(text: &str) -> Result<Scalar, WickError> {
    text.trim()
        .parse::<BigRational>()
        .map_err(|_| WickError::Parse(format!("invalid rational literal '{text}'")))
}

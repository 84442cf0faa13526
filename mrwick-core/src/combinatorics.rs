use num_bigint::BigInt;
use num_traits::One;

use crate::scalar::Scalar;

/// Binomial coefficient C(n, k) as an exact scalar.
pub fn binomial(n: usize, k: usize) -> Scalar {
    if k > n {
        return Scalar::from_integer(BigInt::from(0));
    }
    let mut num = BigInt::one();
    let mut den = BigInt::one();
    for i in 0..k.min(n - k) {
        num *= BigInt::from(n - i);
        den *= BigInt::from(i + 1);
    }
    Scalar::from_integer(num / den)
}

/// Factorial n! as an exact scalar.
pub fn factorial(n: usize) -> Scalar {
    let mut out = BigInt::one();
    for i in 2..=n {
        out *= BigInt::from(i);
    }
    Scalar::from_integer(out)
}

/// All partitions of `n` into at most `max_parts` positive parts, each
/// partition listed with non-increasing parts. The enumeration order is
/// fixed: largest first part first, recursing on the remainder.
pub fn integer_partitions(n: usize, max_parts: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    partitions_rec(n, n, max_parts, &mut current, &mut out);
    out
}

fn partitions_rec(
    n: usize,
    max_part: usize,
    parts_left: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if n == 0 {
        out.push(current.clone());
        return;
    }
    if parts_left == 0 {
        return;
    }
    for part in (1..=n.min(max_part)).rev() {
        current.push(part);
        partitions_rec(n - part, part, parts_left - 1, current, out);
        current.pop();
    }
}

/// Advance `v` to its next lexicographic permutation, returning `false`
/// (and leaving `v` sorted ascending) once the last permutation has been
/// reached. Repeated values are handled like the C++ algorithm: each
/// distinct arrangement of a multiset appears exactly once.
pub fn next_permutation<T: Ord>(v: &mut [T]) -> bool {
    if v.len() < 2 {
        return false;
    }
    let mut i = v.len() - 1;
    while i > 0 && v[i - 1] >= v[i] {
        i -= 1;
    }
    if i == 0 {
        v.reverse();
        return false;
    }
    let mut j = v.len() - 1;
    while v[j] <= v[i - 1] {
        j -= 1;
    }
    v.swap(i - 1, j);
    v[i..].reverse();
    true
}

/// Sign of the permutation written in one-line notation (`perm[i]` is the
/// image of `i`): +1 for even, -1 for odd.
///
/// The parity equals the parity of the inversion count, computed with a
/// merge sweep in O(n log n); a quadratic count would dominate on long
/// operator strings.
pub fn permutation_parity(perm: &[usize]) -> i32 {
    let mut work: Vec<usize> = perm.to_vec();
    let mut buffer = vec![0usize; perm.len()];
    let inversions = merge_count(&mut work, &mut buffer);
    if inversions % 2 == 0 {
        1
    } else {
        -1
    }
}

fn merge_count(v: &mut [usize], buffer: &mut [usize]) -> u64 {
    let n = v.len();
    if n < 2 {
        return 0;
    }
    let mid = n / 2;
    let mut inversions = merge_count(&mut v[..mid], buffer) + merge_count(&mut v[mid..], buffer);
    let (mut i, mut j, mut k) = (0, mid, 0);
    while i < mid && j < n {
        if v[i] <= v[j] {
            buffer[k] = v[i];
            i += 1;
        } else {
            buffer[k] = v[j];
            inversions += (mid - i) as u64;
            j += 1;
        }
        k += 1;
    }
    while i < mid {
        buffer[k] = v[i];
        i += 1;
        k += 1;
    }
    while j < n {
        buffer[k] = v[j];
        j += 1;
        k += 1;
    }
    v.copy_from_slice(&buffer[..n]);
    inversions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::scalar_int;

    #[test]
    fn binomials() {
        assert_eq!(binomial(4, 2), scalar_int(6));
        assert_eq!(binomial(2, 1), scalar_int(2));
        assert_eq!(binomial(3, 0), scalar_int(1));
        assert_eq!(binomial(1, 2), scalar_int(0));
    }

    #[test]
    fn factorials() {
        assert_eq!(factorial(0), scalar_int(1));
        assert_eq!(factorial(4), scalar_int(24));
    }

    #[test]
    fn partitions_of_four() {
        assert_eq!(
            integer_partitions(4, 4),
            vec![
                vec![4],
                vec![3, 1],
                vec![2, 2],
                vec![2, 1, 1],
                vec![1, 1, 1, 1],
            ]
        );
        // bounded number of parts
        assert_eq!(
            integer_partitions(4, 2),
            vec![vec![4], vec![3, 1], vec![2, 2]]
        );
        assert_eq!(integer_partitions(0, 3), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn multiset_permutations_are_distinct() {
        let mut v = vec![0, 1, 1];
        let mut seen = vec![v.clone()];
        while next_permutation(&mut v) {
            seen.push(v.clone());
        }
        assert_eq!(seen, vec![vec![0, 1, 1], vec![1, 0, 1], vec![1, 1, 0]]);
        // wrapped around to sorted order
        assert_eq!(v, vec![0, 1, 1]);
    }

    #[test]
    fn parity_matches_inversion_count() {
        assert_eq!(permutation_parity(&[0, 1, 2, 3]), 1);
        assert_eq!(permutation_parity(&[1, 0, 2, 3]), -1);
        assert_eq!(permutation_parity(&[2, 1, 0, 3]), -1);
        assert_eq!(permutation_parity(&[2, 1, 0]), -1);
        assert_eq!(permutation_parity(&[1, 2, 0]), 1);
        assert_eq!(permutation_parity(&[]), 1);
    }
}

use std::fmt;
use std::ops::{Add, AddAssign};

use crate::error::WickError;
use crate::space::MAX_SPACES;

/// Per-space creation/annihilation leg counts for one operator position.
///
/// Stored as a fixed array over the maximum number of spaces so that
/// comparison and hashing are flat memory operations. The derived ordering
/// is lexicographic over spaces with creation counts compared before
/// annihilation counts, which is the order used by canonical signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vertex {
    legs: [(u8, u8); MAX_SPACES],
}

impl Vertex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of creation legs in `space`.
    pub fn cre(&self, space: usize) -> usize {
        self.legs[space].0 as usize
    }

    /// Number of annihilation legs in `space`.
    pub fn ann(&self, space: usize) -> usize {
        self.legs[space].1 as usize
    }

    pub fn set_cre(&mut self, space: usize, count: usize) {
        self.legs[space].0 = count as u8;
    }

    pub fn set_ann(&mut self, space: usize, count: usize) {
        self.legs[space].1 = count as u8;
    }

    /// Total number of legs (creation plus annihilation over all spaces).
    pub fn rank(&self) -> usize {
        self.legs
            .iter()
            .map(|&(c, a)| c as usize + a as usize)
            .sum()
    }

    /// Componentwise `self >= other`, i.e. `other` fits in the free legs
    /// counted by `self`.
    pub fn contains(&self, other: &Vertex) -> bool {
        self.legs
            .iter()
            .zip(other.legs.iter())
            .all(|(&(c, a), &(oc, oa))| c >= oc && a >= oa)
    }

    /// Spaces with at least one leg.
    pub fn active_spaces(&self) -> impl Iterator<Item = usize> + '_ {
        self.legs
            .iter()
            .enumerate()
            .filter(|(_, &(c, a))| c > 0 || a > 0)
            .map(|(s, _)| s)
    }

    /// Componentwise subtraction. Only defined when `self.contains(rhs)`;
    /// a deficit means the engine tried to consume legs that are not free,
    /// which surfaces as an invariant violation rather than a wrong count.
    pub fn checked_sub(&self, rhs: &Vertex) -> Result<Vertex, WickError> {
        if !self.contains(rhs) {
            return Err(WickError::InvariantViolation(
                "vertex subtraction would leave negative leg counts".into(),
            ));
        }
        let mut out = *self;
        for (lhs, rhs) in out.legs.iter_mut().zip(rhs.legs.iter()) {
            lhs.0 -= rhs.0;
            lhs.1 -= rhs.1;
        }
        Ok(out)
    }

    /// Signature fragment used for canonical comparisons. Distinct vertices
    /// always produce distinct fragments.
    pub fn signature(&self) -> String {
        let mut s = String::new();
        for &(c, a) in &self.legs {
            s.push_str(&format!("{c}c{a}a|"));
        }
        s
    }
}

impl AddAssign<&Vertex> for Vertex {
    fn add_assign(&mut self, rhs: &Vertex) {
        for (lhs, rhs) in self.legs.iter_mut().zip(rhs.legs.iter()) {
            lhs.0 += rhs.0;
            lhs.1 += rhs.1;
        }
    }
}

impl Add<&Vertex> for Vertex {
    type Output = Vertex;
    fn add(mut self, rhs: &Vertex) -> Vertex {
        self += rhs;
        self
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let mut first = true;
        for (s, &(c, a)) in self.legs.iter().enumerate() {
            if c == 0 && a == 0 {
                continue;
            }
            if !first {
                write!(f, " ")?;
            }
            write!(f, "s{s}:{c}+{a}-")?;
            first = false;
        }
        write!(f, "]")
    }
}

/// Total rank of a vector of vertices.
pub fn vertices_rank(vertices: &[Vertex]) -> usize {
    vertices.iter().map(Vertex::rank).sum()
}

/// The single space touched by a vector of vertices, if any legs exist.
/// Elementary contractions are supported on exactly one space, so the first
/// active space found is the space of the contraction.
pub fn vertices_space(vertices: &[Vertex]) -> Option<usize> {
    vertices.iter().flat_map(|v| v.active_spaces()).next()
}

/// Signature of a vertex vector, the concatenation of the per-position
/// fragments.
pub fn vertices_signature(vertices: &[Vertex]) -> String {
    vertices.iter().map(Vertex::signature).collect()
}

use crate::index::{Index, IndexMap};
use crate::space::OrbitalSpaces;

/// Index permutation symmetry of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TensorSymmetry {
    /// Odd under exchange of two upper or two lower indices.
    Antisymmetric,
    Nonsymmetric,
}

/// A labeled tensor with lower (creation-side) and upper
/// (annihilation-side) index lists, rendered as `label^{upper}_{lower}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tensor {
    label: String,
    upper: Vec<Index>,
    lower: Vec<Index>,
    symmetry: TensorSymmetry,
}

impl Tensor {
    pub fn new(
        label: impl Into<String>,
        lower: Vec<Index>,
        upper: Vec<Index>,
        symmetry: TensorSymmetry,
    ) -> Self {
        Self {
            label: label.into(),
            upper,
            lower,
            symmetry,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn upper(&self) -> &[Index] {
        &self.upper
    }

    pub fn lower(&self) -> &[Index] {
        &self.lower
    }

    pub fn symmetry(&self) -> TensorSymmetry {
        self.symmetry
    }

    pub(crate) fn upper_mut(&mut self) -> &mut Vec<Index> {
        &mut self.upper
    }

    pub(crate) fn lower_mut(&mut self) -> &mut Vec<Index> {
        &mut self.lower
    }

    pub fn reindex(&mut self, map: &IndexMap) {
        for idx in self.upper.iter_mut().chain(self.lower.iter_mut()) {
            if let Some(&target) = map.get(idx) {
                *idx = target;
            }
        }
    }

    pub fn display(&self, spaces: &OrbitalSpaces) -> String {
        format!(
            "{}^{{{}}}_{{{}}}",
            self.label,
            index_list(&self.upper, spaces),
            index_list(&self.lower, spaces)
        )
    }
}

fn index_list(indices: &[Index], spaces: &OrbitalSpaces) -> String {
    indices
        .iter()
        .map(|&i| spaces.index_name(i))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::SpaceKind;

    fn spaces() -> OrbitalSpaces {
        let mut spaces = OrbitalSpaces::new();
        spaces.add_space("o", SpaceKind::Occupied, &["i", "j"]).unwrap();
        spaces.add_space("v", SpaceKind::Unoccupied, &["a", "b"]).unwrap();
        spaces
    }

    #[test]
    fn rendering() {
        let t = Tensor::new(
            "t",
            vec![Index::new(1, 0), Index::new(1, 1)],
            vec![Index::new(0, 0), Index::new(0, 1)],
            TensorSymmetry::Antisymmetric,
        );
        assert_eq!(t.display(&spaces()), "t^{o0,o1}_{v0,v1}");
    }

    #[test]
    fn reindex_touches_both_lists() {
        let mut t = Tensor::new(
            "f",
            vec![Index::new(0, 1)],
            vec![Index::new(1, 2)],
            TensorSymmetry::Antisymmetric,
        );
        let mut map = IndexMap::new();
        map.insert(Index::new(0, 1), Index::new(0, 0));
        map.insert(Index::new(1, 2), Index::new(1, 0));
        t.reindex(&map);
        assert_eq!(t.lower(), &[Index::new(0, 0)]);
        assert_eq!(t.upper(), &[Index::new(1, 0)]);
    }
}

use crate::index::{Index, IndexMap};
use crate::space::OrbitalSpaces;

/// Whether a second-quantized operator creates or annihilates. Creation
/// sorts before annihilation, matching the normal-ordered convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SQOperatorKind {
    Creation,
    Annihilation,
}

/// An atomic second-quantized operator: a creator or annihilator labeled by
/// one orbital index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SQOperator {
    kind: SQOperatorKind,
    index: Index,
}

impl SQOperator {
    pub fn creation(index: Index) -> Self {
        Self {
            kind: SQOperatorKind::Creation,
            index,
        }
    }

    pub fn annihilation(index: Index) -> Self {
        Self {
            kind: SQOperatorKind::Annihilation,
            index,
        }
    }

    pub fn kind(&self) -> SQOperatorKind {
        self.kind
    }

    pub fn is_creation(&self) -> bool {
        self.kind == SQOperatorKind::Creation
    }

    pub fn index(&self) -> Index {
        self.index
    }

    pub fn reindex(&mut self, map: &IndexMap) {
        if let Some(&target) = map.get(&self.index) {
            self.index = target;
        }
    }

    /// `a+(o0)` / `a-(v1)` rendering.
    pub fn display(&self, spaces: &OrbitalSpaces) -> String {
        let sign = if self.is_creation() { "+" } else { "-" };
        format!("a{}({})", sign, spaces.index_name(self.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_sorts_before_annihilation() {
        let cre = SQOperator::creation(Index::new(1, 5));
        let ann = SQOperator::annihilation(Index::new(0, 0));
        assert!(cre < ann);
    }

    #[test]
    fn reindex_rewrites_mapped_indices_only() {
        let mut op = SQOperator::annihilation(Index::new(0, 2));
        let mut map = IndexMap::new();
        map.insert(Index::new(0, 2), Index::new(0, 0));
        map.insert(Index::new(1, 1), Index::new(1, 0));
        op.reindex(&map);
        assert_eq!(op.index(), Index::new(0, 0));
        op.reindex(&map);
        assert_eq!(op.index(), Index::new(0, 0));
    }
}

use std::fmt;

use crate::error::WickError;
use crate::index::Index;
use crate::vertex::Vertex;

/// Hard cap on the number of orbital spaces. `Vertex` stores per-space leg
/// counts in a fixed array of this length.
pub const MAX_SPACES: usize = 8;

/// The contraction behavior of an orbital space.
///
/// Occupied spaces contract a creation with a later annihilation (hole
/// lines), unoccupied spaces the reverse (particle lines), and general
/// spaces carry density matrices and cumulants and admit 2k-legged
/// contractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceKind {
    Occupied,
    Unoccupied,
    General,
}

impl fmt::Display for SpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpaceKind::Occupied => "occupied",
            SpaceKind::Unoccupied => "unoccupied",
            SpaceKind::General => "general",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
struct SpaceEntry {
    label: String,
    kind: SpaceKind,
    index_labels: Vec<String>,
}

/// Registry of orbital spaces.
///
/// Built once by the caller and passed by reference into the engine; the
/// engine never mutates it. Each space has a short label used in operator
/// specifications (`"oo->vv"`) and canonical index names (`o0`, `v1`), plus
/// a table of pretty index labels (`i`, `j`, `a`, ...) for rendering.
#[derive(Debug, Clone, Default)]
pub struct OrbitalSpaces {
    spaces: Vec<SpaceEntry>,
}

impl OrbitalSpaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a space and return its id. Space ids are dense and assigned
    /// in registration order.
    pub fn add_space(
        &mut self,
        label: &str,
        kind: SpaceKind,
        index_labels: &[&str],
    ) -> Result<usize, WickError> {
        if self.spaces.len() == MAX_SPACES {
            return Err(WickError::Parse(format!(
                "cannot register '{label}': at most {MAX_SPACES} spaces are supported"
            )));
        }
        if label.is_empty() {
            return Err(WickError::Parse("space label cannot be empty".into()));
        }
        if self.space_index(label).is_some() {
            return Err(WickError::Parse(format!(
                "space label '{label}' is already registered"
            )));
        }
        self.spaces.push(SpaceEntry {
            label: label.to_string(),
            kind,
            index_labels: index_labels.iter().map(|s| s.to_string()).collect(),
        });
        Ok(self.spaces.len() - 1)
    }

    pub fn num_spaces(&self) -> usize {
        self.spaces.len()
    }

    pub fn label(&self, space: usize) -> &str {
        &self.spaces[space].label
    }

    pub fn kind(&self, space: usize) -> SpaceKind {
        self.spaces[space].kind
    }

    /// Find a space id by its label.
    pub fn space_index(&self, label: &str) -> Option<usize> {
        self.spaces.iter().position(|e| e.label == label)
    }

    /// Canonical name of an index: space label followed by the counter
    /// (`o0`, `v1`). This is the form used by `Display` implementations and
    /// accepted back by the expression parser.
    pub fn index_name(&self, index: Index) -> String {
        format!("{}{}", self.label(index.space), index.number)
    }

    /// Pretty name of an index from the registered label table (`i`, `a`),
    /// falling back to the canonical name when the table is exhausted.
    pub fn index_label(&self, index: Index) -> String {
        match self.spaces[index.space].index_labels.get(index.number) {
            Some(l) => l.clone(),
            None => self.index_name(index),
        }
    }

    /// Parse an index name, either canonical (`o0`) or pretty (`i`).
    pub fn parse_index(&self, name: &str) -> Result<Index, WickError> {
        for (s, entry) in self.spaces.iter().enumerate() {
            if let Some(n) = entry.index_labels.iter().position(|l| l == name) {
                return Ok(Index::new(s, n));
            }
        }
        for (s, entry) in self.spaces.iter().enumerate() {
            if let Some(rest) = name.strip_prefix(entry.label.as_str()) {
                if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                    let n = rest
                        .parse::<usize>()
                        .map_err(|_| WickError::Parse(format!("invalid index '{name}'")))?;
                    return Ok(Index::new(s, n));
                }
            }
        }
        Err(WickError::Parse(format!("unknown index '{name}'")))
    }

    /// Parse an operator component specification such as `"oo->vv"`.
    ///
    /// The labels before `->` are the annihilation spaces (in order), the
    /// labels after are the creation spaces; the resulting vertex counts one
    /// leg per label occurrence.
    pub fn parse_vertex(&self, spec: &str) -> Result<Vertex, WickError> {
        let (ann_part, cre_part) = spec
            .split_once("->")
            .ok_or_else(|| WickError::Parse(format!("missing '->' in vertex spec '{spec}'")))?;
        let mut vertex = Vertex::new();
        for label in Self::split_labels(ann_part) {
            let s = self
                .space_index(&label)
                .ok_or_else(|| WickError::Parse(format!("unknown space '{label}' in '{spec}'")))?;
            vertex.set_ann(s, vertex.ann(s) + 1);
        }
        for label in Self::split_labels(cre_part) {
            let s = self
                .space_index(&label)
                .ok_or_else(|| WickError::Parse(format!("unknown space '{label}' in '{spec}'")))?;
            vertex.set_cre(s, vertex.cre(s) + 1);
        }
        Ok(vertex)
    }

    // Space labels in a vertex spec are single characters unless separated
    // by whitespace ("act1 act2->act1 act2" style).
    fn split_labels(part: &str) -> Vec<String> {
        let part = part.trim();
        if part.contains(char::is_whitespace) {
            part.split_whitespace().map(|s| s.to_string()).collect()
        } else {
            part.chars().map(|c| c.to_string()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ov_spaces() -> OrbitalSpaces {
        let mut spaces = OrbitalSpaces::new();
        spaces
            .add_space("o", SpaceKind::Occupied, &["i", "j", "k", "l", "m", "n"])
            .unwrap();
        spaces
            .add_space("v", SpaceKind::Unoccupied, &["a", "b", "c", "d", "e", "f"])
            .unwrap();
        spaces
    }

    #[test]
    fn registration_and_lookup() {
        let spaces = ov_spaces();
        assert_eq!(spaces.num_spaces(), 2);
        assert_eq!(spaces.label(0), "o");
        assert_eq!(spaces.kind(1), SpaceKind::Unoccupied);
        assert_eq!(spaces.space_index("v"), Some(1));
        assert_eq!(spaces.space_index("x"), None);
    }

    #[test]
    fn duplicate_label_rejected() {
        let mut spaces = ov_spaces();
        assert!(spaces.add_space("o", SpaceKind::General, &[]).is_err());
    }

    #[test]
    fn vertex_spec_counts_legs() {
        let spaces = ov_spaces();
        let v = spaces.parse_vertex("oo->vv").unwrap();
        assert_eq!(v.ann(0), 2);
        assert_eq!(v.cre(1), 2);
        assert_eq!(v.cre(0), 0);
        assert_eq!(v.rank(), 4);

        let f = spaces.parse_vertex("v->o").unwrap();
        assert_eq!(f.ann(1), 1);
        assert_eq!(f.cre(0), 1);
    }

    #[test]
    fn vertex_spec_errors() {
        let spaces = ov_spaces();
        assert!(spaces.parse_vertex("ov").is_err());
        assert!(spaces.parse_vertex("o->x").is_err());
    }

    #[test]
    fn index_names() {
        let spaces = ov_spaces();
        let idx = Index::new(1, 0);
        assert_eq!(spaces.index_name(idx), "v0");
        assert_eq!(spaces.index_label(idx), "a");
        assert_eq!(spaces.parse_index("v0").unwrap(), idx);
        assert_eq!(spaces.parse_index("a").unwrap(), idx);
        assert_eq!(spaces.index_label(Index::new(0, 7)), "o7");
        assert!(spaces.parse_index("q3").is_err());
    }
}

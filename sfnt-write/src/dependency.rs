//! Relationships between tables that must be kept in sync

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use types::Tag;

/// How a table depends on another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DependencyKind {
    /// The dependent must be rewritten when the dependency changes.
    RebuildRequired,
    /// The two tables should agree, but a change to one doesn't invalidate
    /// the other.
    ConsistencyRequired,
}

/// A graph recording which tables derive data from which others.
///
/// Edges point from a dependency to the tables that depend on it. The
/// default graph knows the common relationships between TrueType tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDependencyGraph {
    dependents: BTreeMap<Tag, Vec<(Tag, DependencyKind)>>,
}

impl TableDependencyGraph {
    /// A graph with no edges.
    pub fn empty() -> Self {
        TableDependencyGraph {
            dependents: BTreeMap::new(),
        }
    }

    /// Record that `dependent` derives data from `dependency`.
    ///
    /// Adding an edge that already exists has no effect.
    pub fn add_dependency(&mut self, dependent: Tag, dependency: Tag, kind: DependencyKind) {
        let edges = self.dependents.entry(dependency).or_default();
        if !edges.contains(&(dependent, kind)) {
            edges.push((dependent, kind));
        }
    }

    /// The tables that directly depend on `dependency` with this kind.
    pub fn dependents(
        &self,
        dependency: Tag,
        kind: DependencyKind,
    ) -> impl Iterator<Item = Tag> + '_ {
        self.dependents
            .get(&dependency)
            .into_iter()
            .flatten()
            .filter(move |(_, edge_kind)| *edge_kind == kind)
            .map(|(tag, _)| *tag)
    }

    /// Every table reachable from `dependency` through edges of this kind.
    ///
    /// Each table is reported once, in breadth-first order. `dependency`
    /// itself is only included if it is part of a cycle.
    pub fn transitive_dependents(&self, dependency: Tag, kind: DependencyKind) -> Vec<Tag> {
        let mut seen = BTreeSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::from([dependency]);
        while let Some(next) = queue.pop_front() {
            for dependent in self.dependents(next, kind) {
                if seen.insert(dependent) {
                    result.push(dependent);
                    queue.push_back(dependent);
                }
            }
        }
        result
    }
}

impl Default for TableDependencyGraph {
    fn default() -> Self {
        const REBUILD: &[(&[u8; 4], &[u8; 4])] = &[
            (b"loca", b"glyf"),
            (b"hmtx", b"maxp"),
            (b"vmtx", b"maxp"),
            (b"hdmx", b"maxp"),
            (b"LTSH", b"maxp"),
            (b"post", b"maxp"),
            (b"cmap", b"maxp"),
            (b"Zapf", b"maxp"),
            (b"sbix", b"maxp"),
            (b"gvar", b"maxp"),
            (b"gvar", b"glyf"),
            (b"hmtx", b"hhea"),
            (b"vmtx", b"vhea"),
            (b"gvar", b"fvar"),
            (b"cvar", b"fvar"),
            (b"cvar", b"cvt "),
            (b"EBLC", b"EBDT"),
            (b"CBLC", b"CBDT"),
            (b"BLOC", b"BDAT"),
        ];

        let mut graph = Self::empty();
        for (dependent, dependency) in REBUILD {
            graph.add_dependency(
                Tag::new(dependent),
                Tag::new(dependency),
                DependencyKind::RebuildRequired,
            );
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const MAXP: Tag = Tag::new(b"maxp");
    const GLYF: Tag = Tag::new(b"glyf");

    #[test]
    fn default_edges() {
        let graph = TableDependencyGraph::default();
        let mut from_glyf: Vec<_> = graph
            .dependents(GLYF, DependencyKind::RebuildRequired)
            .collect();
        from_glyf.sort();
        assert_eq!(from_glyf, [Tag::new(b"gvar"), Tag::new(b"loca")]);
        assert_eq!(
            graph
                .dependents(GLYF, DependencyKind::ConsistencyRequired)
                .count(),
            0
        );
        assert_eq!(
            graph
                .dependents(Tag::new(b"cvt "), DependencyKind::RebuildRequired)
                .collect::<Vec<_>>(),
            [Tag::new(b"cvar")]
        );
    }

    #[test]
    fn edges_are_deduplicated() {
        let mut graph = TableDependencyGraph::empty();
        let kind = DependencyKind::ConsistencyRequired;
        graph.add_dependency(Tag::new(b"OS/2"), Tag::new(b"cmap"), kind);
        graph.add_dependency(Tag::new(b"OS/2"), Tag::new(b"cmap"), kind);
        assert_eq!(graph.dependents(Tag::new(b"cmap"), kind).count(), 1);
    }

    #[test]
    fn transitive() {
        let mut graph = TableDependencyGraph::default();
        let kind = DependencyKind::RebuildRequired;
        // a made-up chain: maxp -> hmtx -> abcd -> maxp
        graph.add_dependency(Tag::new(b"abcd"), Tag::new(b"hmtx"), kind);
        graph.add_dependency(MAXP, Tag::new(b"abcd"), kind);
        let reached = graph.transitive_dependents(MAXP, kind);
        let unique: BTreeSet<_> = reached.iter().copied().collect();
        assert_eq!(unique.len(), reached.len());
        assert!(reached.contains(&Tag::new(b"abcd")));
        assert!(reached.contains(&Tag::new(b"hmtx")));
        assert!(reached.contains(&MAXP));
        // direct dependents come first
        let abcd_pos = reached.iter().position(|t| *t == Tag::new(b"abcd"));
        let hmtx_pos = reached.iter().position(|t| *t == Tag::new(b"hmtx"));
        assert!(hmtx_pos < abcd_pos);
    }
}

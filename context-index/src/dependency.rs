//! File-level dependency graph.
//!
//! Each indexed file owns a [`DependencyRecord`] holding its outgoing
//! (`imports`) and incoming (`imported_by`) edges. Both directions are kept
//! in step: `b ∈ imports(a)` exactly when `a ∈ imported_by(b)`.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Edges recorded for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Files this file imports.
    pub imports: BTreeSet<PathBuf>,

    /// Files importing this file.
    pub imported_by: BTreeSet<PathBuf>,

    /// When the record was last touched.
    pub last_analyzed: DateTime<Utc>,
}

impl DependencyRecord {
    fn new() -> Self {
        Self {
            imports: BTreeSet::new(),
            imported_by: BTreeSet::new(),
            last_analyzed: Utc::now(),
        }
    }

    fn is_isolated(&self) -> bool {
        self.imports.is_empty() && self.imported_by.is_empty()
    }
}

/// Bidirectional import graph over file paths.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    records: HashMap<PathBuf, DependencyRecord>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` imports `to`. Duplicate edges are ignored.
    pub fn add_dependency(&mut self, from: &Path, to: &Path) {
        let now = Utc::now();

        let source = self
            .records
            .entry(from.to_path_buf())
            .or_insert_with(DependencyRecord::new);
        source.imports.insert(to.to_path_buf());
        source.last_analyzed = now;

        let target = self
            .records
            .entry(to.to_path_buf())
            .or_insert_with(DependencyRecord::new);
        target.imported_by.insert(from.to_path_buf());
        target.last_analyzed = now;

        trace!("Dependency {} -> {}", from.display(), to.display());
    }

    /// Remove `file` from the graph with every edge touching it.
    ///
    /// Neighbors are unlinked before the record itself is dropped so no
    /// dangling reverse edge survives. Returns the files that imported it.
    pub fn remove_dependencies(&mut self, file: &Path) -> BTreeSet<PathBuf> {
        let Some(record) = self.records.remove(file) else {
            return BTreeSet::new();
        };

        for target in &record.imports {
            if let Some(target_record) = self.records.get_mut(target) {
                target_record.imported_by.remove(file);
            }
        }
        for importer in &record.imported_by {
            if let Some(importer_record) = self.records.get_mut(importer) {
                importer_record.imports.remove(file);
            }
        }

        for neighbor in record.imports.iter().chain(&record.imported_by) {
            self.prune(neighbor);
        }

        record.imported_by
    }

    /// Recorded paths equal to or below `prefix`, sorted.
    pub fn paths_under(&self, prefix: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .records
            .keys()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    /// Every file that imports `file`, directly or transitively.
    ///
    /// Breadth-first over `imported_by`; cycles terminate and `file` itself
    /// is never included.
    pub fn get_affected_files(&self, file: &Path) -> Vec<PathBuf> {
        self.reachable(file, |record| &record.imported_by)
    }

    /// Every file `file` imports, directly or transitively.
    pub fn get_dependencies_transitive(&self, file: &Path) -> Vec<PathBuf> {
        self.reachable(file, |record| &record.imports)
    }

    fn reachable<'a>(
        &'a self,
        start: &Path,
        next: impl Fn(&'a DependencyRecord) -> &'a BTreeSet<PathBuf>,
    ) -> Vec<PathBuf> {
        let mut visited: HashSet<&Path> = HashSet::new();
        let mut queue: VecDeque<&Path> = VecDeque::new();
        let mut out = Vec::new();

        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let Some(record) = self.records.get(current) else {
                continue;
            };
            for neighbor in next(record) {
                if visited.insert(neighbor.as_path()) {
                    out.push(neighbor.clone());
                    queue.push_back(neighbor.as_path());
                }
            }
        }

        out
    }

    /// The record for a file, if it takes part in any edge.
    pub fn get_file_dependencies(&self, file: &Path) -> Option<&DependencyRecord> {
        self.records.get(file)
    }

    /// Direct imports of a file.
    pub fn imports_of(&self, file: &Path) -> Vec<PathBuf> {
        self.records
            .get(file)
            .map(|r| r.imports.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Direct importers of a file.
    pub fn importers_of(&self, file: &Path) -> Vec<PathBuf> {
        self.records
            .get(file)
            .map(|r| r.imported_by.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.records.values().map(|r| r.imports.len()).sum()
    }

    /// Number of files with at least one edge.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Check that forward and reverse edges agree.
    pub fn is_symmetric(&self) -> bool {
        self.records.iter().all(|(path, record)| {
            record.imports.iter().all(|target| {
                self.records
                    .get(target)
                    .is_some_and(|t| t.imported_by.contains(path))
            }) && record.imported_by.iter().all(|source| {
                self.records
                    .get(source)
                    .is_some_and(|s| s.imports.contains(path))
            })
        })
    }

    /// Drop a record once it has no edges left.
    fn prune(&mut self, file: &Path) {
        if self.records.get(file).is_some_and(DependencyRecord::is_isolated) {
            self.records.remove(file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    fn sorted(mut v: Vec<PathBuf>) -> Vec<PathBuf> {
        v.sort();
        v
    }

    /// c imports b, b imports a.
    fn chain() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(&p("/b.ts"), &p("/a.ts"));
        graph.add_dependency(&p("/c.ts"), &p("/b.ts"));
        graph
    }

    #[test]
    fn test_add_dependency_is_bidirectional() {
        let graph = chain();
        assert_eq!(graph.imports_of(&p("/b.ts")), vec![p("/a.ts")]);
        assert_eq!(graph.importers_of(&p("/a.ts")), vec![p("/b.ts")]);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_duplicate_edges_are_ignored() {
        let mut graph = chain();
        graph.add_dependency(&p("/b.ts"), &p("/a.ts"));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_affected_files_are_transitive() {
        let graph = chain();
        assert_eq!(
            sorted(graph.get_affected_files(&p("/a.ts"))),
            vec![p("/b.ts"), p("/c.ts")]
        );
        assert!(graph.get_affected_files(&p("/c.ts")).is_empty());
        assert!(graph.get_affected_files(&p("/unknown.ts")).is_empty());
    }

    #[test]
    fn test_transitive_dependencies() {
        let graph = chain();
        assert_eq!(
            sorted(graph.get_dependencies_transitive(&p("/c.ts"))),
            vec![p("/a.ts"), p("/b.ts")]
        );
    }

    #[test]
    fn test_cycles_terminate_and_exclude_start() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(&p("/a.ts"), &p("/b.ts"));
        graph.add_dependency(&p("/b.ts"), &p("/a.ts"));

        assert_eq!(graph.get_affected_files(&p("/a.ts")), vec![p("/b.ts")]);
        assert_eq!(graph.get_affected_files(&p("/b.ts")), vec![p("/a.ts")]);
    }

    #[test]
    fn test_remove_dependencies_unlinks_both_directions() {
        let mut graph = chain();
        let importers = graph.remove_dependencies(&p("/b.ts"));

        assert_eq!(importers.into_iter().collect::<Vec<_>>(), vec![p("/c.ts")]);
        assert!(graph.get_file_dependencies(&p("/b.ts")).is_none());
        assert!(graph.importers_of(&p("/a.ts")).is_empty());
        assert!(graph.imports_of(&p("/c.ts")).is_empty());
        assert!(graph.is_empty());
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_symmetry_survives_mixed_mutations() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(&p("/a.ts"), &p("/b.ts"));
        graph.add_dependency(&p("/a.ts"), &p("/c.ts"));
        graph.add_dependency(&p("/c.ts"), &p("/a.ts"));
        graph.add_dependency(&p("/d.ts"), &p("/c.ts"));
        assert!(graph.is_symmetric());

        graph.remove_dependencies(&p("/c.ts"));
        assert!(graph.is_symmetric());
        assert_eq!(graph.imports_of(&p("/a.ts")), vec![p("/b.ts")]);
        assert!(graph.get_file_dependencies(&p("/d.ts")).is_none());

        graph.add_dependency(&p("/d.ts"), &p("/a.ts"));
        graph.remove_dependencies(&p("/b.ts"));
        assert!(graph.is_symmetric());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_remove_unknown_file_is_noop() {
        let mut graph = chain();
        assert!(graph.remove_dependencies(&p("/zzz.ts")).is_empty());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_paths_under_prefix() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(&p("/app/main.ts"), &p("/app/gen/x.ts"));
        graph.add_dependency(&p("/app/gen/x.ts"), &p("/app/gen/sub/y.ts"));
        graph.add_dependency(&p("/app/main.ts"), &p("/app/generated.ts"));

        assert_eq!(
            graph.paths_under(&p("/app/gen")),
            vec![p("/app/gen/sub/y.ts"), p("/app/gen/x.ts")]
        );
        assert!(graph.paths_under(&p("/other")).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut graph = chain();
        graph.clear();
        assert_eq!(graph.len(), 0);
        assert_eq!(graph.edge_count(), 0);
    }
}

//! Import extraction and resolution.
//!
//! Extraction is textual and best-effort. Extractors are looked up by file
//! extension, so a parser-backed implementation can be registered for a
//! language without touching the graph or the incremental update path.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex_lite::Regex;

/// Resolution suffixes tried, in order, after the literal import path.
pub const DEFAULT_RESOLUTION_CANDIDATES: &[&str] =
    &[".ts", ".tsx", ".js", ".jsx", "/index.ts", "/index.js"];

/// Extracts raw import specifiers from source text.
pub trait DependencyExtractor: Send + Sync + std::fmt::Debug {
    /// Whether this extractor handles files with `extension` (no leading dot).
    fn supports(&self, extension: &str) -> bool;

    /// Import specifiers in source order.
    fn extract(&self, source: &str) -> Vec<String>;
}

/// Shared handle to an extractor.
pub type SharedExtractor = Arc<dyn DependencyExtractor>;

static IMPORT_FROM_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"import\s+[^'";]*?\s+from\s+['"]([^'"]+)['"]"#).ok());

static SIDE_EFFECT_IMPORT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*import\s+['"]([^'"]+)['"]"#).ok());

/// Pattern extractor for ECMAScript-style `import` statements.
#[derive(Debug, Clone)]
pub struct ImportPatternExtractor {
    extensions: Vec<String>,
}

impl Default for ImportPatternExtractor {
    fn default() -> Self {
        Self {
            extensions: ["ts", "tsx", "js", "jsx", "mjs", "cjs"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ImportPatternExtractor {
    /// Extractor restricted to the given extensions.
    pub fn for_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }
}

impl DependencyExtractor for ImportPatternExtractor {
    fn supports(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    fn extract(&self, source: &str) -> Vec<String> {
        let mut found: Vec<(usize, String)> = Vec::new();

        for re in [&*IMPORT_FROM_RE, &*SIDE_EFFECT_IMPORT_RE]
            .into_iter()
            .flatten()
        {
            for caps in re.captures_iter(source) {
                if let Some(m) = caps.get(1) {
                    found.push((m.start(), m.as_str().to_string()));
                }
            }
        }

        found.sort_by_key(|(pos, _)| *pos);
        let mut specifiers: Vec<String> = Vec::with_capacity(found.len());
        for (_, spec) in found {
            if !specifiers.contains(&spec) {
                specifiers.push(spec);
            }
        }
        specifiers
    }
}

/// Whether an import specifier is relative to the importing file.
pub fn is_relative_import(specifier: &str) -> bool {
    specifier.starts_with('.')
}

/// Lexically normalize a path, folding `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Resolve a relative import from `importer` to a file on disk.
///
/// Tries the literal path first, then each candidate suffix in order. Only
/// regular files count as a match. Non-relative specifiers never resolve.
pub async fn resolve_import(
    importer: &Path,
    specifier: &str,
    candidates: &[String],
) -> Option<PathBuf> {
    if !is_relative_import(specifier) {
        return None;
    }

    let base = normalize_path(&importer.parent()?.join(specifier));

    if is_file(&base).await {
        return Some(base);
    }

    let base = base.to_string_lossy();
    for suffix in candidates {
        let candidate = PathBuf::from(format!("{base}{suffix}"));
        if is_file(&candidate).await {
            return Some(candidate);
        }
    }

    None
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

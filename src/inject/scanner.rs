//! Artifact discovery and injection-site enumeration
//!
//! Discovery walks the target tree and applies the configured include and
//! exclude globs. Site enumeration runs a compiled pattern over one
//! artifact's source and records every builder-construction call site,
//! marking the ones that are already wrapped in the registration call.

use std::path::{Path, PathBuf};

use anyhow::Context;
use glob::Pattern;
use regex::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::verify;
use crate::config::InjectConfig;
use crate::Result;

/// One detected builder-construction site within an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionSite {
    /// Byte offset where the builder call expression starts.
    pub start: usize,
    /// Byte offset just past the builder call's closing parenthesis.
    pub end: usize,
    /// 1-based line of `start`.
    pub line: usize,
    /// 1-based column of `start`.
    pub column: usize,
    /// The site is already wrapped in the registration call.
    pub instrumented: bool,
}

/// Enumerate the artifacts selected by the config, in a stable order.
pub fn discover_artifacts(root: &Path, config: &InjectConfig) -> Result<Vec<PathBuf>> {
    let include = compile_patterns(&config.include)?;
    let exclude = compile_patterns(&config.exclude)?;

    let mut artifacts = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.context("Failed to walk target directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let relative = relative.to_string_lossy();
        if !include.iter().any(|pattern| pattern.matches(&relative)) {
            continue;
        }
        if exclude.iter().any(|pattern| pattern.matches(&relative)) {
            debug!(artifact = %relative, "Excluded by pattern");
            continue;
        }
        artifacts.push(entry.path().to_path_buf());
    }

    info!(
        root = %root.display(),
        count = artifacts.len(),
        "Artifact discovery complete"
    );
    Ok(artifacts)
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| Pattern::new(pattern).map_err(Into::into))
        .collect()
}

/// Compiled detector for builder-construction sites.
pub struct SiteScanner {
    pattern: Regex,
    wrapper_call: String,
}

impl SiteScanner {
    pub fn new(config: &InjectConfig) -> Result<Self> {
        let alternation = config
            .builder_patterns
            .iter()
            .map(|pattern| regex::escape(pattern))
            .collect::<Vec<_>>()
            .join("|");
        // Builder constructions are zero-argument calls on the configured
        // paths.
        let pattern = Regex::new(&format!(r"(?:{})\s*\(\s*\)", alternation))?;
        Ok(Self {
            pattern,
            wrapper_call: format!("{}(", config.wrapper_name()),
        })
    }

    /// Find every construction site in one artifact's source, in order of
    /// appearance. Matches inside string/char literals or comments are host
    /// data, not code, and are never counted as sites.
    pub fn scan(&self, source: &str) -> Vec<InjectionSite> {
        let masked = verify::non_code_spans(source);
        self.pattern
            .find_iter(source)
            .filter(|found| !masked.iter().any(|span| span.contains(&found.start())))
            .filter(|found| !is_path_continuation(source, found.start()))
            .map(|found| {
                let (line, column) = position(source, found.start());
                InjectionSite {
                    start: found.start(),
                    end: found.end(),
                    line,
                    column,
                    instrumented: self.is_wrapped(source, found.start()),
                }
            })
            .collect()
    }

    /// A site is instrumented when the registration call immediately
    /// precedes it, however the wrapper path was qualified at the call site.
    /// The wrapper name must stand on its own: a longer identifier that
    /// merely ends with it (`my_instrument_builder`) does not count.
    fn is_wrapped(&self, source: &str, start: usize) -> bool {
        let prefix = source[..start].trim_end();
        let Some(head) = prefix.strip_suffix(&self.wrapper_call) else {
            return false;
        };
        !head
            .chars()
            .next_back()
            .is_some_and(|c| c == '_' || c.is_alphanumeric())
    }
}

/// True when the match begins in the middle of a longer path or identifier
/// (`MyClient::builder` must not match the `Client::builder` pattern).
fn is_path_continuation(source: &str, start: usize) -> bool {
    source[..start]
        .chars()
        .next_back()
        .is_some_and(|c| c == ':' || c == '_' || c.is_alphanumeric())
}

/// 1-based line and column of a byte offset. Columns count characters, so
/// multi-byte text earlier on the line does not shift the diagnostic.
fn position(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = source[line_start..offset].chars().count() + 1;
    (line, column)
}

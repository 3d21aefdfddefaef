//! Injection pass - build-time rewrite of client-construction sites
//!
//! The pass walks a target tree, enumerates every HTTP-client-builder
//! construction site, wraps each one in the observer-registration call, and
//! verifies that every rewritten artifact is still structurally sound
//! before writing it back.
//!
//! Each artifact moves through a linear state machine:
//!
//! ```text
//! Unscanned -> Scanned (sites enumerated)
//!           -> Rewritten (sites patched)
//!           -> Verified (structure checked)   terminal, success
//!           -> Rejected                       terminal, fatal build failure
//! ```
//!
//! Runtime telemetry fails open; this pass fails closed. A structurally
//! invalid rewrite aborts the whole run, because a broken artifact is worse
//! than an uninstrumented one. A missing construction API or a variant
//! whose classpath lacks the registration symbol simply produces no
//! rewrite.

pub mod classpath;
pub mod rewrite;
pub mod scanner;
pub mod verify;

pub use self::classpath::Classpath;
pub use self::scanner::InjectionSite;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::InjectConfig;
use crate::{Result, TelegraftError};

use self::scanner::SiteScanner;

/// Progress of one artifact through the pass.
#[derive(Debug)]
enum ArtifactState {
    Unscanned,
    Scanned { sites: Vec<InjectionSite> },
    Rewritten { output: String, injected: usize },
    /// `output` is None when the artifact had nothing to patch.
    Verified { output: Option<String>, injected: usize },
    Rejected { line: usize, column: usize, reason: String },
}

#[derive(Debug)]
struct Artifact {
    path: PathBuf,
    source: String,
    state: ArtifactState,
}

/// Outcome summary of one pass invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InjectionReport {
    pub artifacts_scanned: usize,
    pub artifacts_rewritten: usize,
    pub sites_found: usize,
    pub sites_injected: usize,
    pub sites_already_instrumented: usize,
    /// The variant's classpath lacked the registration symbol, so no
    /// rewrite was attempted.
    pub variant_gated: bool,
}

/// The build-time transformation pass. One instance per invocation; no
/// state is shared across artifacts.
pub struct InjectionPass {
    config: InjectConfig,
    classpath: Option<Classpath>,
    dry_run: bool,
}

impl InjectionPass {
    pub fn new(config: InjectConfig) -> Self {
        Self {
            config,
            classpath: None,
            dry_run: false,
        }
    }

    /// Gate injection on a build variant's available symbols.
    pub fn with_classpath(mut self, classpath: Classpath) -> Self {
        self.classpath = Some(classpath);
        self
    }

    /// Compute the report without writing any artifact back.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the pass over every artifact under `target`.
    ///
    /// Returns the report on success. Fails with
    /// [`TelegraftError::InjectionSite`] if any rewrite produced a
    /// structurally invalid artifact.
    pub async fn run(&self, target: &Path) -> Result<InjectionReport> {
        let mut report = InjectionReport::default();

        // Injected code may only call symbols present in this variant.
        if let Some(classpath) = &self.classpath {
            if !classpath.contains(&self.config.wrapper_path) {
                info!(
                    symbol = %self.config.wrapper_path,
                    "Registration symbol absent from variant classpath; skipping injection"
                );
                report.variant_gated = true;
                return Ok(report);
            }
        }

        let site_scanner = SiteScanner::new(&self.config)?;
        let paths = scanner::discover_artifacts(target, &self.config)?;

        for path in paths {
            let source = tokio::fs::read_to_string(&path).await?;
            let mut artifact = Artifact {
                path,
                source,
                state: ArtifactState::Unscanned,
            };

            self.advance(&mut artifact, &site_scanner, &mut report);

            match artifact.state {
                ArtifactState::Verified {
                    output: Some(output),
                    injected,
                } => {
                    report.artifacts_rewritten += 1;
                    if self.dry_run {
                        debug!(
                            artifact = %artifact.path.display(),
                            injected,
                            "Dry run; artifact left untouched"
                        );
                    } else {
                        tokio::fs::write(&artifact.path, output).await?;
                        info!(
                            artifact = %artifact.path.display(),
                            injected,
                            "Artifact rewritten"
                        );
                    }
                }
                ArtifactState::Verified { output: None, .. } => {}
                ArtifactState::Rejected {
                    line,
                    column,
                    reason,
                } => {
                    warn!(
                        artifact = %artifact.path.display(),
                        line, column, "Rewrite rejected"
                    );
                    return Err(TelegraftError::InjectionSite {
                        artifact: artifact.path,
                        line,
                        column,
                        reason,
                    });
                }
                // advance always reaches a terminal state.
                _ => unreachable!("injection pass left artifact in a non-terminal state"),
            }
        }

        info!(
            artifacts = report.artifacts_scanned,
            sites = report.sites_found,
            injected = report.sites_injected,
            "Injection pass complete"
        );
        Ok(report)
    }

    /// Drive one artifact from `Unscanned` to a terminal state.
    fn advance(&self, artifact: &mut Artifact, site_scanner: &SiteScanner, report: &mut InjectionReport) {
        // Unscanned -> Scanned
        let sites = site_scanner.scan(&artifact.source);
        report.artifacts_scanned += 1;
        report.sites_found += sites.len();
        report.sites_already_instrumented +=
            sites.iter().filter(|site| site.instrumented).count();
        artifact.state = ArtifactState::Scanned { sites };

        // Scanned -> Rewritten | Verified (nothing to patch)
        let ArtifactState::Scanned { sites } = std::mem::replace(&mut artifact.state, ArtifactState::Unscanned)
        else {
            unreachable!()
        };
        let pending = sites.iter().filter(|site| !site.instrumented).count();
        if pending == 0 {
            artifact.state = ArtifactState::Verified {
                output: None,
                injected: 0,
            };
            return;
        }
        let output = rewrite::apply(&artifact.source, &sites, &self.config.wrapper_path);
        artifact.state = ArtifactState::Rewritten {
            output,
            injected: pending,
        };

        // Rewritten -> Verified | Rejected
        let ArtifactState::Rewritten { output, injected } =
            std::mem::replace(&mut artifact.state, ArtifactState::Unscanned)
        else {
            unreachable!()
        };
        if let Err(broken) = verify::check_delimiters(&output) {
            artifact.state = ArtifactState::Rejected {
                line: broken.line,
                column: broken.column,
                reason: broken.reason,
            };
            return;
        }
        // Every site must now be wrapped; a leftover means the rewrite
        // missed one.
        if let Some(missed) = site_scanner
            .scan(&output)
            .into_iter()
            .find(|site| !site.instrumented)
        {
            artifact.state = ArtifactState::Rejected {
                line: missed.line,
                column: missed.column,
                reason: "Construction site left uninstrumented after rewrite".to_string(),
            };
            return;
        }

        report.sites_injected += injected;
        artifact.state = ArtifactState::Verified {
            output: Some(output),
            injected,
        };
    }
}

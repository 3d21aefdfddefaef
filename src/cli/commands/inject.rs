use std::path::PathBuf;

use anyhow::Context;

use super::resolve_config;
use crate::inject::{Classpath, InjectionPass};
use crate::Result;

/// Handler for the `inject` command
pub struct InjectCommand {
    pub target: PathBuf,
    pub config: Option<PathBuf>,
    pub variant: Option<String>,
    pub dry_run: bool,
    pub json: bool,
}

impl InjectCommand {
    pub fn new(
        target: PathBuf,
        config: Option<PathBuf>,
        variant: Option<String>,
        dry_run: bool,
        json: bool,
    ) -> Self {
        Self {
            target,
            config,
            variant,
            dry_run,
            json,
        }
    }
}

impl InjectCommand {
    pub async fn execute(&self) -> Result<()> {
        let config = resolve_config(&self.target, self.config.as_ref())?;

        let mut pass = InjectionPass::new(config.clone()).dry_run(self.dry_run);
        if let Some(variant) = &self.variant {
            let classpath = Classpath::from_variant(config.variant(variant)?);
            pass = pass.with_classpath(classpath);
        }

        let report = pass.run(&self.target).await?;

        if self.json {
            let rendered = serde_json::to_string_pretty(&report)
                .context("Failed to render injection report")?;
            println!("{rendered}");
            return Ok(());
        }

        if report.variant_gated {
            println!(
                "Variant '{}' has no access to the registration symbol; nothing injected.",
                self.variant.as_deref().unwrap_or("<none>")
            );
            return Ok(());
        }

        println!(
            "Scanned {} artifacts: {} sites found, {} injected, {} already instrumented{}",
            report.artifacts_scanned,
            report.sites_found,
            report.sites_injected,
            report.sites_already_instrumented,
            if self.dry_run { " (dry run)" } else { "" },
        );
        Ok(())
    }
}

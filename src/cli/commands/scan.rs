use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;

use super::resolve_config;
use crate::inject::scanner::{discover_artifacts, SiteScanner};
use crate::Result;

/// Handler for the `scan` command: enumerate sites, rewrite nothing.
pub struct ScanCommand {
    pub target: PathBuf,
    pub config: Option<PathBuf>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SiteListing {
    artifact: PathBuf,
    line: usize,
    column: usize,
    instrumented: bool,
}

impl ScanCommand {
    pub fn new(target: PathBuf, config: Option<PathBuf>, json: bool) -> Self {
        Self {
            target,
            config,
            json,
        }
    }

    async fn collect(&self) -> Result<Vec<SiteListing>> {
        let config = resolve_config(&self.target, self.config.as_ref())?;
        let site_scanner = SiteScanner::new(&config)?;

        let mut listings = Vec::new();
        for path in discover_artifacts(&self.target, &config)? {
            let source = tokio::fs::read_to_string(&path).await?;
            let relative = path
                .strip_prefix(&self.target)
                .unwrap_or(&path)
                .to_path_buf();
            for site in site_scanner.scan(&source) {
                listings.push(SiteListing {
                    artifact: relative.clone(),
                    line: site.line,
                    column: site.column,
                    instrumented: site.instrumented,
                });
            }
        }
        Ok(listings)
    }

    pub async fn execute(&self) -> Result<()> {
        let listings = self.collect().await?;

        if self.json {
            let rendered =
                serde_json::to_string_pretty(&listings).context("Failed to render site list")?;
            println!("{rendered}");
            return Ok(());
        }

        if listings.is_empty() {
            println!("No construction sites found.");
            return Ok(());
        }
        for site in &listings {
            println!(
                "{}:{}:{} {}",
                site.artifact.display(),
                site.line,
                site.column,
                if site.instrumented {
                    "(instrumented)"
                } else {
                    "(pending)"
                },
            );
        }
        Ok(())
    }
}

//! File writing stage.
//!
//! Writes rendered posts and pages to the output directory and copies static
//! files. Entities that failed an earlier stage are skipped. Any I/O failure
//! here stops the build.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::build::pipeline::{BuildError, BuildIssue, PipelineContext, Stage};
use crate::build::processor::Processor;
use crate::build::site::Site;

pub struct WriteStage;

impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(&self, site: &mut Site, ctx: &PipelineContext) -> Result<(), BuildError> {
        site.check_output_dir()?;
        let output_dir = site.output_dir();
        std::fs::create_dir_all(&output_dir).map_err(|source| BuildError::OutputRoot {
            path: output_dir.clone(),
            source,
        })?;

        let mut written: HashSet<PathBuf> = HashSet::new();
        let mut duplicates = Vec::new();
        let mut escaped = Vec::new();

        let entries = site
            .posts
            .iter()
            .map(|p| &p.entry)
            .chain(site.pages.iter().map(|p| &p.entry))
            .filter(|entry| !entry.is_failed());
        for entry in entries {
            let Some(output_path) = entry.output_path(&output_dir) else {
                escaped.push(entry.url.clone());
                continue;
            };
            write_file(&output_path, entry.content().as_bytes())?;
            if !written.insert(output_path) {
                duplicates.push(entry.url.clone());
            }
        }

        let source_dir = site.source_dir();
        for file in &site.static_files {
            let output_path = output_dir.join(&file.path);
            create_parent(&output_path)?;
            std::fs::copy(source_dir.join(&file.path), &output_path)
                .map_err(|e| BuildError::io(&output_path, e))?;
            written.insert(output_path);
        }

        for url in escaped {
            site.record(BuildIssue::error(
                "write",
                url,
                "URL resolves outside the output directory",
            ));
        }
        for url in duplicates {
            site.record(BuildIssue::warning(
                "write",
                url,
                "another entity wrote the same output file",
            ));
        }

        let mut written: Vec<PathBuf> = written.into_iter().collect();
        written.sort();
        tracing::info!(
            files = written.len(),
            output = %output_dir.display(),
            "wrote output"
        );
        site.written = written;

        ctx.processors.post_write(site);
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    Ok(())
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), BuildError> {
    create_parent(path)?;
    std::fs::write(path, content).map_err(|e| BuildError::io(path, e))
}

//! Stale output cleanup stage.
//!
//! Deletes files under the output directory that this build did not write,
//! then prunes directories left empty. Paths listed in `keep_files` are
//! never touched. Failures here only produce warnings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::build::pipeline::{BuildError, BuildIssue, PipelineContext, Stage};
use crate::build::processor::Processor;
use crate::build::site::Site;

pub struct CleanupStage;

impl Stage for CleanupStage {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn process(&self, site: &mut Site, ctx: &PipelineContext) -> Result<(), BuildError> {
        site.check_output_dir()?;
        let output_dir = site.output_dir();
        if output_dir.is_dir() {
            let keep: Vec<PathBuf> = site
                .config
                .keep_files
                .iter()
                .map(|k| output_dir.join(k.trim_start_matches('/')))
                .collect();
            let written: HashSet<&Path> = site.written.iter().map(PathBuf::as_path).collect();

            let (removed, warnings) = remove_stale(&output_dir, &written, &keep);
            for issue in warnings {
                site.record(issue);
            }
            tracing::info!(removed, "cleaned output");
        }

        ctx.processors.post_cleanup(site);
        Ok(())
    }
}

fn remove_stale(
    output_dir: &Path,
    written: &HashSet<&Path>,
    keep: &[PathBuf],
) -> (usize, Vec<BuildIssue>) {
    let mut removed = 0;
    let mut warnings = Vec::new();
    let warn = |path: &Path, message: String| {
        BuildIssue::warning("cleanup", path.display().to_string(), message)
    };
    let is_kept = |path: &Path| keep.iter().any(|k| path.starts_with(k));

    // Files first; directories are collected deepest-first for pruning.
    let mut dirs = Vec::new();
    for entry in WalkDir::new(output_dir).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warnings.push(warn(e.path().unwrap_or(output_dir), e.to_string()));
                continue;
            }
        };
        let path = entry.path();
        if is_kept(path) {
            continue;
        }

        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        } else if !written.contains(path) {
            match std::fs::remove_file(path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "removed stale file");
                    removed += 1;
                }
                Err(e) => warnings.push(warn(path, e.to_string())),
            }
        }
    }

    for dir in dirs {
        let empty = std::fs::read_dir(&dir)
            .map(|mut it| it.next().is_none())
            .unwrap_or(false);
        if empty && let Err(e) = std::fs::remove_dir(&dir) {
            warnings.push(warn(&dir, e.to_string()));
        }
    }

    (removed, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_stale_keeps_written_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        for file in ["index.html", "old/index.html", ".git/HEAD", "static/app.css"] {
            let path = out.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "x").unwrap();
        }

        let index = out.join("index.html");
        let css = out.join("static/app.css");
        let written: HashSet<&Path> = [index.as_path(), css.as_path()].into_iter().collect();
        let keep = vec![out.join(".git")];

        let (removed, warnings) = remove_stale(out, &written, &keep);

        assert_eq!(removed, 1);
        assert!(warnings.is_empty());
        assert!(index.exists());
        assert!(css.exists());
        assert!(out.join(".git/HEAD").exists());
        assert!(!out.join("old").exists());
    }

    #[test]
    fn test_remove_stale_walks_past_kept_directory() {
        // Kept directories sort before and after stale siblings.
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        for file in [
            "a-stale.html",
            ".git/HEAD",
            ".git/refs/main",
            "m/stale/index.html",
            "z-stale/index.html",
            "zz/kept.txt",
        ] {
            let path = out.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "x").unwrap();
        }
        let keep = vec![out.join(".git"), out.join("zz")];

        let (removed, warnings) = remove_stale(out, &HashSet::new(), &keep);

        assert_eq!(removed, 3);
        assert!(warnings.is_empty());
        assert!(!out.join("a-stale.html").exists());
        assert!(!out.join("m").exists());
        assert!(!out.join("z-stale").exists());
        assert!(out.join(".git/refs/main").exists());
        assert!(out.join("zz/kept.txt").exists());
    }
}

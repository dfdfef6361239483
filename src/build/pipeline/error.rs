//! Build errors and per-entity issues.
//!
//! A [`BuildError`] aborts the whole build. Everything that only affects one
//! entity is a [`BuildIssue`]: recorded on the site, logged, and reported at
//! the end while the rest of the build carries on.

use std::fmt;
use std::path::PathBuf;

use crate::build::render::RenderError;
use crate::build::source::SourceError;
use crate::theme::ThemeError;

/// Fatal build errors.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("content root not found: {}", .0.display())]
    ContentRootMissing(PathBuf),

    #[error("cannot create output root {}: {source}", .path.display())]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "output directory {} contains {}; refusing to write or clean it",
        .output.display(),
        .path.display()
    )]
    OutputOverlapsSources { output: PathBuf, path: PathBuf },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("theme error: {0}")]
    Theme(#[from] ThemeError),
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A problem confined to one entity or file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIssue {
    /// Stage that found the problem (e.g. "render")
    pub stage: &'static str,
    /// The file or URL concerned
    pub subject: String,
    pub message: String,
    pub severity: Severity,
}

impl BuildIssue {
    pub fn warning(
        stage: &'static str,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            subject: subject.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn error(
        stage: &'static str,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            subject: subject.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for BuildIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.stage, self.subject, self.message
        )
    }
}

/// Log an issue and append it to the list.
pub fn record_issue(issues: &mut Vec<BuildIssue>, issue: BuildIssue) {
    match issue.severity {
        Severity::Warning => tracing::warn!(
            stage = issue.stage,
            subject = %issue.subject,
            "{}",
            issue.message
        ),
        Severity::Error => tracing::error!(
            stage = issue.stage,
            subject = %issue.subject,
            "{}",
            issue.message
        ),
    }
    issues.push(issue);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let issue = BuildIssue::error("render", "/about.html", "template not found: page.html");
        assert_eq!(
            issue.to_string(),
            "error [render] /about.html: template not found: page.html"
        );
        assert!(issue.is_error());
        assert!(!BuildIssue::warning("read", "a.md", "x").is_error());
    }

    #[test]
    fn test_record_issue_appends_in_order() {
        let mut issues = Vec::new();
        record_issue(&mut issues, BuildIssue::warning("read", "a.md", "first"));
        record_issue(&mut issues, BuildIssue::error("convert", "b.md", "second"));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].message, "first");
        assert_eq!(issues[1].severity, Severity::Error);
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use super::front_matter::{FrontMatter, FrontMatterError, has_front_matter, parse_front_matter};

/// Directory (at any depth) whose files are posts rather than pages.
pub const POSTS_DIR: &str = "_posts";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed front matter in {path}: {reason}")]
    Malformed {
        path: PathBuf,
        reason: FrontMatterError,
    },

    #[error("failed to walk content tree: {0}")]
    Walk(#[from] walkdir::Error),
}

impl SourceError {
    /// The file this error is about, if it is about a single file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            SourceError::Io { path, .. } | SourceError::Malformed { path, .. } => Some(path),
            SourceError::Walk(e) => e.path(),
        }
    }
}

// =============================================================================
// Sources and static files
// =============================================================================

/// A loaded content file: front matter plus raw body.
///
/// Sources are immutable once loaded and shared read-only (`Arc`) with the
/// entity built from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Path relative to the content root (e.g. "_posts/2021-03-01-hello.md")
    pub path: PathBuf,
    /// Parsed front matter
    pub front_matter: FrontMatter,
    /// Content after the front matter block
    pub body: String,
    /// Lowercase file extension without the dot; selects the converter
    pub kind: String,
}

impl Source {
    pub fn new(path: impl Into<PathBuf>, front_matter: FrontMatter, body: impl Into<String>) -> Self {
        let path = path.into();
        let kind = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        Self {
            path,
            front_matter,
            body: body.into(),
            kind,
        }
    }

    /// Parse a source from raw file content.
    pub fn parse(path: impl Into<PathBuf>, raw: &str) -> Result<Self, SourceError> {
        let path = path.into();
        let parsed = parse_front_matter(raw).map_err(|reason| SourceError::Malformed {
            path: path.clone(),
            reason,
        })?;
        Ok(Self::new(path, parsed.front_matter, parsed.body))
    }

    /// Returns true if this source lives under a `_posts` directory.
    pub fn is_post(&self) -> bool {
        self.path
            .parent()
            .is_some_and(|dir| dir.components().any(|c| c.as_os_str() == POSTS_DIR))
    }

    /// File name without extension.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Source-relative path with forward slashes.
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }
}

/// A file without front matter, copied verbatim to the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    /// Path relative to the content root (e.g. "images/logo.png")
    pub path: PathBuf,
}

// =============================================================================
// Loader
// =============================================================================

/// Everything found under the content root.
#[derive(Debug, Default)]
pub struct LoadedContent {
    /// Sources in discovery order
    pub sources: Vec<Arc<Source>>,
    pub static_files: Vec<StaticFile>,
    /// Per-file failures; loading continued past each of these
    pub errors: Vec<SourceError>,
}

/// Walks a content root and loads every source file in it.
pub struct SourceLoader {
    root: PathBuf,
}

impl SourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Discover and load all content.
    ///
    /// Directories are walked in file-name order, so discovery order is
    /// stable across runs. Files are read and parsed in parallel; a file that
    /// fails is reported in `errors` and does not stop the others.
    pub fn load(&self) -> Result<LoadedContent, SourceError> {
        let mut files = Vec::new();
        let mut errors = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_ignored(entry));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                // The root itself being unreadable is fatal
                Err(e) if e.depth() == 0 => return Err(SourceError::Walk(e)),
                Err(e) => errors.push(SourceError::Walk(e)),
            }
        }

        let loaded: Vec<Result<Loaded, SourceError>> =
            files.par_iter().map(|path| self.load_file(path)).collect();

        let mut content = LoadedContent {
            errors,
            ..Default::default()
        };
        for result in loaded {
            match result {
                Ok(Loaded::Source(source)) => content.sources.push(Arc::new(source)),
                Ok(Loaded::Static(file)) => content.static_files.push(file),
                Err(e) => content.errors.push(e),
            }
        }

        tracing::debug!(
            root = %self.root.display(),
            sources = content.sources.len(),
            static_files = content.static_files.len(),
            errors = content.errors.len(),
            "loaded content tree"
        );
        Ok(content)
    }

    fn load_file(&self, path: &Path) -> Result<Loaded, SourceError> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();

        let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
            path: relative.clone(),
            source,
        })?;

        // Binary files cannot carry front matter
        let Ok(raw) = std::str::from_utf8(&bytes) else {
            return Ok(Loaded::Static(StaticFile { path: relative }));
        };

        if !has_front_matter(raw) {
            return Ok(Loaded::Static(StaticFile { path: relative }));
        }

        Source::parse(relative, raw).map(Loaded::Source)
    }
}

enum Loaded {
    Source(Source),
    Static(StaticFile),
}

/// Hidden entries and `_`-prefixed directories (other than `_posts`) are
/// not content.
fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && name.starts_with('_') && name != POSTS_DIR
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_source_kind_and_post_detection() {
        let post = Source::new("_posts/2021-03-01-hello.md", FrontMatter::new(), "");
        assert_eq!(post.kind, "md");
        assert!(post.is_post());
        assert_eq!(post.stem(), "2021-03-01-hello");

        let page = Source::new("about.HTML", FrontMatter::new(), "");
        assert_eq!(page.kind, "html");
        assert!(!page.is_post());
    }

    #[test]
    fn test_load_content_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "_posts/2021-03-01-b.md", "---\ntitle: B\n---\nbody b");
        write(root, "_posts/2021-03-02-a.md", "---\ntitle: A\n---\nbody a");
        write(root, "about.md", "---\ntitle: About\n---\nabout");
        write(root, "images/logo.txt", "not a source");
        write(root, ".hidden/secret.md", "---\ntitle: Hidden\n---\n");
        write(root, "_drafts/draft.md", "---\ntitle: Draft\n---\n");

        let content = SourceLoader::new(root).load().unwrap();

        let paths: Vec<String> = content.sources.iter().map(|s| s.path_string()).collect();
        assert_eq!(
            paths,
            vec!["_posts/2021-03-01-b.md", "_posts/2021-03-02-a.md", "about.md"]
        );
        assert_eq!(
            content.static_files,
            vec![StaticFile {
                path: PathBuf::from("images/logo.txt")
            }]
        );
        assert!(content.errors.is_empty());
    }

    #[test]
    fn test_malformed_source_is_collected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "good.md", "---\ntitle: Good\n---\nok");
        write(root, "broken.md", "---\ntitle: Broken\nno closing delimiter");

        let content = SourceLoader::new(root).load().unwrap();

        assert_eq!(content.sources.len(), 1);
        assert_eq!(content.errors.len(), 1);
        match &content.errors[0] {
            SourceError::Malformed { path, reason } => {
                assert_eq!(path, &PathBuf::from("broken.md"));
                assert!(matches!(reason, FrontMatterError::Unterminated));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Path and URL conversion utilities.
//!
//! This module handles conversions between:
//! - Source file paths (relative paths within the content root)
//! - URL paths (the URL at which content will be served)
//! - Output file paths (where files are written in the output directory)

use std::path::{Path, PathBuf};

/// Values substituted into a permalink pattern.
#[derive(Debug, Default)]
pub struct PermalinkParts<'a> {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub title: &'a str,
    pub categories: &'a [String],
}

/// Expand a permalink pattern such as `/:year/:month/:day/:title/`.
///
/// Missing parts expand to nothing and the resulting empty segments are
/// collapsed.
pub fn expand_permalink(pattern: &str, parts: &PermalinkParts) -> String {
    let categories = parts
        .categories
        .iter()
        .map(|c| crate::build::taxonomy::slugify(c))
        .collect::<Vec<_>>()
        .join("/");

    let url = pattern
        .replace(":categories", &categories)
        .replace(":title", parts.title)
        .replace(":name", parts.title)
        .replace(":year", parts.year.as_deref().unwrap_or_default())
        .replace(":month", parts.month.as_deref().unwrap_or_default())
        .replace(":day", parts.day.as_deref().unwrap_or_default());

    normalize_url(&url)
}

/// Convert a source path to a page URL.
///
/// The extension is replaced with the converter's output extension, and
/// `index.html` collapses to its directory.
///
/// # Examples
/// ```ignore
/// source_path_to_url("about.md", ".html") => "/about.html"
/// source_path_to_url("blog/index.md", ".html") => "/blog/"
/// source_path_to_url("index.html", ".html") => "/"
/// ```
pub fn source_path_to_url(path: &Path, output_extension: &str) -> String {
    let path_str = path.with_extension("").to_string_lossy().replace('\\', "/");
    let url = format!("/{}{}", path_str, output_extension);

    match url.strip_suffix("index.html") {
        Some(dir) if dir.ends_with('/') => dir.to_string(),
        _ => url,
    }
}

/// The directory part of a URL, with a trailing slash.
///
/// "/blog/" -> "/blog/", "/blog/index.html" -> "/blog/", "/about.html" -> "/"
pub fn url_dir(url: &str) -> &str {
    match url.rfind('/') {
        Some(pos) => &url[..=pos],
        None => "/",
    }
}

/// Convert a URL path to an output file path.
///
/// The URL is percent-decoded first so that non-ASCII slugs become real
/// file names. Directory URLs (trailing slash) and extensionless URLs become
/// `path/index.html`; URLs with an extension keep their path. `.` and `..`
/// segments are resolved; a URL that climbs above the output root yields
/// `None`.
///
/// # Examples
/// ```ignore
/// url_to_output_path("/2021/03/01/hello/", output_dir) => Some(output_dir/2021/03/01/hello/index.html)
/// url_to_output_path("/", output_dir) => Some(output_dir/index.html)
/// url_to_output_path("/about.html", output_dir) => Some(output_dir/about.html)
/// url_to_output_path("/../escaped.html", output_dir) => None
/// ```
pub fn url_to_output_path(url_path: &str, output_dir: &Path) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url_path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| url_path.to_string());

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(segment),
        }
    }

    let is_dir = decoded.is_empty()
        || decoded.ends_with('/')
        || decoded.ends_with("/.")
        || decoded.ends_with("/..");
    let mut path = output_dir.to_path_buf();
    path.extend(&segments);

    let has_extension = segments
        .last()
        .is_some_and(|last| Path::new(last).extension().is_some());
    if is_dir || !has_extension {
        path.push("index.html");
    }
    Some(path)
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Collapse repeated slashes and ensure a leading slash.
fn normalize_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len() + 1);
    if !url.starts_with('/') {
        out.push('/');
    }
    for c in url.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

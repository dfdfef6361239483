//! The build context.
//!
//! One [`Site`] exists per build. It owns the configuration, every entity
//! read or generated during the build and the issues recorded along the way.
//! Stages take it by `&mut` in turn, so its collections are never shared
//! across threads while they are being modified.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::cache::{ContentCache, MemoryCache};
use super::entity::{Page, Post, link_neighbours, sort_posts};
use super::pipeline::{BuildError, BuildIssue, record_issue};
use super::source::StaticFile;
use super::taxonomy::{self, Category, Tag, Taxon};
use crate::config::{ContentCacheMode, SiteConfig};

pub struct Site {
    pub config: SiteConfig,
    /// Directory relative config paths resolve against
    pub base_path: PathBuf,
    /// Posts, newest first once reading finishes
    pub posts: Vec<Post>,
    pub pages: Vec<Page>,
    pub tags: Vec<Tag>,
    pub categories: Vec<Category>,
    pub static_files: Vec<StaticFile>,
    /// Output files produced by this build
    pub written: Vec<PathBuf>,
    pub issues: Vec<BuildIssue>,
    cache: Option<Arc<dyn ContentCache>>,
}

impl Site {
    pub fn new(config: SiteConfig, base_path: PathBuf) -> Self {
        let cache: Option<Arc<dyn ContentCache>> = match config.content_cache {
            ContentCacheMode::Inline => None,
            ContentCacheMode::Memory => Some(Arc::new(MemoryCache::new())),
        };
        Self {
            config,
            base_path,
            posts: Vec::new(),
            pages: Vec::new(),
            tags: Vec::new(),
            categories: Vec::new(),
            static_files: Vec::new(),
            written: Vec::new(),
            issues: Vec::new(),
            cache,
        }
    }

    /// Use an external content cache for entities created from now on.
    pub fn set_cache(&mut self, cache: Arc<dyn ContentCache>) {
        self.cache = Some(cache);
    }

    /// The content cache handed to new entities, if content is not inline.
    pub fn cache(&self) -> Option<Arc<dyn ContentCache>> {
        self.cache.clone()
    }

    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.config.source)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.config.output)
    }

    pub fn theme_dir(&self) -> PathBuf {
        self.resolve(&self.config.theme)
    }

    /// Fails when the output directory is, or contains, the project root,
    /// the content root or the theme. Writing and cleaning such a directory
    /// would destroy sources.
    pub fn check_output_dir(&self) -> Result<(), BuildError> {
        let Ok(output) = self.output_dir().canonicalize() else {
            // Nothing to protect if it does not exist yet.
            return Ok(());
        };
        let protected = [self.base_path.clone(), self.source_dir(), self.theme_dir()];
        for path in protected {
            if let Ok(path) = path.canonicalize()
                && path.starts_with(&output)
            {
                return Err(BuildError::OutputOverlapsSources { output, path });
            }
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.base_path.join(path)
        } else {
            path.to_path_buf()
        }
    }

    pub fn record(&mut self, issue: BuildIssue) {
        record_issue(&mut self.issues, issue);
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    /// Fix the post order: newest first, with neighbour links.
    pub fn sort_posts(&mut self) {
        sort_posts(&mut self.posts);
        link_neighbours(&mut self.posts);
    }

    /// Rebuild tags and categories from the current posts.
    pub fn collect_taxonomies(&mut self) {
        self.tags = taxonomy::collect(
            self.posts.iter().enumerate().map(|(i, p)| (i, p.tags.as_slice())),
            &self.config.tag_dir,
        );
        self.categories = taxonomy::collect(
            self.posts
                .iter()
                .enumerate()
                .map(|(i, p)| (i, p.categories.as_slice())),
            &self.config.category_dir,
        );
    }

    /// The `site` value exposed to templates.
    pub fn template_data(&self) -> Value {
        let taxa = |list: &[Taxon]| {
            Value::Array(
                list.iter()
                    .map(|taxon| {
                        let mut value = serde_json::to_value(taxon).unwrap_or(Value::Null);
                        if let Value::Object(map) = &mut value {
                            map.insert("count".into(), taxon.posts.len().into());
                        }
                        value
                    })
                    .collect(),
            )
        };

        let mut map: Map<String, Value> = self
            .config
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let text = |s: &Option<String>| s.clone().map(Value::String).unwrap_or(Value::Null);
        map.insert("title".into(), text(&self.config.title));
        map.insert("url".into(), text(&self.config.url));
        map.insert(
            "time".into(),
            Value::String(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        );
        map.insert("post_count".into(), self.posts.len().into());
        map.insert("tags".into(), taxa(&self.tags));
        map.insert("categories".into(), taxa(&self.categories));
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::front_matter::parse_front_matter;
    use crate::build::source::Source;
    use serde_json::json;

    fn add_post(site: &mut Site, path: &str, raw: &str) {
        let parsed = parse_front_matter(raw).unwrap();
        let source = Arc::new(Source::new(path, parsed.front_matter, parsed.body));
        let (post, _) = Post::from_source(source, ".html".into(), &site.config, site.cache());
        site.posts.push(post);
    }

    #[test]
    fn test_paths_resolve_against_base() {
        let config = SiteConfig {
            output: PathBuf::from("/abs/out"),
            ..Default::default()
        };
        let site = Site::new(config, PathBuf::from("/project"));
        assert_eq!(site.source_dir(), PathBuf::from("/project/source"));
        assert_eq!(site.output_dir(), PathBuf::from("/abs/out"));
        assert_eq!(site.theme_dir(), PathBuf::from("/project/themes/default"));
    }

    #[test]
    fn test_cache_follows_config() {
        let inline = Site::new(SiteConfig::default(), PathBuf::from("."));
        assert!(inline.cache().is_none());

        let config = SiteConfig {
            content_cache: ContentCacheMode::Memory,
            ..Default::default()
        };
        assert!(Site::new(config, PathBuf::from(".")).cache().is_some());
    }

    #[test]
    fn test_taxonomies_follow_sorted_posts() {
        let mut site = Site::new(SiteConfig::default(), PathBuf::from("."));
        add_post(&mut site, "_posts/a.md", "---\ndate: 2021-01-01 00:00\ntags: [go]\n---\n");
        add_post(&mut site, "_posts/b.md", "---\ndate: 2021-02-01 00:00\ntags: [go, rust]\ncategories: dev\n---\n");
        site.sort_posts();
        site.collect_taxonomies();

        assert_eq!(site.posts[0].entry.url, "/2021/02/01/b/");
        assert_eq!(site.tags.len(), 2);
        assert_eq!(site.tags[0].name, "go");
        assert_eq!(site.tags[0].posts, vec![0, 1]);
        assert_eq!(site.tags[1].posts, vec![0]);
        assert_eq!(site.categories[0].url, "/category/dev/");

        let data = site.template_data();
        assert_eq!(data["post_count"], json!(2));
        assert_eq!(data["tags"][0]["count"], json!(2));
        assert_eq!(data["tags"][1]["url"], json!("/tag/rust/"));
    }

    #[test]
    fn test_template_data_exposes_extra_config() {
        let mut config = SiteConfig {
            title: Some("Blog".into()),
            ..Default::default()
        };
        config.extra.insert("author".into(), json!("Jane"));
        let site = Site::new(config, PathBuf::from("."));

        let data = site.template_data();
        assert_eq!(data["title"], json!("Blog"));
        assert_eq!(data["author"], json!("Jane"));
    }

    #[test]
    fn test_record_counts_errors() {
        let mut site = Site::new(SiteConfig::default(), PathBuf::from("."));
        site.record(BuildIssue::warning("read", "a.md", "bad date"));
        site.record(BuildIssue::error("render", "/a/", "boom"));
        assert_eq!(site.issues.len(), 2);
        assert_eq!(site.error_count(), 1);
    }
}

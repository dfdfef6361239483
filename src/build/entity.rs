//! The content model: posts, pages and the data they share.
//!
//! Every entity wraps an [`Entry`] holding the fields common to all
//! convertible content. Behaviour that differs between entity kinds is
//! expressed through the [`Convertible`], [`Renderable`] and [`HasPager`]
//! traits rather than through a type hierarchy.
//!
//! Content moves through three states within one build:
//!
//! 1. `Raw`: the source body (empty for derived pages)
//! 2. `Converted`: output markup from the matching converter
//! 3. `Rendered`: the final output produced by the page template
//!
//! Each transition happens at most once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

use super::cache::{ContentCache, ContentSlot};
use super::date::{self, DateLookup};
use super::format::{ConvertError, ConverterRegistry};
use super::front_matter::{FrontMatter, MetaValue};
use super::paths::{PermalinkParts, expand_permalink, source_path_to_url, url_to_output_path};
use super::render::{RenderContext, RenderError, Renderer, RootMap};
use super::source::Source;
use super::taxonomy::{self, Taxon, taxon_url};
use crate::config::SiteConfig;

/// Layout names that mean "write the converted content as is".
pub const RAW_LAYOUTS: [&str; 2] = ["nil", "none"];

/// Marker separating a post's excerpt from the rest of its content.
pub const EXCERPT_MARKERS: [&str; 2] = ["<!--more-->", "<!-- more -->"];

/// Format of `date` / `updated` in template data.
const DATE_VALUE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Front matter keys materialised as `Entry` fields.
const ENTRY_KEYS: [&str; 6] = ["title", "layout", "permalink", "path", "date", "updated"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentState {
    Raw,
    Converted,
    Rendered,
}

/// A date-like front matter value that could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnparsableDate {
    pub key: &'static str,
    pub value: String,
}

// =============================================================================
// Entry
// =============================================================================

/// Fields shared by every post and page.
#[derive(Debug)]
pub struct Entry {
    /// The backing source; `None` for derived pages
    pub source: Option<Arc<Source>>,
    pub title: Option<String>,
    /// Site-relative URL
    pub url: String,
    pub path: Option<String>,
    pub layout: Option<String>,
    pub permalink: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub updated: Option<NaiveDateTime>,
    pub date_formatted: Option<String>,
    pub updated_formatted: Option<String>,
    /// Extension of the written file, with the dot (e.g. ".html")
    pub output_extension: String,
    date_pattern: String,
    content: ContentSlot,
    state: ContentState,
    failed: bool,
    /// Front matter keys without a dedicated field
    extra: FrontMatter,
}

impl Entry {
    /// Build the shared fields from a source.
    ///
    /// Dates that do not parse are left unset and reported back.
    pub fn from_source(
        source: Arc<Source>,
        output_extension: String,
        date_pattern: &str,
        cache: Option<Arc<dyn ContentCache>>,
    ) -> (Self, Vec<UnparsableDate>) {
        let fm = &source.front_matter;
        let text = |key: &str| fm.get(key).and_then(MetaValue::to_plain_string);

        let mut unparsable = Vec::new();
        let mut resolve = |key: &'static str| match date::lookup(fm, key) {
            DateLookup::Found(date) => Some(date),
            DateLookup::Absent => None,
            DateLookup::Unparsable(value) => {
                unparsable.push(UnparsableDate { key, value });
                None
            }
        };
        let date = resolve("date");
        let updated = resolve("updated");

        let extra = fm
            .iter()
            .filter(|(key, _)| !ENTRY_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let mut content = ContentSlot::new(cache);
        content.set(source.body.clone());

        let entry = Self {
            title: text("title"),
            url: String::new(),
            path: text("path").or_else(|| Some(source.path_string())),
            layout: text("layout"),
            permalink: text("permalink"),
            date,
            updated,
            date_formatted: date.map(|d| date::format_date(&d, date_pattern)),
            updated_formatted: updated.map(|d| date::format_date(&d, date_pattern)),
            output_extension,
            date_pattern: date_pattern.to_string(),
            content,
            state: ContentState::Raw,
            failed: false,
            extra,
            source: Some(source),
        };
        (entry, unparsable)
    }

    /// Shared fields for a page with no backing source.
    pub fn derived(
        title: impl Into<String>,
        url: impl Into<String>,
        cache: Option<Arc<dyn ContentCache>>,
    ) -> Self {
        Self {
            source: None,
            title: Some(title.into()),
            url: url.into(),
            path: None,
            layout: Some(RAW_LAYOUTS[0].to_string()),
            permalink: None,
            date: None,
            updated: None,
            date_formatted: None,
            updated_formatted: None,
            output_extension: ".html".to_string(),
            date_pattern: date::DEFAULT_DISPLAY_FORMAT.to_string(),
            content: ContentSlot::new(cache),
            state: ContentState::Raw,
            failed: false,
            extra: FrontMatter::new(),
        }
    }

    /// A copy with its own content storage.
    pub fn fork(&self) -> Self {
        Self {
            source: self.source.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
            path: self.path.clone(),
            layout: self.layout.clone(),
            permalink: self.permalink.clone(),
            date: self.date,
            updated: self.updated,
            date_formatted: self.date_formatted.clone(),
            updated_formatted: self.updated_formatted.clone(),
            output_extension: self.output_extension.clone(),
            date_pattern: self.date_pattern.clone(),
            content: self.content.fork(),
            state: self.state,
            failed: self.failed,
            extra: self.extra.clone(),
        }
    }

    pub fn content(&self) -> String {
        self.content.get()
    }

    pub fn set_content(&mut self, content: String) {
        self.content.set(content);
    }

    pub fn state(&self) -> ContentState {
        self.state
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Set the publish date and refresh its formatted form.
    pub fn set_date(&mut self, date: Option<NaiveDateTime>) {
        self.date = date;
        self.date_formatted = date.map(|d| date::format_date(&d, &self.date_pattern));
    }

    /// Look up a property by name: dedicated fields first, then extras.
    pub fn get(&self, name: &str) -> Option<MetaValue> {
        let text = |value: &Option<String>| value.clone().map(MetaValue::String);
        match name {
            "title" => text(&self.title),
            "url" => Some(MetaValue::String(self.url.clone())),
            "path" => text(&self.path),
            "layout" => text(&self.layout),
            "permalink" => text(&self.permalink),
            "date" => self.date.map(MetaValue::Date),
            "updated" => self.updated.map(MetaValue::Date),
            "date_formatted" => text(&self.date_formatted),
            "updated_formatted" => text(&self.updated_formatted),
            _ => self.extra.get(name).cloned(),
        }
    }

    /// Set a property by name.
    ///
    /// Dedicated fields are updated in place (dates go through the same
    /// lenient parsing as front matter); any other name lands in extras.
    pub fn set(&mut self, name: &str, value: MetaValue) {
        let text = value.to_plain_string();
        match name {
            "title" => self.title = text,
            "url" => self.url = text.unwrap_or_default(),
            "path" => self.path = text,
            "layout" => self.layout = text,
            "permalink" => self.permalink = text,
            "date" | "updated" => {
                let mut fm = FrontMatter::new();
                fm.insert(name.to_string(), value);
                let parsed = date::lookup(&fm, name).date();
                if name == "date" {
                    self.set_date(parsed);
                } else {
                    self.updated = parsed;
                    self.updated_formatted =
                        parsed.map(|d| date::format_date(&d, &self.date_pattern));
                }
            }
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    pub fn extra(&self) -> &FrontMatter {
        &self.extra
    }

    /// Remove extras that a wrapping entity materialises itself.
    fn take_extra(&mut self, keys: &[&str]) {
        self.extra.retain(|key, _| !keys.contains(&key.as_str()));
    }

    /// Run the source's converter over the current content.
    ///
    /// Only the first call does anything; on failure the content is left as
    /// it was.
    pub fn convert_with(&mut self, converters: &ConverterRegistry) -> Result<(), ConvertError> {
        if self.state != ContentState::Raw {
            return Ok(());
        }
        if let Some(source) = &self.source {
            let converter = converters.for_source(source);
            let converted = converter.convert(&self.content())?;
            self.content.set(converted);
        }
        self.state = ContentState::Converted;
        Ok(())
    }

    /// Mark conversion done without transforming anything.
    pub fn skip_conversion(&mut self) {
        if self.state == ContentState::Raw {
            self.state = ContentState::Converted;
        }
    }

    /// Replace the content with the rendered output.
    pub fn finish_render(&mut self, output: String) {
        self.content.set(output);
        self.state = ContentState::Rendered;
    }

    /// Template for this entry's layout, or `None` for raw layouts.
    pub fn layout_template(&self, default_layout: &str) -> Option<String> {
        let layout = self.layout.as_deref().unwrap_or(default_layout).trim();
        if RAW_LAYOUTS.contains(&layout) || layout.is_empty() {
            None
        } else if layout.contains('.') {
            Some(layout.to_string())
        } else {
            Some(format!("{layout}.html"))
        }
    }

    /// Where this entry is written under the output directory.
    /// Where this entry is written, or `None` when its URL escapes `output_dir`.
    pub fn output_path(&self, output_dir: &Path) -> Option<PathBuf> {
        url_to_output_path(&self.url, output_dir)
    }

    /// Template data for this entry.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .extra
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect();

        let date_value = |d: &Option<NaiveDateTime>| {
            d.map(|d| Value::String(d.format(DATE_VALUE_FORMAT).to_string()))
                .unwrap_or(Value::Null)
        };
        let text = |s: &Option<String>| s.clone().map(Value::String).unwrap_or(Value::Null);

        map.insert("title".into(), text(&self.title));
        map.insert("url".into(), Value::String(self.url.clone()));
        map.insert("path".into(), text(&self.path));
        map.insert("layout".into(), text(&self.layout));
        map.insert("permalink".into(), text(&self.permalink));
        map.insert("date".into(), date_value(&self.date));
        map.insert("updated".into(), date_value(&self.updated));
        map.insert("date_formatted".into(), text(&self.date_formatted));
        map.insert("updated_formatted".into(), text(&self.updated_formatted));
        map.insert("content".into(), Value::String(self.content()));
        map
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// Content that a converter can transform.
pub trait Convertible {
    fn entry(&self) -> &Entry;

    fn entry_mut(&mut self) -> &mut Entry;

    fn convert(&mut self, converters: &ConverterRegistry) -> Result<(), ConvertError> {
        self.entry_mut().convert_with(converters)
    }
}

/// Content that produces its final output through a template.
pub trait Renderable: Convertible {
    /// The template to render, or `None` to output the content as is.
    fn template(&self) -> Option<String>;

    /// Data handed to the template.
    fn root_map(&self, ctx: &RenderContext) -> RootMap;

    fn render(&mut self, renderer: &dyn Renderer, ctx: &RenderContext) -> Result<(), RenderError> {
        if self.entry().state() == ContentState::Rendered {
            return Ok(());
        }
        let output = match self.template() {
            Some(template) => renderer.render(&template, &self.root_map(ctx))?,
            None => self.entry().content(),
        };
        self.entry_mut().finish_render(output);
        Ok(())
    }
}

/// Content split across numbered listing pages.
pub trait HasPager {
    fn pager(&self) -> Option<&Pager>;

    fn set_pager(&mut self, pager: Option<Pager>);
}

// =============================================================================
// Posts
// =============================================================================

/// A dated blog post.
#[derive(Debug)]
pub struct Post {
    pub entry: Entry,
    pub slug: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    /// Index of the next newer post
    pub previous: Option<usize>,
    /// Index of the next older post
    pub next: Option<usize>,
}

impl Post {
    pub fn from_source(
        source: Arc<Source>,
        output_extension: String,
        config: &SiteConfig,
        cache: Option<Arc<dyn ContentCache>>,
    ) -> (Self, Vec<UnparsableDate>) {
        let fm = source.front_matter.clone();
        let stem = source.stem().to_string();
        let (mut entry, unparsable) =
            Entry::from_source(source, output_extension, &config.date_pattern(), cache);

        let dated_stem = date::split_dated_stem(&stem);
        if entry.date.is_none()
            && let Some((date, _)) = dated_stem
        {
            entry.set_date(Some(date));
        }

        let slug = fm
            .get("slug")
            .and_then(MetaValue::to_plain_string)
            .unwrap_or_else(|| match dated_stem {
                Some((_, rest)) => rest.to_string(),
                None => stem.clone(),
            });
        let list = |keys: [&str; 2]| {
            keys.iter()
                .find_map(|k| fm.get(*k))
                .map(MetaValue::to_string_list)
                .unwrap_or_default()
        };
        let tags = list(["tags", "tag"]);
        let categories = list(["categories", "category"]);
        entry.take_extra(&["slug", "tags", "tag", "categories", "category"]);

        entry.url = match &entry.permalink {
            Some(permalink) => permalink.clone(),
            None => expand_permalink(
                &config.permalink,
                &PermalinkParts {
                    year: entry.date.map(|d| format!("{:04}", d.year())),
                    month: entry.date.map(|d| format!("{:02}", d.month())),
                    day: entry.date.map(|d| format!("{:02}", d.day())),
                    title: &slug,
                    categories: &categories,
                },
            ),
        };

        let post = Self {
            entry,
            slug,
            tags,
            categories,
            previous: None,
            next: None,
        };
        (post, unparsable)
    }

    /// Converted content up to the excerpt marker, if the post has one.
    pub fn excerpt(&self) -> Option<String> {
        let content = self.entry.content();
        EXCERPT_MARKERS
            .iter()
            .find_map(|marker| content.find(marker))
            .map(|pos| content[..pos].trim_end().to_string())
    }

    /// Template data for this post. Tag and category links point at the
    /// collected taxa when one matches the name.
    pub fn to_json(&self, config: &SiteConfig, tags: &[Taxon], categories: &[Taxon]) -> Value {
        let links = |names: &[String], taxa: &[Taxon], dir: &str| {
            Value::Array(
                names
                    .iter()
                    .map(|name| {
                        let url = taxonomy::find(taxa, name)
                            .map(|t| t.url.clone())
                            .unwrap_or_else(|| taxon_url(dir, name));
                        serde_json::json!({ "name": name, "url": url })
                    })
                    .collect(),
            )
        };

        let mut map = self.entry.to_json();
        map.insert("slug".into(), Value::String(self.slug.clone()));
        map.insert("tags".into(), links(&self.tags, tags, &config.tag_dir));
        map.insert(
            "categories".into(),
            links(&self.categories, categories, &config.category_dir),
        );
        map.insert(
            "excerpt".into(),
            self.excerpt().map(Value::String).unwrap_or(Value::Null),
        );
        Value::Object(map)
    }
}

impl Convertible for Post {
    fn entry(&self) -> &Entry {
        &self.entry
    }

    fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }
}

impl Renderable for Post {
    fn template(&self) -> Option<String> {
        self.entry.layout_template("post")
    }

    fn root_map(&self, ctx: &RenderContext) -> RootMap {
        let neighbour = |index: Option<usize>| {
            index
                .and_then(|i| ctx.posts.get(i).cloned())
                .unwrap_or(Value::Null)
        };

        let mut root = ctx.root_map();
        root.insert(
            "page".into(),
            self.to_json(ctx.config, ctx.tags, ctx.categories),
        );
        root.insert("content".into(), Value::String(self.entry.content()));
        root.insert(
            "canonical".into(),
            Value::String(ctx.config.canonical(&self.entry.url)),
        );
        root.insert("previous".into(), neighbour(self.previous));
        root.insert("next".into(), neighbour(self.next));
        root
    }
}

/// Sort posts newest first. Undated posts go last; ties keep their order.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.entry.date.cmp(&a.entry.date));
}

/// Point each post at its newer (`previous`) and older (`next`) neighbour.
///
/// Expects `posts` sorted newest first.
pub fn link_neighbours(posts: &mut [Post]) {
    let len = posts.len();
    for (i, post) in posts.iter_mut().enumerate() {
        post.previous = i.checked_sub(1);
        post.next = (i + 1 < len).then_some(i + 1);
    }
}

// =============================================================================
// Pages
// =============================================================================

/// Position of a listing page within a paginated series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pager {
    /// 1-based page number
    pub number: usize,
    pub total_pages: usize,
    pub per_page: usize,
    pub total_posts: usize,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
    /// Indices of the posts on this page
    #[serde(skip)]
    pub posts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// A page rendered from its own content through its layout
    Content,
    /// A derived index of posts rendered by a fixed template
    Listing { template: String, posts: Vec<usize> },
}

/// A standalone page, either from a source file or derived.
#[derive(Debug)]
pub struct Page {
    pub entry: Entry,
    pub kind: PageKind,
    pub pager: Option<Pager>,
    /// Whether this page asked to be paginated over the site's posts
    pub paginate: bool,
    /// True for pages not backed by a source file of their own
    pub derived: bool,
}

impl Page {
    pub fn from_source(
        source: Arc<Source>,
        output_extension: String,
        config: &SiteConfig,
        cache: Option<Arc<dyn ContentCache>>,
    ) -> (Self, Vec<UnparsableDate>) {
        let paginate = source
            .front_matter
            .get("pagination")
            .and_then(MetaValue::as_bool)
            .unwrap_or(false);
        let path = source.path.clone();

        let (mut entry, unparsable) =
            Entry::from_source(source, output_extension, &config.date_pattern(), cache);
        entry.take_extra(&["pagination"]);
        entry.url = match &entry.permalink {
            Some(permalink) => permalink.clone(),
            None => source_path_to_url(&path, &entry.output_extension),
        };

        let page = Self {
            entry,
            kind: PageKind::Content,
            pager: None,
            paginate,
            derived: false,
        };
        (page, unparsable)
    }

    /// A derived page listing posts through a fixed template.
    pub fn listing(
        title: impl Into<String>,
        url: impl Into<String>,
        template: impl Into<String>,
        posts: Vec<usize>,
        cache: Option<Arc<dyn ContentCache>>,
    ) -> Self {
        Self {
            entry: Entry::derived(title, url, cache),
            kind: PageKind::Listing {
                template: template.into(),
                posts,
            },
            pager: None,
            paginate: false,
            derived: true,
        }
    }

    /// A derived copy of this page with its own content storage.
    pub fn fork(&self) -> Self {
        Self {
            entry: self.entry.fork(),
            kind: self.kind.clone(),
            pager: self.pager.clone(),
            paginate: self.paginate,
            derived: true,
        }
    }

    /// Post indices this page lists, if it lists any.
    pub fn listed_posts(&self) -> Option<&[usize]> {
        match &self.kind {
            PageKind::Listing { posts, .. } => Some(posts),
            PageKind::Content => self.pager.as_ref().map(|p| p.posts.as_slice()),
        }
    }

    /// Template data for this page.
    pub fn to_json(&self, ctx: &RenderContext) -> Value {
        let mut map = self.entry.to_json();
        if let PageKind::Listing { posts, .. } = &self.kind {
            map.insert("posts".into(), ctx.posts_at(posts));
        }
        Value::Object(map)
    }
}

impl Convertible for Page {
    fn entry(&self) -> &Entry {
        &self.entry
    }

    fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }

    fn convert(&mut self, converters: &ConverterRegistry) -> Result<(), ConvertError> {
        match self.kind {
            // Listing output comes entirely from the template
            PageKind::Listing { .. } => {
                self.entry.skip_conversion();
                Ok(())
            }
            PageKind::Content => self.entry.convert_with(converters),
        }
    }
}

impl Renderable for Page {
    fn template(&self) -> Option<String> {
        match &self.kind {
            PageKind::Listing { template, .. } => Some(template.clone()),
            PageKind::Content => self.entry.layout_template("page"),
        }
    }

    fn root_map(&self, ctx: &RenderContext) -> RootMap {
        let mut root = ctx.root_map();
        root.insert(
            "canonical".into(),
            Value::String(ctx.config.canonical(&self.entry.url)),
        );
        root.insert("page".into(), self.to_json(ctx));

        match &self.kind {
            PageKind::Listing { posts, .. } => {
                root.insert("posts".into(), ctx.posts_at(posts));
            }
            PageKind::Content => {
                root.insert("content".into(), Value::String(self.entry.content()));
            }
        }

        if let Some(pager) = &self.pager {
            let mut paginator = match serde_json::to_value(pager) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            };
            paginator.insert("posts".into(), ctx.posts_at(&pager.posts));
            root.insert("paginator".into(), Value::Object(paginator));
        }
        root
    }
}

impl HasPager for Page {
    fn pager(&self) -> Option<&Pager> {
        self.pager.as_ref()
    }

    fn set_pager(&mut self, pager: Option<Pager>) {
        self.pager = pager;
    }
}

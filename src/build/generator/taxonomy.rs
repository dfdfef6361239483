//! Tag and category index pages.

use std::sync::Arc;

use super::Generator;
use crate::build::cache::ContentCache;
use crate::build::entity::{Page, Post};
use crate::build::site::Site;
use crate::build::taxonomy::Taxon;

pub const TAG_TEMPLATE: &str = "tag.html";
pub const CATEGORY_TEMPLATE: &str = "category.html";

/// One listing page per tag that has posts.
pub struct TagGenerator;

impl Generator for TagGenerator {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn order(&self) -> i32 {
        300
    }

    fn generate(&self, site: &mut Site) {
        let cache = site.cache();
        let pages = listing_pages(
            &mut site.tags,
            &site.posts,
            &site.config.tag_title_prefix,
            TAG_TEMPLATE,
            cache,
        );
        tracing::debug!(pages = pages.len(), "generated tag pages");
        site.pages.extend(pages);
    }
}

/// One listing page per category that has posts.
pub struct CategoryGenerator;

impl Generator for CategoryGenerator {
    fn name(&self) -> &'static str {
        "category"
    }

    fn order(&self) -> i32 {
        200
    }

    fn generate(&self, site: &mut Site) {
        let cache = site.cache();
        let pages = listing_pages(
            &mut site.categories,
            &site.posts,
            &site.config.category_title_prefix,
            CATEGORY_TEMPLATE,
            cache,
        );
        tracing::debug!(pages = pages.len(), "generated category pages");
        site.pages.extend(pages);
    }
}

fn listing_pages(
    taxa: &mut [Taxon],
    posts: &[Post],
    title_prefix: &str,
    template: &str,
    cache: Option<Arc<dyn ContentCache>>,
) -> Vec<Page> {
    taxa.iter_mut()
        .filter(|taxon| !taxon.posts.is_empty())
        .map(|taxon| {
            taxon.sort_posts(|i| posts.get(i).and_then(|p| p.entry.date));
            Page::listing(
                format!("{}{}", title_prefix, taxon.name),
                taxon.url.clone(),
                template,
                taxon.posts.clone(),
                cache.clone(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::entity::{PageKind, Renderable};
    use crate::build::front_matter::parse_front_matter;
    use crate::build::source::Source;
    use crate::config::SiteConfig;
    use std::path::PathBuf;

    fn site_with_posts(posts: &[(&str, &str)]) -> Site {
        let config = SiteConfig {
            tag_title_prefix: "Tag: ".into(),
            ..Default::default()
        };
        let mut site = Site::new(config, PathBuf::from("."));
        for (path, raw) in posts {
            let parsed = parse_front_matter(raw).unwrap();
            let source = Arc::new(Source::new(*path, parsed.front_matter, parsed.body));
            let (post, _) = Post::from_source(source, ".html".into(), &site.config, None);
            site.posts.push(post);
        }
        site.sort_posts();
        site.collect_taxonomies();
        site
    }

    fn listed(page: &Page) -> Vec<String> {
        match &page.kind {
            PageKind::Listing { posts, .. } => posts.iter().map(|i| i.to_string()).collect(),
            PageKind::Content => Vec::new(),
        }
    }

    #[test]
    fn test_tag_pages_only_for_used_tags() {
        let mut site = site_with_posts(&[
            ("_posts/a.md", "---\ntitle: a\ndate: 2021-01-01 00:00\ntags: [go]\n---\n"),
            ("_posts/b.md", "---\ntitle: b\ndate: 2021-03-01 00:00\ntags: [rust]\n---\n"),
            ("_posts/c.md", "---\ntitle: c\ndate: 2021-02-01 00:00\ntags: [go]\n---\n"),
        ]);
        site.tags.push(Taxon::new("python", "/tag/"));

        TagGenerator.generate(&mut site);

        assert_eq!(site.pages.len(), 2);
        // posts are [b, c, a] after sorting, so rust is seen first
        let rust = &site.pages[0];
        let go = &site.pages[1];
        assert_eq!(go.entry.title.as_deref(), Some("Tag: go"));
        assert_eq!(go.entry.url, "/tag/go/");
        assert!(go.derived);
        assert_eq!(go.template().as_deref(), Some(TAG_TEMPLATE));
        assert_eq!(rust.entry.url, "/tag/rust/");

        let titles = |page: &Page| -> Vec<String> {
            page.listed_posts()
                .unwrap_or_default()
                .iter()
                .map(|&i| site.posts[i].entry.title.clone().unwrap_or_default())
                .collect()
        };
        assert_eq!(titles(go), vec!["c", "a"]);
        assert_eq!(titles(rust), vec!["b"]);
        assert!(site.pages.iter().all(|p| p.entry.url != "/tag/python/"));
    }

    #[test]
    fn test_listing_posts_resorted_by_date() {
        let mut site = site_with_posts(&[
            ("_posts/a.md", "---\ndate: 2021-01-01 00:00\ntags: [go]\n---\n"),
            ("_posts/b.md", "---\ndate: 2021-02-01 00:00\ntags: [go]\n---\n"),
        ]);
        site.tags[0].posts.reverse();

        TagGenerator.generate(&mut site);
        assert_eq!(listed(&site.pages[0]), vec!["0", "1"]);
    }

    #[test]
    fn test_category_pages() {
        let mut site = site_with_posts(&[(
            "_posts/a.md",
            "---\ncategories: [Dev Notes]\n---\n",
        )]);
        CategoryGenerator.generate(&mut site);

        assert_eq!(site.pages.len(), 1);
        assert_eq!(site.pages[0].entry.url, "/category/dev-notes/");
        assert_eq!(site.pages[0].entry.title.as_deref(), Some("Dev Notes"));
        assert_eq!(site.pages[0].template().as_deref(), Some(CATEGORY_TEMPLATE));
    }
}

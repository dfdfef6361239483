//! Tags and categories.
//!
//! A taxon is built by scanning the loaded posts. It refers to its posts by
//! index into the site's post list, which is fixed once reading finishes.

use chrono::NaiveDateTime;
use serde::Serialize;

/// A tag or category and the posts filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taxon {
    pub name: String,
    pub slug: String,
    /// Site-relative URL of the index page (e.g. "/tag/rust/")
    pub url: String,
    /// Indices into the site's posts
    #[serde(skip)]
    pub posts: Vec<usize>,
}

pub type Tag = Taxon;
pub type Category = Taxon;

impl Taxon {
    pub fn new(name: &str, dir: &str) -> Self {
        Self::with_slug(name, slugify(name), dir)
    }

    pub fn with_slug(name: &str, slug: String, dir: &str) -> Self {
        Self {
            name: name.to_string(),
            url: slug_url(dir, &slug),
            slug,
            posts: Vec::new(),
        }
    }

    /// Sort the post indices newest first; ties keep their current order.
    pub fn sort_posts<F>(&mut self, date_of: F)
    where
        F: Fn(usize) -> Option<NaiveDateTime>,
    {
        self.posts.sort_by(|a, b| date_of(*b).cmp(&date_of(*a)));
    }
}

/// Group posts by the names `names_of` yields for each, in first-seen order.
///
/// Names are matched case-insensitively, so "Rust" and "rust" are the same
/// tag; the first spelling seen wins. Every named taxon gets a distinct
/// slug, see [`assign_slugs`].
pub fn collect<'a, I>(items: I, dir: &str) -> Vec<Taxon>
where
    I: IntoIterator<Item = (usize, &'a [String])>,
{
    let mut groups: Vec<(String, String, Vec<usize>)> = Vec::new();

    for (index, names) in items {
        for name in names {
            let key = name_key(name);
            if key.is_empty() {
                continue;
            }
            let pos = match groups.iter().position(|(k, _, _)| *k == key) {
                Some(pos) => pos,
                None => {
                    groups.push((key, name.trim().to_string(), Vec::new()));
                    groups.len() - 1
                }
            };
            let posts = &mut groups[pos].2;
            if !posts.contains(&index) {
                posts.push(index);
            }
        }
    }

    let names: Vec<&str> = groups.iter().map(|(_, name, _)| name.as_str()).collect();
    let slugs = assign_slugs(&names);
    groups
        .iter()
        .zip(slugs)
        .map(|((_, name, posts), slug)| {
            let mut taxon = Taxon::with_slug(name, slug, dir);
            taxon.posts = posts.clone();
            taxon
        })
        .collect()
}

/// The taxon a post's tag or category name belongs to.
pub fn find<'a>(taxa: &'a [Taxon], name: &str) -> Option<&'a Taxon> {
    let key = name_key(name);
    taxa.iter().find(|t| name_key(&t.name) == key)
}

/// Pick a distinct slug for each name, in order.
///
/// The plain [`slugify`] form is used when it is non-empty and free.
/// Otherwise the lowercased name itself (path separators replaced) is
/// tried, and as a last resort a numbered variant.
fn assign_slugs(names: &[&str]) -> Vec<String> {
    let mut used: Vec<String> = Vec::with_capacity(names.len());

    for name in names {
        let literal = name_key(name)
            .replace(['/', '\\'], "-")
            .trim_matches('.')
            .to_string();
        let candidates = [slugify(name), literal];
        let slug = match candidates
            .iter()
            .find(|c| !c.is_empty() && !used.contains(*c))
        {
            Some(slug) => slug.clone(),
            None => {
                let base = candidates
                    .iter()
                    .find(|c| !c.is_empty())
                    .map_or("taxon", String::as_str);
                (2..)
                    .map(|n| format!("{base}-{n}"))
                    .find(|c| !used.contains(c))
                    .unwrap_or_default()
            }
        };
        used.push(slug);
    }

    used
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// URL-safe slug for a tag or category name.
///
/// Lowercases, turns whitespace into `-` and drops punctuation. Non-ASCII
/// letters are kept; URLs percent-encode them.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_whitespace() || c == '-' {
            if !slug.ends_with('-') && !slug.is_empty() {
                slug.push('-');
            }
        } else if c.is_alphanumeric() || c == '_' || c == '.' {
            slug.extend(c.to_lowercase());
        }
    }
    slug.trim_matches(['-', '.']).to_string()
}

/// URL of a taxon index page under `dir`, for a name with no collected
/// taxon.
pub fn taxon_url(dir: &str, name: &str) -> String {
    slug_url(dir, &slugify(name))
}

fn slug_url(dir: &str, slug: &str) -> String {
    let dir = dir.trim_matches('/');
    let slug = urlencoding::encode(slug).into_owned();
    if dir.is_empty() {
        format!("/{}/", slug)
    } else {
        format!("/{}/{}/", dir, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::date::parse_date_time;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Rust"), "rust");
        assert_eq!(slugify("Static  Site Generators"), "static-site-generators");
        assert_eq!(slugify("C++"), "c");
        assert_eq!(slugify("node.js"), "node.js");
        assert_eq!(slugify("中文"), "中文");
        assert_eq!(slugify(" - "), "");
        assert_eq!(slugify(".."), "");
    }

    #[test]
    fn test_taxon_url() {
        assert_eq!(taxon_url("/tag/", "Go"), "/tag/go/");
        assert_eq!(taxon_url("", "Go"), "/go/");
        assert_eq!(taxon_url("/tag/", "中文"), "/tag/%E4%B8%AD%E6%96%87/");
    }

    #[test]
    fn test_collect_keeps_names_with_lossy_slugs_apart() {
        let a = names(&["C++"]);
        let b = names(&["C"]);
        let c = names(&["C#"]);
        let d = names(&["++", "c++"]);
        let taxa = collect(
            [
                (0, a.as_slice()),
                (1, b.as_slice()),
                (2, c.as_slice()),
                (3, d.as_slice()),
            ],
            "/tag/",
        );

        let slugs: Vec<&str> = taxa.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "c-2", "c#", "++"]);
        assert_eq!(taxa[0].posts, vec![0, 3]);
        assert_eq!(taxa[2].url, "/tag/c%23/");
        assert_eq!(taxa[3].url, "/tag/%2B%2B/");
        assert_eq!(find(&taxa, "c#").map(|t| t.url.as_str()), Some("/tag/c%23/"));
    }

    #[test]
    fn test_collect_slug_never_escapes_dir() {
        let a = names(&["..", "a/b"]);
        let taxa = collect([(0, a.as_slice())], "/tag/");
        assert_eq!(taxa[0].slug, "taxon-2");
        assert_eq!(taxa[1].slug, "ab");
    }

    #[test]
    fn test_collect_groups_by_name_in_first_seen_order() {
        let a = names(&["go", "Rust"]);
        let b = names(&["rust"]);
        let c = names(&["go", "go"]);
        let taxa = collect(
            [(0, a.as_slice()), (1, b.as_slice()), (2, c.as_slice())],
            "/tag/",
        );

        assert_eq!(taxa.len(), 2);
        assert_eq!(taxa[0].name, "go");
        assert_eq!(taxa[0].posts, vec![0, 2]);
        assert_eq!(taxa[1].name, "Rust");
        assert_eq!(taxa[1].url, "/tag/rust/");
        assert_eq!(taxa[1].posts, vec![0, 1]);
    }

    #[test]
    fn test_sort_posts_newest_first_stable() {
        let dates = [
            parse_date_time("2021-01-01 00:00"),
            parse_date_time("2021-06-01 00:00"),
            parse_date_time("2021-01-01 00:00"),
            None,
        ];
        let mut taxon = Taxon::new("go", "/tag/");
        taxon.posts = vec![0, 3, 1, 2];
        taxon.sort_posts(|i| dates[i]);
        assert_eq!(taxon.posts, vec![1, 0, 2, 3]);
    }
}

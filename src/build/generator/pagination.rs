//! Paginated post listings.
//!
//! A page whose front matter sets `pagination: true` lists the site's posts,
//! `paginate` at a time. Page 1 keeps the page's own URL; page `n` is a
//! derived copy at `<dir>page/<n>/`.

use super::Generator;
use crate::build::entity::{HasPager, Pager};
use crate::build::paths::url_dir;
use crate::build::site::Site;

pub struct PaginationGenerator;

impl Generator for PaginationGenerator {
    fn name(&self) -> &'static str {
        "pagination"
    }

    fn order(&self) -> i32 {
        100
    }

    fn generate(&self, site: &mut Site) {
        let per_page = site.config.paginate.max(1);
        let total_posts = site.posts.len();
        let total_pages = total_posts.div_ceil(per_page).max(1);

        let mut derived = Vec::new();
        for page in site.pages.iter_mut() {
            if !page.paginate || page.derived || page.pager().is_some() {
                continue;
            }

            let base_url = page.entry.url.clone();
            let url_for = |number: usize| match number {
                1 => base_url.clone(),
                n => format!("{}page/{}/", url_dir(&base_url), n),
            };
            let pager_for = |number: usize| {
                let start = (number - 1) * per_page;
                let end = (start + per_page).min(total_posts);
                Pager {
                    number,
                    total_pages,
                    per_page,
                    total_posts,
                    previous_url: (number > 1).then(|| url_for(number - 1)),
                    next_url: (number < total_pages).then(|| url_for(number + 1)),
                    posts: (start..end).collect(),
                }
            };

            for number in 2..=total_pages {
                let mut copy = page.fork();
                copy.entry.url = url_for(number);
                copy.set_pager(Some(pager_for(number)));
                derived.push(copy);
            }
            page.set_pager(Some(pager_for(1)));

            tracing::debug!(url = %base_url, pages = total_pages, "paginated page");
        }
        site.pages.extend(derived);
    }
}

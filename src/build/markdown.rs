//! Markdown rendering with heading anchors.

use std::collections::HashSet;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Map configured extension names onto pulldown-cmark options.
pub fn markdown_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "smart_punctuation" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// A heading awaiting its generated id.
struct PendingHeading {
    level: HeadingLevel,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl PendingHeading {
    /// ` class="..." key="value"` for the captured attributes.
    fn extra_attributes(&self) -> String {
        let mut out = String::new();
        if !self.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape_attr(&self.classes.join(" "))));
        }
        for (key, value) in &self.attrs {
            match value {
                Some(value) => out.push_str(&format!(" {}=\"{}\"", key, escape_attr(value))),
                None => out.push_str(&format!(" {}", key)),
            }
        }
        out
    }
}

/// Render markdown to HTML using pulldown-cmark.
///
/// Headings without an explicit id get one derived from their text, made
/// unique within the document. Their classes and attributes are kept.
pub fn render_markdown(markdown: &str, options: Options) -> String {
    let parser = Parser::new_ext(markdown, options);

    let mut in_heading: Option<PendingHeading> = None;
    let mut heading_html = String::new();
    let mut used_heading_ids: HashSet<String> = HashSet::new();
    let mut buffered: Vec<Event> = Vec::new();

    let events: Vec<Event> = parser
        .flat_map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id: None,
                ref classes,
                ref attrs,
            }) => {
                in_heading = Some(PendingHeading {
                    level,
                    classes: classes.iter().map(|c| c.to_string()).collect(),
                    attrs: attrs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.as_ref().map(|v| v.to_string())))
                        .collect(),
                });
                heading_html.clear();
                buffered.clear();
                vec![]
            }
            Event::Start(Tag::Heading { id: Some(ref id), .. }) => {
                used_heading_ids.insert(id.to_string());
                vec![event]
            }
            Event::End(TagEnd::Heading(_)) if in_heading.is_some() => {
                let Some(heading) = in_heading.take() else {
                    return vec![];
                };

                let text: String = buffered
                    .iter()
                    .filter_map(|e| match e {
                        Event::Text(t) | Event::Code(t) => Some(t.as_ref()),
                        _ => None,
                    })
                    .collect();
                html::push_html(&mut heading_html, buffered.drain(..));

                let base_id = slugify(&text);
                let mut id = base_id.clone();
                let mut suffix = 1;
                while used_heading_ids.contains(&id) {
                    id = format!("{}-{}", base_id, suffix);
                    suffix += 1;
                }
                used_heading_ids.insert(id.clone());

                vec![Event::Html(
                    format!(
                        "<{level} id=\"{id}\"{}>{}</{level}>\n",
                        heading.extra_attributes(),
                        heading_html.trim_end(),
                        level = heading.level,
                    )
                    .into(),
                )]
            }
            other if in_heading.is_some() => {
                buffered.push(other);
                vec![]
            }
            other => vec![other],
        })
        .collect();

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());
    html_output
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Convert a string to a slug suitable for use as an HTML id.
fn slugify(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(' ', "-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-' && c != '_', "")
}

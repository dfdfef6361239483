//! Front matter parsing and the typed metadata values it produces.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Line that opens and closes a front matter block.
pub const DELIMITER: &str = "---";

/// Front matter metadata: key -> typed value, in key order.
pub type FrontMatter = BTreeMap<String, MetaValue>;

/// A front matter value.
///
/// YAML values are mapped onto this closed set so that entities and
/// templates never deal with raw YAML nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDateTime),
    List(Vec<MetaValue>),
    Map(BTreeMap<String, MetaValue>),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Interpret the value as a list of strings.
    ///
    /// A single string is split on commas so that both `tags: [a, b]` and
    /// `tags: a, b` work.
    pub fn to_string_list(&self) -> Vec<String> {
        match self {
            MetaValue::List(items) => items
                .iter()
                .filter_map(|item| item.to_plain_string())
                .filter(|s| !s.is_empty())
                .collect(),
            MetaValue::String(s) => s
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
            other => other.to_plain_string().into_iter().collect(),
        }
    }

    /// Render a scalar as plain text. Lists, maps and null have no plain form.
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            MetaValue::String(s) => Some(s.trim().to_string()),
            MetaValue::Bool(b) => Some(b.to_string()),
            MetaValue::Integer(i) => Some(i.to_string()),
            MetaValue::Float(f) => Some(f.to_string()),
            MetaValue::Date(d) => Some(d.to_string()),
            MetaValue::Null | MetaValue::List(_) | MetaValue::Map(_) => None,
        }
    }
}

impl From<serde_yaml::Value> for MetaValue {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::Null => MetaValue::Null,
            Value::Bool(b) => MetaValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => MetaValue::Integer(i),
                None => MetaValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => match yaml_timestamp(&s) {
                Some(date) => MetaValue::Date(date),
                None => MetaValue::String(s),
            },
            Value::Sequence(items) => MetaValue::List(items.into_iter().map(Into::into).collect()),
            Value::Mapping(map) => MetaValue::Map(
                map.into_iter()
                    .filter_map(|(k, v)| yaml_key(k).map(|k| (k, v.into())))
                    .collect(),
            ),
            Value::Tagged(tagged) => tagged.value.into(),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

/// Recognise the YAML timestamp forms: `2021-03-01`, `2021-03-01 10:00:00`,
/// `2021-03-01T10:00:00.5`, optionally followed by `Z` or an offset.
///
/// Offset timestamps keep their wall-clock time.
fn yaml_timestamp(text: &str) -> Option<NaiveDateTime> {
    const LOCAL: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    const OFFSET: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f %:z",
        "%Y-%m-%dT%H:%M:%S%.f%#z",
    ];

    let text = text.trim();
    if !text.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Some(date) = LOCAL
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
    {
        return Some(date);
    }
    let text = match text.strip_suffix(['Z', 'z']) {
        Some(utc) => return yaml_timestamp(utc.trim_end()),
        None => text,
    };
    OFFSET
        .iter()
        .find_map(|f| DateTime::parse_from_str(text, f).ok())
        .map(|d| d.naive_local())
}

/// Mapping keys must be scalars; anything else is dropped.
fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;

    match key {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FrontMatterError {
    #[error("missing closing '---' delimiter")]
    Unterminated,

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a key/value mapping")]
    NotAMapping,
}

/// Result of splitting a file into front matter and body.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if none found)
    pub front_matter: FrontMatter,
    /// The content without the front matter block
    pub body: String,
}

/// Returns true if the content opens with a front matter delimiter line.
pub fn has_front_matter(content: &str) -> bool {
    content
        .lines()
        .next()
        .is_some_and(|line| line.trim_end() == DELIMITER)
}

/// Parse front matter from file content.
///
/// Front matter is a YAML block delimited by `---` lines at the start of the
/// file:
///
/// ```markdown
/// ---
/// title: My Post
/// tags: [rust, blog]
/// ---
///
/// # Content starts here
/// ```
///
/// Content without an opening delimiter is returned untouched with empty
/// front matter. An opening delimiter without a closing one is an error.
pub fn parse_front_matter(content: &str) -> Result<ParsedContent, FrontMatterError> {
    let mut lines = content.split_inclusive('\n');

    let first = lines.next().unwrap_or_default();
    if first.trim_end() != DELIMITER {
        return Ok(ParsedContent {
            front_matter: FrontMatter::new(),
            body: content.to_string(),
        });
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let front_matter = parse_yaml(&content[yaml_start..offset])?;
            let body = content[offset + line.len()..]
                .trim_start_matches(['\r', '\n'])
                .to_string();
            return Ok(ParsedContent { front_matter, body });
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

fn parse_yaml(yaml: &str) -> Result<FrontMatter, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::new());
    }

    match MetaValue::from(serde_yaml::from_str::<serde_yaml::Value>(yaml)?) {
        MetaValue::Map(map) => Ok(map),
        MetaValue::Null => Ok(FrontMatter::new()),
        _ => Err(FrontMatterError::NotAMapping),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_front_matter_basic() {
        let content = "---\ntitle: Hello\ndate: 2021-03-01 10:00\n---\nWorld";
        let parsed = parse_front_matter(content).unwrap();
        assert_eq!(
            parsed.front_matter.get("title"),
            Some(&MetaValue::String("Hello".to_string()))
        );
        assert_eq!(
            parsed.front_matter.get("date"),
            Some(&MetaValue::String("2021-03-01 10:00".to_string()))
        );
        assert_eq!(parsed.body, "World");
    }

    #[test]
    fn test_yaml_timestamps_become_dates() {
        let content = "---\n\
            date: 2021-03-01\n\
            updated: 2021-03-02 08:30:00\n\
            stamped: 2021-03-03T09:15:00Z\n\
            zoned: 2021-03-04T10:00:00+08:00\n\
            short: 2021-03-05 10:00\n\
            title: 2021 in review\n\
            ---\n";
        let fm = parse_front_matter(content).unwrap().front_matter;
        let at = |d: u32, h: u32, m: u32| {
            NaiveDate::from_ymd_opt(2021, 3, d)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap()
        };

        assert_eq!(fm["date"], MetaValue::Date(at(1, 0, 0)));
        assert_eq!(fm["updated"], MetaValue::Date(at(2, 8, 30)));
        assert_eq!(fm["stamped"], MetaValue::Date(at(3, 9, 15)));
        assert_eq!(fm["zoned"], MetaValue::Date(at(4, 10, 0)));
        // Not a YAML timestamp: minutes without seconds stay text.
        assert_eq!(fm["short"], MetaValue::from("2021-03-05 10:00"));
        assert_eq!(fm["title"], MetaValue::from("2021 in review"));
    }

    #[test]
    fn test_parse_front_matter_lists() {
        let content = "---\ntags: [go, rust]\ncategories:\n  - notes\ndraft: false\n---\n\nBody\n";
        let parsed = parse_front_matter(content).unwrap();
        assert_eq!(
            parsed.front_matter["tags"].to_string_list(),
            vec!["go".to_string(), "rust".to_string()]
        );
        assert_eq!(
            parsed.front_matter["categories"].to_string_list(),
            vec!["notes".to_string()]
        );
        assert_eq!(parsed.front_matter["draft"].as_bool(), Some(false));
        assert_eq!(parsed.body, "Body\n");
    }

    #[test]
    fn test_comma_separated_string_list() {
        let value = MetaValue::from("go, rust ,");
        assert_eq!(value.to_string_list(), vec!["go", "rust"]);
    }

    #[test]
    fn test_parse_front_matter_no_front_matter() {
        let content = "# Just Markdown\n\nNo front matter here.";
        let parsed = parse_front_matter(content).unwrap();
        assert!(parsed.front_matter.is_empty());
        assert_eq!(parsed.body, content);
    }

    #[test]
    fn test_parse_front_matter_empty_block() {
        let parsed = parse_front_matter("---\n---\n\n# Content").unwrap();
        assert!(parsed.front_matter.is_empty());
        assert_eq!(parsed.body, "# Content");
    }

    #[test]
    fn test_unterminated_front_matter() {
        let result = parse_front_matter("---\ntitle: Broken\n\nBody");
        assert!(matches!(result, Err(FrontMatterError::Unterminated)));
    }

    #[test]
    fn test_front_matter_must_be_mapping() {
        let result = parse_front_matter("---\n- a\n- b\n---\nBody");
        assert!(matches!(result, Err(FrontMatterError::NotAMapping)));
    }

    #[test]
    fn test_has_front_matter() {
        assert!(has_front_matter("---\ntitle: x\n---\n"));
        assert!(has_front_matter("---\r\ntitle: x\r\n---\r\n"));
        assert!(!has_front_matter("title: x"));
        assert!(!has_front_matter(""));
    }
}

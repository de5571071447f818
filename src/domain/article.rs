use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::SummarizerError;

/// An inbound article as accepted by `POST /summarize`.
///
/// Producers disagree on field names, so each field is resolved from a fixed
/// list of candidate paths and the first one present wins.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ArticleRequest {
    pub user_id: i32,
    pub source_name: String,
    pub title: String,
    pub content: String,
    pub categories: Vec<String>,
    pub url: String,
}

const USER_ID_PATHS: &[&[&str]] = &[&["user_id"], &["author_id"], &["user"]];
const SOURCE_NAME_PATHS: &[&[&str]] = &[&["src"], &["source", "name"], &["source"], &["author"]];
const TITLE_PATHS: &[&[&str]] = &[&["title"]];
const CONTENT_PATHS: &[&[&str]] = &[&["content"], &["text"], &["summary"]];
const CATEGORIES_PATHS: &[&[&str]] = &[&["categories"]];
const URL_PATHS: &[&[&str]] = &[&["src_url"], &["link"], &["url"], &["source", "url"]];

impl ArticleRequest {
    /// Prompt sent to the model for this article. Also persisted verbatim as
    /// `original_text`.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!("Summarize: {}\n{}", self.title, self.content)
    }

    /// Resolve an article from one element of the request array.
    pub fn from_value(value: &Value) -> Result<Self, SummarizerError> {
        match value {
            Value::Object(object) => {
                Self::from_object(object).map_err(SummarizerError::InvalidArticle)
            }
            other => Err(SummarizerError::InvalidArticle(format!(
                "expected an article object, got {other}"
            ))),
        }
    }

    /// Resolve an article from an arbitrary JSON object.
    pub fn from_object(object: &Map<String, Value>) -> Result<Self, String> {
        let user_id = match first_present(object, USER_ID_PATHS) {
            Some((path, value)) => user_id_at(path, value)?,
            None => 0,
        };
        // A bare `source` only names the source when it is a string; as an
        // object it carries `source.name` / `source.url` instead.
        let source_name = match first_present_where(object, SOURCE_NAME_PATHS, |path, value| {
            *path != ["source"] || value.is_string()
        }) {
            Some((path, value)) => string_at(path, value)?,
            None => String::new(),
        };
        let title = required_string(object, TITLE_PATHS)?;
        let content = required_string(object, CONTENT_PATHS)?;
        let categories = match first_present(object, CATEGORIES_PATHS) {
            None | Some((_, Value::Null)) => Vec::new(),
            Some((_, Value::Array(items))) => items
                .iter()
                .map(category_id)
                .collect::<Result<Vec<_>, _>>()?,
            Some((_, other)) => return Err(format!("categories must be an array, got {other}")),
        };
        let url = required_string(object, URL_PATHS)?;

        Ok(Self {
            user_id,
            source_name,
            title,
            content,
            categories,
            url,
        })
    }
}

impl<'de> Deserialize<'de> for ArticleRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(D::Error::custom)
    }
}

/// First of `paths` present in `object`, with its value. Later paths are
/// never consulted once one is present, whatever its value.
fn first_present<'a, 'p>(
    object: &'a Map<String, Value>,
    paths: &[&'p [&'p str]],
) -> Option<(&'p [&'p str], &'a Value)> {
    first_present_where(object, paths, |_, _| true)
}

fn first_present_where<'a, 'p>(
    object: &'a Map<String, Value>,
    paths: &[&'p [&'p str]],
    counts: impl Fn(&[&str], &Value) -> bool,
) -> Option<(&'p [&'p str], &'a Value)> {
    paths.iter().find_map(|path| {
        lookup(object, path)
            .filter(|value| counts(*path, *value))
            .map(|value| (*path, value))
    })
}

fn lookup<'a>(object: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = object.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

fn required_string(object: &Map<String, Value>, paths: &[&[&str]]) -> Result<String, String> {
    match first_present(object, paths) {
        Some((path, value)) => string_at(path, value),
        None => Err(format!("missing field {}", describe(paths))),
    }
}

fn string_at(path: &[&str], value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("`{}` must be a string, got {value}", path.join(".")))
}

/// Integers, integral floats and integer strings are accepted.
fn user_id_at(path: &[&str], value: &Value) -> Result<i32, String> {
    let field = path.join(".");
    let id = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("`{field}` must be an integer, got {value}"))?;
    i32::try_from(id).map_err(|_| format!("`{field}` {id} out of range"))
}

fn describe(paths: &[&[&str]]) -> String {
    let names: Vec<String> = paths.iter().map(|p| format!("`{}`", p.join("."))).collect();
    match names.split_first() {
        Some((first, [])) => first.clone(),
        Some((first, rest)) => format!("{first} (or {})", rest.join(", ")),
        None => String::new(),
    }
}

fn category_id(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("category must be a string or integer, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<ArticleRequest, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_canonical_fields() {
        let article = parse(json!({
            "user_id": 7,
            "src": "wire",
            "title": "Test Article 1",
            "content": "This is a test article content.",
            "categories": ["1", "2"],
            "url": "https://example.com/a"
        }))
        .unwrap();

        assert_eq!(article.user_id, 7);
        assert_eq!(article.source_name, "wire");
        assert_eq!(article.categories, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(article.url, "https://example.com/a");
    }

    #[test]
    fn test_first_alias_wins() {
        let article = parse(json!({
            "user": 3,
            "author_id": 2,
            "title": "t",
            "summary": "from summary",
            "text": "from text",
            "url": "u-url",
            "link": "u-link"
        }))
        .unwrap();

        assert_eq!(article.user_id, 2);
        assert_eq!(article.content, "from text");
        assert_eq!(article.url, "u-link");
    }

    #[test]
    fn test_nested_source_paths() {
        let article = parse(json!({
            "source": {"name": "Reuters", "url": "https://reuters.com/x"},
            "author": "someone",
            "title": "t",
            "content": "c"
        }))
        .unwrap();

        assert_eq!(article.source_name, "Reuters");
        assert_eq!(article.url, "https://reuters.com/x");
    }

    #[test]
    fn test_source_string_and_author_fallback() {
        let article = parse(json!({
            "source": "AP",
            "title": "t",
            "content": "c",
            "url": "u"
        }))
        .unwrap();
        assert_eq!(article.source_name, "AP");

        let article = parse(json!({
            "author": "Jane",
            "title": "t",
            "content": "c",
            "url": "u"
        }))
        .unwrap();
        assert_eq!(article.source_name, "Jane");
    }

    #[test]
    fn test_defaults() {
        let article = parse(json!({"title": "t", "content": "c", "url": "u"})).unwrap();
        assert_eq!(article.user_id, 0);
        assert_eq!(article.source_name, "");
        assert!(article.categories.is_empty());

        let article =
            parse(json!({"title": "t", "content": "c", "url": "u", "categories": null})).unwrap();
        assert!(article.categories.is_empty());
    }

    #[test]
    fn test_integer_categories_become_strings() {
        let article =
            parse(json!({"title": "t", "content": "c", "url": "u", "categories": [4, "5"]}))
                .unwrap();
        assert_eq!(article.categories, vec!["4".to_string(), "5".to_string()]);
    }

    #[test]
    fn test_missing_required_fields() {
        let err = parse(json!({"content": "c", "url": "u"})).unwrap_err();
        assert!(err.to_string().contains("title"));

        let err = parse(json!({"title": "t", "url": "u"})).unwrap_err();
        assert!(err.to_string().contains("content"));

        let err = parse(json!({"title": "t", "content": "c"})).unwrap_err();
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(parse(json!(["title"])).is_err());
        assert!(matches!(
            ArticleRequest::from_value(&json!("just a string")),
            Err(SummarizerError::InvalidArticle(_))
        ));
    }

    #[test]
    fn test_present_alias_is_validated_not_skipped() {
        let err = parse(json!({
            "user_id": "seven",
            "author_id": 3,
            "title": "t",
            "content": "c",
            "url": "u"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("`user_id` must be an integer"));

        let err = parse(json!({"title": "t", "content": 42, "text": "from text", "url": "u"}))
            .unwrap_err();
        assert!(err.to_string().contains("`content` must be a string"));

        let err = parse(json!({"title": "t", "content": "c", "src_url": null, "url": "u"}))
            .unwrap_err();
        assert!(err.to_string().contains("`src_url`"));
    }

    #[test]
    fn test_user_id_integer_strings_are_coerced() {
        let article = parse(json!({"user_id": "5", "title": "t", "content": "c", "url": "u"}))
            .unwrap();
        assert_eq!(article.user_id, 5);

        let article = parse(json!({
            "user_id": "7",
            "author_id": 3,
            "title": "t",
            "content": "c",
            "url": "u"
        }))
        .unwrap();
        assert_eq!(article.user_id, 7);

        let article =
            parse(json!({"user": 9.0, "title": "t", "content": "c", "url": "u"})).unwrap();
        assert_eq!(article.user_id, 9);
    }

    #[test]
    fn test_user_id_out_of_range() {
        let err = parse(json!({"user_id": 1_i64 << 40, "title": "t", "content": "c", "url": "u"}))
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_source_object_without_name_falls_back_to_author() {
        let article = parse(json!({
            "source": {"url": "https://example.com/x"},
            "author": "Jane",
            "title": "t",
            "content": "c"
        }))
        .unwrap();
        assert_eq!(article.source_name, "Jane");
        assert_eq!(article.url, "https://example.com/x");
    }

    #[test]
    fn test_prompt_format() {
        let article = parse(json!({"title": "Headline", "content": "Body text", "url": "u"})).unwrap();
        assert_eq!(article.prompt(), "Summarize: Headline\nBody text");
    }
}

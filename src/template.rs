//! Path template rendering
//!
//! Endpoint paths may contain `{name}` placeholders, e.g. `/users/{user_id}/repos`.
//! Values are substituted per path segment and percent-encoded by `url`, so a
//! value containing `/` or `?` can never escape its segment.

use crate::error::{Error, Result};
use crate::types::StringMap;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Regex for matching path placeholders: {name}
static TEMPLATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}").unwrap());

/// Render a path template against a base URL
///
/// Absolute `http(s)://` templates bypass the base URL entirely.
pub fn render_path(base: &Url, template: &str, params: &StringMap) -> Result<Url> {
    if template.starts_with("http://") || template.starts_with("https://") {
        let rendered = render_str(template, params)?;
        return Ok(Url::parse(&rendered)?);
    }

    let mut missing = Vec::new();
    let segments: Vec<String> = template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| substitute(segment, params, &mut missing))
        .collect();

    if !missing.is_empty() {
        return Err(missing_params(&missing));
    }

    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| Error::config(format!("base URL '{base}' cannot carry a path")))?;
        path.pop_if_empty();
        path.extend(segments.iter());
    }
    Ok(url)
}

/// Render placeholders in a plain string without any encoding
pub fn render_str(template: &str, params: &StringMap) -> Result<String> {
    let mut missing = Vec::new();
    let rendered = substitute(template, params, &mut missing);
    if missing.is_empty() {
        Ok(rendered)
    } else {
        Err(missing_params(&missing))
    }
}

/// Check if a string contains placeholders
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all placeholder names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn substitute(template: &str, params: &StringMap, missing: &mut Vec<String>) -> String {
    TEMPLATE_REGEX
        .replace_all(template, |cap: &regex::Captures<'_>| {
            let name = &cap[1];
            match params.get(name) {
                Some(value) => value.clone(),
                None => {
                    missing.push(name.to_string());
                    String::new()
                }
            }
        })
        .into_owned()
}

fn missing_params(missing: &[String]) -> Error {
    Error::precondition(format!("missing path parameter(s): {}", missing.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> StringMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn base() -> Url {
        Url::parse("https://api.example.com/v1/").unwrap()
    }

    #[test]
    fn test_plain_path_joins_base() {
        let url = render_path(&base(), "/items", &StringMap::new()).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/items");
    }

    #[test]
    fn test_base_without_trailing_slash() {
        let base = Url::parse("https://api.example.com/v1").unwrap();
        let url = render_path(&base, "items", &StringMap::new()).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/items");
    }

    #[test]
    fn test_placeholder_substitution() {
        let url = render_path(
            &base(),
            "/users/{user_id}/repos",
            &params(&[("user_id", "42")]),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/users/42/repos");
    }

    #[test]
    fn test_values_are_percent_encoded_within_segment() {
        let url = render_path(
            &base(),
            "/files/{name}",
            &params(&[("name", "a b/c?d")]),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/files/a%20b%2Fc%3Fd"
        );
    }

    #[test]
    fn test_missing_parameter_is_precondition_violation() {
        let err = render_path(&base(), "/users/{user_id}/{repo}", &StringMap::new()).unwrap_err();
        assert!(matches!(err, Error::PreconditionViolation { .. }));
        assert!(err.to_string().contains("user_id, repo"));
    }

    #[test]
    fn test_absolute_template_ignores_base() {
        let url = render_path(
            &base(),
            "https://other.example.com/export/{id}",
            &params(&[("id", "7")]),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://other.example.com/export/7");
    }

    #[test]
    fn test_has_templates_and_extract() {
        assert!(has_templates("/users/{id}"));
        assert!(!has_templates("/users/me"));
        assert_eq!(
            extract_variables("/orgs/{org}/teams/{ team }"),
            vec!["org", "team"]
        );
    }
}

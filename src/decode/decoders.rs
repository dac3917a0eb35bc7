//! JSON page decoder

use super::types::{DecoderConfig, Page, PageDecoder};
use crate::error::{Error, Result};
use crate::http::Response;
use crate::types::OptionStringExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Decodes JSON bodies into typed pages
pub struct JsonPageDecoder<T> {
    config: DecoderConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonPageDecoder<T> {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            _marker: PhantomData,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl<T> Default for JsonPageDecoder<T> {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl<T> Clone for JsonPageDecoder<T> {
    fn clone(&self) -> Self {
        Self::new(self.config.clone())
    }
}

impl<T> fmt::Debug for JsonPageDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonPageDecoder")
            .field("config", &self.config)
            .finish()
    }
}

impl<T: DeserializeOwned> PageDecoder<T> for JsonPageDecoder<T> {
    fn decode(&self, response: &Response) -> Result<Page<T>> {
        let body: Value = response.json()?;

        let records = match &self.config.items_path {
            Some(path) => extract_path(&body, path)
                .ok_or_else(|| Error::protocol(format!("no items at '{path}'")))?,
            None => &body,
        };

        let items = match records {
            Value::Array(arr) => arr
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    T::deserialize(item)
                        .map_err(|e| Error::protocol(format!("item {i} did not decode: {e}")))
                })
                .collect::<Result<Vec<T>>>()?,
            Value::Null => Vec::new(),
            other => {
                return Err(Error::protocol(format!(
                    "expected an item array, found {}",
                    type_name(other)
                )))
            }
        };

        let mut next_cursor = self
            .config
            .next_cursor_path
            .as_deref()
            .and_then(|path| extract_path(&body, path))
            .and_then(scalar_string)
            .none_if_empty();

        if next_cursor.is_none() && self.config.next_link_header {
            next_cursor = response
                .headers
                .get("link")
                .and_then(|link| parse_link_header(link, "next"));
        }

        let total = match self.config.total_path.as_deref() {
            Some(path) => match extract_path(&body, path) {
                None | Some(Value::Null) => None,
                Some(value) => Some(count(value).ok_or_else(|| {
                    Error::protocol(format!("total at '{path}' is not a count: {value}"))
                })?),
            },
            None => None,
        };

        Ok(Page {
            items,
            next_cursor,
            total,
        })
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Look up a value by dot-notation path
///
/// Supports `a.b.c`, array indexing `items[0]`, chained indexing
/// `grid[0][1]`, and negative indices counting from the end (`items[-1]`).
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        let (name, mut indices) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };

        if !name.is_empty() {
            current = current.get(name)?;
        }

        while !indices.is_empty() {
            let (index, rest) = indices.strip_prefix('[')?.split_once(']')?;
            current = index_array(current, index)?;
            indices = rest;
        }
    }

    Some(current)
}

fn index_array<'a>(value: &'a Value, index: &str) -> Option<&'a Value> {
    let arr = value.as_array()?;
    let index: i64 = index.trim().parse().ok()?;
    let idx = if index < 0 {
        arr.len().checked_sub(usize::try_from(index.unsigned_abs()).ok()?)?
    } else {
        usize::try_from(index).ok()?
    };
    arr.get(idx)
}

/// Parse an RFC 5988 `Link` header and return the URL for `target_rel`
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    // <url>; rel="next", <url>; rel="prev"
    header.split(',').find_map(|part| {
        let mut url = None;
        let mut matched = false;

        for segment in part.split(';').map(str::trim) {
            if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Some(inner);
            } else if let Some(rel) = segment.strip_prefix("rel=") {
                let rel = rel.trim_matches(|c| c == '"' || c == '\'');
                matched = rel.split_whitespace().any(|r| r == target_rel);
            }
        }

        url.filter(|_| matched).map(str::to_string)
    })
}

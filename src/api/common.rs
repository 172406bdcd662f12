//! Shared handler helpers
//!
//! HTML form bodies are parsed by hand because checkbox groups submit the
//! same key several times, which the standard urlencoded extractor cannot
//! represent. The parser keeps every pair so `get_all` can collect them.

use crate::api::error::PageError;

/// Decoded `application/x-www-form-urlencoded` body
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    /// Parse a raw urlencoded body. Pairs without '=' become empty values.
    pub fn parse(body: &[u8]) -> Result<Self, PageError> {
        let text = std::str::from_utf8(body)
            .map_err(|_| PageError::Validation("Form body is not valid UTF-8".to_string()))?;

        let mut pairs = Vec::new();
        for pair in text.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, v),
                None => (pair, ""),
            };
            pairs.push((decode_component(key)?, decode_component(value)?));
        }
        Ok(Self { pairs })
    }

    /// First value for a key, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value for a key, trimmed, or a validation error when the field
    /// is missing or blank
    pub fn require(&self, name: &str) -> Result<&str, PageError> {
        match self.get(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(PageError::Validation(format!(
                "Missing required field '{}'",
                name
            ))),
        }
    }

    /// All values submitted under a key, in order
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Checkbox-group values parsed as integers; unparsable entries are
    /// discarded the same way unknown ids are
    pub fn get_ids(&self, name: &str) -> Vec<i64> {
        self.get_all(name)
            .into_iter()
            .filter_map(|v| v.parse().ok())
            .collect()
    }

    /// Whether a checkbox was ticked
    pub fn is_checked(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

fn decode_component(raw: &str) -> Result<String, PageError> {
    let plus_decoded = raw.replace('+', " ");
    urlencoding::decode(&plus_decoded)
        .map(|cow| cow.into_owned())
        .map_err(|_| PageError::Validation("Malformed form encoding".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_pairs() {
        let form = FormData::parse(b"title=Xin+ch%C3%A0o&author=An").unwrap();
        assert_eq!(form.get("title"), Some("Xin chào"));
        assert_eq!(form.get("author"), Some("An"));
        assert_eq!(form.get("missing"), None);
    }

    #[test]
    fn test_repeated_keys_collect() {
        let form = FormData::parse(b"genre_ids=1&genre_ids=3&genre_ids=xyz").unwrap();
        assert_eq!(form.get_all("genre_ids"), vec!["1", "3", "xyz"]);
        assert_eq!(form.get_ids("genre_ids"), vec![1, 3]);
    }

    #[test]
    fn test_require_rejects_blank() {
        let form = FormData::parse(b"title=+++&secret=abc").unwrap();
        assert!(form.require("title").is_err());
        assert_eq!(form.require("secret").unwrap(), "abc");
    }

    #[test]
    fn test_checkbox() {
        let form = FormData::parse(b"is_completed=1").unwrap();
        assert!(form.is_checked("is_completed"));
        assert!(!form.is_checked("is_hidden"));
    }
}

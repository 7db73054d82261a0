//! Per-request placeholder replacer.
//!
//! Handlers record values under dotted keys (`http.request.method`) and
//! expand `{key}` placeholders in templates. A replacer is scratch state for
//! one request and is never shared between requests.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Replacer {
    values: HashMap<String, String>,
}

impl Replacer {
    /// An empty replacer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Expand every `{key}` in `input`. Unknown placeholders become `empty`;
    /// an unterminated `{` is copied through as-is.
    pub fn replace_all(&self, input: &str, empty: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let key = &after[..close];
                    out.push_str(self.get(key).unwrap_or(empty));
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);

        out
    }
}

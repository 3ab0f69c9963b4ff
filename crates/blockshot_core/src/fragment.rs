use std::fmt;

use serde::Serialize;

/// A resource as seen by the pipeline: an id and a display title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceRef {
    pub id: u64,
    pub title: String,
}

impl ResourceRef {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// A self-contained markup snippet selected for conversion.
///
/// Two fragments are the same fragment iff their serialized markup is
/// byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TextFragment(String);

impl TextFragment {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TextFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TextFragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TextFragment {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TextFragment {
    fn from(value: String) -> Self {
        Self(value)
    }
}

//! Boundary to the host document.
//!
//! The engine never edits a document itself: it hands the rewritten fragment and a list of
//! [`StatePatch`]es to a [`DocumentPatcher`]. [`InMemoryDocument`] is the implementation used
//! by the CLI and tests.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Replacement for one named string field of document state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePatch {
    pub field: String,
    pub replacement: String,
}

pub trait DocumentPatcher {
    /// The rendered markup fragment to convert.
    fn fragment(&self) -> &str;

    /// Named string fields that may hold embedded markup, in document order.
    fn string_fields(&self) -> Vec<(String, String)>;

    fn replace_fragment(&mut self, text: String);

    fn apply_patch(&mut self, patch: &StatePatch);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryDocument {
    pub body: String,
    #[serde(default)]
    pub state: IndexMap<String, String>,
}

impl InMemoryDocument {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            state: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.state.insert(name.into(), value.into());
        self
    }
}

impl DocumentPatcher for InMemoryDocument {
    fn fragment(&self) -> &str {
        &self.body
    }

    fn string_fields(&self) -> Vec<(String, String)> {
        self.state
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn replace_fragment(&mut self, text: String) {
        self.body = text;
    }

    fn apply_patch(&mut self, patch: &StatePatch) {
        // Patches only ever target fields the document reported.
        if let Some(slot) = self.state.get_mut(&patch.field) {
            *slot = patch.replacement.clone();
        }
    }
}

fn numeric_reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").expect("valid regex"))
}

/// Decodes numeric character references (`&#60;`, `&#x3C;`). Named entities and references
/// to invalid code points are left as written.
pub fn decode_numeric_references(input: &str) -> Cow<'_, str> {
    if !input.contains("&#") {
        return Cow::Borrowed(input);
    }
    numeric_reference_regex().replace_all(input, |caps: &Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            (None, None) => None,
        };
        match code.and_then(char::from_u32) {
            Some(ch) => ch.to_string(),
            None => caps[0].to_string(),
        }
    })
}

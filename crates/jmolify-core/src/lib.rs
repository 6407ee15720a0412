#![forbid(unsafe_code)]

//! Converts legacy molecule-viewer markup into Jmol controls, in place.
//!
//! Two legacy schemas are supported:
//! - old `<applet code="JmolApplet">` / `JmolAppletControl` pages with `<param>` children
//! - Chime plug-in pages using self-closing `<embed src=... script=... button=...>` tags
//!
//! The engine works on raw markup text rather than a parsed tree, so malformed pages survive
//! and markup it does not recognize is passed through byte-for-byte.
//!
//! ```
//! use jmolify_core::{Converter, ConvertOptions};
//!
//! let converter = Converter::new().with_options(ConvertOptions::default());
//! let page = r#"<p>Spin it:</p><embed button="push" script="spin on">"#;
//! let out = converter.convert_page(page);
//! assert!(!out.text.contains("<embed"));
//! assert!(out.text.contains(r#"data-script="spin on""#));
//! ```

pub mod attributes;
pub mod config;
pub mod control;
pub mod dialect;
pub mod document;
pub mod error;
pub mod occurrence;
pub mod params;
pub mod rewrite;
pub mod script;

pub use attributes::{AttributeMap, tokenize_attributes};
pub use config::ConvertOptions;
pub use control::{ControlKind, ControlRegistry, ControlSpec, Dimension, FailureCallback};
pub use dialect::{Dialect, detect_dialect};
pub use document::{DocumentPatcher, InMemoryDocument, StatePatch};
pub use error::{Error, Result};
pub use occurrence::{OccurrenceKind, TagOccurrence};
pub use rewrite::{Diagnostic, RewriteReport, find_occurrences, rewrite_fragment};

use document::decode_numeric_references;
use serde::Serialize;

/// Result of converting one page (or one document).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConversion {
    /// `None` when nothing on the page needed converting.
    pub dialect: Option<Dialect>,
    pub text: String,
    pub converted: usize,
    pub passed_through: usize,
    pub patches: Vec<StatePatch>,
    pub diagnostics: Vec<Diagnostic>,
    /// Style block generated buttons need, if any were generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<String>,
}

impl PageConversion {
    fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    /// The converted page with the stylesheet (when needed) in front of it.
    pub fn into_page(self) -> String {
        match self.stylesheet {
            Some(style) => format!("{style}\n{}", self.text),
            None => self.text,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Detects the page's dialect and converts it. Pages with nothing to convert (including
    /// pages this engine already converted) come back unchanged.
    pub fn convert_page(&self, page: &str) -> PageConversion {
        match detect_dialect(page) {
            Some(dialect) => self.convert_fragment(page, dialect),
            None => PageConversion::unchanged(page),
        }
    }

    /// Converts `fragment` as `dialect`, skipping page-level detection.
    pub fn convert_fragment(&self, fragment: &str, dialect: Dialect) -> PageConversion {
        let mut registry = ControlRegistry::new();
        let report = rewrite_fragment(fragment, dialect, &self.options, &mut registry);
        PageConversion {
            dialect: Some(dialect),
            text: report.text,
            converted: report.converted,
            passed_through: report.passed_through,
            patches: Vec::new(),
            diagnostics: report.diagnostics,
            stylesheet: registry.stylesheet(&self.options),
        }
    }

    /// Converts a document's fragment and its string state, installing the results through
    /// `document`. One control registry spans both passes so ids stay unique.
    pub fn convert_document<D: DocumentPatcher>(
        &self,
        document: &mut D,
        dialect: Option<Dialect>,
    ) -> PageConversion {
        let fields = document.string_fields();
        let dialect = dialect
            .or_else(|| detect_dialect(document.fragment()))
            .or_else(|| {
                fields
                    .iter()
                    .find_map(|(_, value)| detect_dialect(&decode_numeric_references(value)))
            });
        let Some(dialect) = dialect else {
            return PageConversion::unchanged(document.fragment());
        };

        let mut registry = ControlRegistry::new();
        let report = rewrite_fragment(document.fragment(), dialect, &self.options, &mut registry);
        let (patches, state_diagnostics) =
            rewrite::rewrite_state_fields(fields, dialect, &self.options, &mut registry);

        document.replace_fragment(report.text.clone());
        for patch in &patches {
            tracing::debug!(field = %patch.field, "applying state patch");
            document.apply_patch(patch);
        }

        let mut diagnostics = report.diagnostics;
        diagnostics.extend(state_diagnostics);
        PageConversion {
            dialect: Some(dialect),
            text: report.text,
            converted: report.converted,
            passed_through: report.passed_through,
            patches,
            diagnostics,
            stylesheet: registry.stylesheet(&self.options),
        }
    }
}

#[cfg(test)]
mod tests;

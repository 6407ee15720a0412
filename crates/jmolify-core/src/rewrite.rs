//! Marker-splitting fragment rewriter.
//!
//! A fragment is cut at every occurrence of the dialect's marker token. Text before the first
//! marker is never touched; each later segment holds at most one occurrence, whose end is found
//! with the dialect's [`Termination`] rule. Converted occurrences are replaced in place and
//! everything after the terminator is copied verbatim. No tree is built, so unrelated (and
//! malformed) markup survives byte-for-byte.

use crate::attributes::tokenize_attributes;
use crate::config::ConvertOptions;
use crate::control::ControlRegistry;
use crate::dialect::{Dialect, Termination, find_ignore_ascii_case, marker_positions};
use crate::document::{StatePatch, decode_numeric_references};
use crate::occurrence::{TagOccurrence, classify, convert_occurrence};
use crate::params::normalize_params;
use htmlize::escape_text;
use serde::Serialize;

/// A per-occurrence problem; the rest of the fragment is still converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Document state field the occurrence came from; `None` for the main fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub start: usize,
    pub end: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteReport {
    pub text: String,
    /// Occurrences replaced by generated controls.
    pub converted: usize,
    /// Occurrences left exactly as written (unrecognized or unterminated).
    pub passed_through: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Index of the terminator inside `segment` and the number of bytes up to and including it.
fn locate_end(segment: &str, termination: Termination) -> Option<(usize, usize)> {
    match termination {
        Termination::ClosingMarker(closing) => {
            find_ignore_ascii_case(segment, closing, 0).map(|pt| (pt, pt + closing.len()))
        }
        Termination::QuoteParity => {
            let mut quotes = 0usize;
            for (i, b) in segment.bytes().enumerate() {
                match b {
                    b'"' => quotes += 1,
                    b'>' if quotes % 2 == 0 => return Some((i, i + 1)),
                    _ => {}
                }
            }
            None
        }
    }
}

/// Finds every marker occurrence in `fragment`, classified but not yet converted.
pub fn find_occurrences(fragment: &str, dialect: Dialect) -> Vec<TagOccurrence<'_>> {
    let marker = dialect.marker();
    let starts = marker_positions(fragment, marker);

    let mut out = Vec::with_capacity(starts.len());
    for (idx, &start) in starts.iter().enumerate() {
        let segment_end = starts.get(idx + 1).copied().unwrap_or(fragment.len());
        let body_start = start + marker.len();
        let segment = &fragment[body_start..segment_end];

        let Some((text_len, consumed)) = locate_end(segment, dialect.termination()) else {
            out.push(TagOccurrence {
                start,
                end: segment_end,
                text: segment,
                terminated: false,
                kind: None,
                attributes: Default::default(),
            });
            continue;
        };

        let text = &segment[..text_len];
        let attributes = tokenize_attributes(&normalize_params(text));
        let kind = classify(dialect, text, &attributes);
        out.push(TagOccurrence {
            start,
            end: body_start + consumed,
            text,
            terminated: true,
            kind,
            attributes,
        });
    }
    out
}

/// Rewrites every recognized occurrence of `dialect`'s marker in `fragment`.
///
/// Never fails: unrecognized and unterminated occurrences are copied unchanged, and an
/// occurrence that cannot be converted is replaced by an operator-facing message.
pub fn rewrite_fragment(
    fragment: &str,
    dialect: Dialect,
    options: &ConvertOptions,
    registry: &mut ControlRegistry,
) -> RewriteReport {
    let mut report = RewriteReport::default();
    let mut out = String::with_capacity(fragment.len());
    let mut cursor = 0usize;

    for occurrence in find_occurrences(fragment, dialect) {
        out.push_str(&fragment[cursor..occurrence.start]);
        cursor = occurrence.end;

        let original = &fragment[occurrence.start..occurrence.end];
        let Some(kind) = occurrence.kind else {
            if occurrence.terminated {
                tracing::debug!(start = occurrence.start, "unrecognized {dialect} tag left as is");
            } else {
                tracing::warn!(
                    start = occurrence.start,
                    "unterminated {dialect} tag left as is"
                );
            }
            report.passed_through += 1;
            out.push_str(original);
            continue;
        };

        tracing::debug!(start = occurrence.start, ?kind, "converting {dialect} tag");
        match convert_occurrence(kind, &occurrence.attributes, options, registry) {
            Ok(markup) => {
                report.converted += 1;
                out.push_str(&markup);
            }
            Err(err) => {
                tracing::warn!(start = occurrence.start, "{err}");
                let message = err.to_string();
                out.push_str(&format!(
                    "<span class=\"jmolify-error\">{}</span>",
                    escape_text(&message)
                ));
                report.diagnostics.push(Diagnostic {
                    field: None,
                    start: occurrence.start,
                    end: occurrence.end,
                    message,
                });
            }
        }
    }

    out.push_str(&fragment[cursor..]);
    report.text = out;
    report
}

/// Converts embedded markup hidden in document-level string fields.
///
/// Only dialects that stash markup in strings are swept. Values are numeric-reference decoded
/// first; fields without a marker (or without anything to convert) produce no patch.
pub fn rewrite_state_fields<I, K, V>(
    fields: I,
    dialect: Dialect,
    options: &ConvertOptions,
    registry: &mut ControlRegistry,
) -> (Vec<StatePatch>, Vec<Diagnostic>)
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut patches = Vec::new();
    let mut diagnostics = Vec::new();
    if !dialect.rewrites_document_state() {
        return (patches, diagnostics);
    }

    for (field, value) in fields {
        let field = field.as_ref();
        let decoded = decode_numeric_references(value.as_ref());
        if marker_positions(&decoded, dialect.marker()).is_empty() {
            continue;
        }

        let report = rewrite_fragment(&decoded, dialect, options, registry);
        if report.converted == 0 && report.diagnostics.is_empty() {
            continue;
        }
        tracing::debug!(field, converted = report.converted, "patching document state");
        diagnostics.extend(report.diagnostics.into_iter().map(|d| Diagnostic {
            field: Some(field.to_string()),
            ..d
        }));
        patches.push(StatePatch {
            field: field.to_string(),
            replacement: report.text,
        });
    }

    (patches, diagnostics)
}

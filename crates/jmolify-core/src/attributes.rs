//! Tolerant attribute extraction for one raw tag.
//!
//! Pages carrying legacy applet/embed markup are frequently malformed (unbalanced quotes, stray
//! `<br>` inside attribute values, missing closing `>`). This tokenizer works on the raw text of a
//! single tag interior and always returns a best-effort [`AttributeMap`]; it never fails.

use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// Name/value boundary appended after normalization so a trailing bare name is still closed.
const SENTINEL: &str = " =";

fn line_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"))
}

fn whitespace_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn equals_spacing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*=\s*").expect("valid regex"))
}

/// Lower-cased attribute name -> raw attribute value for one tag occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: FxHashMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an attribute, lower-casing the name. Later writes win.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Raw lookup; an attribute written as a bare name yields `Some("")`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Lookup that treats an empty value the same as a missing attribute.
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn normalize_tag_text(tag: &str) -> String {
    let mut s = tag.replace(['\r', '\n', '\t'], " ");
    s = line_break_regex().replace_all(&s, " ").into_owned();

    let trimmed = s.trim_end();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    s = whitespace_run_regex().replace_all(trimmed, " ").into_owned();
    s = equals_spacing_regex().replace_all(&s, "=").into_owned();

    s.push_str(SENTINEL);
    s
}

fn attribute_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn find_from(haystack: &str, needle: u8, from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack.as_bytes()[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|rel| from + rel)
}

/// Locates the opening quote of the value that starts after `pte` (the `=`).
///
/// A double quote directly after `=` wins; otherwise the nearer of the two quote characters.
fn opening_quote(tag: &str, pte: usize) -> Option<(usize, u8)> {
    let bytes = tag.as_bytes();
    if bytes.get(pte + 1) == Some(&b'"') {
        return Some((pte + 1, b'"'));
    }
    let single = find_from(tag, b'\'', pte + 1);
    let double = find_from(tag, b'"', pte + 1);
    match (single, double) {
        (Some(s), Some(d)) if d < s => Some((d, b'"')),
        (Some(s), _) => Some((s, b'\'')),
        (None, Some(d)) => Some((d, b'"')),
        (None, None) => None,
    }
}

/// Extracts the attribute map from a tag interior (the text after the tag name, before `>`).
///
/// Three token shapes are recognized: a bare name (`nomenus`), an unquoted value
/// (`width=300`), and a quoted value (`script="select *; spacefill"`, either quote character).
/// An unterminated quote consumes the rest of the text as the value and ends the scan.
pub fn tokenize_attributes(tag: &str) -> AttributeMap {
    let tag = normalize_tag_text(tag);
    let bytes = tag.as_bytes();
    let scan_end = tag.len() - SENTINEL.len();
    let mut attrs = AttributeMap::new();

    let mut i = 0usize;
    while i < scan_end {
        if bytes[i] == b' ' {
            i += 1;
            continue;
        }

        // The sentinel guarantees both exist.
        let Some(pts) = find_from(&tag, b' ', i) else {
            break;
        };
        let Some(pte) = find_from(&tag, b'=', i) else {
            break;
        };

        if pts < pte {
            insert_named(&mut attrs, &tag[i..pts], String::new());
            i = pts + 1;
            continue;
        }

        let name = &tag[i..pte];
        match opening_quote(&tag, pte) {
            Some((ptq, quote)) if ptq < pts => match find_from(&tag, quote, ptq + 1) {
                Some(ptq2) => {
                    insert_named(&mut attrs, name, tag[ptq + 1..ptq2].to_string());
                    i = ptq2 + 1;
                }
                None => {
                    let rest = tag[ptq + 1..scan_end].trim_end();
                    insert_named(&mut attrs, name, rest.to_string());
                    break;
                }
            },
            _ => {
                insert_named(&mut attrs, name, tag[pte + 1..pts].to_string());
                i = pts + 1;
            }
        }
    }

    attrs
}

fn insert_named(attrs: &mut AttributeMap, raw_name: &str, value: String) {
    let name = attribute_name(raw_name);
    if name.is_empty() {
        return;
    }
    attrs.entries.insert(name, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_quoted_values_with_spaces_for_both_quote_characters() {
        let attrs = tokenize_attributes(
            r#" src="models/caffeine.mol" script='select all; spacefill 20%' name="main viewer""#,
        );
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs.get("src"), Some("models/caffeine.mol"));
        assert_eq!(attrs.get("script"), Some("select all; spacefill 20%"));
        assert_eq!(attrs.get("name"), Some("main viewer"));
    }

    #[test]
    fn recognizes_bare_names_and_unquoted_values() {
        let attrs = tokenize_attributes(" width=200 height=150 nomenus frank=false");
        assert_eq!(attrs.get("width"), Some("200"));
        assert_eq!(attrs.get("height"), Some("150"));
        assert_eq!(attrs.get("nomenus"), Some(""));
        assert_eq!(attrs.non_empty("nomenus"), None);
        assert_eq!(attrs.get("frank"), Some("false"));
    }

    #[test]
    fn trailing_bare_name_is_closed_by_sentinel() {
        let attrs = tokenize_attributes(r#" src="a.pdb" startspin"#);
        assert_eq!(attrs.get("src"), Some("a.pdb"));
        assert!(attrs.contains("startspin"));
    }

    #[test]
    fn names_are_lowercased_and_unquoted() {
        let attrs = tokenize_attributes(r#" SRC="a.pdb" "Script"="spin on""#);
        assert_eq!(attrs.get("src"), Some("a.pdb"));
        assert_eq!(attrs.get("script"), Some("spin on"));
    }

    #[test]
    fn normalizes_spacing_around_equals_and_line_breaks() {
        let attrs = tokenize_attributes(" width = 300\r\n\theight= 200<br/>script =\"wireframe on;\"");
        assert_eq!(attrs.get("width"), Some("300"));
        assert_eq!(attrs.get("height"), Some("200"));
        assert_eq!(attrs.get("script"), Some("wireframe on;"));
    }

    #[test]
    fn strips_self_closing_marker() {
        let attrs = tokenize_attributes(r#" src="a.mol" width=100 /"#);
        assert_eq!(attrs.get("width"), Some("100"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn double_quote_right_after_equals_wins_over_earlier_apostrophe() {
        let attrs = tokenize_attributes(r#" script="select 'CA'; color red" button=push"#);
        assert_eq!(attrs.get("script"), Some("select 'CA'; color red"));
        assert_eq!(attrs.get("button"), Some("push"));
    }

    #[test]
    fn unterminated_quote_consumes_the_rest() {
        let attrs = tokenize_attributes(r#" src="a.mol" script="spin on; width=12"#);
        assert_eq!(attrs.get("src"), Some("a.mol"));
        assert_eq!(attrs.get("script"), Some("spin on; width=12"));
    }

    #[test]
    fn later_duplicates_overwrite_earlier_ones() {
        let attrs = tokenize_attributes(" width=100 width=250");
        assert_eq!(attrs.get("width"), Some("250"));
    }

    #[test]
    fn empty_and_garbage_inputs_are_total() {
        assert!(tokenize_attributes("").is_empty());
        assert!(tokenize_attributes("   ").is_empty());
        let attrs = tokenize_attributes("= = \"'");
        assert!(attrs.len() <= 1);
        let attrs = tokenize_attributes("name=\u{e9}t\u{e9} label=\"caf\u{e9} au lait\"");
        assert_eq!(attrs.get("name"), Some("\u{e9}t\u{e9}"));
        assert_eq!(attrs.get("label"), Some("caf\u{e9} au lait"));
    }
}

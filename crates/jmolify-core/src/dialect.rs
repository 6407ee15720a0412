use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the two legacy markup/scripting schemas this crate converts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// `<applet code="JmolApplet...">` with `<param>` children, closed by `</applet>`.
    #[serde(rename = "jmol")]
    JmolApplet,
    /// Self-closing `<embed src=... script=...>` tags written for the Chime plug-in.
    #[serde(rename = "chime")]
    ChimeEmbed,
}

/// How the end of one occurrence is found after its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// First explicit closing marker in the segment (case-insensitive).
    ClosingMarker(&'static str),
    /// First `>` seen while an even number of `"` characters has been scanned.
    QuoteParity,
}

impl Dialect {
    pub fn marker(self) -> &'static str {
        match self {
            Dialect::JmolApplet => "<applet",
            Dialect::ChimeEmbed => "<embed",
        }
    }

    pub fn termination(self) -> Termination {
        match self {
            Dialect::JmolApplet => Termination::ClosingMarker("</applet>"),
            Dialect::ChimeEmbed => Termination::QuoteParity,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::JmolApplet => "jmol",
            Dialect::ChimeEmbed => "chime",
        }
    }

    /// Only Chime pages stash embed markup inside document-level strings.
    pub fn rewrites_document_state(self) -> bool {
        matches!(self, Dialect::ChimeEmbed)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jmol" | "applet" => Ok(Self::JmolApplet),
            "chime" | "embed" => Ok(Self::ChimeEmbed),
            _ => Err(()),
        }
    }
}

pub(crate) fn starts_with_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle` at or after `from`.
pub(crate) fn find_ignore_ascii_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    let first = needle.first()?;
    let mut i = from;
    while i + needle.len() <= hay.len() {
        let rel = hay[i..].iter().position(|b| b.eq_ignore_ascii_case(first))?;
        i += rel;
        if starts_with_ignore_ascii_case(&hay[i..], needle) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Offsets of every marker occurrence that is followed by a tag-name boundary, so `<embed`
/// does not match `<embedded`.
pub(crate) fn marker_positions(text: &str, marker: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut from = 0usize;
    while let Some(pos) = find_ignore_ascii_case(text, marker, from) {
        let next = bytes.get(pos + marker.len()).copied();
        let at_boundary = match next {
            None => true,
            Some(b) => b.is_ascii_whitespace() || b == b'>' || b == b'/',
        };
        if at_boundary {
            out.push(pos);
        }
        from = pos + marker.len();
    }
    out
}

/// Picks the dialect a whole page should be converted with, if any.
///
/// Pages that already reference `JmolApplet` are only converted when they still use the old
/// `JmolAppletControl` buttons; anything else with an embed marker is treated as a Chime page.
pub fn detect_dialect(page: &str) -> Option<Dialect> {
    if page.contains("JmolApplet") {
        return page
            .contains("JmolAppletControl")
            .then_some(Dialect::JmolApplet);
    }
    if !marker_positions(page, Dialect::ChimeEmbed.marker()).is_empty() {
        return Some(Dialect::ChimeEmbed);
    }
    None
}

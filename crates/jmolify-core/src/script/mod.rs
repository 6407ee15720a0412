//! Source-dialect script commands -> Jmol script commands.
//!
//! Each dialect owns an ordered rule table ([`rules::rules_for`]). Behaviour that is not a plain
//! substitution (zoom rescaling, re-applying the baseline orientation after `reset`) runs as
//! explicit steps after the table.

pub mod chime;
pub mod rules;

use crate::control::Dimension;
use crate::dialect::Dialect;
use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

pub use chime::{ChimeFlag, chime_flag, display_mode_commands, embed_setup_commands};
pub use rules::rules_for;

/// One ordered textual transformation from a source dialect to the target dialect.
#[derive(Debug, Clone)]
pub struct ScriptDialectRule {
    pub pattern: Regex,
    pub replacement: &'static str,
    /// Maximum number of matches rewritten; `0` rewrites all of them.
    pub limit: usize,
}

impl ScriptDialectRule {
    pub fn all(pattern: &str, replacement: &'static str) -> Self {
        Self::with_limit(pattern, replacement, 0)
    }

    pub fn first(pattern: &str, replacement: &'static str) -> Self {
        Self::with_limit(pattern, replacement, 1)
    }

    fn with_limit(pattern: &str, replacement: &'static str, limit: usize) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid rule regex"),
            replacement,
            limit,
        }
    }

    pub fn apply<'a>(&self, script: &'a str) -> Cow<'a, str> {
        self.pattern
            .replacen(script, self.limit, NoExpand(self.replacement))
    }
}

/// Values derived from the surrounding tag that influence a script rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptContext<'a> {
    /// Legacy viewer width in pixels; `Some` only when a zoom conversion is possible.
    pub zoom_pixel_width: Option<u32>,
    /// `;`-terminated orientation script re-applied after every `reset`.
    pub orientation_prefix: &'a str,
}

fn zoom_command_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bzoom\s+([+-]?\d+(?:\.\d+)?)").expect("valid regex"))
}

fn reset_word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\breset\b").expect("valid regex"))
}

/// Width used to rescale a numeric `zoom` command.
///
/// Present only when the viewer width was given in pixels and the script actually zooms;
/// percentage widths never trigger rescaling.
pub fn derive_zoom_width(width: &Dimension, script: Option<&str>) -> Option<u32> {
    let pixels = width.pixels().filter(|w| *w > 0)?;
    let script = script?;
    zoom_command_regex().is_match(script).then_some(pixels)
}

/// Rescales the first numeric `zoom` command: Chime zoom is relative to the viewer size while
/// the target's zoom is a percentage.
pub fn rescale_zoom(script: &str, pixel_width: u32) -> Cow<'_, str> {
    if pixel_width == 0 {
        return Cow::Borrowed(script);
    }
    let Some(caps) = zoom_command_regex().captures(script) else {
        return Cow::Borrowed(script);
    };
    let Some(whole) = caps.get(0) else {
        return Cow::Borrowed(script);
    };
    let Ok(z) = caps[1].parse::<f64>() else {
        return Cow::Borrowed(script);
    };
    let scaled = (z / f64::from(pixel_width) * 100.0).round() as i64;
    Cow::Owned(format!(
        "{}zoom {scaled}{}",
        &script[..whole.start()],
        &script[whole.end()..]
    ))
}

/// Appends `orientation` after every `reset` that stands as a whole command (at the start of
/// the script or after a `;`). Text mentioning reset inside another command is left alone.
fn reapply_orientation_after_reset<'a>(script: &'a str, orientation: &str) -> Cow<'a, str> {
    if orientation.is_empty() || !reset_word_regex().is_match(script) {
        return Cow::Borrowed(script);
    }
    let mut out = String::with_capacity(script.len() + orientation.len());
    let mut changed = false;
    for command in script.split_inclusive(';') {
        let body = command.strip_suffix(';').unwrap_or(command);
        if body.trim().eq_ignore_ascii_case("reset") {
            let indent = &body[..body.len() - body.trim_start().len()];
            out.push_str(indent);
            out.push_str("reset;");
            out.push_str(orientation);
            changed = true;
        } else {
            out.push_str(command);
        }
    }
    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(script)
    }
}

/// Translates one command string from `dialect` into the target dialect.
///
/// Deterministic and side-effect free: the same inputs always produce the same output.
pub fn rewrite_script(dialect: Dialect, command: &str, context: &ScriptContext<'_>) -> String {
    let mut script = command.to_string();
    for rule in rules_for(dialect) {
        if let Cow::Owned(next) = rule.apply(&script) {
            script = next;
        }
    }

    if dialect == Dialect::ChimeEmbed {
        // Zoom first, so a zoom inside the orientation prefix keeps its value.
        if let Some(width) = context.zoom_pixel_width {
            if let Cow::Owned(next) = rescale_zoom(&script, width) {
                script = next;
            }
        }
        if let Cow::Owned(next) = reapply_orientation_after_reset(&script, context.orientation_prefix)
        {
            script = next;
        }
    }

    script
}

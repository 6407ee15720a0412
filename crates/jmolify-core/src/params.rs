//! Folds `<param name=X value=Y>` children into inline attribute syntax.
//!
//! Object/applet markup carries most of its configuration in `<param>` children while the
//! embed dialect uses inline attributes only. Rewriting the params into `X="Y"` pairs lets one
//! tokenizer ([`crate::attributes::tokenize_attributes`]) serve both.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

fn param_name_first_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?is)<param\s+name\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)\s+value\s*=\s*("[^"]*"|'[^']*'|[^\s>]*)\s*/?>"#,
        )
        .expect("valid regex")
    })
}

fn param_value_first_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?is)<param\s+value\s*=\s*("[^"]*"|'[^']*'|[^\s>]*)\s+name\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)\s*/?>"#,
        )
        .expect("valid regex")
    })
}

fn param_close_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</param\s*>").expect("valid regex"))
}

fn unquote(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        return &raw[1..raw.len() - 1];
    }
    raw
}

/// Re-quotes a param value with whichever quote character it does not contain.
fn as_attribute(name: &str, value: &str) -> String {
    let name = unquote(name);
    let value = unquote(value);
    if value.contains('"') {
        format!(" {name}='{value}' ")
    } else {
        format!(" {name}=\"{value}\" ")
    }
}

/// Replaces `/>` and `>` that sit outside quoted values with a space.
fn strip_bare_tag_ends(text: &str) -> Cow<'_, str> {
    if !text.contains('>') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                quote = None;
                out.push(c);
            }
            (Some(_), c) => out.push(c),
            // Only a quote that opens a value (`="...`) starts a quoted run.
            (None, c @ ('"' | '\'')) if out.ends_with('=') => {
                quote = Some(c);
                out.push(c);
            }
            (None, '/') if chars.peek() == Some(&'>') => {
                chars.next();
                out.push(' ');
            }
            (None, '>') => out.push(' '),
            (None, c) => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Rewrites `<param>` children into inline `name="value"` pairs and strips leftover tag
/// punctuation. Text without any `<param` is returned borrowed apart from bare `>` removal,
/// which makes the function idempotent.
pub fn normalize_params(tag: &str) -> Cow<'_, str> {
    let has_params = tag
        .as_bytes()
        .windows(6)
        .any(|w| w.eq_ignore_ascii_case(b"<param"));
    if !has_params {
        return strip_bare_tag_ends(tag);
    }

    let s = param_name_first_regex().replace_all(tag, |caps: &Captures| {
        as_attribute(&caps[1], &caps[2])
    });
    let s = param_value_first_regex().replace_all(&s, |caps: &Captures| {
        as_attribute(&caps[2], &caps[1])
    });
    let s = param_close_regex().replace_all(&s, " ");
    Cow::Owned(strip_bare_tag_ends(&s).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::tokenize_attributes;

    #[test]
    fn folds_params_into_attributes() {
        let tag = r#" code="JmolApplet" width="300" height="300">
  <param name="progressbar" value="true">
  <param name="load" value="caffeine.xyz" />
  <param name='script' value='spacefill off; wireframe 0.2'>
"#;
        let attrs = tokenize_attributes(&normalize_params(tag));
        assert_eq!(attrs.get("code"), Some("JmolApplet"));
        assert_eq!(attrs.get("width"), Some("300"));
        assert_eq!(attrs.get("progressbar"), Some("true"));
        assert_eq!(attrs.get("load"), Some("caffeine.xyz"));
        assert_eq!(attrs.get("script"), Some("spacefill off; wireframe 0.2"));
    }

    #[test]
    fn accepts_value_before_name_and_unquoted_params() {
        let tag = r#" code=JmolAppletControl><param value="spin on" name=script><PARAM NAME=target VALUE=main>"#;
        let attrs = tokenize_attributes(&normalize_params(tag));
        assert_eq!(attrs.get("script"), Some("spin on"));
        assert_eq!(attrs.get("target"), Some("main"));
    }

    #[test]
    fn value_containing_double_quotes_keeps_its_content() {
        let tag = r#"><param name="script" value='load "a.pdb"; cartoons on'>"#;
        let attrs = tokenize_attributes(&normalize_params(tag));
        assert_eq!(attrs.get("script"), Some(r#"load "a.pdb"; cartoons on"#));
    }

    #[test]
    fn keeps_angle_brackets_inside_quoted_values() {
        let tag = r#" script="select atomno>5; color red">"#;
        let normalized = normalize_params(tag);
        assert!(normalized.contains("atomno>5"));
        assert!(!normalized.trim_end().ends_with('>'));
    }

    #[test]
    fn is_idempotent_without_params() {
        let tag = r#" src="a.mol" width=200 button=push"#;
        assert!(matches!(normalize_params(tag), Cow::Borrowed(_)));
        let once = normalize_params(r#" code="JmolApplet" width=12>"#).into_owned();
        let twice = normalize_params(&once).into_owned();
        assert_eq!(once, twice);
    }
}

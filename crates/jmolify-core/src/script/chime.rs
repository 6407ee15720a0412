//! Commands derived from Chime `<embed>` attributes (`display3d`, `spinx`, `startanim`, ...).

use crate::attributes::AttributeMap;

/// Chime draws wireframe by default while Jmol draws ball-and-stick.
pub const CHIME_BASELINE: &str = "spacefill off;wireframe on;";

/// Interpretation of a legacy yes/no attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChimeFlag {
    True,
    False,
    /// Missing or not a recognized truthy/falsy token.
    Unset,
}

pub fn chime_flag(value: Option<&str>) -> ChimeFlag {
    let Some(value) = value else {
        return ChimeFlag::Unset;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "1" => ChimeFlag::True,
        "no" | "false" | "off" | "0" => ChimeFlag::False,
        _ => ChimeFlag::Unset,
    }
}

/// Command sequence for a `display3d` value; unknown modes contribute nothing.
pub fn display_mode_commands(mode: &str) -> Option<&'static str> {
    let commands = match mode.trim().to_ascii_lowercase().as_str() {
        "spacefill" => "spacefill on;wireframe off;",
        "sticks" => "spacefill off;wireframe 0.15;",
        "wireframe" => "spacefill on;wireframe on;",
        "ball&stick" | "ball&amp;stick" => "spacefill 30%;wireframe 0.15;",
        "cartoons" => "spacefill off;wireframe off;cartoons on;",
        "ribbons" => "spacefill off;wireframe off;ribbons on;",
        "strands" => "spacefill off;wireframe off;strands on;",
        _ => return None,
    };
    Some(commands)
}

/// `color3d` = chain|cpk|group|monochrome|shapely|structure|temperature|user
fn color_scheme_command(value: &str) -> String {
    let scheme = match value.trim() {
        "monochrome" | "user" => "white",
        other => other,
    };
    format!("color {scheme};")
}

fn background_command(value: &str) -> String {
    let value = value.trim();
    match value.strip_prefix('#') {
        Some(hex) => format!("color background [x{hex}];"),
        None => format!("color background {value};"),
    }
}

/// Setting any spin axis in Chime cancels its implicit `0 10 0` spin; the target keeps its own
/// default, so all three axes are zeroed first.
fn spin_commands(attrs: &AttributeMap, out: &mut String) {
    let axes = [("spinx", "spinX"), ("spiny", "spinY"), ("spinz", "spinZ")];
    if !axes.iter().any(|(attr, _)| attrs.non_empty(attr).is_some()) {
        return;
    }
    out.push_str("set spinX 0; set spinY 0; set spinZ 0;");
    for (attr, setting) in axes {
        if let Some(v) = attrs.non_empty(attr) {
            out.push_str(&format!("set {setting} {v};"));
        }
    }
}

fn flag_commands(value: Option<&str>, on: &str, off: &str, out: &mut String) {
    match chime_flag(value) {
        ChimeFlag::True => out.push_str(on),
        ChimeFlag::False => out.push_str(off),
        ChimeFlag::Unset => {}
    }
}

/// Baseline plus every attribute-derived command for a Chime viewer, in Chime's
/// application order.
pub fn embed_setup_commands(attrs: &AttributeMap) -> String {
    let mut s = String::from(CHIME_BASELINE);

    if chime_flag(attrs.get("frank")) == ChimeFlag::False {
        s.push_str("frank off;");
    }
    if chime_flag(attrs.get("nomenus")) == ChimeFlag::True {
        s.push_str("set disablePopupMenu on;");
    }
    if let Some(commands) = attrs.non_empty("display3d").and_then(display_mode_commands) {
        s.push_str(commands);
    }
    if let Some(v) = attrs.non_empty("color3d") {
        s.push_str(&color_scheme_command(v));
    }
    if let Some(v) = attrs.non_empty("bgcolor") {
        s.push_str(&background_command(v));
    }

    spin_commands(attrs, &mut s);
    if let Some(v) = attrs.non_empty("spinfps") {
        s.push_str(&format!("set spinFps {v};"));
    }
    flag_commands(attrs.get("startspin"), "spin on;", "spin off;", &mut s);

    if let Some(v) = attrs.non_empty("hbonds").filter(|v| !v.eq_ignore_ascii_case("off")) {
        s.push_str(&format!("hbonds calculate; hbonds {v};"));
    }
    if let Some(v) = attrs.non_empty("ssbonds") {
        s.push_str(&format!("ssbonds {v};"));
    }
    if let Some(v) = attrs.non_empty("animmode") {
        s.push_str(&format!("animation mode {v};"));
    }
    if let Some(v) = attrs.non_empty("animfps") {
        s.push_str(&format!("animation fps {v};"));
    }
    flag_commands(
        attrs.get("startanim"),
        "animation on;",
        "animation off;",
        &mut s,
    );

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::tokenize_attributes;

    fn setup(tag: &str) -> String {
        embed_setup_commands(&tokenize_attributes(tag))
    }

    #[test]
    fn flags_are_case_insensitive_and_tri_state() {
        assert_eq!(chime_flag(Some("TRUE")), ChimeFlag::True);
        assert_eq!(chime_flag(Some("1")), ChimeFlag::True);
        assert_eq!(chime_flag(Some("Off")), ChimeFlag::False);
        assert_eq!(chime_flag(Some("nope")), ChimeFlag::Unset);
        assert_eq!(chime_flag(Some("")), ChimeFlag::Unset);
        assert_eq!(chime_flag(None), ChimeFlag::Unset);
    }

    #[test]
    fn display_modes_map_to_fixed_sequences() {
        assert_eq!(
            display_mode_commands("sticks"),
            Some("spacefill off;wireframe 0.15;")
        );
        assert_eq!(
            display_mode_commands("Ball&amp;Stick"),
            Some("spacefill 30%;wireframe 0.15;")
        );
        assert_eq!(
            display_mode_commands("wireframe"),
            Some("spacefill on;wireframe on;")
        );
        assert_eq!(display_mode_commands("unknownmode"), None);
    }

    #[test]
    fn unknown_display_mode_keeps_the_rest() {
        let s = setup(r##" src="a.pdb" display3d="unknownmode" bgcolor="#FF0000""##);
        assert_eq!(
            s,
            "spacefill off;wireframe on;color background [xFF0000];"
        );
    }

    #[test]
    fn startanim_truthy_and_unrecognized() {
        assert!(setup(r#" startanim="TRUE""#).ends_with("animation on;"));
        assert!(setup(r#" startanim="1""#).ends_with("animation on;"));
        assert!(setup(r#" startanim="false""#).ends_with("animation off;"));
        let neither = setup(r#" startanim="nope""#);
        assert!(!neither.contains("animation on;"));
        assert!(!neither.contains("animation off;"));
    }

    #[test]
    fn any_spin_axis_zeroes_all_three_first() {
        let s = setup(" spiny=5 startspin=yes");
        assert_eq!(
            s,
            "spacefill off;wireframe on;set spinX 0; set spinY 0; set spinZ 0;set spinY 5;spin on;"
        );
        assert!(!setup(" startspin=yes").contains("set spinX 0"));
    }

    #[test]
    fn hbonds_off_is_skipped() {
        assert!(!setup(" hbonds=off").contains("hbonds"));
        assert!(setup(" hbonds=on").ends_with("hbonds calculate; hbonds on;"));
    }

    #[test]
    fn frank_menus_and_colors() {
        let s = setup(" frank=no nomenus=yes color3d=monochrome display3d=sticks");
        assert_eq!(
            s,
            "spacefill off;wireframe on;frank off;set disablePopupMenu on;spacefill off;wireframe 0.15;color white;"
        );
    }
}

//! Classification and conversion of a single marker-tag occurrence.

use crate::attributes::AttributeMap;
use crate::config::{ConvertOptions, SIGNED_ARCHIVE, UNSIGNED_ARCHIVE};
use crate::control::{
    ControlKind, ControlRegistry, ControlSpec, Dimension, FailureCallback, PanelAssets,
    build_control, panel_id,
};
use crate::dialect::Dialect;
use crate::script::{ScriptContext, derive_zoom_width, embed_setup_commands, rewrite_script};
use crate::{Error, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OccurrenceKind {
    /// Old `JmolAppletControl` button applet.
    AppletControl,
    /// Chime viewer (`<embed src=...>`).
    EmbedApplet,
    /// Chime button (`<embed button=...>`).
    Button,
    /// `JmolApplet` viewer applet.
    PlainApplet,
}

/// One marker occurrence found while scanning a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOccurrence<'a> {
    /// Offset of the marker in the fragment.
    pub start: usize,
    /// End of the occurrence (after the terminator), or the end of its segment when no
    /// terminator was found.
    pub end: usize,
    /// Tag text between the marker and the terminator.
    pub text: &'a str,
    pub terminated: bool,
    pub kind: Option<OccurrenceKind>,
    pub attributes: AttributeMap,
}

/// Classifies a tag from its raw text and attributes; `None` means "leave it alone".
pub fn classify(dialect: Dialect, text: &str, attrs: &AttributeMap) -> Option<OccurrenceKind> {
    match dialect {
        Dialect::JmolApplet => {
            if text.contains("JmolAppletControl") {
                Some(OccurrenceKind::AppletControl)
            } else if text.contains("JmolApplet") {
                Some(OccurrenceKind::PlainApplet)
            } else {
                None
            }
        }
        Dialect::ChimeEmbed => {
            if attrs.contains("button") {
                Some(OccurrenceKind::Button)
            } else if attrs.contains("src") {
                Some(OccurrenceKind::EmbedApplet)
            } else {
                None
            }
        }
    }
}

fn describe(kind: OccurrenceKind, attrs: &AttributeMap) -> String {
    if let Some(name) = attrs.non_empty("name") {
        return panel_id(name);
    }
    match kind {
        OccurrenceKind::PlainApplet | OccurrenceKind::EmbedApplet => "a viewer".to_string(),
        OccurrenceKind::AppletControl | OccurrenceKind::Button => "a button".to_string(),
    }
}

fn check_script_budget(
    kind: OccurrenceKind,
    attrs: &AttributeMap,
    options: &ConvertOptions,
) -> Result<()> {
    let len = ["script", "altscript"]
        .iter()
        .filter_map(|name| attrs.get(name))
        .map(str::len)
        .sum::<usize>();
    if len > options.max_script_bytes {
        return Err(Error::OversizedScript {
            target: describe(kind, attrs),
            len,
            limit: options.max_script_bytes,
        });
    }
    Ok(())
}

/// Builds the replacement markup for one classified occurrence.
///
/// The only failure is an oversized script payload; the caller substitutes an operator-facing
/// message for it.
pub fn convert_occurrence(
    kind: OccurrenceKind,
    attrs: &AttributeMap,
    options: &ConvertOptions,
    registry: &mut ControlRegistry,
) -> Result<String> {
    check_script_budget(kind, attrs, options)?;
    let spec = match kind {
        OccurrenceKind::PlainApplet => jmol_applet(attrs, options, registry),
        OccurrenceKind::AppletControl => jmol_control(attrs, options, registry),
        OccurrenceKind::EmbedApplet => chime_viewer(attrs, options, registry),
        OccurrenceKind::Button => chime_button(attrs, options, registry),
    };
    Ok(build_control(&spec, options, registry))
}

fn jmol_archive(attrs: &AttributeMap, options: &ConvertOptions) -> String {
    let mut archive = attrs
        .non_empty("archive")
        .unwrap_or(UNSIGNED_ARCHIVE)
        .to_string();
    if archive == "JmolApplet.jar" {
        archive = UNSIGNED_ARCHIVE.to_string();
    }
    if options.signed && !archive.contains("Signed") {
        archive = SIGNED_ARCHIVE.to_string();
    }
    archive
}

fn jmol_applet(
    attrs: &AttributeMap,
    options: &ConvertOptions,
    registry: &mut ControlRegistry,
) -> ControlSpec {
    let script = rewrite_script(
        Dialect::JmolApplet,
        attrs.non_empty("script").unwrap_or_default(),
        &ScriptContext::default(),
    );
    let load = attrs
        .non_empty("load")
        .map(|file| format!("load \"{file}\";"))
        .unwrap_or_default();
    let command = format!("{load}{}{script}", options.script_prefix());

    let id = registry.register_panel(attrs.non_empty("name"));
    let mut spec = ControlSpec::new(ControlKind::Panel, id, command).with_size(
        Dimension::parse(attrs.non_empty("width"), 300),
        Dimension::parse(attrs.non_empty("height"), 300),
    );
    spec.assets = Some(PanelAssets {
        codebase: attrs
            .non_empty("codebase")
            .unwrap_or(options.base_path.as_str())
            .to_string(),
        archive: jmol_archive(attrs, options),
    });
    spec.failure_callback = Some(FailureCallback::new(options.error_callback.clone()));
    spec
}

fn jmol_control(
    attrs: &AttributeMap,
    options: &ConvertOptions,
    registry: &mut ControlRegistry,
) -> ControlSpec {
    let rewrite = |name: &str| {
        let script = rewrite_script(
            Dialect::JmolApplet,
            attrs.non_empty(name).unwrap_or_default(),
            &ScriptContext::default(),
        );
        format!("{}{script}", options.script_prefix())
    };
    let target = attrs
        .non_empty("target")
        .map(panel_id)
        .unwrap_or_else(|| registry.target());
    let size = (
        Dimension::parse(attrs.non_empty("width"), 12),
        Dimension::parse(attrs.non_empty("height"), 12),
    );

    if attrs.non_empty("altscript").is_some() {
        let mut spec = ControlSpec::new(ControlKind::Toggle, target, rewrite("script"))
            .with_size(size.0, size.1);
        spec.alt_command = Some(rewrite("altscript"));
        return spec;
    }
    ControlSpec::new(ControlKind::PushButton, target, rewrite("script")).with_size(size.0, size.1)
}

fn chime_viewer(
    attrs: &AttributeMap,
    options: &ConvertOptions,
    registry: &mut ControlRegistry,
) -> ControlSpec {
    let width = Dimension::parse(attrs.non_empty("width"), 300);
    let height = Dimension::parse(attrs.non_empty("height"), 300);
    let prefix = options.script_prefix();
    // Only a width actually written on the tag scales zoom; the panel default does not.
    let zoom_pixel_width = attrs
        .non_empty("width")
        .map(|w| Dimension::parse(Some(w), 0))
        .and_then(|w| derive_zoom_width(&w, attrs.non_empty("script")));
    let context = ScriptContext {
        zoom_pixel_width,
        orientation_prefix: &prefix,
    };
    let script = attrs
        .non_empty("script")
        .map(|s| rewrite_script(Dialect::ChimeEmbed, s, &context))
        .unwrap_or_default();
    let command = format!(
        "load \"{}\";{}{prefix}{script}",
        attrs.get("src").unwrap_or_default(),
        embed_setup_commands(attrs)
    );

    let id = registry.register_panel(attrs.non_empty("name"));
    let mut spec = ControlSpec::new(ControlKind::Panel, id, command).with_size(width, height);
    spec.failure_callback = Some(FailureCallback::new(options.error_callback.clone()));
    spec
}

fn chime_button(
    attrs: &AttributeMap,
    options: &ConvertOptions,
    registry: &mut ControlRegistry,
) -> ControlSpec {
    let prefix = options.script_prefix();
    let context = ScriptContext {
        zoom_pixel_width: None,
        orientation_prefix: &prefix,
    };
    let rewrite = |name: &str| {
        let script = attrs
            .non_empty(name)
            .map(|s| rewrite_script(Dialect::ChimeEmbed, s, &context))
            .unwrap_or_default();
        format!("{prefix}{script}")
    };

    // Like the plug-in, a target sticks for every later button on the page.
    if let Some(target) = attrs.non_empty("target") {
        registry.set_target(target);
    }

    let value = attrs.get("button").unwrap_or_default().trim().to_ascii_lowercase();
    let kind = ControlKind::from_button_value(&value);
    let mut spec = ControlSpec::new(kind, registry.target(), rewrite("script"));
    match kind {
        ControlKind::PushButton => {
            let height = Dimension::parse(attrs.non_empty("height"), 12);
            spec.font_size = Some(height.pixels().unwrap_or(12).saturating_sub(4));
        }
        ControlKind::Toggle => {
            spec.alt_command = Some(rewrite("altscript"));
        }
        ControlKind::Radio => {
            spec.group = Some(format!("Chime{value}"));
        }
        ControlKind::Link | ControlKind::Panel => {
            spec.label = "[x]".to_string();
        }
    }
    spec
}

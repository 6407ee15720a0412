//! Replacement markup for converted viewers and buttons.
//!
//! Generated controls carry their command in `data-*` attributes and hand it to the runtime's
//! command sink (`ConvertOptions::command_sink`) on click; nothing here touches the document.

use crate::config::ConvertOptions;
use htmlize::{escape_attribute, escape_text};
use regex::Regex;
use std::sync::OnceLock;

/// Runtime callbacks receive at most this many arguments.
pub const FAILURE_ARGS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Panel,
    PushButton,
    Toggle,
    Radio,
    Link,
}

impl ControlKind {
    /// Maps a Chime `button=` value (`push|pushed|followed|toggle|radio<N>`); anything else
    /// becomes a plain link.
    pub fn from_button_value(value: &str) -> Self {
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "push" | "pushed" | "followed" => ControlKind::PushButton,
            "toggle" => ControlKind::Toggle,
            v if v.contains("radio") => ControlKind::Radio,
            _ => ControlKind::Link,
        }
    }
}

fn percentage_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(?:\.\d+)?%$").expect("valid regex"))
}

/// A width or height as written on the legacy tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimension {
    Pixels(u32),
    /// Kept verbatim, e.g. `"100%"`.
    Percent(String),
}

impl Dimension {
    /// Plain percentages (`80%`, `12.5%`) are preserved; anything else is read like
    /// `parseInt` (leading digits), falling back to `default_px`.
    pub fn parse(raw: Option<&str>, default_px: u32) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Dimension::Pixels(default_px);
        };
        if percentage_regex().is_match(raw) {
            return Dimension::Percent(raw.to_string());
        }
        let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<u32>() {
            Ok(px) => Dimension::Pixels(px),
            Err(_) => Dimension::Pixels(default_px),
        }
    }

    pub fn pixels(&self) -> Option<u32> {
        match self {
            Dimension::Pixels(px) => Some(*px),
            Dimension::Percent(_) => None,
        }
    }

    pub fn css(&self) -> String {
        match self {
            Dimension::Pixels(px) => format!("{px}px"),
            Dimension::Percent(p) => p.clone(),
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Pixels(px) => write!(f, "{px}"),
            Dimension::Percent(p) => f.write_str(p),
        }
    }
}

pub type FailureHandler = fn(&[Option<&str>]) -> String;

/// Runtime failure hook attached to a panel.
///
/// `name` is what the generated markup registers with the runtime; `handler` is the typed
/// implementation, called directly instead of being looked up by name.
#[derive(Clone)]
pub struct FailureCallback {
    pub name: String,
    pub handler: FailureHandler,
}

impl std::fmt::Debug for FailureCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureCallback")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl FailureCallback {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: present_failure,
        }
    }

    /// Invokes the handler with at most [`FAILURE_ARGS`] arguments.
    pub fn invoke(&self, args: &[Option<&str>]) -> String {
        (self.handler)(&args[..args.len().min(FAILURE_ARGS)])
    }
}

/// Default failure presentation: every non-empty argument, separated by a blank line.
pub fn present_failure(args: &[Option<&str>]) -> String {
    args.iter()
        .take(FAILURE_ARGS)
        .flatten()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Where a panel loads its runtime from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelAssets {
    pub codebase: String,
    pub archive: String,
}

/// Everything needed to render one control.
#[derive(Debug, Clone)]
pub struct ControlSpec {
    pub kind: ControlKind,
    /// Panel id for panels; the panel the command is sent to for everything else.
    pub target: String,
    pub width: Dimension,
    pub height: Dimension,
    pub command: String,
    /// Off-state command of a toggle.
    pub alt_command: Option<String>,
    /// Radio group name.
    pub group: Option<String>,
    pub label: String,
    /// Chime push buttons scale their text to the old button height.
    pub font_size: Option<u32>,
    pub assets: Option<PanelAssets>,
    pub failure_callback: Option<FailureCallback>,
}

impl ControlSpec {
    pub fn new(kind: ControlKind, target: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            width: Dimension::Pixels(12),
            height: Dimension::Pixels(12),
            command: command.into(),
            alt_command: None,
            group: None,
            label: "X".to_string(),
            font_size: None,
            assets: None,
            failure_callback: None,
        }
    }

    pub fn with_size(mut self, width: Dimension, height: Dimension) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Per-page state shared by every control generated during one conversion.
#[derive(Debug, Default)]
pub struct ControlRegistry {
    panel_count: usize,
    control_count: usize,
    target: Option<String>,
    radio_groups: Vec<String>,
    uses_buttons: bool,
}

/// Element id of the panel named (or numbered) `suffix`.
pub fn panel_id(suffix: &str) -> String {
    if suffix.starts_with("jmolApplet") {
        suffix.to_string()
    } else {
        format!("jmolApplet{suffix}")
    }
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a panel id; unnamed panels are numbered in page order.
    pub fn register_panel(&mut self, name: Option<&str>) -> String {
        let index = self.panel_count;
        self.panel_count += 1;
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => panel_id(name),
            None => panel_id(&index.to_string()),
        }
    }

    /// Sets the panel later controls send commands to.
    pub fn set_target(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.target = Some(panel_id(name));
        }
    }

    pub fn target(&self) -> String {
        self.target.clone().unwrap_or_else(|| panel_id("0"))
    }

    pub fn panel_count(&self) -> usize {
        self.panel_count
    }

    pub fn control_count(&self) -> usize {
        self.control_count
    }

    pub fn radio_groups(&self) -> &[String] {
        &self.radio_groups
    }

    fn next_control_id(&mut self, kind: ControlKind) -> String {
        let index = self.control_count;
        self.control_count += 1;
        self.uses_buttons = true;
        let prefix = match kind {
            ControlKind::Panel => "jmolPanel",
            ControlKind::PushButton => "jmolButton",
            ControlKind::Toggle => "jmolCheckbox",
            ControlKind::Radio => "jmolRadio",
            ControlKind::Link => "jmolLink",
        };
        format!("{prefix}{index}")
    }

    fn note_radio_group(&mut self, group: &str) {
        if !self.radio_groups.iter().any(|g| g == group) {
            self.radio_groups.push(group.to_string());
        }
    }

    /// The `<style>` block generated buttons rely on, once any button was built.
    pub fn stylesheet(&self, options: &ConvertOptions) -> Option<String> {
        self.uses_buttons.then(|| {
            format!(
                "<style type=\"text/css\"> .{} {{ background-color:#C0C0C0; border:1px outset #C0C0C0; padding:0; font:inherit; }} </style>",
                options.button_class
            )
        })
    }
}

fn click_handler(options: &ConvertOptions, command_expr: &str) -> String {
    format!(
        "{}({command_expr}, this.dataset.target)",
        options.command_sink
    )
}

/// Renders `spec` as replacement markup.
pub fn build_control(
    spec: &ControlSpec,
    options: &ConvertOptions,
    registry: &mut ControlRegistry,
) -> String {
    match spec.kind {
        ControlKind::Panel => build_panel(spec, options),
        ControlKind::PushButton => {
            let id = registry.next_control_id(spec.kind);
            let button = format!(
                "<input type=\"button\" id=\"{id}\" class=\"{}\" value=\"{}\" data-target=\"{}\" data-script=\"{}\" onclick=\"{}\" />",
                escape_attribute(&options.button_class),
                escape_attribute(&spec.label),
                escape_attribute(&spec.target),
                escape_attribute(&spec.command),
                escape_attribute(&click_handler(options, "this.dataset.script")),
            );
            match spec.font_size {
                Some(px) => format!("<span style=\"font-size:{px}px;\">{button}</span>"),
                None => format!(
                    "<span style=\"display:inline-block;width:{};height:{};\">{button}</span>",
                    spec.width.css(),
                    spec.height.css()
                ),
            }
        }
        ControlKind::Toggle => {
            let id = registry.next_control_id(spec.kind);
            let alt = spec.alt_command.as_deref().unwrap_or_default();
            format!(
                "<input type=\"checkbox\" id=\"{id}\" class=\"{}\" style=\"width:{};\" data-target=\"{}\" data-script=\"{}\" data-alt-script=\"{}\" onclick=\"{}\" />",
                escape_attribute(&options.button_class),
                spec.width.css(),
                escape_attribute(&spec.target),
                escape_attribute(&spec.command),
                escape_attribute(alt),
                escape_attribute(&click_handler(
                    options,
                    "this.checked ? this.dataset.script : this.dataset.altScript"
                )),
            )
        }
        ControlKind::Radio => {
            let id = registry.next_control_id(spec.kind);
            let group = spec.group.as_deref().unwrap_or("jmolRadioGroup");
            registry.note_radio_group(group);
            format!(
                "<input type=\"radio\" id=\"{id}\" name=\"{}\" class=\"{}\" data-target=\"{}\" data-script=\"{}\" onclick=\"{}\" />",
                escape_attribute(group),
                escape_attribute(&options.button_class),
                escape_attribute(&spec.target),
                escape_attribute(&spec.command),
                escape_attribute(&click_handler(options, "this.dataset.script")),
            )
        }
        ControlKind::Link => {
            let id = registry.next_control_id(spec.kind);
            format!(
                "<a href=\"javascript:void(0)\" id=\"{id}\" data-target=\"{}\" data-script=\"{}\" onclick=\"{}; return false;\">{}</a>",
                escape_attribute(&spec.target),
                escape_attribute(&spec.command),
                escape_attribute(&click_handler(options, "this.dataset.script")),
                escape_text(&spec.label),
            )
        }
    }
}

fn build_panel(spec: &ControlSpec, options: &ConvertOptions) -> String {
    let (codebase, archive) = match &spec.assets {
        Some(assets) => (assets.codebase.as_str(), assets.archive.as_str()),
        None => (options.base_path.as_str(), options.archive()),
    };
    let callback = spec
        .failure_callback
        .as_ref()
        .map(|cb| cb.name.as_str())
        .unwrap_or(options.error_callback.as_str());
    format!(
        "<div id=\"{}\" class=\"jmol-panel\" style=\"width:{};height:{};\" data-codebase=\"{}\" data-archive=\"{}\" data-script=\"{}\" data-error-callback=\"{}\"></div>",
        escape_attribute(&spec.target),
        spec.width.css(),
        spec.height.css(),
        escape_attribute(codebase),
        escape_attribute(archive),
        escape_attribute(&spec.command),
        escape_attribute(callback),
    )
}

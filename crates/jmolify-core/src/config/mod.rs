use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_PATH: &str = "./Jmol";
pub const UNSIGNED_ARCHIVE: &str = "JmolApplet0.jar";
pub const SIGNED_ARCHIVE: &str = "JmolAppletSigned0.jar";

/// Page conversion settings.
///
/// Every field has a default, so a configuration file only needs the keys it changes:
///
/// ```
/// use jmolify_core::ConvertOptions;
///
/// let options = ConvertOptions::from_json_str(r#"{ "signed": true, "defaultScriptPrefix": "reset;" }"#)?;
/// assert_eq!(options.archive(), "JmolAppletSigned0.jar");
/// assert_eq!(options.base_path, "./Jmol");
/// # Ok::<(), jmolify_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Directory generated panels load their runtime assets from.
    pub base_path: String,
    /// Use the signed asset variant (needed for local `file:` pages).
    pub signed: bool,
    /// Script placed ahead of every rewritten page script, typically a baseline orientation.
    pub default_script_prefix: String,
    /// Script payloads above this many bytes are not converted.
    pub max_script_bytes: usize,
    /// Name of the runtime function generated controls send commands to.
    pub command_sink: String,
    /// Name of the callback panels report runtime failures through.
    pub error_callback: String,
    /// CSS class given to generated buttons.
    pub button_class: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            signed: false,
            default_script_prefix: String::new(),
            max_script_bytes: 32 * 1024,
            command_sink: "jmolScript".to_string(),
            error_callback: "jmolScriptError".to_string(),
            button_class: "JmolChimeButton".to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // An empty YAML document deserializes as `null`; treat it as "all defaults".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn with_default_script_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_script_prefix = prefix.into();
        self
    }

    pub fn with_max_script_bytes(mut self, limit: usize) -> Self {
        self.max_script_bytes = limit;
        self
    }

    /// Applet archive matching the signed flag.
    pub fn archive(&self) -> &'static str {
        if self.signed {
            SIGNED_ARCHIVE
        } else {
            UNSIGNED_ARCHIVE
        }
    }

    /// The default prefix as a complete command (`;`-terminated), or `""` when unset.
    pub fn script_prefix(&self) -> String {
        let prefix = self.default_script_prefix.trim();
        if prefix.is_empty() || prefix.ends_with(';') {
            prefix.to_string()
        } else {
            format!("{prefix};")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let options = ConvertOptions::from_json_str(r#"{ "basePath": "/static/jmol" }"#).unwrap();
        assert_eq!(options.base_path, "/static/jmol");
        assert_eq!(options.command_sink, "jmolScript");
        assert_eq!(options.archive(), UNSIGNED_ARCHIVE);
    }

    #[test]
    fn yaml_config_is_accepted() {
        let options =
            ConvertOptions::from_yaml_str("signed: true\ndefaultScriptPrefix: rotate x 180\n")
                .unwrap();
        assert!(options.signed);
        assert_eq!(options.script_prefix(), "rotate x 180;");
        assert_eq!(ConvertOptions::from_yaml_str("").unwrap(), ConvertOptions::default());
    }

    #[test]
    fn malformed_config_is_reported() {
        let err = ConvertOptions::from_json_str("{ signed: ").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert!(err.to_string().starts_with("Invalid configuration: "));
    }
}

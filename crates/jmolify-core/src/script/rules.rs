use super::ScriptDialectRule;
use crate::dialect::Dialect;
use std::sync::OnceLock;

/// Ordered rule table for `dialect`. The tables look alike but are not interchangeable.
pub fn rules_for(dialect: Dialect) -> &'static [ScriptDialectRule] {
    match dialect {
        Dialect::JmolApplet => jmol_rules(),
        Dialect::ChimeEmbed => chime_rules(),
    }
}

fn chime_rules() -> &'static [ScriptDialectRule] {
    static RULES: OnceLock<Vec<ScriptDialectRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            // Angle brackets in scripts arrive entity-encoded from the rendered page.
            ScriptDialectRule::all("&gt;", ">"),
            ScriptDialectRule::all("&lt;", "<"),
            // Must come after the other entities so `&amp;gt;` stays `&gt;`.
            ScriptDialectRule::all("&amp;", "&"),
            // Chime computes hydrogen bonds on demand; Jmol needs an explicit calculation.
            ScriptDialectRule::first("hbonds ", "hbonds calculate;hbonds "),
        ]
    })
}

fn jmol_rules() -> &'static [ScriptDialectRule] {
    static RULES: OnceLock<Vec<ScriptDialectRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            ScriptDialectRule::all("&gt;", ">"),
            ScriptDialectRule::all("&lt;", "<"),
            ScriptDialectRule::all("&quot;", "\""),
            ScriptDialectRule::all("&amp;", "&"),
        ]
    })
}

use jmolify_core::{Converter, ConvertOptions, Dialect};
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

fn fixtures_root() -> PathBuf {
    workspace_root().join("fixtures")
}

fn list_fixture_pages(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if path.extension().is_some_and(|e| e == "html") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

/// (fixture stem, dialect, converted, passed through)
const EXPECTED: &[(&str, Dialect, usize, usize)] = &[
    ("caffeine", Dialect::ChimeEmbed, 5, 0),
    ("mixed-media", Dialect::ChimeEmbed, 1, 2),
    ("crambin", Dialect::JmolApplet, 3, 1),
];

fn marker_count(text: &str, dialect: Dialect) -> usize {
    text.to_ascii_lowercase().matches(dialect.marker()).count()
}

#[test]
fn fixtures_convert_with_expected_counts() {
    let pages = list_fixture_pages(&fixtures_root());
    assert!(
        !pages.is_empty(),
        "no fixtures found under {}",
        fixtures_root().display()
    );

    let converter = Converter::new()
        .with_options(ConvertOptions::default().with_default_script_prefix("rotate x 180"));
    for path in pages {
        let text = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let Some(&(_, dialect, converted, passed_through)) =
            EXPECTED.iter().find(|(name, ..)| *name == stem)
        else {
            panic!("no expectation for fixture {}", path.display());
        };

        let out = converter.convert_page(&text);
        assert_eq!(out.dialect, Some(dialect), "{}", path.display());
        assert_eq!(out.converted, converted, "{}", path.display());
        assert_eq!(out.passed_through, passed_through, "{}", path.display());
        assert!(out.diagnostics.is_empty(), "{}", path.display());
        assert_eq!(
            marker_count(&out.text, dialect),
            passed_through,
            "{}: only passed-through tags may keep the marker",
            path.display()
        );

        let again = converter.convert_page(&out.text);
        assert_eq!(again.converted, 0, "{}", path.display());
        assert_eq!(again.text, out.text, "{}: second pass changed the page", path.display());
    }
}

#[test]
fn chime_fixture_keeps_radio_group_and_target() {
    let text = std::fs::read_to_string(fixtures_root().join("chime").join("caffeine.html"))
        .expect("fixture");
    let out = Converter::new().convert_page(&text);
    assert_eq!(out.text.matches("name=\"Chimeradio1\"").count(), 2);
    assert!(out.text.contains("<div id=\"jmolAppletcaffeine\""));
    assert_eq!(out.text.matches("data-target=\"jmolAppletcaffeine\"").count(), 4);
    assert!(out.text.contains("spacefill 30%;wireframe 0.15;"));
    assert!(out.text.contains("color background [x000000];"));
    assert!(out.text.contains("zoom 50;"));
    assert!(out.stylesheet.is_some());
}

#[test]
fn jmol_fixture_keeps_foreign_applets() {
    let text = std::fs::read_to_string(fixtures_root().join("jmol").join("crambin.html"))
        .expect("fixture");
    let out = Converter::new().convert_page(&text);
    assert!(out.text.contains(r#"<applet code="Clock.class" width="80" height="20"></applet>"#));
    assert!(out.text.contains("data-script=\"load &quot;1crn.pdb&quot;;cartoons on; color structure\""));
    assert!(out.text.contains("data-script=\"select *; spacefill 100%\""));
}

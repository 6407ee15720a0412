use crate::*;

const PAGE: &str = r#"<h1>Crambin</h1>
<applet code="JmolApplet" archive="JmolApplet.jar" codebase="../jmol" width=400 height=400 name="main">
  <param name="load" value="1crn.pdb">
  <param name="script" value="select *; cartoons on">
</applet>
<applet code="JmolAppletControl" width=40 height=20>
  <param name="target" value="main">
  <param name="script" value="spin on">
  <param name="altscript" value="spin off">
</applet>
<p>done</p>"#;

#[test]
fn applet_page_converts_viewer_and_control() {
    let out = Converter::new().convert_page(PAGE);
    assert_eq!(out.dialect, Some(Dialect::JmolApplet));
    assert_eq!(out.converted, 2);
    assert!(!out.text.to_ascii_lowercase().contains("<applet"));
    assert!(!out.text.to_ascii_lowercase().contains("</applet>"));
    assert!(out.text.starts_with("<h1>Crambin</h1>\n<div id=\"jmolAppletmain\""));
    assert!(out.text.ends_with("\n<p>done</p>"));

    assert!(out.text.contains("data-codebase=\"../jmol\""));
    assert!(out.text.contains("data-archive=\"JmolApplet0.jar\""));
    assert!(out.text.contains("style=\"width:400px;height:400px;\""));
    assert!(out.text.contains("data-script=\"load &quot;1crn.pdb&quot;;select *; cartoons on\""));

    assert!(out.text.contains("type=\"checkbox\""));
    assert!(out.text.contains("data-target=\"jmolAppletmain\""));
    assert!(out.text.contains("data-alt-script=\"spin off\""));
    assert!(out.text.contains("style=\"width:40px;\""));
}

#[test]
fn signed_option_switches_archive() {
    let converter = Converter::new().with_options(ConvertOptions::default().with_signed(true));
    let out = converter.convert_page(PAGE);
    assert!(out.text.contains("data-archive=\"JmolAppletSigned0.jar\""));
}

#[test]
fn prefix_precedes_each_script() {
    let converter = Converter::new()
        .with_options(ConvertOptions::default().with_default_script_prefix("set antialiasDisplay"));
    let out = converter.convert_page(PAGE);
    assert!(out.text.contains(
        "data-script=\"load &quot;1crn.pdb&quot;;set antialiasDisplay;select *; cartoons on\""
    ));
    assert!(out.text.contains("data-script=\"set antialiasDisplay;spin on\""));
    assert!(out.text.contains("data-alt-script=\"set antialiasDisplay;spin off\""));
}

#[test]
fn viewer_only_page_is_not_detected_but_converts_when_forced() {
    let page = r#"<applet code="JmolApplet" width=200 height=200><param name="load" value="a.pdb"></applet>"#;
    let converter = Converter::new();

    let detected = converter.convert_page(page);
    assert_eq!(detected.dialect, None);
    assert_eq!(detected.text, page);

    let forced = converter.convert_fragment(page, Dialect::JmolApplet);
    assert_eq!(forced.converted, 1);
    assert!(forced.text.starts_with("<div id=\"jmolApplet0\""));
    assert!(forced.text.contains("data-codebase=\"./Jmol\""));
}

#[test]
fn non_jmol_applets_are_kept() {
    let page = r#"<applet code="Clock.class" width=50></applet><applet code="JmolAppletControl"><param name="script" value="spin on"></applet>"#;
    let out = Converter::new().convert_page(page);
    assert_eq!(out.passed_through, 1);
    assert_eq!(out.converted, 1);
    assert!(out.text.starts_with(r#"<applet code="Clock.class" width=50></applet>"#));
}

#[test]
fn missing_closing_tag_is_passed_through() {
    let page = r#"<applet code="JmolAppletControl"><param name="script" value="spin on">"#;
    let out = Converter::new().convert_page(page);
    assert_eq!(out.dialect, Some(Dialect::JmolApplet));
    assert_eq!(out.passed_through, 1);
    assert_eq!(out.text, page);
}

#[test]
fn second_pass_leaves_output_alone() {
    let converter = Converter::new();
    let first = converter.convert_page(PAGE);
    let second = converter.convert_page(&first.text);
    assert_eq!(second.dialect, None);
    assert_eq!(second.text, first.text);
}

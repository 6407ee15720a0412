use indexmap::IndexMap;
use jmolify_core::{
    ConvertOptions, Converter, Diagnostic, Dialect, InMemoryDocument, PageConversion, StatePatch,
    detect_dialect,
};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Jmolify(jmolify_core::Error),
    Json(serde_json::Error),
    NothingToConvert,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Jmolify(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::NothingToConvert => write!(f, "No Chime or Jmol applet markup detected"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<jmolify_core::Error> for CliError {
    fn from(value: jmolify_core::Error) -> Self {
        Self::Jmolify(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Convert,
    Detect,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    base_path: Option<String>,
    signed: bool,
    prefix: Option<String>,
    dialect: Option<Dialect>,
    state: Option<String>,
    report: bool,
    pretty: bool,
    out: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportOut<'a> {
    dialect: Option<Dialect>,
    converted: usize,
    passed_through: usize,
    stylesheet_required: bool,
    patches: &'a [StatePatch],
    diagnostics: &'a [Diagnostic],
}

fn usage() -> &'static str {
    "jmolify-cli\n\
\n\
USAGE:\n\
  jmolify-cli [convert] [--config <file>] [--base-path <p>] [--signed] [--prefix <script>] [--dialect jmol|chime] [--state <json>] [--report] [--pretty] [--out <path>] [<path>|-]\n\
  jmolify-cli detect [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - --config reads ConvertOptions from JSON, or YAML for .yaml/.yml files; flags override it.\n\
  - convert prints the converted page, with the button stylesheet in front when one is needed.\n\
  - --state names a JSON object of string fields to sweep for embedded Chime markup; the\n\
    resulting patches are listed by --report.\n\
  - --report prints a JSON summary (dialect, counts, patches, diagnostics) instead of the page.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "convert" => args.command = Command::Convert,
            "detect" => args.command = Command::Detect,
            "--signed" => args.signed = true,
            "--report" => args.report = true,
            "--pretty" => args.pretty = true,
            "--config" | "--base-path" | "--prefix" | "--state" | "--out" => {
                let Some(value) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let slot = match a.as_str() {
                    "--config" => &mut args.config,
                    "--base-path" => &mut args.base_path,
                    "--prefix" => &mut args.prefix,
                    "--state" => &mut args.state,
                    _ => &mut args.out,
                };
                *slot = Some(value.clone());
            }
            "--dialect" => {
                let Some(dialect) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.dialect = Some(
                    dialect
                        .parse::<Dialect>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn load_options(args: &Args) -> Result<ConvertOptions, CliError> {
    let mut options = match args.config.as_deref() {
        None => ConvertOptions::default(),
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let is_yaml = Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
            if is_yaml {
                ConvertOptions::from_yaml_str(&text)?
            } else {
                ConvertOptions::from_json_str(&text)?
            }
        }
    };
    if let Some(base_path) = &args.base_path {
        options = options.with_base_path(base_path.clone());
    }
    if args.signed {
        options = options.with_signed(true);
    }
    if let Some(prefix) = &args.prefix {
        options = options.with_default_script_prefix(prefix.clone());
    }
    Ok(options)
}

fn load_state(path: &str) -> Result<IndexMap<String, String>, CliError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    write_text(&format!("{text}\n"), out)
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn convert(args: &Args, page: String) -> Result<PageConversion, CliError> {
    let converter = Converter::new().with_options(load_options(args)?);
    let conversion = match &args.state {
        Some(path) => {
            let mut document = InMemoryDocument {
                body: page,
                state: load_state(path)?,
            };
            converter.convert_document(&mut document, args.dialect)
        }
        None => match args.dialect {
            Some(dialect) => converter.convert_fragment(&page, dialect),
            None => converter.convert_page(&page),
        },
    };
    Ok(conversion)
}

fn run(args: Args) -> Result<(), CliError> {
    let page = read_input(args.input.as_deref())?;

    match args.command {
        Command::Detect => {
            let dialect = detect_dialect(&page).ok_or(CliError::NothingToConvert)?;
            println!("{dialect}");
            Ok(())
        }
        Command::Convert => {
            let conversion = convert(&args, page)?;
            for diagnostic in &conversion.diagnostics {
                eprintln!("warning: {}", diagnostic.message);
            }
            if args.report {
                let report = ReportOut {
                    dialect: conversion.dialect,
                    converted: conversion.converted,
                    passed_through: conversion.passed_through,
                    stylesheet_required: conversion.stylesheet.is_some(),
                    patches: &conversion.patches,
                    diagnostics: &conversion.diagnostics,
                };
                return write_json(&report, args.pretty, args.out.as_deref());
            }
            write_text(&conversion.into_page(), args.out.as_deref())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::NothingToConvert) => {
            eprintln!("{}", CliError::NothingToConvert);
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

use isocompose::{ComposeOptions, CompositionRequest, ShapeLibrary, compose};
use miette::{IntoDiagnostic, WrapErr};
use std::io::{Read, Write};
use std::path::PathBuf;

const SHAPES_ENV: &str = "ISOCOMPOSE_SHAPES";
const DEFAULT_SHAPES_DIR: &str = "./shapes";

const USAGE: &str = "\
Usage: isocompose <command> [options]

Commands:
  compose <request.json|->   Compose a diagram request into SVG
  catalog                    List the shape library as JSON

Options:
  --shapes <dir>    Shape library directory (default: $ISOCOMPOSE_SHAPES or ./shapes)
  --out <file>      Write output to a file instead of stdout
  --debug           Draw face and decoration outlines
  --json-errors     Report failures as {\"error\": \"...\"} on stdout";

#[derive(Debug, Default)]
struct Args {
    command: String,
    input: Option<String>,
    shapes: Option<PathBuf>,
    out: Option<PathBuf>,
    debug: bool,
    json_errors: bool,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args {
        command: raw.next().ok_or("missing command")?,
        ..Default::default()
    };
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--shapes" => {
                args.shapes = Some(raw.next().ok_or("--shapes needs a directory")?.into());
            }
            "--out" | "-o" => {
                args.out = Some(raw.next().ok_or("--out needs a file")?.into());
            }
            "--debug" => args.debug = true,
            "--json-errors" => args.json_errors = true,
            "-h" | "--help" => return Err(String::new()),
            other if other.starts_with("--") => return Err(format!("unknown option {other}")),
            _ if args.input.is_none() => args.input = Some(arg),
            _ => return Err(format!("unexpected argument {arg}")),
        }
    }
    Ok(args)
}

fn main() -> miette::Result<()> {
    // stdout carries the SVG, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {msg}\n");
            }
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    let json_errors = args.json_errors;
    match run(args) {
        Ok(()) => Ok(()),
        Err(report) if json_errors => {
            println!("{}", serde_json::json!({ "error": report.to_string() }));
            std::process::exit(1);
        }
        Err(report) => Err(report),
    }
}

fn run(args: Args) -> miette::Result<()> {
    let shapes_dir = args
        .shapes
        .clone()
        .or_else(|| std::env::var_os(SHAPES_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SHAPES_DIR));
    let library = ShapeLibrary::load_dir(&shapes_dir)?;
    tracing::info!(dir = %shapes_dir.display(), shapes = library.len(), "shape library loaded");

    let output = match args.command.as_str() {
        "compose" => {
            let request_text = read_request(args.input.as_deref())?;
            let mut request = CompositionRequest::from_json(&request_text)?;
            request.debug |= args.debug;
            let doc = compose(&library, &request, &ComposeOptions::default())?;
            doc.to_svg_string()
        }
        "catalog" => serde_json::to_string_pretty(&library.catalog())
            .into_diagnostic()
            .wrap_err("failed to serialize catalog")?,
        other => miette::bail!("unknown command '{other}'\n\n{USAGE}"),
    };

    write_output(args.out.as_ref(), &output)
}

fn read_request(input: Option<&str>) -> miette::Result<String> {
    match input {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .into_diagnostic()
                .wrap_err("failed to read request from stdin")?;
            Ok(text)
        }
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read request {path}")),
    }
}

fn write_output(out: Option<&PathBuf>, text: &str) -> miette::Result<()> {
    match out {
        Some(path) => std::fs::write(path, text)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}").into_diagnostic()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_compose_options() {
        let args = parse(&["compose", "--shapes", "lib", "req.json", "--debug", "-o", "x.svg"])
            .unwrap();
        assert_eq!(args.command, "compose");
        assert_eq!(args.input.as_deref(), Some("req.json"));
        assert_eq!(args.shapes, Some(PathBuf::from("lib")));
        assert_eq!(args.out, Some(PathBuf::from("x.svg")));
        assert!(args.debug);
        assert!(!args.json_errors);
    }

    #[test]
    fn rejects_unknown_and_incomplete_options() {
        assert!(parse(&["compose", "--colour"]).is_err());
        assert!(parse(&["catalog", "--shapes"]).is_err());
        assert!(parse(&["compose", "a.json", "b.json"]).is_err());
        assert!(parse(&[]).is_err());
    }
}

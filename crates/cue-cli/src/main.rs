//! Command-line inspector for TTML caption files
//!
//! Usage: `cue <file> [--at <ms>]`
//!
//! Prints every cue grouped by region, then the problems met while parsing.
//! With `--at`, only the cues active at that instant are listed. Set
//! `RUST_LOG=debug` to trace the parse.

use std::{fmt::Write, fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use cue_core::{
    timing::format_clock_time,
    track::{group_by_region, CueTrack},
    ttml::{CaptionAdapter, TtmlAdapter},
    CueNode,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Parsed command line
#[derive(Debug, PartialEq)]
struct Args {
    path: PathBuf,
    at: Option<f64>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut path = None;
        let mut at = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--at" => {
                    let value = args.next().context("--at needs a time in milliseconds")?;
                    let millis: f64 = value
                        .parse()
                        .with_context(|| format!("`{value}` is not a number of milliseconds"))?;
                    at = Some(millis);
                }
                flag if flag.starts_with("--") => bail!("unknown option `{flag}`"),
                _ if path.is_some() => bail!("only one input file is accepted"),
                _ => path = Some(PathBuf::from(arg)),
            }
        }

        Ok(Self {
            path: path.context("usage: cue <file> [--at <ms>]")?,
            at,
        })
    }
}

fn describe(cue: &CueNode) -> String {
    format!(
        "  [{} --> {}] {}: {}",
        format_clock_time(cue.start_time()),
        format_clock_time(cue.end_time()),
        cue.id(),
        cue.content().replace('\n', " / ")
    )
}

/// Parse the input and render the report
fn run(args: &Args) -> Result<String> {
    let document = fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let result = TtmlAdapter::new()
        .parse(&document)
        .with_context(|| format!("failed to parse {}", args.path.display()))?;
    info!(cues = result.data.len(), errors = result.errors.len(), "parsed {}", args.path.display());

    let mut track = CueTrack::new();
    track.add_result(result);

    let cues = match args.at {
        Some(time) => track.active_cues(time),
        None => track.cues().to_vec(),
    };

    let mut report = String::new();
    match args.at {
        Some(time) => writeln!(report, "{} cue(s) active at {}", cues.len(), format_clock_time(time))?,
        None => writeln!(report, "{} cue(s)", cues.len())?,
    }
    for group in group_by_region(cues) {
        writeln!(report, "region {}:", group.id)?;
        for cue in &group.cues {
            writeln!(report, "{}", describe(cue))?;
        }
    }

    if !track.errors().is_empty() {
        writeln!(report, "{} problem(s):", track.errors().len())?;
        for error in track.errors() {
            let severity = if error.is_critical { "error" } else { "warning" };
            writeln!(report, "  {severity}: {error}")?;
        }
    }

    Ok(report)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    print!("{}", run(&args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse(list.iter().map(ToString::to_string))
    }

    fn document_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const DOCUMENT: &str = r#"<tt>
        <head><layout><region xml:id="bottom"/></layout></head>
        <body><div>
            <p region="bottom" begin="0s" end="2s">Hello<br/>there</p>
            <p begin="1s" end="3s">Unplaced</p>
            <p region="missing" begin="5s" end="6s">Later</p>
        </div></body>
    </tt>"#;

    #[test]
    fn parses_arguments() {
        assert_eq!(
            args(&["subs.ttml", "--at", "1500"]).unwrap(),
            Args {
                path: PathBuf::from("subs.ttml"),
                at: Some(1500.0)
            }
        );
        assert!(args(&[]).is_err());
        assert!(args(&["a.ttml", "b.ttml"]).is_err());
        assert!(args(&["a.ttml", "--at"]).is_err());
        assert!(args(&["a.ttml", "--at", "soon"]).is_err());
        assert!(args(&["a.ttml", "--verbose"]).is_err());
    }

    #[test]
    fn reports_all_cues_by_region() {
        let file = document_file(DOCUMENT);
        let report = run(&Args {
            path: file.path().to_path_buf(),
            at: None,
        })
        .unwrap();

        assert!(report.starts_with("3 cue(s)\n"));
        assert!(report.contains("region bottom:\n  [00:00:00.000 --> 00:00:02.000] cue-0: Hello / there"));
        assert!(report.contains("region default:"));
        assert!(report.contains("1 problem(s):\n  warning: "));
    }

    #[test]
    fn filters_active_cues() {
        let file = document_file(DOCUMENT);
        let report = run(&Args {
            path: file.path().to_path_buf(),
            at: Some(5500.0),
        })
        .unwrap();

        assert!(report.starts_with("1 cue(s) active at 00:00:05.500\n"));
        assert!(report.contains("Later"));
        assert!(!report.contains("Hello"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = run(&Args {
            path: PathBuf::from("/definitely/not/here.ttml"),
            at: None,
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }
}

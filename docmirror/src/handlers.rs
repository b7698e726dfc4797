use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use docmirror_core::crawl::{ExportOptions, execute_export};
use docmirror_core::report::{ReportFormat, generate_export_report};
use docmirror_scanner::http::DEFAULT_TIMEOUT_SECS;
use docmirror_scanner::scope::parse_root;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Export settings as given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct ExportArgs {
    pub url: Option<String>,
    pub out: Option<String>,
    pub max_pages: Option<usize>,
    pub delay: Option<f64>,
    pub no_assets: bool,
    pub timeout_secs: u64,
    pub quiet: bool,
}

impl ExportArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            url: matches.get_one::<String>("url").cloned(),
            out: matches.get_one::<String>("out").cloned(),
            max_pages: matches.get_one::<usize>("max-pages").copied(),
            delay: matches.get_one::<f64>("delay").copied(),
            no_assets: matches.get_flag("no-assets"),
            timeout_secs: matches
                .get_one::<u64>("timeout")
                .copied()
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            quiet: matches.get_flag("quiet"),
        }
    }
}

// Helpers for parsing prompt answers

/// Page cap answer, read the same way as `--max-pages`. Anything but a
/// non-negative integer means no cap.
pub fn parse_max_pages(input: &str) -> Option<usize> {
    input.trim().parse::<usize>().ok()
}

/// Delay answer in seconds. Empty, invalid or negative input falls back to zero.
pub fn parse_delay(input: &str) -> Duration {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(Duration::ZERO)
}

/// `[Y/n]` answer; only an explicit no turns the default off.
pub fn parse_yes_no(input: &str, default: bool) -> bool {
    match input.trim().to_lowercase().as_str() {
        "n" | "no" => false,
        "y" | "yes" => true,
        _ => default,
    }
}

/// Expand `~` and fall back to the current directory for empty input.
pub fn expand_output_dir(input: &str) -> Result<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return std::env::current_dir().context("Cannot determine the current directory");
    }
    Ok(PathBuf::from(shellexpand::tilde(trimmed).as_ref()))
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, msg: &str) -> Result<String> {
    write!(output, "{} ", msg.bright_cyan().bold())?;
    output.flush()?;

    let mut response = String::new();
    let read = input.read_line(&mut response)?;
    if read == 0 {
        anyhow::bail!("Input closed while waiting for an answer");
    }
    Ok(response.trim().to_string())
}

/// Turn command-line arguments into export options, prompting for anything
/// missing when no URL was given.
pub fn resolve_export_options<R: BufRead, W: Write>(
    args: ExportArgs,
    input: &mut R,
    output: &mut W,
) -> Result<ExportOptions> {
    let interactive = args.url.is_none();

    if interactive {
        writeln!(output, "Press Enter to accept defaults in brackets.")?;
    }

    let url = match args.url {
        Some(url) => url,
        None => loop {
            let answer = prompt(input, output, "Root URL to mirror (e.g. https://example.com/docs/):")?;
            if !answer.is_empty() {
                break answer;
            }
        },
    };

    let output_dir = match args.out {
        Some(out) => expand_output_dir(&out)?,
        None if interactive => {
            let cwd = std::env::current_dir().context("Cannot determine the current directory")?;
            let answer = prompt(input, output, &format!("Output directory [{}]:", cwd.display()))?;
            expand_output_dir(&answer)?
        }
        None => expand_output_dir("")?,
    };

    let max_pages = match args.max_pages {
        Some(n) => Some(n),
        None if interactive => {
            parse_max_pages(&prompt(input, output, "Max pages (empty for no limit):")?)
        }
        None => None,
    };

    let delay = match args.delay {
        Some(secs) => Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO),
        None if interactive => parse_delay(&prompt(
            input,
            output,
            "Delay in seconds between pages (e.g. 0.25) [0]:",
        )?),
        None => Duration::ZERO,
    };

    let download_assets = if args.no_assets {
        false
    } else if interactive {
        parse_yes_no(&prompt(input, output, "Download images [Y/n]:")?, true)
    } else {
        true
    };

    Ok(ExportOptions {
        url,
        output_dir,
        max_pages,
        delay,
        download_assets,
        timeout_secs: args.timeout_secs,
        show_progress: !args.quiet,
    })
}

pub async fn handle_export(matches: &ArgMatches) {
    let args = ExportArgs::from_matches(matches);
    let format = matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    let stdin = io::stdin();
    let options = match resolve_export_options(args, &mut stdin.lock(), &mut io::stdout()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = parse_root(&options.url) {
        eprintln!("{} {}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    debug!("Export options: {:?}", options);

    let summary = match execute_export(options, None).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    match generate_export_report(&summary, format) {
        Ok(report) => println!("{}", report),
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

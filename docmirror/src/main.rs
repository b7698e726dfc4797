use commands::command_argument_builder;
use docmirror::handlers::handle_export;
use docmirror_core::print_banner;
use tracing_subscriber::EnvFilter;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let matches = cmd.get_matches();
    let quiet = matches.get_flag("quiet");
    let verbose = matches.get_flag("verbose");

    // Logs go to stderr so the report on stdout stays clean
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "docmirror={level},docmirror_core={level},docmirror_scanner={level}"
        )))
        .with_writer(std::io::stderr)
        .init();

    // stdout carries the JSON report
    let json = matches.get_one::<String>("format").is_some_and(|f| f == "json");
    if !quiet && !json {
        print_banner();
    }

    handle_export(&matches).await;
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

use crate::CLAP_STYLING;
use clap::arg;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("docmirror")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("docmirror")
        .about("Mirror a documentation site as a tree of Markdown files")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-u --"url" <URL>)
                .required(false)
                .help("Root URL to mirror; only pages under its path are followed. Prompted for when absent"),
        )
        .arg(
            arg!(-o --"out" <DIR>)
                .required(false)
                .help("Output directory (defaults to the current directory)"),
        )
        .arg(
            arg!(-m --"max-pages" <N>)
                .required(false)
                .help("Stop after this many pages have been written")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(-d --"delay" <SECONDS>)
                .required(false)
                .help("Pause between pages, in seconds")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(arg!(--"no-assets" "Do not download images; keep their remote URLs").required(false))
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("HTTP request timeout in seconds")
                .default_value("20")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Summary report format")
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(arg!(-q --"quiet" "Suppress banner and progress output").required(false))
        .arg(arg!(-v --"verbose" "Enable debug logging").required(false))
}

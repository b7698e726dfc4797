pub mod crawl;
pub mod report;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
     _                     _
  __| | ___   ___ _ __ ___ (_)_ __ _ __ ___  _ __
 / _` |/ _ \ / __| '_ ` _ \| | '__| '__/ _ \| '__|
| (_| | (_) | (__| | | | | | | |  | | | (_) | |
 \__,_|\___/ \___|_| |_| |_|_|_|  |_|  \___/|_|
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "website to markdown mirror".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

pub mod handlers;

pub use handlers::{
    ExportArgs, expand_output_dir, parse_delay, parse_max_pages, parse_yes_no,
    resolve_export_options,
};

// Re-export export functionality from docmirror-core
pub use docmirror_core::crawl::{ExportOptions, execute_export, extract_url_path};

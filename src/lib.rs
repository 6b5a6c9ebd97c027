/*!
 * codepack - Pack a directory tree into a single Markdown document
 *
 * The scanner builds an ordered tree of the directory, the writer renders it
 * as a structure diagram followed by the content of every file, and the run
 * summary reports what was skipped and why.
 */

pub mod config;
pub mod error;
pub mod filter;
pub mod report;
pub mod scanner;
pub mod types;
pub mod utils;
pub mod writer;


use std::sync::Arc;

use indicatif::ProgressBar;

// Re-export main components for easier access
pub use config::{BinaryPolicy, Config, FenceStyle, OutputTarget};
pub use error::{EntryReadError, PackError, Result};
pub use filter::ExclusionRules;
pub use report::{FileReportInfo, ReportFormat, Reporter, RunSummary, ScanReport};
pub use scanner::Scanner;
pub use types::{DirectoryNode, FileContent, FileNode, Node, NodeKind};
pub use writer::MarkdownWriter;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scan `config.target_dir` and write the packed document to `config.output`
pub fn pack(config: &Config) -> Result<RunSummary> {
    pack_with_progress(config, Arc::new(ProgressBar::hidden()))
}

/// Same as [`pack`], reporting per-file progress on `progress`
pub fn pack_with_progress(config: &Config, progress: Arc<ProgressBar>) -> Result<RunSummary> {
    config.validate()?;

    let scanner = Scanner::new(config.clone(), progress);
    let (root, summary) = scanner.scan()?;

    MarkdownWriter::new(config.clone()).write(&root)?;

    Ok(summary)
}

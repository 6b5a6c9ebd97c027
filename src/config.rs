/*!
 * Configuration handling for codepack
 */

use std::fmt;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use clap_complete::Shell;
use serde::Serialize;

use crate::ensure;
use crate::error::Result;
use crate::filter::ExclusionRules;
use crate::utils::DEFAULT_EXCLUDES;

/// What to do with files whose bytes are not valid UTF-8
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryPolicy {
    /// Emit a section with a placeholder notice instead of the content
    #[default]
    Omit,
    /// Leave the file out of the content sections entirely
    Skip,
    /// Write the raw bytes verbatim
    Include,
}

impl fmt::Display for BinaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinaryPolicy::Omit => "omit",
            BinaryPolicy::Skip => "skip",
            BinaryPolicy::Include => "include",
        };
        f.write_str(name)
    }
}

/// How file content is delimited inside the document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FenceStyle {
    /// Code fence long enough that the content cannot close it
    #[default]
    Adaptive,
    /// Raw content with no fence
    Raw,
}

/// Run summary output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Console tables
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Where the packed document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output
    Stdout,
    /// A file, overwritten if it exists
    File(PathBuf),
}

impl OutputTarget {
    /// Parse a CLI value, `-` meaning stdout
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(value))
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        match self {
            OutputTarget::Stdout => None,
            OutputTarget::File(path) => Some(path),
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Stdout => f.write_str("<stdout>"),
            OutputTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Command-line arguments for codepack
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "codepack",
    version = env!("CARGO_PKG_VERSION"),
    about = "Pack a directory tree into a single Markdown document",
    long_about = "Walks a directory, draws its structure as a tree and appends the content of every text file, producing one Markdown document suitable as context for Large Language Models."
)]
pub struct Args {
    /// Directory to pack
    #[clap(default_value = ".")]
    pub directory_path: String,

    /// Output Markdown file (`-` for stdout)
    #[clap(default_value = ".codepack.md")]
    pub output_file: String,

    /// Comma-separated list of patterns to exclude
    #[clap(short = 'e', long = "exclude", value_delimiter = ',')]
    pub exclude_patterns: Vec<String>,

    /// Comma-separated list of patterns files must match to be packed
    #[clap(short = 'i', long = "include", value_delimiter = ',')]
    pub include_patterns: Vec<String>,

    /// Do not apply the built-in exclusion list
    #[clap(long)]
    pub no_default_excludes: bool,

    /// Drop directories left empty after filtering
    #[clap(long)]
    pub prune_empty_dirs: bool,

    /// Handling of files that are not valid UTF-8
    #[clap(long = "binary", value_enum, default_value_t = BinaryPolicy::default())]
    pub binary_policy: BinaryPolicy,

    /// How file content is fenced
    #[clap(long, value_enum, default_value_t = FenceStyle::default())]
    pub fence: FenceStyle,

    /// Format of the run summary
    #[clap(long, value_enum, default_value_t = ReportKind::default())]
    pub report: ReportKind,

    /// Suppress the progress spinner and the run summary
    #[clap(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory to pack
    pub target_dir: PathBuf,

    /// Destination of the document
    pub output: OutputTarget,

    /// Patterns to exclude, in addition to the defaults
    pub exclude_patterns: Vec<String>,

    /// Patterns files must match (if empty, include all)
    pub include_patterns: Vec<String>,

    /// Whether the built-in exclusion list applies
    pub use_default_excludes: bool,

    /// Drop directories with no remaining entries
    pub prune_empty_dirs: bool,

    /// Handling of non-UTF-8 files
    pub binary_policy: BinaryPolicy,

    /// Fence style for content sections
    pub fence: FenceStyle,
}

impl Config {
    /// Configuration with default options
    pub fn new(target_dir: impl Into<PathBuf>, output: OutputTarget) -> Self {
        Self {
            target_dir: target_dir.into(),
            output,
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
            use_default_excludes: true,
            prune_empty_dirs: false,
            binary_policy: BinaryPolicy::default(),
            fence: FenceStyle::default(),
        }
    }

    /// Create configuration from command-line arguments
    pub fn from_args(args: &Args) -> Self {
        Self {
            target_dir: PathBuf::from(&args.directory_path),
            output: OutputTarget::parse(&args.output_file),
            exclude_patterns: args.exclude_patterns.clone(),
            include_patterns: args.include_patterns.clone(),
            use_default_excludes: !args.no_default_excludes,
            prune_empty_dirs: args.prune_empty_dirs,
            binary_policy: args.binary_policy,
            fence: args.fence,
        }
    }

    /// Validate the configuration.
    ///
    /// The target directory is checked by the scanner so that a missing root
    /// surfaces as `NotFound` rather than a configuration error.
    pub fn validate(&self) -> Result<()> {
        for pattern in self.exclude_patterns.iter().chain(&self.include_patterns) {
            ensure!(
                !pattern.trim().is_empty() && pattern.trim() != "/",
                Config,
                "empty pattern in exclusion or inclusion list"
            );
        }

        if let OutputTarget::File(path) = &self.output {
            ensure!(
                !path.is_dir(),
                Config,
                "output path is a directory: {}",
                path.display()
            );
        }

        Ok(())
    }

    /// Exclusion patterns in effect, defaults first
    pub fn effective_excludes(&self) -> Vec<String> {
        let defaults: Vec<String> = if self.use_default_excludes {
            DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect()
        } else {
            Vec::new()
        };
        defaults
            .into_iter()
            .chain(self.exclude_patterns.iter().cloned())
            .collect()
    }

    /// Build the exclusion rules for a scan
    pub fn exclusion_rules(&self) -> ExclusionRules {
        ExclusionRules::new(self.effective_excludes(), self.include_patterns.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_target_parse() {
        assert_eq!(OutputTarget::parse("-"), OutputTarget::Stdout);
        assert_eq!(
            OutputTarget::parse("out/pack.md"),
            OutputTarget::File(PathBuf::from("out/pack.md"))
        );
    }

    #[test]
    fn test_from_args_defaults() {
        let args = Args::parse_from(["codepack"]);
        let config = Config::from_args(&args);

        assert_eq!(config.target_dir, PathBuf::from("."));
        assert_eq!(
            config.output,
            OutputTarget::File(PathBuf::from(".codepack.md"))
        );
        assert!(config.use_default_excludes);
        assert!(!config.prune_empty_dirs);
        assert_eq!(config.binary_policy, BinaryPolicy::Omit);
        assert_eq!(config.fence, FenceStyle::Adaptive);
    }

    #[test]
    fn test_from_args_options() {
        let args = Args::parse_from([
            "codepack",
            "proj",
            "-",
            "-e",
            "*.bin,docs/",
            "--include",
            "*.rs",
            "--no-default-excludes",
            "--prune-empty-dirs",
            "--binary",
            "include",
            "--fence",
            "raw",
        ]);
        let config = Config::from_args(&args);

        assert_eq!(config.output, OutputTarget::Stdout);
        assert_eq!(config.exclude_patterns, vec!["*.bin", "docs/"]);
        assert_eq!(config.include_patterns, vec!["*.rs"]);
        assert_eq!(config.effective_excludes(), vec!["*.bin", "docs/"]);
        assert!(config.prune_empty_dirs);
        assert_eq!(config.binary_policy, BinaryPolicy::Include);
        assert_eq!(config.fence, FenceStyle::Raw);
    }

    #[test]
    fn test_validate_rejects_empty_pattern() {
        let mut config = Config::new(".", OutputTarget::Stdout);
        config.exclude_patterns.push("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_directory_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(".", OutputTarget::File(dir.path().to_path_buf()));
        assert!(config.validate().is_err());
    }
}

/*!
 * Run summary and reporting for codepack
 *
 * The scanner fills a [`RunSummary`] while it walks; the [`Reporter`] renders
 * it as console tables through the tabled library, or as JSON.
 */

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::config::BinaryPolicy;
use crate::error::{EntryReadError, Result};
use crate::utils::format_number;

/// Information about a packed file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReportInfo {
    /// Number of lines in the file
    pub lines: usize,
    /// Number of characters in the file
    pub chars: usize,
}

impl FileReportInfo {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().count(),
            chars: text.chars().count(),
        }
    }

    /// Rough token estimate, one token per four characters
    pub fn estimated_tokens(&self) -> usize {
        self.chars / 4
    }
}

/// Non-fatal outcome of a pack run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Files that received a content section
    pub files_included: usize,
    /// Directories kept in the tree, root excluded
    pub directories: usize,
    /// Entries skipped by exclusion or inclusion rules
    pub excluded: usize,
    /// Binary files left without their content
    pub skipped_binary: usize,
    /// Entries that could not be read
    pub skipped_unreadable: usize,
    /// Policy applied to binary files
    pub binary_policy: BinaryPolicy,
    /// Every file detected as binary, whatever the policy did with it
    pub binary_files: Vec<String>,
    /// Directory links skipped because they point back at an ancestor
    pub cycles: Vec<String>,
    /// Per-entry read errors
    pub errors: Vec<EntryReadError>,
    /// Total lines across text files
    pub total_lines: usize,
    /// Total characters across text files
    pub total_chars: usize,
    /// Details for each text file, keyed by relative path
    pub file_details: BTreeMap<String, FileReportInfo>,
}

impl RunSummary {
    pub fn new(binary_policy: BinaryPolicy) -> Self {
        Self {
            binary_policy,
            ..Self::default()
        }
    }

    /// Record a text file that was packed
    pub fn record_text(&mut self, rel_path: &str, text: &str) {
        let info = FileReportInfo::from_text(text);
        self.files_included += 1;
        self.total_lines += info.lines;
        self.total_chars += info.chars;
        self.file_details.insert(rel_path.to_string(), info);
    }

    /// Record a binary file according to the policy in effect
    pub fn record_binary(&mut self, rel_path: &str) {
        self.binary_files.push(rel_path.to_string());
        match self.binary_policy {
            BinaryPolicy::Include => self.files_included += 1,
            BinaryPolicy::Omit | BinaryPolicy::Skip => self.skipped_binary += 1,
        }
    }

    /// Record an entry that could not be read
    pub fn record_error(&mut self, error: EntryReadError) {
        self.skipped_unreadable += 1;
        self.errors.push(error);
    }

    /// Whether any entry could not be read
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Report for a finished run
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Output destination
    pub output: String,
    /// Time taken to scan and write
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// Run summary
    #[serde(flatten)]
    pub summary: RunSummary,
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Format of the report output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
    /// Pretty-printed JSON
    Json,
}

/// Report generator for scan results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string based on scan statistics
    pub fn generate_report(&self, report: &ScanReport) -> Result<String> {
        match self.format {
            ReportFormat::ConsoleTable => Ok(self.generate_console_report(report)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        }
    }

    /// Print the report to stderr so that stdout stays free for the document
    pub fn print_report(&self, report: &ScanReport) -> Result<()> {
        eprintln!("\n{}", self.generate_report(report)?);
        Ok(())
    }

    // Keep the tail of long paths, where the file name lives
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.chars().count() <= max_len {
            return path.to_string();
        }

        let mut segments = Vec::new();
        let mut current_len = 3; // "..."
        for part in path.split('/').rev() {
            let part_len = part.chars().count() + 1;
            if current_len + part_len > max_len {
                break;
            }
            segments.push(part);
            current_len += part_len;
        }

        if segments.is_empty() {
            let tail: String = path
                .chars()
                .rev()
                .take(max_len.saturating_sub(3))
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return format!("...{}", tail);
        }

        let mut result = String::from("...");
        for part in segments.iter().rev() {
            result.push('/');
            result.push_str(part);
        }
        result
    }

    fn style_table(table: &mut Table) -> String {
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));
        table.to_string()
    }

    fn create_summary_table(&self, report: &ScanReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let summary = &report.summary;
        let mut rows = vec![
            SummaryRow {
                key: "📂 Output".to_string(),
                value: report.output.clone(),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "📄 Files Included".to_string(),
                value: format_number(summary.files_included),
            },
            SummaryRow {
                key: "📁 Directories".to_string(),
                value: format_number(summary.directories),
            },
            SummaryRow {
                key: "📝 Total Lines".to_string(),
                value: format_number(summary.total_lines),
            },
            SummaryRow {
                key: "📦 LLM Tokens".to_string(),
                value: format!("{} tokens (estimated)", format_number(summary.total_chars / 4)),
            },
            SummaryRow {
                key: "🚫 Excluded".to_string(),
                value: format_number(summary.excluded),
            },
        ];

        if !summary.binary_files.is_empty() {
            rows.push(SummaryRow {
                key: "🧱 Binary Files".to_string(),
                value: format!(
                    "{} detected, {} skipped (policy: {})",
                    summary.binary_files.len(),
                    summary.skipped_binary,
                    summary.binary_policy
                ),
            });
        }

        if summary.skipped_unreadable > 0 {
            rows.push(SummaryRow {
                key: "⚠️ Unreadable".to_string(),
                value: format_number(summary.skipped_unreadable),
            });
        }

        if !summary.cycles.is_empty() {
            rows.push(SummaryRow {
                key: "🔁 Link Cycles".to_string(),
                value: format_number(summary.cycles.len()),
            });
        }

        Self::style_table(&mut Table::new(rows))
    }

    fn create_files_table(&self, report: &ScanReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Est. Tokens")]
            tokens: String,
        }

        // Largest first, path as tie-breaker
        let mut files: Vec<_> = report.summary.file_details.iter().collect();
        files.sort_by(|(pa, a), (pb, b)| b.chars.cmp(&a.chars).then_with(|| pa.cmp(pb)));

        let files_to_show = if files.len() > 15 {
            &files[0..10]
        } else {
            &files[..]
        };

        let rows: Vec<FileRow> = files_to_show
            .iter()
            .map(|(path, info)| FileRow {
                path: self.format_path(path, 60),
                lines: format_number(info.lines),
                tokens: format_number(info.estimated_tokens()),
            })
            .collect();

        Self::style_table(&mut Table::new(rows))
    }

    fn create_problems_table(&self, summary: &RunSummary) -> String {
        #[derive(Tabled)]
        struct ProblemRow {
            #[tabled(rename = "Entry")]
            path: String,

            #[tabled(rename = "Reason")]
            reason: String,
        }

        let rows = summary
            .errors
            .iter()
            .map(|e| ProblemRow {
                path: self.format_path(&e.path, 60),
                reason: e.message.clone(),
            })
            .chain(summary.cycles.iter().map(|path| ProblemRow {
                path: self.format_path(path, 60),
                reason: "symbolic link cycle, not followed".to_string(),
            }));

        Self::style_table(&mut Table::new(rows))
    }

    fn generate_console_report(&self, report: &ScanReport) -> String {
        let summary_table = self.create_summary_table(report);
        let files_table = self.create_files_table(report);

        let files_title = if report.summary.file_details.len() > 15 {
            "📋  TOP 10 LARGEST FILES BY CHARACTER COUNT  📋"
        } else {
            "📋  PACKED FILES"
        };

        let mut out = format!("{}\n{}\n", files_title, files_table);

        if report.summary.has_errors() || !report.summary.cycles.is_empty() {
            out.push_str(&format!(
                "\n⚠️  SKIPPED ENTRIES\n{}\n",
                self.create_problems_table(&report.summary)
            ));
        }

        out.push_str(&format!("\n✅  PACK COMPLETE\n{}", summary_table));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ScanReport {
        let mut summary = RunSummary::new(BinaryPolicy::Omit);
        summary.record_text("src/main.rs", "fn main() {}\n");
        summary.record_text("README.md", "# Title\n\nBody\n");
        summary.record_binary("logo.png");
        summary.record_error(EntryReadError::new("secret", "Permission denied"));
        summary.cycles.push("loop".to_string());

        ScanReport {
            output: "out.md".to_string(),
            duration: Duration::from_millis(12),
            summary,
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = sample_report();
        let summary = &report.summary;

        assert_eq!(summary.files_included, 2);
        assert_eq!(summary.skipped_binary, 1);
        assert_eq!(summary.skipped_unreadable, 1);
        assert_eq!(summary.total_lines, 4);
        assert_eq!(summary.binary_files, vec!["logo.png"]);
    }

    #[test]
    fn test_binary_include_counts_as_included() {
        let mut summary = RunSummary::new(BinaryPolicy::Include);
        summary.record_binary("logo.png");

        assert_eq!(summary.files_included, 1);
        assert_eq!(summary.skipped_binary, 0);
        assert_eq!(summary.binary_files.len(), 1);
    }

    #[test]
    fn test_console_report_lists_problems() {
        let text = Reporter::new(ReportFormat::ConsoleTable)
            .generate_report(&sample_report())
            .unwrap();

        assert!(text.contains("PACKED FILES"));
        assert!(text.contains("src/main.rs"));
        assert!(text.contains("SKIPPED ENTRIES"));
        assert!(text.contains("Permission denied"));
        assert!(text.contains("symbolic link cycle"));
        assert!(text.contains("policy: omit"));
    }

    #[test]
    fn test_json_report() {
        let text = Reporter::new(ReportFormat::Json)
            .generate_report(&sample_report())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["output"], "out.md");
        assert_eq!(value["duration_ms"], 12);
        assert_eq!(value["files_included"], 2);
        assert_eq!(value["binary_policy"], "omit");
        assert_eq!(value["errors"][0]["path"], "secret");
        assert_eq!(value["file_details"]["README.md"]["lines"], 3);
    }

    #[test]
    fn test_format_path_keeps_tail() {
        let reporter = Reporter::new(ReportFormat::ConsoleTable);
        assert_eq!(reporter.format_path("a/b.rs", 60), "a/b.rs");

        let long = format!("{}/{}/file.rs", "x".repeat(40), "y".repeat(30));
        let short = reporter.format_path(&long, 40);
        assert!(short.starts_with("..."));
        assert!(short.ends_with("/file.rs"));
        assert!(short.chars().count() <= 40);
    }
}

/*!
 * Utility functions for codepack
 */

use once_cell::sync::Lazy;

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Format a count with K/M suffixes
pub fn format_number(num: usize) -> String {
    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

/// Default exclusion patterns.
///
/// Copied into each `Config`; never consulted directly by the scanner.
pub static DEFAULT_EXCLUDES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Version Control
        ".git/",
        ".svn/",
        ".hg/",
        ".bzr/",
        // OS Files
        ".DS_Store",
        "Thumbs.db",
        "desktop.ini",
        // Dependencies
        "node_modules/",
        "bower_components/",
        ".npm/",
        ".yarn/",
        ".pnpm-store/",
        "package-lock.json",
        "yarn.lock",
        // Build output
        "dist/",
        "build/",
        "out/",
        "*.min.js",
        "*.min.css",
        // Python
        "__pycache__/",
        ".pytest_cache/",
        ".venv/",
        "venv/",
        "*.pyc",
        "*.egg-info/",
        // Rust
        "target/",
        "Cargo.lock",
        // IDEs & Editors
        ".idea/",
        ".vscode/",
        ".vs/",
        "*.swp",
        "*~",
        // Caches
        ".cache/",
        ".gradle/",
        ".next/",
        ".terraform/",
        "*.log",
        // Compiled objects & archives
        "*.class",
        "*.jar",
        "*.o",
        "*.so",
        "*.dylib",
        "*.dll",
        "*.exe",
        "*.zip",
        "*.tar.gz",
        "*.tgz",
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_500), "1.5K");
        assert_eq!(format_number(2_000_000), "2.0M");
    }
}

/*!
 * Exclusion and inclusion rules applied during the scan
 */

use glob_match::glob_match;

/// A single glob pattern
#[derive(Debug, Clone)]
struct Pattern {
    glob: String,
    /// Pattern had a trailing `/` and only applies to directories
    dir_only: bool,
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let dir_only = trimmed.ends_with('/');
        let glob = trimmed.trim_end_matches('/').trim_start_matches("./");
        Self {
            glob: glob.to_string(),
            dir_only,
        }
    }

    fn matches(&self, name: &str, rel_path: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        glob_match(&self.glob, name) || glob_match(&self.glob, rel_path)
    }
}

/// Name/path patterns deciding which entries the scanner visits
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    excludes: Vec<Pattern>,
    includes: Vec<Pattern>,
}

impl ExclusionRules {
    pub fn new<I, J>(excludes: I, includes: J) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        J: IntoIterator,
        J::Item: AsRef<str>,
    {
        Self {
            excludes: excludes
                .into_iter()
                .map(|p| Pattern::parse(p.as_ref()))
                .collect(),
            includes: includes
                .into_iter()
                .map(|p| Pattern::parse(p.as_ref()))
                .collect(),
        }
    }

    /// Check whether an entry matches any exclusion pattern.
    ///
    /// `rel_path` uses `/` separators and is relative to the scan root.
    pub fn is_excluded(&self, name: &str, rel_path: &str, is_dir: bool) -> bool {
        self.excludes
            .iter()
            .any(|p| p.matches(name, rel_path, is_dir))
    }

    /// Check whether a file passes the include patterns.
    ///
    /// Always true when no include patterns are configured.
    pub fn is_included(&self, name: &str, rel_path: &str) -> bool {
        self.includes.is_empty()
            || self
                .includes
                .iter()
                .any(|p| p.matches(name, rel_path, false))
    }
}

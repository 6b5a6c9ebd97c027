/*!
 * Directory scanning: builds the ordered in-memory tree
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::{BinaryPolicy, Config};
use crate::error::{EntryReadError, PackError, Result};
use crate::filter::ExclusionRules;
use crate::report::RunSummary;
use crate::types::{display_path, DirectoryNode, FileContent, FileNode, Node};

/// A directory whose children are still being collected
struct Frame {
    depth: usize,
    abs_path: PathBuf,
    node: DirectoryNode,
}

/// Scanner for directory contents
pub struct Scanner {
    /// Scanner configuration
    config: Config,
    /// Rules derived from the configuration
    rules: ExclusionRules,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
}

impl Scanner {
    /// Create a new scanner
    pub fn new(config: Config, progress: Arc<ProgressBar>) -> Self {
        let rules = config.exclusion_rules();
        Self {
            config,
            rules,
            progress,
        }
    }

    /// Scan the target directory and return the tree with its run summary.
    ///
    /// Only an invalid root is fatal; unreadable entries end up in the summary.
    pub fn scan(&self) -> Result<(DirectoryNode, RunSummary)> {
        let root = resolve_root(&self.config.target_dir)?;
        let output = self.output_path();
        let root_name = root
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        info!(root = %root.display(), "Scanning directory");

        let mut summary = RunSummary::new(self.config.binary_policy);
        let mut excluded = 0usize;
        let mut stack = vec![Frame {
            depth: 0,
            abs_path: root.clone(),
            node: DirectoryNode::new(root_name, PathBuf::new()),
        }];

        let walker = WalkDir::new(&root)
            .follow_links(true)
            .min_depth(1)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .filter_entry(|entry| {
                let skip = self.should_exclude(entry, &root, output.as_deref());
                if skip {
                    excluded += 1;
                }
                !skip
            });

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    self.record_walk_error(err, &root, &mut stack, &mut summary);
                    continue;
                }
            };

            self.close_frames(&mut stack, entry.depth(), &mut summary);

            let rel_path = relative_to(&root, entry.path());
            let name = entry.file_name().to_string_lossy().to_string();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                debug!(path = %display_path(&rel_path), "Entering directory");
                stack.push(Frame {
                    depth: entry.depth(),
                    abs_path: entry.path().to_path_buf(),
                    node: DirectoryNode::new(name, rel_path),
                });
            } else if file_type.is_file() {
                if let Some(file) = self.process_file(entry.path(), rel_path, name, &mut summary) {
                    if let Some(parent) = stack.last_mut() {
                        parent.node.children.push(Node::File(file));
                    }
                }
            } else {
                // Sockets, FIFOs and devices are never read
                debug!(path = %display_path(&rel_path), "Skipping special file");
                summary.excluded += 1;
            }
        }

        self.close_frames(&mut stack, 1, &mut summary);
        summary.excluded += excluded;

        let root_node = match stack.pop() {
            Some(frame) => frame.node,
            None => DirectoryNode::new(String::new(), PathBuf::new()),
        };

        info!(
            files = summary.files_included,
            directories = summary.directories,
            excluded = summary.excluded,
            errors = summary.errors.len(),
            "Scan complete"
        );

        Ok((root_node, summary))
    }

    /// Check if an entry is skipped by the configured rules
    pub fn should_exclude(&self, entry: &DirEntry, root: &Path, output: Option<&Path>) -> bool {
        // Don't pack the output file itself
        if output.map_or(false, |out| entry.path() == out) {
            debug!(path = %entry.path().display(), "Skipping output file");
            return true;
        }

        let name = entry.file_name().to_string_lossy();
        let rel_path = display_path(&relative_to(root, entry.path()));
        let file_type = entry.file_type();

        if self.rules.is_excluded(&name, &rel_path, file_type.is_dir()) {
            debug!(path = %rel_path, "Excluded by pattern");
            return true;
        }

        if file_type.is_file() && !self.rules.is_included(&name, &rel_path) {
            debug!(path = %rel_path, "Not matched by include patterns");
            return true;
        }

        false
    }

    /// Attach every open directory at `depth` or deeper to its parent
    fn close_frames(&self, stack: &mut Vec<Frame>, depth: usize, summary: &mut RunSummary) {
        while stack.len() > 1 && stack.last().map_or(false, |f| f.depth >= depth) {
            let Some(frame) = stack.pop() else { break };

            if self.config.prune_empty_dirs && frame.node.children.is_empty() {
                debug!(path = %display_path(&frame.node.path), "Pruning empty directory");
                continue;
            }

            summary.directories += 1;
            if let Some(parent) = stack.last_mut() {
                parent.node.children.push(Node::Directory(frame.node));
            }
        }
    }

    /// Turn a walk error into a summary entry
    fn record_walk_error(
        &self,
        err: walkdir::Error,
        root: &Path,
        stack: &mut Vec<Frame>,
        summary: &mut RunSummary,
    ) {
        let rel_path = err
            .path()
            .map(|p| display_path(&relative_to(root, p)))
            .unwrap_or_default();

        if let Some(ancestor) = err.loop_ancestor() {
            warn!(
                path = %rel_path,
                ancestor = %ancestor.display(),
                "Skipping symbolic link cycle"
            );
            summary.cycles.push(rel_path);
            return;
        }

        // A directory that failed to list was already pushed; omit it
        if let Some(path) = err.path() {
            if stack.len() > 1 && stack.last().map_or(false, |f| f.abs_path == path) {
                stack.pop();
            }
        }

        let message = match err.io_error() {
            Some(io_err) => io_err.to_string(),
            None => err.to_string(),
        };
        warn!(path = %rel_path, error = %message, "Failed to read entry");
        summary.record_error(EntryReadError::new(rel_path, message));
    }

    /// Read a single file and return its node representation
    fn process_file(
        &self,
        abs_path: &Path,
        rel_path: PathBuf,
        name: String,
        summary: &mut RunSummary,
    ) -> Option<FileNode> {
        self.progress.inc(1);

        // Truncate long names to avoid display issues
        let display_name = if name.chars().count() > 40 {
            let tail: String = name.chars().skip(name.chars().count() - 37).collect();
            format!("...{}", tail)
        } else {
            name.clone()
        };
        self.progress
            .set_message(format!("Current file: {}", display_name));

        let file_path = display_path(&rel_path);
        let bytes = match fs::read(abs_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %file_path, error = %e, "Failed to read file");
                summary.record_error(EntryReadError::new(file_path, e));
                return None;
            }
        };

        let content = match String::from_utf8(bytes) {
            Ok(text) => {
                summary.record_text(&file_path, &text);
                FileContent::Text(text)
            }
            Err(err) => {
                debug!(path = %file_path, policy = %self.config.binary_policy, "Binary content detected");
                summary.record_binary(&file_path);
                match self.config.binary_policy {
                    BinaryPolicy::Include => FileContent::Binary(err.into_bytes()),
                    BinaryPolicy::Omit | BinaryPolicy::Skip => FileContent::BinaryOmitted {
                        size: err.as_bytes().len() as u64,
                    },
                }
            }
        };

        Some(FileNode {
            name,
            path: rel_path,
            content,
        })
    }

    /// Absolute location of the output file, if it is a file
    fn output_path(&self) -> Option<PathBuf> {
        let path = self.config.output.file_path()?;
        let name = path.file_name()?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::canonicalize(parent).ok().map(|p| p.join(name))
    }
}

/// Check the root and return its canonical form
pub fn resolve_root(path: &Path) -> Result<PathBuf> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(PackError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(PackError::Io(e)),
    };

    if !metadata.is_dir() {
        return Err(PackError::NotADirectory(path.to_path_buf()));
    }

    Ok(fs::canonicalize(path)?)
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

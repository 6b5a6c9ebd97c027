/*!
 * Core types and data structures for the packed tree
 */

use std::path::{Path, PathBuf};

/// Kind of a filesystem entry kept in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Directory containing other entries
    Directory,
    /// Regular file (text or binary)
    File,
}

/// Content of a file, read once during the scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Content that decoded as UTF-8
    Text(String),
    /// Undecodable content kept verbatim
    Binary(Vec<u8>),
    /// Undecodable content that was dropped; only the size is kept
    BinaryOmitted { size: u64 },
}

/// Represents a directory in the scanned tree
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    /// Directory name
    pub name: String,
    /// Relative path from scan root (empty for the root itself)
    pub path: PathBuf,
    /// Sorted directory contents
    pub children: Vec<Node>,
}

/// Represents a file in the scanned tree
#[derive(Debug, Clone)]
pub struct FileNode {
    /// File name
    pub name: String,
    /// Relative path from scan root
    pub path: PathBuf,
    /// File content
    pub content: FileContent,
}

/// A generic tree node
#[derive(Debug, Clone)]
pub enum Node {
    /// Directory node
    Directory(DirectoryNode),
    /// File node
    File(FileNode),
}

impl Node {
    /// Base name of the entry
    pub fn name(&self) -> &str {
        match self {
            Node::Directory(dir) => &dir.name,
            Node::File(file) => &file.name,
        }
    }

    /// Path relative to the scan root
    pub fn path(&self) -> &Path {
        match self {
            Node::Directory(dir) => &dir.path,
            Node::File(file) => &file.path,
        }
    }

    /// Whether this is a directory or a file
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Directory(_) => NodeKind::Directory,
            Node::File(_) => NodeKind::File,
        }
    }
}

impl DirectoryNode {
    /// Create an empty directory node
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            children: Vec::new(),
        }
    }

    /// Collect every file below this directory in depth-first order
    pub fn files(&self) -> Vec<&FileNode> {
        let mut files = Vec::new();
        collect_files(self, &mut files);
        files
    }
}

fn collect_files<'a>(dir: &'a DirectoryNode, out: &mut Vec<&'a FileNode>) {
    for child in &dir.children {
        match child {
            Node::Directory(sub) => collect_files(sub, out),
            Node::File(file) => out.push(file),
        }
    }
}

/// Render a relative path with `/` separators regardless of platform
pub fn display_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/*!
 * Markdown writer implementation for codepack
 */

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::{debug, info};

use crate::config::{BinaryPolicy, Config, FenceStyle, OutputTarget};
use crate::error::{PackError, Result};
use crate::types::{display_path, DirectoryNode, FileContent, FileNode, Node};
use crate::utils::format_file_size;

/// Heading above the structure diagram
pub const STRUCTURE_HEADING: &str = "# Project Structure";

/// Markdown writer for a scanned tree
pub struct MarkdownWriter {
    /// Writer configuration
    config: Config,
}

impl MarkdownWriter {
    /// Create a new Markdown writer
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Write the document to the configured output in a single write
    pub fn write(&self, root: &DirectoryNode) -> Result<()> {
        let document = self.render_to_vec(root);

        match &self.config.output {
            OutputTarget::Stdout => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(&document)
                    .and_then(|_| lock.flush())
                    .map_err(|source| PackError::Write {
                        path: PathBuf::from("<stdout>"),
                        source,
                    })?;
            }
            OutputTarget::File(path) => write_atomically(path, &document)?,
        }

        info!(output = %self.config.output, bytes = document.len(), "Document written");
        Ok(())
    }

    /// Render the whole document into memory
    pub fn render_to_vec(&self, root: &DirectoryNode) -> Vec<u8> {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.render(root, &mut buffer);
        buffer
    }

    /// Render the structure diagram followed by one section per file
    pub fn render<W: Write>(&self, root: &DirectoryNode, out: &mut W) -> io::Result<()> {
        self.write_structure(root, out)?;

        for file in root.files() {
            self.write_file_section(file, out)?;
        }

        Ok(())
    }

    /// Write the ASCII tree of the whole scan
    fn write_structure<W: Write>(&self, root: &DirectoryNode, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", STRUCTURE_HEADING)?;
        writeln!(out, "/{}", root.name)?;
        self.write_tree(root, "", out)
    }

    fn write_tree<W: Write>(&self, dir: &DirectoryNode, prefix: &str, out: &mut W) -> io::Result<()> {
        let count = dir.children.len();

        for (index, child) in dir.children.iter().enumerate() {
            let last = index + 1 == count;
            let connector = if last { "└── " } else { "├── " };
            let name = escape_controls(child.name());
            writeln!(out, "{}{}{}", prefix, connector, name)?;

            if let Node::Directory(sub) = child {
                let extension = if last { "    " } else { "│   " };
                self.write_tree(sub, &format!("{}{}", prefix, extension), out)?;
            }
        }

        Ok(())
    }

    /// Write the heading and content block of one file
    fn write_file_section<W: Write>(&self, file: &FileNode, out: &mut W) -> io::Result<()> {
        let body: &[u8] = match &file.content {
            FileContent::Text(text) => text.as_bytes(),
            FileContent::Binary(bytes) => bytes,
            FileContent::BinaryOmitted { size } => {
                if self.config.binary_policy == BinaryPolicy::Skip {
                    debug!(path = %display_path(&file.path), "Binary file left out of sections");
                    return Ok(());
                }
                writeln!(out, "\n# {}\n", escape_controls(&display_path(&file.path)))?;
                writeln!(
                    out,
                    "[Binary file omitted: {} ({})]",
                    escape_controls(&file.name),
                    format_file_size(*size)
                )?;
                return Ok(());
            }
        };

        writeln!(out, "\n# {}\n", escape_controls(&display_path(&file.path)))?;

        match self.config.fence {
            FenceStyle::Adaptive => {
                let fence = fence_for(body);
                writeln!(out, "{}{}", fence, language_for(&file.name))?;
                out.write_all(body)?;
                writeln!(out)?;
                writeln!(out, "{}", fence)?;
            }
            FenceStyle::Raw => {
                out.write_all(body)?;
                writeln!(out)?;
            }
        }

        Ok(())
    }
}

/// Backtick fence longer than any backtick run inside `content`
pub fn fence_for(content: &[u8]) -> String {
    let mut longest = 0;
    let mut run = 0;
    for &byte in content {
        if byte == b'`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// Escape control characters so a name always fits on one line
pub fn escape_controls(name: &str) -> Cow<'_, str> {
    if !name.chars().any(char::is_control) {
        return Cow::Borrowed(name);
    }
    let mut escaped = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_control() {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

/// Fence info string for a file: its extension, or `txt`
pub fn language_for(name: &str) -> &str {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("txt")
}

/// Write `bytes` to a temporary file next to `path`, then rename it over `path`
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let wrap = |source: io::Error| PackError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(wrap)?;

    let mut tmp = Builder::new()
        .prefix(".codepack")
        .suffix(".tmp")
        .tempfile_in(&parent)
        .map_err(wrap)?;
    tmp.write_all(bytes).map_err(wrap)?;
    tmp.flush().map_err(wrap)?;

    // Temp files are created 0600; give the result ordinary file permissions
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o7777)
            .unwrap_or(0o644);
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
            .map_err(wrap)?;
    }

    tmp.persist(path).map_err(|e| wrap(e.error))?;
    debug!(path = %path.display(), "Output persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: FileContent) -> Node {
        let path = PathBuf::from(path);
        Node::File(FileNode {
            name: path.file_name().unwrap().to_string_lossy().to_string(),
            path,
            content,
        })
    }

    fn text(path: &str, body: &str) -> Node {
        file(path, FileContent::Text(body.to_string()))
    }

    fn dir(path: &str, children: Vec<Node>) -> Node {
        let path = PathBuf::from(path);
        Node::Directory(DirectoryNode {
            name: path.file_name().unwrap().to_string_lossy().to_string(),
            path,
            children,
        })
    }

    fn root(children: Vec<Node>) -> DirectoryNode {
        DirectoryNode {
            name: "Proj".to_string(),
            path: PathBuf::new(),
            children,
        }
    }

    fn render(config: Config, root: &DirectoryNode) -> String {
        String::from_utf8(MarkdownWriter::new(config).render_to_vec(root)).unwrap()
    }

    fn config() -> Config {
        Config::new(".", OutputTarget::Stdout)
    }

    #[test]
    fn test_structure_and_section_layout() {
        let tree = root(vec![text("a.py", "x=1"), dir("sub", vec![])]);

        let expected = "# Project Structure\n/Proj\n├── a.py\n└── sub\n\n# a.py\n\n```py\nx=1\n```\n";
        assert_eq!(render(config(), &tree), expected);
    }

    #[test]
    fn test_nested_indentation() {
        let tree = root(vec![
            dir(
                "src",
                vec![
                    dir("bin", vec![text("src/bin/tool.rs", "")]),
                    text("src/lib.rs", ""),
                ],
            ),
            text("z.md", ""),
        ]);

        let output = render(config(), &tree);
        let diagram: Vec<&str> = output.lines().take(7).collect();
        assert_eq!(
            diagram,
            vec![
                "# Project Structure",
                "/Proj",
                "├── src",
                "│   ├── bin",
                "│   │   └── tool.rs",
                "│   └── lib.rs",
                "└── z.md",
            ]
        );

        let tool = output.find("# src/bin/tool.rs").unwrap();
        let lib = output.find("# src/lib.rs").unwrap();
        let z = output.find("# z.md").unwrap();
        assert!(tool < lib && lib < z);
    }

    #[test]
    fn test_fence_outgrows_content_backticks() {
        let body = "before\n```rust\nlet x = 1;\n```\n````\nafter";
        let tree = root(vec![text("notes.md", body)]);

        let output = render(config(), &tree);
        assert!(output.contains(&format!("`````md\n{}\n`````\n", body)));
    }

    #[test]
    fn test_fence_for() {
        assert_eq!(fence_for(b"plain"), "```");
        assert_eq!(fence_for(b"inline `code`"), "```");
        assert_eq!(fence_for(b"```"), "````");
        assert_eq!(fence_for(b"a ````` b"), "``````");
    }

    #[test]
    fn test_control_characters_in_names() {
        let tree = root(vec![
            dir("odd\tdir", vec![text("odd\tdir/a\nb.txt", "x")]),
            text("plain \"q\".txt", "y"),
        ]);

        let output = render(config(), &tree);
        assert!(output.contains("├── odd\\tdir\n│   └── a\\nb.txt\n"));
        assert!(output.contains("\n# odd\\tdir/a\\nb.txt\n\n```txt\nx\n```\n"));
        assert!(output.contains("└── plain \"q\".txt\n"));
        assert_eq!(escape_controls("a\u{1b}b"), "a\\u{1b}b");
        assert!(matches!(escape_controls("lib.rs"), Cow::Borrowed("lib.rs")));
    }

    #[test]
    fn test_language_for() {
        assert_eq!(language_for("main.rs"), "rs");
        assert_eq!(language_for("archive.tar.gz"), "gz");
        assert_eq!(language_for("Makefile"), "txt");
        assert_eq!(language_for(".bashrc"), "txt");
    }

    #[test]
    fn test_raw_fence_style() {
        let mut config = config();
        config.fence = FenceStyle::Raw;
        let tree = root(vec![text("a.txt", "hello")]);

        let output = render(config, &tree);
        assert!(output.ends_with("\n# a.txt\n\nhello\n"));
        assert!(!output.contains("```"));
    }

    #[test]
    fn test_binary_policies() {
        let omitted = || {
            root(vec![
                file("logo.png", FileContent::BinaryOmitted { size: 2048 }),
                text("z.txt", "z"),
            ])
        };

        let output = render(config(), &omitted());
        assert!(output.contains("# logo.png\n\n[Binary file omitted: logo.png (2.00 KB)]\n"));

        let mut skip = config();
        skip.binary_policy = BinaryPolicy::Skip;
        let output = render(skip, &omitted());
        assert!(output.contains("├── logo.png"));
        assert!(!output.contains("# logo.png"));
        assert!(output.contains("# z.txt"));

        let mut include = config();
        include.binary_policy = BinaryPolicy::Include;
        let tree = root(vec![file("blob.bin", FileContent::Binary(vec![0xff, 0x00, 0xfe]))]);
        let bytes = MarkdownWriter::new(include).render_to_vec(&tree);
        let needle: Vec<u8> = [&b"```bin\n"[..], &[0xff, 0x00, 0xfe][..], &b"\n```\n"[..]].concat();
        assert!(bytes.windows(needle.len()).any(|w| w == needle.as_slice()));
    }

    #[test]
    fn test_filesystem_root_name() {
        let tree = DirectoryNode::new(String::new(), PathBuf::new());
        assert_eq!(render(config(), &tree), "# Project Structure\n/\n");
    }

    #[test]
    fn test_write_creates_parent_and_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("nested").join("out").join("pack.md");
        let tree = root(vec![text("a.txt", "first")]);

        let writer = MarkdownWriter::new(Config::new(".", OutputTarget::File(target.clone())));
        writer.write(&tree).unwrap();
        assert!(fs::read_to_string(&target).unwrap().contains("first"));

        let tree = root(vec![text("a.txt", "second")]);
        writer.write(&tree).unwrap();
        let content = fs::read_to_string(&target).unwrap();
        assert!(content.contains("second"));
        assert!(!content.contains("first"));

        // Only the document remains, no temp files
        let entries = fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }
}

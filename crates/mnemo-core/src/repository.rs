use std::path::{Path, PathBuf};

use crate::error::{MnemoError, Result};
use crate::model::Dialect;
use crate::vfs::FileSystem;

/// Markdown file extension handled by scans.
pub const OUTLINE_EXTENSION: &str = "md";

/// Subdirectory holding documents in a native-layout repository.
pub const MEMORY_DIR: &str = "memory";

/// Stencil subdirectories of a native-layout repository.
pub const NOTE_STENCILS_DIR: &str = "stencils/notes";
pub const OUTLINE_STENCILS_DIR: &str = "stencils/outlines";

/// How a repository path is accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// A directory tree of documents.
    Tree,
    /// One single Markdown file.
    SingleFile,
}

/// A classified repository location.
///
/// The dialect recorded here is only a *hint*: a plain-Markdown file
/// without metadata is indistinguishable from a not-yet-written native
/// document, so the authoritative dialect is known only after each file is
/// parsed.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    dialect: Dialect,
    access: AccessMode,
    single_file: Option<String>,
    read_only: bool,
}

/// File sets produced by one scan. Purely derived; rebuilt on every scan.
#[derive(Debug, Default)]
pub struct RepositoryScan {
    pub outline_files: Vec<PathBuf>,
    pub note_stencil_files: Vec<PathBuf>,
    pub outline_stencil_files: Vec<PathBuf>,
}

impl Repository {
    /// Classify a filesystem path into a repository descriptor.
    ///
    /// A regular file becomes a single-file repository rooted at its
    /// parent directory. A directory is a native-layout tree when it has a
    /// `memory/` subdirectory, otherwise a plain tree of documents rooted
    /// at the directory itself.
    pub fn classify(fs: &dyn FileSystem, path: &Path) -> Result<Repository> {
        if !fs.exists(path) {
            return Err(MnemoError::NotFound(path.to_path_buf()));
        }

        if fs.is_file(path) {
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf();
            let single_file = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            return Ok(Repository {
                root,
                dialect: Dialect::Native,
                access: AccessMode::SingleFile,
                single_file: Some(single_file),
                read_only: false,
            });
        }

        let dialect = if fs.is_dir(&path.join(MEMORY_DIR)) {
            Dialect::Native
        } else {
            Dialect::Markdown
        };
        Ok(Repository {
            root: path.to_path_buf(),
            dialect,
            access: AccessMode::Tree,
            single_file: None,
            read_only: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn single_file(&self) -> Option<&str> {
        self.single_file.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Dialect hint handed to the parser.
    ///
    /// Documents in a native tree default to Native (re-saving writes
    /// metadata, nothing gets lost); plain trees and yet-unclassified
    /// single files default to Markdown. Actual metadata in a file
    /// overrides the hint either way.
    pub fn parse_hint(&self) -> Dialect {
        match (self.access, self.dialect) {
            (AccessMode::Tree, Dialect::Native) => Dialect::Native,
            _ => Dialect::Markdown,
        }
    }

    /// Enumerate document and stencil files for this repository.
    pub fn scan(&self, fs: &dyn FileSystem) -> RepositoryScan {
        match self.access {
            AccessMode::SingleFile => {
                let file = self
                    .single_file
                    .as_ref()
                    .map(|name| self.root.join(name))
                    .into_iter()
                    .collect();
                RepositoryScan {
                    outline_files: file,
                    ..Default::default()
                }
            }
            AccessMode::Tree => match self.dialect {
                Dialect::Native => RepositoryScan {
                    outline_files: fs
                        .list_files(&self.root.join(MEMORY_DIR), OUTLINE_EXTENSION),
                    note_stencil_files: fs
                        .list_files(&self.root.join(NOTE_STENCILS_DIR), OUTLINE_EXTENSION),
                    outline_stencil_files: fs
                        .list_files(&self.root.join(OUTLINE_STENCILS_DIR), OUTLINE_EXTENSION),
                },
                Dialect::Markdown => RepositoryScan {
                    outline_files: fs.list_files(&self.root, OUTLINE_EXTENSION),
                    ..Default::default()
                },
            },
        }
    }

    /// Compute the shortest reference from `source` to `target`.
    ///
    /// `target` is `path`, `path#anchor` or a bare `#anchor`. Same-file
    /// references degrade to the anchor (or the file name); targets
    /// outside the repository root are returned untouched — cross-repository
    /// links are never relativized. In single-file mode only same-file and
    /// same-directory targets relativize, there is no hierarchy to climb.
    pub fn relativize(&self, source: &str, target: &str) -> String {
        let (target_path, anchor) = match target.split_once('#') {
            Some((path, anchor)) => (path, Some(anchor)),
            None => (target, None),
        };

        // Bare anchor: a same-file reference already.
        if target_path.is_empty() {
            return match anchor {
                Some(a) if !a.is_empty() => format!("#{}", a),
                _ => String::new(),
            };
        }

        // Identical file: the anchor alone, or the bare file name.
        if source == target_path {
            return match anchor {
                Some(a) if !a.is_empty() => format!("#{}", a),
                _ => file_name_of(target_path),
            };
        }

        // Cross-repository targets stay absolute, untouched.
        if !Path::new(target_path).starts_with(&self.root) {
            return target.to_string();
        }

        if self.access == AccessMode::SingleFile {
            // No enclosing hierarchy to climb; only a sibling in the same
            // directory can be referenced relatively.
            let same_dir = Path::new(source).parent() == Path::new(target_path).parent();
            if !same_dir {
                return target.to_string();
            }
            return with_anchor(file_name_of(target_path), anchor);
        }

        let Some(source_dir) = Path::new(source).parent() else {
            return target.to_string();
        };
        let relative = relative_path(source_dir, Path::new(target_path));
        with_anchor(relative, anchor)
    }
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

fn with_anchor(path: String, anchor: Option<&str>) -> String {
    match anchor {
        Some(a) if !a.is_empty() => format!("{}#{}", path, a),
        _ => path,
    }
}

/// Standard ancestor-chain climbing: `../` for every directory left from
/// `from_dir`, then the remaining target segments.
fn relative_path(from_dir: &Path, to: &Path) -> String {
    let from: Vec<_> = from_dir.components().collect();
    let to: Vec<_> = to.components().collect();

    let mut common = 0;
    while common < from.len() && common < to.len() && from[common] == to[common] {
        common += 1;
    }

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from.len() {
        segments.push("..".to_string());
    }
    for component in &to[common..] {
        segments.push(component.as_os_str().to_string_lossy().to_string());
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::PhysicalFileSystem;
    use std::fs;
    use tempfile::TempDir;

    fn native_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("memory")).unwrap();
        fs::create_dir_all(dir.path().join("stencils/notes")).unwrap();
        fs::create_dir_all(dir.path().join("stencils/outlines")).unwrap();
        let repo = Repository::classify(&PhysicalFileSystem, dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_classify_missing_path() {
        let err = Repository::classify(&PhysicalFileSystem, Path::new("/no/such/path-xyz"))
            .unwrap_err();
        assert!(matches!(err, MnemoError::NotFound(_)));
    }

    #[test]
    fn test_classify_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.md");
        fs::write(&file, "# Notes\n").unwrap();

        let repo = Repository::classify(&PhysicalFileSystem, &file).unwrap();
        assert_eq!(repo.access(), AccessMode::SingleFile);
        assert_eq!(repo.root(), dir.path());
        assert_eq!(repo.single_file(), Some("notes.md"));
        assert_eq!(repo.dialect(), Dialect::Native, "default hint before parsing");
        assert_eq!(repo.parse_hint(), Dialect::Markdown, "unclassified single file parses plain");
    }

    #[test]
    fn test_classify_native_and_plain_trees() {
        let (dir, repo) = native_repo();
        assert_eq!(repo.access(), AccessMode::Tree);
        assert_eq!(repo.dialect(), Dialect::Native);
        assert_eq!(repo.parse_hint(), Dialect::Native);
        assert_eq!(repo.root(), dir.path());

        let plain = TempDir::new().unwrap();
        let repo = Repository::classify(&PhysicalFileSystem, plain.path()).unwrap();
        assert_eq!(repo.dialect(), Dialect::Markdown);
        assert_eq!(repo.parse_hint(), Dialect::Markdown);
        assert_eq!(repo.root(), plain.path());
    }

    #[test]
    fn test_scan_native_tree_partitions_files() {
        let (dir, repo) = native_repo();
        fs::write(dir.path().join("memory/a.md"), "# A\n").unwrap();
        fs::write(dir.path().join("memory/b.md"), "# B\n").unwrap();
        fs::write(dir.path().join("memory/skip.txt"), "nope").unwrap();
        fs::write(dir.path().join("stencils/notes/n-s.md"), "## N\n").unwrap();
        fs::write(dir.path().join("stencils/outlines/o-s.md"), "# O\n").unwrap();

        let scan = repo.scan(&PhysicalFileSystem);
        assert_eq!(scan.outline_files.len(), 2);
        assert_eq!(scan.note_stencil_files.len(), 1);
        assert_eq!(scan.outline_stencil_files.len(), 1);
        assert!(scan.outline_files[0] < scan.outline_files[1], "scan order is deterministic");
    }

    #[test]
    fn test_scan_plain_tree_and_single_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.md"), "# One\n").unwrap();
        fs::write(dir.path().join("two.md"), "# Two\n").unwrap();

        let repo = Repository::classify(&PhysicalFileSystem, dir.path()).unwrap();
        let scan = repo.scan(&PhysicalFileSystem);
        assert_eq!(scan.outline_files.len(), 2);
        assert!(scan.note_stencil_files.is_empty());

        let single = Repository::classify(&PhysicalFileSystem, &dir.path().join("one.md")).unwrap();
        let scan = single.scan(&PhysicalFileSystem);
        assert_eq!(scan.outline_files, vec![dir.path().join("one.md")]);
        assert!(scan.outline_stencil_files.is_empty());
    }

    fn tree_repo_at(root: &str) -> Repository {
        Repository {
            root: PathBuf::from(root),
            dialect: Dialect::Native,
            access: AccessMode::Tree,
            single_file: None,
            read_only: false,
        }
    }

    #[test]
    fn test_relativize_same_directory() {
        let repo = tree_repo_at("/r");
        assert_eq!(
            repo.relativize("/r/memory/src.md", "/r/memory/dst.md"),
            "dst.md"
        );
    }

    #[test]
    fn test_relativize_same_file_degrades_to_anchor() {
        let repo = tree_repo_at("/r");
        assert_eq!(
            repo.relativize("/r/memory/f.md", "/r/memory/f.md#n1"),
            "#n1"
        );
        assert_eq!(repo.relativize("/r/memory/f.md", "/r/memory/f.md"), "f.md");
        assert_eq!(repo.relativize("/r/memory/f.md", "#n1"), "#n1");
    }

    #[test]
    fn test_relativize_climbs_ancestors() {
        let repo = tree_repo_at("/r");
        assert_eq!(
            repo.relativize("/r/memory/deep/src.md", "/r/memory/dst.md"),
            "../dst.md"
        );
        assert_eq!(
            repo.relativize("/r/memory/src.md", "/r/memory/deep/dst.md#a"),
            "deep/dst.md#a"
        );
        assert_eq!(
            repo.relativize("/r/memory/a/src.md", "/r/memory/b/dst.md"),
            "../b/dst.md"
        );
    }

    #[test]
    fn test_relativize_outside_repository_is_untouched() {
        let repo = tree_repo_at("/r");
        assert_eq!(
            repo.relativize("/r/memory/src.md", "/elsewhere/doc.md"),
            "/elsewhere/doc.md"
        );
        assert_eq!(
            repo.relativize("/r/memory/src.md", "/elsewhere/doc.md#sec"),
            "/elsewhere/doc.md#sec"
        );
        // filesystem root is a defensive passthrough, not a designed case
        assert_eq!(repo.relativize("/r/memory/src.md", "/"), "/");
    }

    #[test]
    fn test_relativize_degenerate_empty_inputs() {
        let repo = tree_repo_at("/r");
        assert_eq!(repo.relativize("", ""), "");
    }

    #[test]
    fn test_relativize_single_file_mode() {
        let repo = Repository {
            root: PathBuf::from("/dir"),
            dialect: Dialect::Native,
            access: AccessMode::SingleFile,
            single_file: Some("f.md".to_string()),
            read_only: false,
        };

        assert_eq!(repo.relativize("/dir/f.md", "/dir/f.md#n"), "#n");
        assert_eq!(repo.relativize("/dir/f.md", "/dir/other.md"), "other.md");
        // no enclosing hierarchy to climb: anything deeper stays absolute
        assert_eq!(
            repo.relativize("/dir/f.md", "/dir/sub/other.md"),
            "/dir/sub/other.md"
        );
    }
}

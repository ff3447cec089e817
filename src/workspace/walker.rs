use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tokio_util::sync::CancellationToken;
use walkdir::{DirEntry, WalkDir};

use super::WorkspaceError;

const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "java", "cpp", "c", "h", "cs", "go", "rs", "php", "rb", "swift", "kt",
];

const IGNORED_DIRS: &[&str] = &["node_modules", "__pycache__", "venv", "env", "target"];

const SEPARATOR_WIDTH: usize = 50;

/// Bounds for a directory walk.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkLimits {
    pub max_depth: usize,
    pub max_files: usize,
    pub max_file_bytes: usize,
    pub max_total_bytes: usize,
    pub max_listing_entries: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_files: 200,
            max_file_bytes: 64 * 1024,
            max_total_bytes: 512 * 1024,
            max_listing_entries: 1000,
        }
    }
}

/// Read-only, bounded walk over a directory that renders a multi-file payload.
#[derive(Debug, Clone, Default)]
pub struct DirectoryWalker {
    limits: WalkLimits,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    cancel: Option<CancellationToken>,
}

/// Rendered directory plus what the walk skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectorySnapshot {
    pub rendered: String,
    pub files_included: usize,
    pub truncated: bool,
}

impl DirectoryWalker {
    pub fn new(limits: WalkLimits) -> Self {
        Self {
            limits,
            include: Vec::new(),
            exclude: Vec::new(),
            cancel: None,
        }
    }

    /// Restrict content to files matching any include pattern and none of the
    /// exclude patterns. Patterns match the path relative to the walk root.
    pub fn with_patterns(
        mut self,
        include: &[String],
        exclude: &[String],
    ) -> Result<Self, WorkspaceError> {
        self.include = compile(include)?;
        self.exclude = compile(exclude)?;
        Ok(self)
    }

    /// Abandon the walk with [`WorkspaceError::Cancelled`] once `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn limits(&self) -> &WalkLimits {
        &self.limits
    }

    pub fn snapshot(&self, root: &Path) -> Result<DirectorySnapshot, WorkspaceError> {
        if !root.exists() {
            return Err(WorkspaceError::NotFound(root.display().to_string()));
        }
        if !root.is_dir() {
            return Err(WorkspaceError::NotADirectory(root.display().to_string()));
        }

        let mut rendered = format!("Directory: {}\n\nDirectory Structure:\n", root.display());
        let mut truncated = false;
        let mut files: Vec<(String, PathBuf)> = Vec::new();
        let mut more_files = false;
        let mut listed = 0;

        let walk = WalkDir::new(root)
            .max_depth(self.limits.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored(e));

        // Listing and file selection share one pass that stops at the listing cap.
        for entry in walk {
            self.check_cancelled()?;
            let Ok(entry) = entry else { continue };
            if listed == self.limits.max_listing_entries {
                rendered.push_str("  ... (listing truncated)\n");
                truncated = true;
                break;
            }
            listed += 1;

            let indent = "  ".repeat(entry.depth());
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() {
                let _ = writeln!(rendered, "{}{}/", indent, name);
                continue;
            }
            let _ = writeln!(rendered, "{}{}", indent, name);

            if !entry.file_type().is_file() {
                continue;
            }
            let relative = relative_path(root, entry.path());
            if !self.wants(&relative, entry.path()) {
                continue;
            }
            if files.len() == self.limits.max_files {
                more_files = true;
            } else {
                files.push((relative, entry.into_path()));
            }
        }

        let _ = write!(
            rendered,
            "\n{}\n\nCode Files Content:\n\n",
            "=".repeat(SEPARATOR_WIDTH)
        );

        let mut files_included = 0;
        let mut total_bytes = 0;
        for (relative, path) in &files {
            self.check_cancelled()?;
            if total_bytes >= self.limits.max_total_bytes {
                more_files = true;
                break;
            }

            let budget = self
                .limits
                .max_file_bytes
                .min(self.limits.max_total_bytes - total_bytes);
            let _ = writeln!(rendered, "--- {} ---", relative);
            match read_prefix(path, budget) {
                Some((body, cut)) => {
                    rendered.push_str(&body);
                    if cut {
                        truncated = true;
                        rendered.push_str("\n... (file truncated)");
                    }
                    total_bytes += body.len();
                }
                None => rendered.push_str("(binary file or permission denied)"),
            }
            rendered.push_str("\n\n");
            files_included += 1;
        }

        if more_files {
            truncated = true;
            rendered.push_str("... (file limit reached, remaining files omitted)\n");
        }

        tracing::debug!(
            root = %root.display(),
            files_included,
            total_bytes,
            truncated,
            "Directory snapshot taken"
        );

        Ok(DirectorySnapshot {
            rendered,
            files_included,
            truncated,
        })
    }

    fn check_cancelled(&self) -> Result<(), WorkspaceError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(WorkspaceError::Cancelled),
            _ => Ok(()),
        }
    }

    fn wants(&self, relative: &str, path: &Path) -> bool {
        if self.exclude.iter().any(|p| matches(p, relative)) {
            return false;
        }
        if !self.include.is_empty() {
            return self.include.iter().any(|p| matches(p, relative));
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| CODE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, WorkspaceError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| WorkspaceError::InvalidPattern {
                pattern: p.clone(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

/// A pattern matches either the relative path or the bare file name.
fn matches(pattern: &Pattern, relative: &str) -> bool {
    let file_name = relative.rsplit('/').next().unwrap_or(relative);
    pattern.matches(relative) || pattern.matches(file_name)
}

fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && IGNORED_DIRS.contains(&name.as_ref())
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read at most `max` bytes of a file as text. The flag is set when the file
/// is longer than `max`. `None` means unreadable or not UTF-8.
pub(crate) fn read_prefix(path: &Path, max: usize) -> Option<(String, bool)> {
    let len = std::fs::metadata(path).ok()?.len();
    let mut bytes = Vec::with_capacity(max.min(len as usize));
    File::open(path)
        .ok()?
        .take(max as u64)
        .read_to_end(&mut bytes)
        .ok()?;
    let cut = len > bytes.len() as u64;
    decode_prefix(bytes, cut).map(|text| (text, cut))
}

/// Decode bytes as UTF-8. When the bytes were cut short, a character split at
/// the end is dropped rather than treated as binary.
fn decode_prefix(mut bytes: Vec<u8>, cut: bool) -> Option<String> {
    match std::str::from_utf8(&bytes) {
        Ok(_) => {}
        Err(e) if cut && e.error_len().is_none() => bytes.truncate(e.valid_up_to()),
        Err(_) => return None,
    }
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn split_character_at_the_cut_is_dropped() {
        let bytes = "héllo".as_bytes()[..2].to_vec();
        assert_eq!(decode_prefix(bytes, true).as_deref(), Some("h"));
    }

    #[test]
    fn invalid_utf8_is_binary() {
        assert_eq!(decode_prefix(vec![0xff, 0xfe, b'a'], true), None);
        assert_eq!(decode_prefix(vec![b'a', 0xc3], false), None);
    }

    #[test]
    fn reads_only_the_prefix_of_a_large_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bundle.js");
        fs::write(&path, "é".repeat(10_000)).unwrap();

        let (text, cut) = read_prefix(&path, 101).unwrap();
        assert!(cut);
        assert_eq!(text, "é".repeat(50));
    }

    #[test]
    fn small_file_is_read_whole() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.py");
        fs::write(&path, "x = 1\n").unwrap();
        assert_eq!(read_prefix(&path, 64), Some(("x = 1\n".to_string(), false)));
    }

    #[test]
    fn listing_stops_at_the_entry_cap() {
        let dir = TempDir::new().unwrap();
        for i in 0..50 {
            fs::write(dir.path().join(format!("f{:02}.py", i)), "pass\n").unwrap();
        }
        let walker = DirectoryWalker::new(WalkLimits {
            max_listing_entries: 10,
            ..WalkLimits::default()
        });
        let snapshot = walker.snapshot(dir.path()).unwrap();

        assert!(snapshot.truncated);
        assert!(snapshot.rendered.contains("... (listing truncated)"));
        // The root itself takes one listing slot.
        assert_eq!(snapshot.files_included, 9);
        assert!(snapshot.rendered.contains("--- f08.py ---"));
        assert!(!snapshot.rendered.contains("f09.py"));
    }

    #[test]
    fn cancelled_walk_stops() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "pass\n").unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let walker = DirectoryWalker::default().with_cancellation(token);
        assert!(matches!(
            walker.snapshot(dir.path()),
            Err(WorkspaceError::Cancelled)
        ));
    }

    #[test]
    fn patterns_match_relative_path_or_file_name() {
        let pattern = Pattern::new("*.rs").unwrap();
        assert!(matches(&pattern, "src/lib.rs"));
        let pattern = Pattern::new("src/*.rs").unwrap();
        assert!(matches(&pattern, "src/lib.rs"));
        assert!(!matches(&pattern, "tests/lib.rs"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let result = DirectoryWalker::default().with_patterns(&["[".to_string()], &[]);
        assert!(matches!(result, Err(WorkspaceError::InvalidPattern { .. })));
    }
}

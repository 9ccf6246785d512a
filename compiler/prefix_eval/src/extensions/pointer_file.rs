//! `.prex` pointer files.
//!
//! One entry per line. Blank lines and lines starting with `!` are
//! skipped. An entry ending in `.prex` names another pointer file,
//! resolved against the directory of the file that mentions it; any other
//! entry names a library.

use std::io;
use std::path::{Path, PathBuf};

use super::ExtensionError;

const POINTER_SUFFIX: &str = ".prex";

/// A library named by a pointer file, with where it was named.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointerEntry {
    pub target: String,
    pub source: PathBuf,
    /// 1-based.
    pub line: usize,
}

/// Entries of one pointer file, as `(line, entry)` pairs.
pub fn parse_pointer_file(text: &str) -> Vec<(usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('!'))
        .collect()
}

/// Every library reachable from the pointer file at `path`, in file order.
pub fn collect_libraries(path: &Path) -> Result<Vec<PointerEntry>, ExtensionError> {
    collect_with(path, &|p| std::fs::read_to_string(p))
}

pub(super) fn collect_with(
    path: &Path,
    read: &dyn Fn(&Path) -> io::Result<String>,
) -> Result<Vec<PointerEntry>, ExtensionError> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    walk(path, read, &mut stack, &mut out)?;
    Ok(out)
}

fn walk(
    path: &Path,
    read: &dyn Fn(&Path) -> io::Result<String>,
    stack: &mut Vec<PathBuf>,
    out: &mut Vec<PointerEntry>,
) -> Result<(), ExtensionError> {
    let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if stack.contains(&key) {
        return Err(ExtensionError::PointerCycle(path.to_path_buf()));
    }
    let text = read(path).map_err(|source| ExtensionError::PointerFile {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "reading pointer file");

    stack.push(key);
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for (line, entry) in parse_pointer_file(&text) {
        if entry.ends_with(POINTER_SUFFIX) {
            let nested = base.join(entry);
            walk(&nested, read, stack, out).map_err(|e| ExtensionError::InPointerFile {
                path: path.to_path_buf(),
                line,
                source: Box::new(e),
            })?;
        } else {
            out.push(PointerEntry {
                target: entry.to_owned(),
                source: path.to_path_buf(),
                line,
            });
        }
    }
    stack.pop();
    Ok(())
}

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::engine_warn;
use walkdir::WalkDir;

/// Immediate subdirectories of `root`, sorted in ascending folder-name order
/// (numeric when both names are purely numeric, lexical otherwise).
pub fn immediate_subdirs(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    sort_dirs(&mut dirs);
    Ok(dirs)
}

/// All files named `filename` anywhere under `root`, sorted by their parent
/// directory name. Unreadable entries are skipped with a warning.
pub fn find_named_files(root: &Path, filename: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                engine_warn!("Skipping unreadable entry under {:?}: {}", root, err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == filename)
        .map(|entry| entry.into_path())
        .collect();
    files.sort_by(|a, b| compare_paths(a, b));
    files
}

/// Directories under `root` (including `root` itself) that directly contain a
/// file named `filename`, in ascending folder-name order.
pub fn dirs_containing(root: &Path, filename: &str) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = find_named_files(root, filename)
        .into_iter()
        .filter_map(|file| file.parent().map(Path::to_path_buf))
        .collect();
    dirs.dedup();
    sort_dirs(&mut dirs);
    dirs
}

fn sort_dirs(dirs: &mut [PathBuf]) {
    dirs.sort_by(|a, b| compare_paths(a, b));
}

/// Componentwise path comparison: year-style numeric folder names order
/// numerically ("9" before "10"), anything else lexically.
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    let mut left = a.components();
    let mut right = b.components();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_folder_names(
                    &x.as_os_str().to_string_lossy(),
                    &y.as_os_str().to_string_lossy(),
                );
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Numeric-aware name comparison used for job start order.
pub fn compare_folder_names(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_names_compare_numerically() {
        assert_eq!(compare_folder_names("9", "10"), Ordering::Less);
        assert_eq!(compare_folder_names("2019", "2020"), Ordering::Less);
    }

    #[test]
    fn mixed_names_compare_lexically() {
        assert_eq!(compare_folder_names("10a", "9"), Ordering::Less);
        assert_eq!(compare_folder_names("alpha", "beta"), Ordering::Less);
    }
}

//! Discovering zone files in a directory tree.
//!
//! [`scan_dir`] walks a directory recursively and adds every regular file
//! whose name ends in [`ZONE_SUFFIX`] to a [`PathList`]. The whole tree is
//! flattened into the one list. Problems with individual directories or
//! entries are logged and skipped; they never end the scan.

use std::path::Path;

use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::pathlist::PathList;

//------------ Constants -----------------------------------------------------

/// The file name suffix of zone files.
pub const ZONE_SUFFIX: &str = ".zone";

/// The file name suffix of configuration files.
pub const CONF_SUFFIX: &str = ".conf";

/// How many directory levels below the root are visited at most.
pub const MAX_SCAN_DEPTH: usize = 64;

//------------ scan_dir ------------------------------------------------------

/// Adds all zone files found below `root` to `list`.
///
/// Symbolic links are followed. Only regular files are added, so FIFOs,
/// sockets, and device nodes are skipped whatever their name. A link that
/// leads back to one of its own ancestors is reported and not followed.
///
/// Returns the number of files that were added.
pub fn scan_dir(root: &Path, list: &mut PathList) -> usize {
    let before = list.file_count();
    for entry in walk(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                match err.loop_ancestor() {
                    Some(ancestor) => warn!(
                        path = %err.path().unwrap_or(root).display(),
                        "symlink loop back to {}, skipping",
                        ancestor.display()
                    ),
                    None => warn!(dir = %root.display(), "{err}"),
                }
                continue;
            }
        };

        let staged = list.stage(entry.path());
        if entry.file_type().is_file()
            && has_suffix(entry.file_name(), ZONE_SUFFIX)
        {
            trace!(path = %staged.path().display(), "added");
            staged.commit();
        } else {
            staged.discard();
        }
    }
    let added = list.file_count() - before;
    debug!(dir = %root.display(), added, "scanned directory");
    added
}

//------------ has_zone_content ----------------------------------------------

/// Returns whether a directory tree contains zone or configuration files.
///
/// This only looks at names. The first entry ending in [`ZONE_SUFFIX`] or
/// [`CONF_SUFFIX`] anywhere in the tree ends the search.
pub fn has_zone_content(dir: &Path) -> bool {
    walk(dir).min_depth(1).into_iter().filter_map(Result::ok).any(|entry| {
        has_suffix(entry.file_name(), ZONE_SUFFIX)
            || has_suffix(entry.file_name(), CONF_SUFFIX)
    })
}

/// Creates the walker used for all scans.
fn walk(root: &Path) -> WalkDir {
    WalkDir::new(root)
        .follow_links(true)
        .max_depth(MAX_SCAN_DEPTH)
}

//------------ Helpers -------------------------------------------------------

/// Returns whether a file name ends in the given suffix.
///
/// Names that aren't valid Unicode are compared by their lossy form, which
/// is fine for the ASCII suffixes we use.
pub(crate) fn has_suffix(name: &std::ffi::OsStr, suffix: &str) -> bool {
    name.to_string_lossy().ends_with(suffix)
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;
    use std::ffi::OsStr;
    use std::fs;
    use std::path::PathBuf;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn suffix() {
        assert!(has_suffix(OsStr::new("example.com.zone"), ZONE_SUFFIX));
        assert!(has_suffix(OsStr::new(".zone"), ZONE_SUFFIX));
        assert!(!has_suffix(OsStr::new("zone"), ZONE_SUFFIX));
        assert!(!has_suffix(OsStr::new("example.zone.bak"), ZONE_SUFFIX));
    }

    #[test]
    fn finds_zone_files_in_whole_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("a.zone"), "");
        touch(&root.join("notes.txt"), "");
        touch(&root.join("sub/b.zone"), "");
        touch(&root.join("sub/deeper/c.zone"), "");
        touch(&root.join("sub/deeper/d.zone.orig"), "");
        fs::create_dir_all(root.join("empty")).unwrap();
        // A directory with the suffix is descended into, not added.
        touch(&root.join("dir.zone/e.zone"), "");

        let mut list = PathList::new();
        assert_eq!(scan_dir(root, &mut list), 4);

        let found: HashSet<PathBuf> = list.iter().cloned().collect();
        let expected: HashSet<PathBuf> = [
            "a.zone",
            "sub/b.zone",
            "sub/deeper/c.zone",
            "dir.zone/e.zone",
        ]
        .iter()
        .map(|name| root.join(name))
        .collect();
        assert_eq!(found, expected);
        assert_eq!(list.file_count(), found.len());

        let encoded: usize = list.iter().map(|p| PathList::entry_len(p)).sum();
        assert_eq!(list.encoded_len(), encoded);
    }

    #[test]
    fn missing_directory_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let mut list = PathList::new();
        list.push("keep.zone");
        assert_eq!(scan_dir(&tmp.path().join("missing"), &mut list), 0);
        assert_eq!(list.file_count(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn symlink_loops_are_not_followed() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("a.zone"), "");
        touch(&root.join("sub/b.zone"), "");
        std::os::unix::fs::symlink(".", root.join("loop")).unwrap();
        std::os::unix::fs::symlink("..", root.join("sub/up")).unwrap();

        let mut list = PathList::new();
        assert_eq!(scan_dir(root, &mut list), 2);
        let found: HashSet<PathBuf> = list.iter().cloned().collect();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&root.join("a.zone")));
        assert!(found.contains(&root.join("sub/b.zone")));
    }

    #[test]
    #[cfg(unix)]
    fn symlinked_files_are_followed() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("data/real.txt"), "");
        std::os::unix::fs::symlink(
            root.join("data/real.txt"),
            root.join("linked.zone"),
        )
        .unwrap();

        let mut list = PathList::new();
        assert_eq!(scan_dir(root, &mut list), 1);
        assert_eq!(list.get(0), Some(root.join("linked.zone").as_path()));
    }

    #[test]
    #[cfg(unix)]
    fn only_regular_files_are_added() {
        use std::os::unix::net::UnixListener;

        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("a.zone"), "");
        let _socket = UnixListener::bind(root.join("control.zone")).unwrap();

        let mut list = PathList::new();
        assert_eq!(scan_dir(root, &mut list), 1);
        assert_eq!(list.get(0), Some(root.join("a.zone").as_path()));
    }

    #[test]
    fn zone_content() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("plain/readme.txt"), "");
        assert!(!has_zone_content(root));

        touch(&root.join("nested/deep/server.conf"), "");
        assert!(has_zone_content(root));
        assert!(!has_zone_content(&root.join("plain")));
        assert!(!has_zone_content(&root.join("missing")));
    }
}

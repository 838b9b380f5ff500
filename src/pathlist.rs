//! The list of zone files discovered for loading.
//!
//! A [`PathList`] is an ordered list of paths together with the number of
//! octets the list would occupy in its packed form: every path followed by
//! a single NUL terminator, with the whole list closed by one additional
//! NUL. Chunking the list for the load workers happens along these octet
//! offsets so that work is divided by the length of the names rather than
//! just their number.
//!
//! Paths are added in two phases. A candidate is first [staged][PathList::stage]
//! and then either [committed][Staged::commit] or
//! [discarded][Staged::discard]. Only committed paths become part of the
//! list.

use std::path::{Path, PathBuf};
use std::slice;

//------------ PathList ------------------------------------------------------

/// An ordered list of zone file paths.
#[derive(Clone, Debug, Default)]
pub struct PathList {
    /// The committed paths in the order they were added.
    paths: Vec<PathBuf>,

    /// The length of the packed encoding without the list terminator.
    encoded_len: usize,
}

impl PathList {
    /// Creates a new, empty list.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a path to the end of the list.
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.stage(path).commit()
    }

    /// Stages a candidate path.
    ///
    /// The path becomes part of the list only once the returned value is
    /// committed. Dropping it has the same effect as discarding it.
    pub fn stage(&mut self, path: impl Into<PathBuf>) -> Staged<'_> {
        Staged {
            list: self,
            path: path.into(),
        }
    }

    /// Returns the number of paths in the list.
    pub fn file_count(&self) -> usize {
        self.paths.len()
    }

    /// Returns whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Returns the length of the packed encoding of the list.
    ///
    /// This is the sum of the length of all paths plus one terminator for
    /// each of them. The final list terminator is not included.
    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    /// Returns the path at the given position.
    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Returns the paths as a slice.
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Returns an iterator over the paths in the list.
    pub fn iter(&self) -> slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    /// Returns the packed encoding of the list.
    ///
    /// Each path is followed by a NUL octet and the list as a whole is
    /// terminated by a second NUL octet.
    #[cfg(unix)]
    pub fn to_packed(&self) -> Vec<u8> {
        use std::os::unix::ffi::OsStrExt;

        let mut res = Vec::with_capacity(self.encoded_len + 1);
        for path in &self.paths {
            res.extend_from_slice(path.as_os_str().as_bytes());
            res.push(0);
        }
        res.push(0);
        res
    }

    /// Returns the length of a path inside the packed encoding.
    pub(crate) fn entry_len(path: &Path) -> usize {
        path.as_os_str().len() + 1
    }
}

impl<'a> IntoIterator for &'a PathList {
    type Item = &'a PathBuf;
    type IntoIter = slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//------------ Staged --------------------------------------------------------

/// A candidate path that has not yet been added to a list.
#[derive(Debug)]
#[must_use = "a staged path is discarded unless committed"]
pub struct Staged<'a> {
    list: &'a mut PathList,
    path: PathBuf,
}

impl<'a> Staged<'a> {
    /// Returns the candidate path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds the candidate to the list.
    pub fn commit(self) {
        self.list.encoded_len += PathList::entry_len(&self.path);
        self.list.paths.push(self.path);
    }

    /// Drops the candidate, returning the path.
    ///
    /// The list is left exactly as it was before the path was staged.
    pub fn discard(self) -> PathBuf {
        self.path
    }
}

//============ Tests =========================================================

//! Sizing the worker pool and dividing the work between workers.

use core::ops::Range;

use crate::pathlist::PathList;

//------------ pool_size_for -------------------------------------------------

/// Returns the number of load workers to use for the given number of files.
///
/// Each worker owns a complete parser session and spends most of its time
/// waiting for file I/O, so the number depends on the amount of work
/// rather than on the number of CPUs. A handful of workers keeps the disk
/// busy without swamping the catalog.
pub const fn pool_size_for(total_files: usize) -> usize {
    if total_files < 10 {
        1
    } else if total_files < 5000 {
        2
    } else {
        4
    }
}

//------------ Chunk ---------------------------------------------------------

/// A contiguous part of a [`PathList`] processed by a single worker.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Chunk {
    /// The range of list entries.
    pub entries: Range<usize>,

    /// The range of octets in the packed encoding of the list.
    ///
    /// The range always ends right after an entry terminator.
    pub bytes: Range<usize>,
}

impl Chunk {
    /// Returns the number of files in the chunk.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the paths of the chunk.
    pub fn paths<'a>(&self, list: &'a PathList) -> &'a [std::path::PathBuf] {
        &list.as_slice()[self.entries.clone()]
    }
}

//------------ partition -----------------------------------------------------

/// Divides a path list into at most `n` chunks of roughly equal size.
///
/// Each chunk aims for an equal share of the list's encoded length and is
/// then extended to the end of the entry the share ends in. Every chunk
/// therefore has at least one entry, and if the list runs out early fewer
/// than `n` chunks are returned. The length of the returned vec is the
/// number of workers to actually start. The last chunk always reaches the
/// end of the list.
pub fn partition(list: &PathList, n: usize) -> Vec<Chunk> {
    let mut res = Vec::with_capacity(n);
    if n == 0 {
        return res;
    }

    let paths = list.as_slice();
    let share = list.encoded_len() / n;
    let mut entry = 0;
    let mut offset = 0;

    while entry < paths.len() && res.len() < n {
        let start = (entry, offset);
        if res.len() + 1 == n {
            entry = paths.len();
            offset = list.encoded_len();
        } else {
            let goal = offset + share;
            while entry < paths.len() {
                // The position of this entry's terminator.
                let nul = offset + PathList::entry_len(&paths[entry]) - 1;
                offset = nul + 1;
                entry += 1;
                if nul >= goal {
                    break;
                }
            }
        }
        res.push(Chunk {
            entries: start.0..entry,
            bytes: start.1..offset,
        });
    }
    res
}

//============ Tests =========================================================

//! A single load worker.
//!
//! A worker takes the paths of one chunk and pushes the files one after
//! another through its own parser session. Files are read in blocks of
//! [`LoadContext::block_size`] octets so that memory use for reading does
//! not depend on the size of the file.
//!
//! A file that cannot be opened or read ends the worker: the remaining
//! files of the chunk are not processed and the worker reports
//! [`Status::Failure`]. Empty files are skipped.

use core::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, trace};

use crate::config::LoadContext;
use crate::parse::{ParserSession, SessionFactory};

//------------ Status --------------------------------------------------------

/// The outcome of a worker or of a whole load run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Status {
    /// Everything was loaded.
    #[default]
    Success,

    /// At least something went wrong.
    Failure,
}

impl Status {
    /// Returns whether this is a success.
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Combines two outcomes.
    ///
    /// The result is a failure if either of the two is.
    #[must_use]
    pub fn and(self, other: Status) -> Status {
        if self.is_success() {
            other
        } else {
            Status::Failure
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => f.write_str("success"),
            Status::Failure => f.write_str("failure"),
        }
    }
}

//------------ WorkerResult --------------------------------------------------

/// What a single worker achieved.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WorkerResult {
    /// The index of the worker.
    pub index: usize,

    /// The number of octets fed to the parser.
    pub bytes: u64,

    /// The number of files fed to the parser.
    pub files: usize,

    /// The number of empty files skipped.
    pub skipped: usize,

    /// How the worker ended.
    pub status: Status,
}

impl WorkerResult {
    /// Creates a new result for the worker with the given index.
    pub fn new(index: usize) -> Self {
        WorkerResult {
            index,
            ..Default::default()
        }
    }

    /// Creates the result of a worker that never got to work.
    pub fn failed(index: usize) -> Self {
        WorkerResult {
            index,
            status: Status::Failure,
            ..Default::default()
        }
    }
}

//------------ ingest --------------------------------------------------------

/// Runs one worker over the given paths.
pub fn ingest<F: SessionFactory>(
    index: usize,
    paths: &[PathBuf],
    ctx: &LoadContext,
    factory: &F,
) -> WorkerResult {
    let mut res = WorkerResult::new(index);
    debug!(worker = index, files = paths.len(), "worker starting");

    let mut session = factory.begin(ctx);
    let mut buf = vec![0u8; ctx.block_size.max(1)];

    for path in paths {
        match feed_file(path, ctx, &mut session, &mut buf, &mut res.bytes) {
            Ok(true) => res.files += 1,
            Ok(false) => {
                info!(path = %path.display(), "file is empty");
                res.skipped += 1;
            }
            Err(err) => {
                error!(worker = index, path = %path.display(), "{err}");
                res.status = Status::Failure;
                return res;
            }
        }
    }

    match session.end() {
        Ok(summary) => {
            debug!(
                worker = index,
                files = summary.files,
                records = summary.records,
                bytes = res.bytes,
                "worker done"
            );
        }
        Err(err) => {
            error!(worker = index, "{err}");
            res.status = Status::Failure;
        }
    }
    res
}

/// Feeds a single file to the session.
///
/// Every octet fed is added to `bytes`, even if reading fails later on.
/// Returns whether the file was fed at all. Empty files are not handed to
/// the session.
fn feed_file(
    path: &Path,
    ctx: &LoadContext,
    session: &mut impl ParserSession,
    buf: &mut [u8],
    bytes: &mut u64,
) -> Result<bool, io::Error> {
    trace!(path = %path.display(), "opening");
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size == 0 {
        return Ok(false);
    }
    trace!(path = %path.display(), size, "parsing");

    session.begin_again(path, &ctx.origin, ctx.default_ttl, size);
    feed_blocks(&mut file, session, buf, bytes)?;
    Ok(true)
}

/// Feeds everything a reader has to the session block by block.
fn feed_blocks(
    source: &mut impl Read,
    session: &mut impl ParserSession,
    buf: &mut [u8],
    bytes: &mut u64,
) -> Result<(), io::Error> {
    loop {
        let read = match source.read(buf) {
            Ok(0) => return Ok(()),
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        session.feed(&buf[..read]);
        *bytes += read as u64;
    }
}

//============ Tests =========================================================

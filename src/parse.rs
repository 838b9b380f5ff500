//! Parsing zone files into the catalog.
//!
//! Zone files are stateful: relative names, the last owner, the `$ORIGIN`
//! and the default TTL carry over from one entry to the next. A parser
//! session can therefore only ever be used by a single worker. Each worker
//! creates one session through a [`SessionFactory`] and then uses it for all
//! the files of its chunk:
//!
//! * [`ParserSession::begin_again`] starts a new file,
//! * [`ParserSession::feed`] hands over the file's content block by block,
//! * [`ParserSession::end`] finishes the session after the last file.
//!
//! [`ZonefileParser`] is the factory used in production. It scans files
//! with the in-place zonefile scanner of the `domain` crate and inserts the
//! records into a [`Catalog`].

use core::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use domain::base::Ttl;
use domain::zonefile::inplace::{Entry, Zonefile};
use tracing::{debug, error, trace, warn};

use crate::catalog::{Catalog, StoredName};
use crate::config::LoadContext;

//------------ Constants -----------------------------------------------------

/// How deeply `$INCLUDE` directives may be nested.
pub const MAX_INCLUDE_DEPTH: usize = 8;

//------------ SessionFactory ------------------------------------------------

/// Creates parser sessions for load workers.
///
/// The factory is shared by all workers of a load run while the sessions
/// it creates are owned by a single worker each.
pub trait SessionFactory: Sync {
    /// The type of session created by this factory.
    type Session: ParserSession;

    /// Creates the session for one worker.
    fn begin(&self, ctx: &LoadContext) -> Self::Session;
}

//------------ ParserSession -------------------------------------------------

/// A parser working its way through a sequence of zone files.
pub trait ParserSession {
    /// Resets the session for the next file.
    ///
    /// `file_size` is the size the file had when it was opened. Any
    /// content of a previous file that hasn't been processed yet is
    /// processed first.
    fn begin_again(
        &mut self,
        path: &Path,
        origin: &StoredName,
        default_ttl: Ttl,
        file_size: u64,
    );

    /// Feeds the next block of the current file.
    fn feed(&mut self, block: &[u8]);

    /// Finishes the session.
    ///
    /// Returns an error if any file processed by the session failed.
    fn end(&mut self) -> Result<SessionSummary, ParseError>;
}

//------------ SessionSummary ------------------------------------------------

/// What a parser session achieved.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SessionSummary {
    /// The number of files processed.
    pub files: usize,

    /// The number of records handed to the catalog.
    pub records: usize,
}

//------------ ZonefileParser ------------------------------------------------

/// A session factory scanning zone files into a catalog.
#[derive(Clone, Debug)]
pub struct ZonefileParser<C> {
    catalog: Arc<C>,
}

impl<C> ZonefileParser<C> {
    /// Creates a new parser for the given catalog.
    pub fn new(catalog: Arc<C>) -> Self {
        ZonefileParser { catalog }
    }

    /// Returns a reference to the catalog.
    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }
}

impl<C: Catalog> SessionFactory for ZonefileParser<C> {
    type Session = ZonefileSession<C>;

    fn begin(&self, ctx: &LoadContext) -> Self::Session {
        trace!(
            working_dir = %ctx.working_dir.display(),
            insertion_threads = ctx.insertion_threads,
            "parser session begins"
        );
        ZonefileSession {
            catalog: self.catalog.clone(),
            working_dir: ctx.working_dir.clone(),
            current: None,
            finished: None,
            grown: None,
            summary: SessionSummary::default(),
            failed_files: 0,
        }
    }
}

//------------ ZonefileSession -----------------------------------------------

/// The parser session of a [`ZonefileParser`].
///
/// The in-place scanner needs complete entries, so the blocks of a file
/// are collected in the scanner's buffer and the file is scanned once all
/// of it has arrived.
pub struct ZonefileSession<C> {
    catalog: Arc<C>,
    working_dir: PathBuf,
    current: Option<CurrentFile>,

    /// The file scanned last because all of it had arrived.
    finished: Option<PathBuf>,

    /// A file that received more data after it was scanned.
    grown: Option<PathBuf>,

    summary: SessionSummary,
    failed_files: usize,
}

/// The file a session is currently receiving.
struct CurrentFile {
    path: PathBuf,
    origin: StoredName,
    default_ttl: Ttl,
    zonefile: Zonefile,
    expected: u64,
    received: u64,
}

impl<C: Catalog> ZonefileSession<C> {
    /// Scans the current file if there is one.
    fn finish_file(&mut self) {
        let Some(mut file) = self.current.take() else {
            return;
        };
        if file.received != file.expected {
            debug!(
                path = %file.path.display(),
                expected = file.expected,
                received = file.received,
                "file changed size while reading"
            );
        }
        self.summary.files += 1;
        let res = self.scan(
            &mut file.zonefile,
            &file.path,
            &file.origin,
            file.default_ttl,
            0,
        );
        match res {
            Ok(records) => {
                debug!(path = %file.path.display(), records, "file parsed");
                self.summary.records += records;
            }
            Err(err) => {
                error!(path = %file.path.display(), "{err}");
                self.failed_files += 1;
            }
        }
        self.finished = Some(file.path);
    }

    /// Drops a block that arrived after its file was scanned.
    ///
    /// The first such block fails the file.
    fn drop_block(&mut self, len: usize) {
        if let Some(path) = self.finished.take() {
            self.failed_files += 1;
            self.grown = Some(path);
        }
        match self.grown.as_ref() {
            Some(path) => error!(
                path = %path.display(),
                dropped = len,
                "file grew while being read, dropping data"
            ),
            None => warn!("data fed to parser session without a file"),
        }
    }

    /// Scans all entries of a zonefile into the catalog.
    ///
    /// Returns the number of records inserted, including those of included
    /// files.
    fn scan(
        &mut self,
        zonefile: &mut Zonefile,
        path: &Path,
        origin: &StoredName,
        default_ttl: Ttl,
        depth: usize,
    ) -> Result<usize, ParseError> {
        let mut records = 0;
        loop {
            let entry = zonefile.next_entry().map_err(|err| {
                ParseError::Syntax {
                    path: path.into(),
                    err: err.to_string(),
                }
            })?;
            match entry {
                None => return Ok(records),
                Some(Entry::Record(record)) => {
                    self.catalog.insert(record).map_err(|err| {
                        ParseError::Rejected {
                            path: path.into(),
                            err: err.to_string(),
                        }
                    })?;
                    records += 1;
                }
                Some(Entry::Include {
                    path: include,
                    origin: include_origin,
                }) => {
                    let include = self.working_dir.join(include.to_string());
                    if depth >= MAX_INCLUDE_DEPTH {
                        return Err(ParseError::IncludeDepth(include));
                    }
                    let origin = include_origin.as_ref().unwrap_or(origin);
                    let mut included =
                        load_include(&include, origin, default_ttl)?;
                    records += self.scan(
                        &mut included,
                        &include,
                        origin,
                        default_ttl,
                        depth + 1,
                    )?;
                }
            }
        }
    }
}

impl<C: Catalog> ParserSession for ZonefileSession<C> {
    fn begin_again(
        &mut self,
        path: &Path,
        origin: &StoredName,
        default_ttl: Ttl,
        file_size: u64,
    ) {
        self.finish_file();
        self.finished = None;
        self.grown = None;
        let capacity = usize::try_from(file_size).unwrap_or(0);
        self.current = Some(CurrentFile {
            path: path.into(),
            origin: origin.clone(),
            default_ttl,
            zonefile: new_zonefile(capacity, origin, default_ttl),
            expected: file_size,
            received: 0,
        });
    }

    fn feed(&mut self, block: &[u8]) {
        let Some(file) = self.current.as_mut() else {
            self.drop_block(block.len());
            return;
        };
        file.zonefile.extend_from_slice(block);
        file.received += block.len() as u64;
        if file.received >= file.expected {
            self.finish_file();
        }
    }

    fn end(&mut self) -> Result<SessionSummary, ParseError> {
        self.finish_file();
        if self.failed_files > 0 {
            Err(ParseError::Failed {
                failed: self.failed_files,
                files: self.summary.files,
            })
        } else {
            Ok(self.summary)
        }
    }
}

//------------ Helpers -------------------------------------------------------

/// Creates an empty zonefile buffer primed with origin and default TTL.
fn new_zonefile(
    capacity: usize,
    origin: &StoredName,
    default_ttl: Ttl,
) -> Zonefile {
    let ttl = format!("$TTL {}\n", default_ttl.as_secs());
    let mut zonefile = Zonefile::with_capacity(capacity + ttl.len());
    zonefile.extend_from_slice(ttl.as_bytes());
    zonefile.set_origin(origin.clone());
    zonefile
}

/// Reads an included file into a new zonefile buffer.
fn load_include(
    path: &Path,
    origin: &StoredName,
    default_ttl: Ttl,
) -> Result<Zonefile, ParseError> {
    let data = fs::read(path).map_err(|err| ParseError::Include {
        path: path.into(),
        err,
    })?;
    let mut zonefile = new_zonefile(data.len(), origin, default_ttl);
    zonefile.extend_from_slice(&data);
    Ok(zonefile)
}

//------------ ParseError ----------------------------------------------------

/// An error happened while parsing zone files.
#[derive(Debug)]
pub enum ParseError {
    /// A zone file contained invalid data.
    Syntax { path: PathBuf, err: String },

    /// The catalog refused a record.
    Rejected { path: PathBuf, err: String },

    /// An included file could not be read.
    Include { path: PathBuf, err: io::Error },

    /// Includes were nested too deeply.
    IncludeDepth(PathBuf),

    /// Some of the files of a session failed.
    Failed { failed: usize, files: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax { path, err } => {
                write!(f, "{}:{err}", path.display())
            }
            ParseError::Rejected { path, err } => {
                write!(f, "{}: record rejected: {err}", path.display())
            }
            ParseError::Include { path, err } => {
                write!(f, "cannot include {}: {err}", path.display())
            }
            ParseError::IncludeDepth(path) => {
                write!(
                    f,
                    "cannot include {}: more than {MAX_INCLUDE_DEPTH} nested includes",
                    path.display()
                )
            }
            ParseError::Failed { failed, files } => {
                write!(f, "{failed} of {files} zone files failed to parse")
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Include { err, .. } => Some(err),
            _ => None,
        }
    }
}

//============ Tests =========================================================

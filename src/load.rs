//! Loading a list of zone files with a pool of workers.
//!
//! [`load`] is the entry point. It decides how many workers to use, divides
//! the list into one chunk per worker, and then [runs][run] the workers.
//!
//! Workers are plain OS threads created for the run and joined before it
//! returns. A worker that fails does not stop the others: every chunk is
//! processed as far as it goes and the outcomes are combined afterwards.

use std::thread;

use tracing::{debug, error, info, warn};

use crate::config::LoadContext;
use crate::pathlist::PathList;
use crate::parse::SessionFactory;
use crate::pool::{partition, pool_size_for, Chunk};
use crate::worker::{ingest, Status, WorkerResult};

//------------ LoadReport ----------------------------------------------------

/// The combined outcome of a load run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LoadReport {
    /// The number of octets processed by all workers.
    pub total_bytes: u64,

    /// The overall outcome.
    ///
    /// This is a failure if any of the workers failed.
    pub status: Status,

    /// The results of the individual workers in chunk order.
    pub workers: Vec<WorkerResult>,
}

impl LoadReport {
    /// Creates a report from the results of all workers.
    pub fn from_results(workers: Vec<WorkerResult>) -> Self {
        let total_bytes = workers.iter().map(|res| res.bytes).sum();
        let status = workers
            .iter()
            .fold(Status::Success, |status, res| status.and(res.status));
        LoadReport {
            total_bytes,
            status,
            workers,
        }
    }

    /// Returns the number of files handed to the parser.
    pub fn files(&self) -> usize {
        self.workers.iter().map(|res| res.files).sum()
    }

    /// Returns the number of empty files skipped.
    pub fn skipped(&self) -> usize {
        self.workers.iter().map(|res| res.skipped).sum()
    }
}

//------------ load ----------------------------------------------------------

/// Loads all files of the list.
///
/// Unless the context forces a number of workers, it is derived from the
/// number of files via [`pool_size_for`]. An empty list is a failure.
pub fn load<F: SessionFactory>(
    list: &PathList,
    ctx: &LoadContext,
    factory: &F,
) -> LoadReport {
    info!("loading {} zone files", list.file_count());
    if list.is_empty() {
        warn!("no zone files to load");
        return LoadReport {
            status: Status::Failure,
            ..Default::default()
        };
    }

    let workers = match ctx.workers {
        Some(workers) => workers.max(1),
        None => pool_size_for(list.file_count()),
    };
    let chunks = partition(list, workers);
    run(list, &chunks, ctx, factory)
}

//------------ run -----------------------------------------------------------

/// Runs one worker per chunk and waits for all of them.
///
/// With a single chunk, the worker runs right here on the current thread.
/// Having no chunks at all is a failure since nothing gets loaded.
pub fn run<F: SessionFactory>(
    list: &PathList,
    chunks: &[Chunk],
    ctx: &LoadContext,
    factory: &F,
) -> LoadReport {
    if chunks.is_empty() {
        warn!("no workers to run");
        return LoadReport {
            status: Status::Failure,
            ..Default::default()
        };
    }
    if let [chunk] = chunks {
        debug!("loading on the current thread");
        return LoadReport::from_results(vec![ingest(
            0,
            chunk.paths(list),
            ctx,
            factory,
        )]);
    }

    let results = thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| {
                debug!(worker = index, files = chunk.len(), "starting worker");
                let paths = chunk.paths(list);
                thread::Builder::new()
                    .name(format!("zoneload-{index}"))
                    .spawn_scoped(scope, move || {
                        ingest(index, paths, ctx, factory)
                    })
                    .map_err(|err| {
                        error!(worker = index, "cannot start worker: {err}");
                    })
            })
            .collect();

        debug!("waiting for workers to end");
        handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| match handle {
                Ok(handle) => handle.join().unwrap_or_else(|_| {
                    error!(worker = index, "worker panicked");
                    WorkerResult::failed(index)
                }),
                Err(()) => WorkerResult::failed(index),
            })
            .collect()
    });
    debug!("workers done");

    LoadReport::from_results(results)
}

//============ Tests =========================================================

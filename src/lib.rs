//! Parallel discovery and bulk loading of DNS zone files.
//!
//! This crate finds zone files on disk and feeds them to a zone file parser
//! using a small pool of worker threads. It is the loading stage of an
//! authoritative name server: everything the parser produces ends up in a
//! [catalog], the loader itself only moves octets.
//!
//! # Modules
//!
//! * [config] contains the configuration and the parameters derived from it
//!   for a load run,
//! * [pathlist] holds the ordered list of discovered files,
//! * [scan] walks directories to fill that list,
//! * [pool] decides how many workers to use and splits the list into one
//!   chunk per worker,
//! * [worker] feeds the files of one chunk through a parser session,
//! * [load] runs all workers and combines their outcomes,
//! * [parse] defines the parser seam and provides a parser built on the
//!   zone file scanner of the `domain` crate, and
//! * [catalog] provides the stores that parsed records end up in.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zoneload::{Config, MemoryCatalog, ZonefileParser};
//!
//! let mut config = Config::new();
//! config.add_argument("/var/lib/zones").unwrap();
//!
//! let catalog = Arc::new(MemoryCatalog::new());
//! let parser = ZonefileParser::new(catalog.clone());
//! let report = zoneload::load(&config.zonefiles, &config.load_context(), &parser);
//! println!("{} octets, {} records", report.total_bytes, catalog.len());
//! ```

pub mod catalog;
pub mod config;
pub mod load;
pub mod parse;
pub mod pathlist;
pub mod pool;
pub mod scan;
pub mod worker;

mod logging;

pub use self::catalog::{Catalog, DiscardCatalog, MemoryCatalog};
pub use self::config::{Config, LoadContext};
pub use self::load::{load, LoadReport};
pub use self::logging::init_logging;
pub use self::parse::ZonefileParser;
pub use self::pathlist::PathList;
pub use self::worker::Status;

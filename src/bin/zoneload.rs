//! Loads zone files from the command line.
//!
//! Everything that is not an option is treated as a bare argument: a zone
//! file, a directory to scan for zone files, an adapter address, or an
//! interface name.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use zoneload::config::ConfigError;
use zoneload::parse::SessionFactory;
use zoneload::{
    init_logging, load, Config, DiscardCatalog, MemoryCatalog, Status,
    ZonefileParser,
};

/// Arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read settings from a configuration file.
    #[arg(short = 'c', long = "conf", value_name = "FILE")]
    conf: Vec<PathBuf>,

    /// The number of threads inserting into the catalog.
    #[arg(long = "insertion-threads", value_name = "N")]
    insertion_threads: Option<String>,

    /// Force the number of load workers.
    #[arg(long = "workers", value_name = "N")]
    workers: Option<String>,

    /// Parse zone files but discard the records.
    #[arg(long = "zonefile-benchmark")]
    zonefile_benchmark: bool,

    /// The network adapter to use.
    #[arg(short = 'i', long = "adapter", value_name = "IF")]
    adapter: Option<String>,

    /// Apply an arbitrary setting.
    #[arg(short = 's', long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Print the adapter settings and exit.
    #[arg(long = "echo")]
    echo: bool,

    /// Log more. May be given up to three times.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Zone files, directories, adapter addresses, or interface names.
    args: Vec<String>,
}

impl Args {
    /// Returns the default log level for the verbosity given.
    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Applies all arguments to the configuration.
    ///
    /// Returns the number of settings that could not be applied. Each of
    /// them has already been logged.
    fn apply(&self, config: &mut Config) -> usize {
        let mut errors = 0;
        let mut check = |res: Result<(), ConfigError>| {
            if let Err(err) = res {
                error!("{err}");
                errors += 1;
            }
        };

        for path in &self.conf {
            check(config.read_config_file(path));
        }
        if let Some(value) = &self.insertion_threads {
            check(config.set_parameter("insertion-threads", value));
        }
        if let Some(value) = &self.workers {
            check(config.set_parameter("workers", value));
        }
        if self.zonefile_benchmark {
            check(config.set_parameter("zonefile-benchmark", ""));
        }
        if let Some(value) = &self.adapter {
            check(config.set_parameter("adapter", value));
        }
        for setting in &self.set {
            match setting.split_once('=') {
                Some((name, value)) => {
                    check(config.set_parameter(name.trim(), value.trim()))
                }
                None => check(Err(ConfigError::UnknownOption {
                    name: setting.clone(),
                    value: String::new(),
                })),
            }
        }
        for arg in &self.args {
            check(config.add_argument(arg));
        }
        errors
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level());

    let mut config = Config::new();
    let errors = args.apply(&mut config);

    if args.echo {
        return match config.write_adapters(&mut io::stdout().lock()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!("cannot write adapter settings: {err}");
                ExitCode::FAILURE
            }
        };
    }

    if errors > 0 && config.zonefiles.is_empty() {
        error!("{errors} configuration errors and no zone files to load");
        return ExitCode::from(2);
    }

    let status = if config.zonefile_benchmark {
        let catalog = Arc::new(DiscardCatalog::new());
        let status = run(&config, &ZonefileParser::new(catalog.clone()));
        info!(records = catalog.seen(), "benchmark done");
        status
    } else {
        let catalog =
            Arc::new(MemoryCatalog::with_shards(config.insertion_threads));
        let status = run(&config, &ZonefileParser::new(catalog.clone()));
        info!(
            records = catalog.len(),
            owners = catalog.owner_count(),
            "catalog loaded"
        );
        status
    };

    match status {
        Status::Success => ExitCode::SUCCESS,
        Status::Failure => ExitCode::FAILURE,
    }
}

/// Loads all configured zone files and reports on the outcome.
fn run(config: &Config, factory: &impl SessionFactory) -> Status {
    let start = Instant::now();
    let report = load(&config.zonefiles, &config.load_context(), factory);
    let elapsed = start.elapsed();

    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        report.total_bytes as f64 / secs / (1024.0 * 1024.0)
    } else {
        0.0
    };
    info!(
        bytes = report.total_bytes,
        files = report.files(),
        skipped = report.skipped(),
        workers = report.workers.len(),
        status = %report.status,
        "loaded in {:.3}s ({rate:.1} MiB/s)",
        secs
    );
    report.status
}

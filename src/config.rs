//! Configuration of a load run.
//!
//! Settings arrive as `name=value` pairs, either from the command line or
//! from configuration files, and are applied through
//! [`Config::set_parameter`]. Parameter names are matched loosely: case
//! and the punctuation characters `-`, `.`, and `_` are ignored, so that
//! `insertion-threads`, `InsertionThreads`, and `insertion_threads` are all
//! the same thing. Adapter settings may carry an index as in
//! `adapter-ip[1]`.
//!
//! Malformed input never ends the program. Every problem is reported as a
//! [`ConfigError`] and it is up to the caller to decide what to do with it.

use core::fmt;
use core::str::FromStr;
use std::env;
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use domain::base::Ttl;
use tracing::{debug, info, warn};

use crate::catalog::StoredName;
use crate::pathlist::PathList;
use crate::scan::{self, ZONE_SUFFIX};

//------------ Limits --------------------------------------------------------

/// The maximum number of network adapters.
pub const MAX_ADAPTERS: usize = 8;

/// The default, minimum, and maximum number of insertion threads.
const INSERTION_THREADS: DefMinMax<usize> = DefMinMax::new(1, 1, 64);

/// The default TTL for records without one.
pub const DEFAULT_TTL: Ttl = Ttl::from_secs(60);

/// The size of the blocks zone files are read in.
pub const BLOCK_SIZE: usize = 64 * 1024;

/// The number of seconds in a day.
const DAY_SECS: u64 = 24 * 60 * 60;

//------------ DefMinMax -----------------------------------------------------

/// The default, minimum, and maximum values for a numeric setting.
#[derive(Clone, Copy, Debug)]
struct DefMinMax<T> {
    def: T,
    min: T,
    max: T,
}

impl<T: Ord + Copy> DefMinMax<T> {
    const fn new(def: T, min: T, max: T) -> Self {
        DefMinMax { def, min, max }
    }

    /// Clamps the given value into the allowed range.
    fn limit(self, value: T) -> T {
        value.clamp(self.min, self.max)
    }
}

//------------ LoadContext ---------------------------------------------------

/// The settings a load worker needs.
///
/// A snapshot of these is taken from the [`Config`] before loading starts
/// and shared read-only by all workers.
#[derive(Clone, Debug)]
pub struct LoadContext {
    /// The origin zone files start with.
    pub origin: StoredName,

    /// The TTL used for records that don't have one.
    pub default_ttl: Ttl,

    /// The size of the blocks files are read and parsed in.
    pub block_size: usize,

    /// The directory relative paths are resolved against.
    pub working_dir: PathBuf,

    /// The number of insertion threads the catalog may use.
    pub insertion_threads: usize,

    /// Forces the number of load workers instead of deriving it.
    pub workers: Option<usize>,
}

impl Default for LoadContext {
    fn default() -> Self {
        LoadContext {
            origin: StoredName::root_bytes(),
            default_ttl: DEFAULT_TTL,
            block_size: BLOCK_SIZE,
            working_dir: PathBuf::from("."),
            insertion_threads: INSERTION_THREADS.def,
            workers: None,
        }
    }
}

//------------ Config --------------------------------------------------------

/// The complete configuration of the loader.
#[derive(Clone, Debug)]
pub struct Config {
    /// The directory relative paths are resolved against.
    pub working_dir: PathBuf,

    /// The zone files to load.
    pub zonefiles: PathList,

    /// The number of insertion threads for the catalog.
    pub insertion_threads: usize,

    /// Parse zone files without storing the records.
    pub zonefile_benchmark: bool,

    /// Forces the number of load workers.
    pub workers: Option<usize>,

    /// The offset into the day for rotating files.
    pub rotate_offset: Option<Duration>,

    /// The network adapters.
    ///
    /// This only ever grows up to the highest index used.
    pub adapters: Vec<Adapter>,

    /// The canonical paths of the configuration files being read.
    reading: Vec<PathBuf>,
}

impl Config {
    /// Creates a new configuration for the current directory.
    pub fn new() -> Self {
        let working_dir = match env::current_dir() {
            Ok(dir) => dir,
            Err(err) => {
                warn!("cannot determine working directory: {err}");
                PathBuf::from(".")
            }
        };
        info!(cwd = %working_dir.display(), "working directory");
        Self::with_working_dir(working_dir)
    }

    /// Creates a new configuration with the given working directory.
    pub fn with_working_dir(working_dir: impl Into<PathBuf>) -> Self {
        Config {
            working_dir: working_dir.into(),
            zonefiles: PathList::new(),
            insertion_threads: INSERTION_THREADS.def,
            zonefile_benchmark: false,
            workers: None,
            rotate_offset: None,
            adapters: Vec::new(),
            reading: Vec::new(),
        }
    }

    /// Returns the settings for a load run.
    pub fn load_context(&self) -> LoadContext {
        LoadContext {
            working_dir: self.working_dir.clone(),
            insertion_threads: self.insertion_threads,
            workers: self.workers,
            ..Default::default()
        }
    }

    /// Applies a single `name=value` setting.
    pub fn set_parameter(
        &mut self,
        name: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let index = array_index(name)?;

        if matches_any(name, &["conf", "config"]) {
            self.read_config_file(value)
        } else if matches_any(name, &["zonefile-benchmark"]) {
            self.zonefile_benchmark = true;
            Ok(())
        } else if matches_any(name, &["insertion-threads", "insertion-thread"])
        {
            let threads = parse_number(name, value)?;
            self.insertion_threads = INSERTION_THREADS.limit(threads);
            Ok(())
        } else if matches_any(name, &["workers"]) {
            self.workers = Some(parse_number::<usize>(name, value)?.max(1));
            Ok(())
        } else if matches_any(name, &["rotate-offset"]) {
            let secs = parse_day_offset(value)?;
            self.rotate_offset = Some(Duration::from_secs(secs));
            Ok(())
        } else if matches_any(name, &["adapter", "if", "interface"]) {
            let adapter = self.adapter_mut(index);
            if !adapter.ifname.is_empty() {
                warn!("overwriting \"adapter={}\"", adapter.ifname);
            }
            adapter.ifname = value.into();
            Ok(())
        } else if matches_any(
            name,
            &[
                "adapter-ip",
                "source-ip",
                "source-address",
                "spoof-ip",
                "spoof-address",
            ],
        ) {
            let addr = IpAddr::from_str(value).map_err(|_| {
                ConfigError::bad_value(name, value, "bad IP address")
            })?;
            let adapter = self.adapter_mut(index);
            match addr {
                IpAddr::V4(addr) => adapter.ipv4 = Some(addr),
                IpAddr::V6(addr) => adapter.ipv6 = Some(addr),
            }
            Ok(())
        } else if matches_any(name, &["adapter-port", "source-port"]) {
            let port = parse_number::<u16>(name, value)?;
            self.adapter_mut(index).port = Some(port);
            Ok(())
        } else if matches_any(
            name,
            &["adapter-mac", "spoof-mac", "source-mac"],
        ) {
            let mac = parse_mac(name, value)?;
            self.adapter_mut(index).mac = Some(mac);
            Ok(())
        } else if matches_any(name, &["router-mac", "router"]) {
            let mac = parse_mac(name, value)?;
            self.adapter_mut(index).router_mac = Some(mac);
            Ok(())
        } else {
            Err(ConfigError::UnknownOption {
                name: name.into(),
                value: value.into(),
            })
        }
    }

    /// Reads a configuration file.
    ///
    /// Each line of the file holds one `name=value` pair. Lines that are
    /// empty or start with a punctuation character are comments. Lines
    /// without an equals sign are ignored.
    ///
    /// Problems with individual lines are logged and skipped. Only failing
    /// to read the file at all is returned as an error. So is a file that
    /// is already being read further up, directly or through other files.
    pub fn read_config_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_err = |err| ConfigError::Io {
            path: path.into(),
            err,
        };
        let canonical = fs::canonicalize(path).map_err(io_err)?;
        if self.reading.contains(&canonical) {
            return Err(ConfigError::Recursive(path.into()));
        }
        let text = fs::read_to_string(&canonical).map_err(io_err)?;
        debug!(path = %path.display(), "reading config file");

        self.reading.push(canonical);
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            match line.chars().next() {
                None => continue,
                Some(ch) if ch.is_ascii_punctuation() => continue,
                Some(_) => {}
            }
            let Some((name, value)) = line.split_once('=') else {
                continue;
            };
            if let Err(err) = self.set_parameter(name.trim(), value.trim()) {
                warn!("{}:{}: {err}", path.display(), line_no + 1);
            }
        }
        self.reading.pop();
        Ok(())
    }

    /// Applies a bare command line argument.
    ///
    /// The argument is one of:
    ///
    /// * the path of a zone file relative to the working directory,
    /// * the IP address of the first adapter,
    /// * the name of an existing network interface,
    /// * a directory containing zone or configuration files, which is
    ///   scanned for zone files.
    pub fn add_argument(&mut self, arg: &str) -> Result<(), ConfigError> {
        if arg.ends_with(ZONE_SUFFIX) {
            self.zonefiles.push(self.working_dir.join(arg));
            Ok(())
        } else if IpAddr::from_str(arg).is_ok() {
            self.set_parameter("adapter-ip", arg)
        } else if interface_exists(arg) {
            self.adapter_mut(0).ifname = arg.into();
            Ok(())
        } else if Path::new(arg).is_dir() && scan::has_zone_content(Path::new(arg))
        {
            scan::scan_dir(Path::new(arg), &mut self.zonefiles);
            Ok(())
        } else {
            Err(ConfigError::UnknownArgument(arg.into()))
        }
    }

    /// Writes the adapter settings in configuration file format.
    ///
    /// Index suffixes are only added when there is more than one adapter.
    pub fn write_adapters(
        &self,
        target: &mut impl io::Write,
    ) -> io::Result<()> {
        writeln!(target, "# ADAPTER SETTINGS")?;
        if self.adapters.is_empty() {
            return Adapter::default().write(target, None);
        }
        let indexed = self.adapters.len() > 1;
        for (index, adapter) in self.adapters.iter().enumerate() {
            adapter.write(target, indexed.then_some(index))?;
        }
        Ok(())
    }

    /// Returns the adapter with the given index, creating it if necessary.
    fn adapter_mut(&mut self, index: usize) -> &mut Adapter {
        if self.adapters.len() <= index {
            self.adapters.resize_with(index + 1, Default::default);
        }
        &mut self.adapters[index]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

//------------ Adapter -------------------------------------------------------

/// The settings of a network adapter.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Adapter {
    /// The interface name.
    pub ifname: String,

    /// The IPv4 address to use.
    pub ipv4: Option<Ipv4Addr>,

    /// The IPv6 address to use.
    pub ipv6: Option<Ipv6Addr>,

    /// The port to send from.
    pub port: Option<u16>,

    /// The MAC address to send from.
    pub mac: Option<MacAddr>,

    /// The MAC address of the router.
    pub router_mac: Option<MacAddr>,
}

impl Adapter {
    fn write(
        &self,
        target: &mut impl io::Write,
        index: Option<usize>,
    ) -> io::Result<()> {
        let suffix = match index {
            Some(index) => format!("[{index}]"),
            None => String::new(),
        };
        writeln!(target, "adapter{suffix} = {}", self.ifname)?;
        writeln!(
            target,
            "adapter-ip{suffix} = {}",
            self.ipv4.unwrap_or(Ipv4Addr::UNSPECIFIED)
        )?;
        if let Some(ipv6) = self.ipv6 {
            writeln!(target, "adapter-ip{suffix} = {ipv6}")?;
        }
        if let Some(port) = self.port {
            writeln!(target, "adapter-port{suffix} = {port}")?;
        }
        writeln!(
            target,
            "adapter-mac{suffix} = {}",
            self.mac.unwrap_or_default()
        )?;
        writeln!(
            target,
            "router-mac{suffix} = {}",
            self.router_mac.unwrap_or_default()
        )
    }
}

//------------ MacAddr -------------------------------------------------------

/// An Ethernet MAC address.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct MacAddr(pub [u8; 6]);

impl FromStr for MacAddr {
    type Err = BadMacAddr;

    /// Parses six pairs of hex digits.
    ///
    /// The pairs may be separated by white space or punctuation such as
    /// `:`, `-`, or `.`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut res = [0u8; 6];
        let mut s = s.as_bytes();
        for octet in &mut res {
            while let Some((ch, rest)) = s.split_first() {
                if ch.is_ascii_whitespace() || ch.is_ascii_punctuation() {
                    s = rest;
                } else {
                    break;
                }
            }
            let [hi, lo, rest @ ..] = s else {
                return Err(BadMacAddr);
            };
            *octet = (hex_digit(*hi)? << 4) | hex_digit(*lo)?;
            s = rest;
        }
        if s.iter()
            .all(|ch| ch.is_ascii_whitespace() || ch.is_ascii_punctuation())
        {
            Ok(MacAddr(res))
        } else {
            Err(BadMacAddr)
        }
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

fn hex_digit(ch: u8) -> Result<u8, BadMacAddr> {
    match ch {
        b'0'..=b'9' => Ok(ch - b'0'),
        b'a'..=b'f' => Ok(ch - b'a' + 10),
        b'A'..=b'F' => Ok(ch - b'A' + 10),
        _ => Err(BadMacAddr),
    }
}

//------------ parse_day_offset ----------------------------------------------

/// Parses a time of day given as an offset from midnight.
///
/// The value is a number followed by an optional unit: `s`econds,
/// `m`inutes, `h`ours, `d`ays, or `w`eeks, so `3600`, `30min`, `2h`,
/// and `hourly` are all accepted. A unit without a number counts as one of
/// that unit. A leading `-` counts back from the end of the day.
///
/// Returns the offset in seconds. Values with a unit must be less than a
/// day.
pub fn parse_day_offset(value: &str) -> Result<u64, ConfigError> {
    let bad = |reason| ConfigError::bad_value("rotate-offset", value, reason);

    let rest = value.trim_start_matches('-');
    let negative = rest.len() != value.len();

    let digits = rest.len()
        - rest.trim_start_matches(|ch: char| ch.is_ascii_digit()).len();
    let (number, rest) = rest.split_at(digits);
    let mut num = if number.is_empty() {
        0
    } else {
        number.parse::<u64>().map_err(|_| bad("number too large"))?
    };
    let rest = rest.trim_start_matches(|ch: char| {
        ch.is_ascii_punctuation() || ch.is_ascii_whitespace()
    });

    let Some(unit) = rest.chars().next() else {
        return Ok(num);
    };
    if unit.is_ascii_alphabetic() && num == 0 {
        num = 1;
    }
    let factor = match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => DAY_SECS,
        'w' => 7 * DAY_SECS,
        _ => return Err(bad("unknown unit")),
    };
    let num = num.saturating_mul(factor);
    if num >= DAY_SECS {
        return Err(bad("value is a day or more"));
    }
    Ok(if negative { DAY_SECS - num } else { num })
}

//------------ Helpers -------------------------------------------------------

/// Compares parameter names ignoring case and some punctuation.
///
/// The name may carry an array index which is ignored.
fn name_matches(pattern: &str, name: &str) -> bool {
    let skip = |ch: &char| !matches!(ch, '-' | '.' | '_');
    let mut pattern = pattern.chars().filter(skip);
    let mut name = name.chars().filter(skip);
    loop {
        match (pattern.next(), name.next()) {
            (None, None) | (None, Some('[')) => return true,
            (Some(left), Some(right))
                if left.eq_ignore_ascii_case(&right) => {}
            _ => return false,
        }
    }
}

fn matches_any(name: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|pattern| name_matches(pattern, name))
}

/// Returns the array index of a parameter name such as `adapter[2]`.
fn array_index(name: &str) -> Result<usize, ConfigError> {
    let Some((_, index)) = name.split_once('[') else {
        return Ok(0);
    };
    let index = index.trim_end_matches(']');
    let index = index.parse::<usize>().map_err(|_| {
        ConfigError::BadIndex(name.into())
    })?;
    if index >= MAX_ADAPTERS {
        return Err(ConfigError::BadIndex(name.into()));
    }
    Ok(index)
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::bad_value(name, value, "expected a number"))
}

fn parse_mac(name: &str, value: &str) -> Result<MacAddr, ConfigError> {
    MacAddr::from_str(value)
        .map_err(|_| ConfigError::bad_value(name, value, "bad MAC address"))
}

/// Returns whether a network interface of the given name exists.
fn interface_exists(name: &str) -> bool {
    if name.is_empty() || name.contains('/') {
        return false;
    }
    if cfg!(target_os = "linux") {
        Path::new("/sys/class/net").join(name).exists()
    } else {
        false
    }
}

//------------ BadMacAddr ----------------------------------------------------

/// A string didn't contain a MAC address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BadMacAddr;

impl fmt::Display for BadMacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bad MAC address")
    }
}

impl std::error::Error for BadMacAddr {}

//------------ ConfigError ---------------------------------------------------

/// A setting could not be applied.
#[derive(Debug)]
pub enum ConfigError {
    /// The parameter name isn't known.
    UnknownOption { name: String, value: String },

    /// The value of a parameter is malformed.
    BadValue {
        name: String,
        value: String,
        reason: &'static str,
    },

    /// The array index of a parameter is malformed or too large.
    BadIndex(String),

    /// A command line argument could not be classified.
    UnknownArgument(String),

    /// A configuration file could not be read.
    Io { path: PathBuf, err: io::Error },

    /// A configuration file includes itself.
    Recursive(PathBuf),
}

impl ConfigError {
    fn bad_value(name: &str, value: &str, reason: &'static str) -> Self {
        ConfigError::BadValue {
            name: name.into(),
            value: value.into(),
            reason,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownOption { name, value } => {
                write!(f, "unknown config option: {name}={value}")
            }
            ConfigError::BadValue {
                name,
                value,
                reason,
            } => {
                write!(f, "{reason}: {name}={value}")
            }
            ConfigError::BadIndex(name) => {
                write!(f, "{name}: bad index (maximum is {})", MAX_ADAPTERS - 1)
            }
            ConfigError::UnknownArgument(arg) => {
                write!(f, "{arg}: unknown command-line parameter")
            }
            ConfigError::Io { path, err } => {
                write!(f, "{}: {err}", path.display())
            }
            ConfigError::Recursive(path) => {
                write!(f, "{}: config file includes itself", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { err, .. } => Some(err),
            _ => None,
        }
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> Config {
        Config::with_working_dir("/srv/dns")
    }

    #[test]
    fn loose_names() {
        assert!(name_matches("insertion-threads", "insertion-threads"));
        assert!(name_matches("insertion-threads", "InsertionThreads"));
        assert!(name_matches("insertion-threads", "insertion_threads"));
        assert!(name_matches("adapter-ip", "adapter.ip[3]"));
        assert!(!name_matches("adapter", "adapter-ip"));
        assert!(!name_matches("adapter-ip", "adapter"));
    }

    #[test]
    fn insertion_threads() {
        let mut conf = config();
        conf.set_parameter("insertion-threads", "4").unwrap();
        assert_eq!(conf.insertion_threads, 4);
        conf.set_parameter("insertion_thread", "1000").unwrap();
        assert_eq!(conf.insertion_threads, 64);
        assert!(matches!(
            conf.set_parameter("insertion-threads", "many"),
            Err(ConfigError::BadValue { .. })
        ));
        assert_eq!(conf.load_context().insertion_threads, 64);
    }

    #[test]
    fn adapters() {
        let mut conf = config();
        conf.set_parameter("adapter", "eth0").unwrap();
        conf.set_parameter("source-ip", "192.0.2.1").unwrap();
        conf.set_parameter("adapter-ip[2]", "2001:db8::1").unwrap();
        conf.set_parameter("source-port[2]", "5353").unwrap();
        conf.set_parameter("router-mac", "00-11-22-aa-bb-CC").unwrap();

        assert_eq!(conf.adapters.len(), 3);
        assert_eq!(conf.adapters[0].ifname, "eth0");
        assert_eq!(conf.adapters[0].ipv4, Some(Ipv4Addr::new(192, 0, 2, 1)));
        assert_eq!(
            conf.adapters[0].router_mac,
            Some(MacAddr([0x00, 0x11, 0x22, 0xaa, 0xbb, 0xcc]))
        );
        assert_eq!(conf.adapters[2].ipv6, Some("2001:db8::1".parse().unwrap()));
        assert_eq!(conf.adapters[2].port, Some(5353));
    }

    #[test]
    fn malformed_values_are_errors() {
        let mut conf = config();
        assert!(matches!(
            conf.set_parameter("adapter-ip", "192.0.2.300"),
            Err(ConfigError::BadValue { .. })
        ));
        assert!(matches!(
            conf.set_parameter("adapter-port", "70000"),
            Err(ConfigError::BadValue { .. })
        ));
        assert!(matches!(
            conf.set_parameter("adapter-mac", "00:11:22"),
            Err(ConfigError::BadValue { .. })
        ));
        assert!(matches!(
            conf.set_parameter("adapter[8]", "eth8"),
            Err(ConfigError::BadIndex(_))
        ));
        assert!(matches!(
            conf.set_parameter("colour", "blue"),
            Err(ConfigError::UnknownOption { .. })
        ));
        assert!(conf.adapters.is_empty());
    }

    #[test]
    fn mac_addresses() {
        let mac = MacAddr([0x00, 0x1b, 0x21, 0x0a, 0xff, 0x09]);
        assert_eq!(MacAddr::from_str("00:1b:21:0a:ff:09"), Ok(mac));
        assert_eq!(MacAddr::from_str("00-1B-21-0A-FF-09"), Ok(mac));
        assert_eq!(MacAddr::from_str(" 001b.210a.ff09 "), Ok(mac));
        assert_eq!(mac.to_string(), "00:1b:21:0a:ff:09");
        assert_eq!(MacAddr::from_str("00:1b:21:0a:ff"), Err(BadMacAddr));
        assert_eq!(MacAddr::from_str("00:1b:21:0a:ff:0g"), Err(BadMacAddr));
        assert_eq!(MacAddr::from_str("00:1b:21:0a:ff:09:10"), Err(BadMacAddr));
    }

    #[test]
    fn day_offsets() {
        assert_eq!(parse_day_offset("3600").unwrap(), 3600);
        assert_eq!(parse_day_offset("90s").unwrap(), 90);
        assert_eq!(parse_day_offset("30min").unwrap(), 1800);
        assert_eq!(parse_day_offset("2 hours").unwrap(), 7200);
        assert_eq!(parse_day_offset("hourly").unwrap(), 3600);
        assert_eq!(parse_day_offset("-1h").unwrap(), 82800);
        assert!(parse_day_offset("daily").is_err());
        assert!(parse_day_offset("25h").is_err());
        assert!(parse_day_offset("5 fortnights").is_err());
    }

    #[test]
    fn config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("zoneload.conf");
        fs::write(
            &path,
            "# ADAPTER SETTINGS\n\
             \n\
             adapter = eth1\n\
             adapter-mac = 02:00:00:00:00:01\n\
             not a setting\n\
             bogus-option = 1\n\
             adapter-ip = not-an-address\n\
             \x20 insertion-threads = 3  \n\
             zonefile-benchmark = yes\n",
        )
        .unwrap();

        let mut conf = config();
        conf.set_parameter("conf", path.to_str().unwrap()).unwrap();
        assert_eq!(conf.adapters[0].ifname, "eth1");
        assert_eq!(conf.adapters[0].mac, Some(MacAddr([2, 0, 0, 0, 0, 1])));
        assert_eq!(conf.adapters[0].ipv4, None);
        assert_eq!(conf.insertion_threads, 3);
        assert!(conf.zonefile_benchmark);

        assert!(matches!(
            conf.read_config_file(tmp.path().join("missing.conf")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn self_including_config_files() {
        let tmp = tempfile::tempdir().unwrap();
        let one = tmp.path().join("one.conf");
        let two = tmp.path().join("two.conf");
        fs::write(
            &one,
            format!("conf = {}\ninsertion-threads = 5\n", one.display()),
        )
        .unwrap();
        // The same file under a different name.
        let alias = tmp.path().join(".").join("two.conf");
        fs::write(&two, format!("adapter = eth2\nconf = {}\n", alias.display()))
            .unwrap();

        let mut conf = config();
        conf.read_config_file(&one).unwrap();
        assert_eq!(conf.insertion_threads, 5);
        assert!(conf.reading.is_empty());

        conf.set_parameter("config", two.to_str().unwrap()).unwrap();
        assert_eq!(conf.adapters[0].ifname, "eth2");
        assert!(conf.reading.is_empty());

        conf.reading.push(fs::canonicalize(&one).unwrap());
        assert!(matches!(
            conf.read_config_file(&one),
            Err(ConfigError::Recursive(_))
        ));
    }

    #[test]
    fn arguments() {
        let tmp = tempfile::tempdir().unwrap();
        let zones = tmp.path().join("zones");
        fs::create_dir_all(zones.join("sub")).unwrap();
        fs::write(zones.join("sub/example.zone"), "").unwrap();
        fs::create_dir_all(tmp.path().join("nothing")).unwrap();

        let mut conf = config();
        conf.add_argument("local.zone").unwrap();
        conf.add_argument("198.51.100.7").unwrap();
        conf.add_argument(zones.to_str().unwrap()).unwrap();
        assert!(matches!(
            conf.add_argument(tmp.path().join("nothing").to_str().unwrap()),
            Err(ConfigError::UnknownArgument(_))
        ));

        let files: Vec<_> = conf.zonefiles.iter().cloned().collect();
        assert_eq!(
            files,
            [
                PathBuf::from("/srv/dns/local.zone"),
                zones.join("sub/example.zone")
            ]
        );
        assert_eq!(
            conf.adapters[0].ipv4,
            Some(Ipv4Addr::new(198, 51, 100, 7))
        );
    }

    #[test]
    fn echo() {
        let mut conf = config();
        let mut out = Vec::new();
        conf.write_adapters(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# ADAPTER SETTINGS\n\
             adapter = \n\
             adapter-ip = 0.0.0.0\n\
             adapter-mac = 00:00:00:00:00:00\n\
             router-mac = 00:00:00:00:00:00\n"
        );

        conf.set_parameter("adapter[1]", "eth1").unwrap();
        let mut out = Vec::new();
        conf.write_adapters(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("adapter[0] = \n"));
        assert!(out.contains("adapter[1] = eth1\n"));
    }
}

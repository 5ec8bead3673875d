use clap::Args;
use pingmulti::{Dashboard, HostSpec, Options};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Options shared by every front end.
#[derive(Args, Debug, Clone)]
pub struct DashboardOpts {
    /// Statistic shown first (Last, Loss%, Avg, Min, Max, StDev, RX_cnt, TX_cnt, XX_cnt)
    #[arg(long = "stats", value_name = "NAME", default_value = "Last")]
    pub stats: String,

    /// Maximum width of the host column; 0 fits the longest host name
    #[arg(long = "host-width", value_name = "N", default_value_t = 0)]
    pub host_width: usize,

    /// Write a log to FILE; the level is taken from RUST_LOG (default: info)
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl DashboardOpts {
    pub fn options(&self, timeout: f64) -> pingmulti::Result<Options> {
        Options::new(timeout, &self.stats, self.host_width)
    }
}

/// Sends log events to `path`. Without a path nothing is logged, since
/// the terminal belongs to the dashboard.
pub fn init_logging(path: Option<&Path>) -> io::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Command line pinging `host` every `interval` seconds, reporting probes
/// without a reply as they happen (`-O`).
pub fn compose_ping_cmd(host: &str, interval: f64) -> String {
    let interval = interval.to_string();
    format!("ping -O -i {} {}", quote(&interval), quote(host))
}

fn quote(arg: &str) -> String {
    // Only fails on NUL bytes, which a command line cannot carry anyway.
    shlex::try_quote(arg)
        .map(|quoted| quoted.into_owned())
        .unwrap_or_else(|_| arg.replace('\0', ""))
}

/// Reads host names from a file, one per line. Blank lines and lines
/// starting with `#` are skipped.
pub fn read_host_file(path: &Path) -> io::Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Runs the dashboard and turns the outcome into the process exit code.
/// Errors are printed once the terminal is back to normal.
pub fn run(opts: &DashboardOpts, timeout: f64, specs: Vec<HostSpec>) -> ExitCode {
    if let Err(e) = init_logging(opts.log_file.as_deref()) {
        eprintln!("Error: cannot open the log file: {}", e);
        return ExitCode::FAILURE;
    }
    let res = opts
        .options(timeout)
        .and_then(|options| Dashboard::new(specs, options))
        .and_then(Dashboard::run);
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

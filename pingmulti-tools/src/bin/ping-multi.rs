use clap::Parser;
use pingmulti::HostSpec;
use pingmulti_tools::{compose_ping_cmd, read_host_file, run, DashboardOpts};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "ping-multi",
    version,
    about = "Ping all hosts from FILE and HOSTs"
)]
struct Cli {
    /// Host to ping; can be given many times
    #[arg(value_name = "HOST")]
    hosts: Vec<String>,

    /// Read the list of hosts from FILE
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: Option<PathBuf>,

    /// Timeout in seconds to wait for a ping reply
    #[arg(short = 'W', long = "wait", value_name = "SECS", default_value_t = 1.0)]
    wait: f64,

    /// Time in seconds between sending each request
    #[arg(short = 'i', long = "interval", value_name = "SECS", default_value_t = 1.0)]
    interval: f64,

    #[command(flatten)]
    dashboard: DashboardOpts,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut hosts = cli.hosts.clone();
    if let Some(path) = &cli.file {
        match read_host_file(path) {
            Ok(more) => hosts.extend(more),
            Err(e) => {
                eprintln!("Error: cannot read {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }
    if hosts.is_empty() {
        Cli::command_error("No hosts were specified");
    }

    let specs = hosts
        .iter()
        .map(|host| HostSpec::new(host.as_str(), compose_ping_cmd(host, cli.interval)))
        .collect();
    run(&cli.dashboard, cli.wait, specs)
}

impl Cli {
    fn command_error(msg: &str) -> ! {
        use clap::CommandFactory;
        Cli::command()
            .error(clap::error::ErrorKind::MissingRequiredArgument, msg)
            .exit()
    }
}

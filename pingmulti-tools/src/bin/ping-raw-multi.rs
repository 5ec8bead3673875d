use clap::{ArgAction, Parser};
use pingmulti::HostSpec;
use pingmulti_tools::{run, DashboardOpts};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "ping-raw-multi",
    version,
    about = "Execute multiple external ping commands at once"
)]
struct Cli {
    /// Unique display NAME and the COMMAND line to run for it; can be given
    /// many times
    #[arg(
        long = "ping",
        num_args = 2,
        value_names = ["NAME", "COMMAND"],
        action = ArgAction::Append,
        required = true
    )]
    ping: Vec<String>,

    /// Ping reply timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 1.0)]
    timeout: f64,

    #[command(flatten)]
    dashboard: DashboardOpts,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let specs = cli
        .ping
        .chunks_exact(2)
        .map(|pair| HostSpec::new(pair[0].as_str(), pair[1].as_str()))
        .collect();
    run(&cli.dashboard, cli.timeout, specs)
}

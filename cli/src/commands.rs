pub mod catalog;
pub mod scan;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lanscout")]
#[command(about = "A local network inventory and exposure scanner.")]
#[command(version)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output (-q hides headers and live log, -qq prints only the summary)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan an address range for devices and exposures
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Show the finding catalog and the well-known port table
    #[command(alias = "c")]
    Catalog,
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Address range: single, a.b.c.d-e, a.b.c.d-w.x.y.z or CIDR
    pub range: String,

    /// Ports to probe, e.g. 1-1024 or 22,80,443
    #[arg(short, long, default_value = "1-1024")]
    pub ports: String,

    /// Scan type: quick probes well-known ports only, deep probes every port
    #[arg(short = 't', long = "type", default_value = "quick")]
    pub scan_type: String,

    /// Hosts probed at the same time
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// TOML file with engine settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

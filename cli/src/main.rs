mod commands;
mod terminal;

use commands::{CommandLine, Commands, catalog, scan};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose)?;

    match commands.command {
        Commands::Scan(args) => {
            if !args.json {
                print::banner(commands.quiet);
            }
            scan::scan(args, commands.quiet).await
        }
        Commands::Catalog => {
            print::banner(commands.quiet);
            catalog::catalog(commands.quiet);
            Ok(())
        }
    }
}

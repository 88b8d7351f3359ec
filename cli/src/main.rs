mod commands;
mod terminal;

use commands::{CommandLine, Commands, scan, verify};
use mailscout_common::config::Config;
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.json, commands.verbose)?;

    let cfg = Config {
        no_banner: commands.no_banner,
        quiet: commands.quiet,
        json: commands.json,
    };
    print::banner(&cfg);

    match commands.command {
        Commands::Scan(args) => {
            print::header("starting scanner", cfg.quiet);
            scan::scan(args, &cfg).await
        }
        Commands::Verify(args) => {
            print::header("verifying instance", cfg.quiet);
            verify::verify(args, &cfg).await
        }
    }
}

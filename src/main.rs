//! Main entry point for the Vareon CLI.

use clap::{command, Args, Parser, Subcommand};

use vareon::{analysis, calibrate, common, server};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "SNV pathogenicity prediction with the Evo2 genomic language model"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Subcommand)]
enum Commands {
    /// Server related commands.
    Server(Server),
    /// Analyse a single SNV.
    Analyse(analysis::Args),
    /// Fit the classification threshold on labeled SNVs.
    Calibrate(calibrate::Args),
}

/// Parsing of "server *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Server {
    /// The sub command to run
    #[command(subcommand)]
    command: ServerCommands,
}

/// Enum supporting the parsing of "server *" sub commands.
#[derive(Debug, Subcommand)]
enum ServerCommands {
    Run(server::run::Args),
    Schema(server::schema::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(cli.common.tracing_level())
        .compact()
        .finish();

    // Install collector and go into sub commands.
    tracing::subscriber::with_default(collector, || {
        tracing::info!("Vareon startup -- scoring variants with Evo2...");

        match &cli.command {
            Commands::Server(server) => match &server.command {
                ServerCommands::Run(args) => server::run::run(&cli.common, args)?,
                ServerCommands::Schema(args) => server::schema::run(&cli.common, args)?,
            },
            Commands::Analyse(args) => analysis::run(&cli.common, args)?,
            Commands::Calibrate(args) => calibrate::run(&cli.common, args)?,
        }

        tracing::info!("All done. Have a nice day!");

        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

//! Commonly used code.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod cli;
#[cfg(test)]
pub(crate) mod fake_server;
pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug, Default)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Args {
    /// The `tracing` level corresponding to the verbosity flags.
    pub fn tracing_level(&self) -> tracing::Level {
        match self.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod test {
    use clap_verbosity_flag::Verbosity;

    #[test]
    fn tracing_level() {
        let args = super::Args {
            verbose: Verbosity::new(1, 0),
        };
        assert_eq!(args.tracing_level(), tracing::Level::DEBUG);

        let args = super::Args::default();
        assert_eq!(args.tracing_level(), tracing::Level::INFO);
    }
}

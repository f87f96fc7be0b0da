//! # LTI Launch CLI
//!
//! Command-line front end for the `lti-launch` crate.
//!
//! ## Quick Start
//!
//! ```bash
//! # Flat parameters to claims
//! echo '{"user_id":"42","roles":"Instructor"}' | lti-launch to-claims
//!
//! # Claims back to flat parameters, as a table
//! lti-launch to-params claims.json --format table
//!
//! # Role vocabulary
//! lti-launch roles Instructor urn:lti:instrole:ims/lis/Faculty
//! lti-launch roles --to legacy http://purl.imsglobal.org/vocab/lis/v2/membership#Learner
//!
//! # Publish the platform key set
//! lti-launch jwks --config platform.toml
//!
//! # Full launch against local fixtures
//! lti-launch simulate -c platform.toml -r tool.json -u user.json \
//!   --role Instructor --custom 'who=$Person.name.full'
//! ```
//!
//! ## Architecture
//!
//! 1. **Command Layer** (`cli`): Clap-based argument parsing
//! 2. **Execution Layer** (`executor`): Runs commands against `lti-launch`
//! 3. **Output Layer** (`formatter`): Human, table, JSON and YAML output

pub mod cli;
pub mod error;
pub mod executor;
pub mod formatter;

use anyhow::Context;
use clap::Parser;
use lti_launch::LoggingConfig;

/// Run the CLI application
///
/// # Errors
///
/// Returns an error if logging cannot be initialized. Command failures are reported
/// on stderr and end the process with status 1.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    LoggingConfig {
        level: if cli.verbose { "debug" } else { "warn" }.to_string(),
        structured: false,
    }
    .init()
    .context("failed to initialize logging")?;

    let executor = CommandExecutor::new(cli.format, !cli.no_color, cli.verbose);
    if let Err(e) = executor.execute(cli.command).await {
        executor.display_error(&e);
        std::process::exit(1);
    }

    Ok(())
}

// Re-export key types for library consumers
pub use cli::{Cli, Commands, OutputFormat};
pub use error::{CliError, CliResult};
pub use executor::CommandExecutor;
pub use formatter::Formatter;

//! CLI argument parsing

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Main CLI application structure
#[derive(Parser, Debug)]
#[command(
    name = "lti-launch",
    version,
    about = "Inspect, translate and simulate LTI launches",
    long_about = "Translates launch payloads between LTI 1.0/1.1 flat parameters and\n\
                  LTI 1.3 claims, converts role and context-type vocabularies, publishes\n\
                  platform key sets and runs a complete OIDC launch against local fixtures.\n\n\
                  Inputs are read from a file, or from stdin when the path is '-'."
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a JSON object of flat launch parameters to claims
    ToClaims(InputArgs),

    /// Convert a JSON claims object to flat launch parameters
    ToParams(InputArgs),

    /// Convert an LTI 1.3 content-item array to the legacy graph
    ContentItems(InputArgs),

    /// Translate roles between vocabularies
    Roles(VocabularyArgs),

    /// Translate context types between vocabularies
    ContextTypes(VocabularyArgs),

    /// Print the platform's public key set
    Jwks(PlatformArgs),

    /// Run a full LTI 1.3 launch against local fixtures
    Simulate(SimulateArgs),
}

/// A single JSON input
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Input file, or '-' for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,
}

/// Values to translate
#[derive(Args, Debug, Clone)]
pub struct VocabularyArgs {
    /// Values in any supported form
    #[arg(required = true)]
    pub values: Vec<String>,

    /// Target vocabulary
    #[arg(long, short = 't', value_enum, default_value = "modern")]
    pub to: TargetForm,

    /// Write person roles with the deprecated `.../lis/v2/person#` prefix
    #[arg(long)]
    pub deprecated_prefixes: bool,
}

/// Platform configuration location
#[derive(Args, Debug, Clone)]
pub struct PlatformArgs {
    /// Platform configuration file (TOML, YAML or JSON)
    #[arg(long, short = 'c', env = "LTI_LAUNCH_CONFIG")]
    pub config: PathBuf,
}

/// Launch simulation inputs
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Tool registration (JSON)
    #[arg(long, short = 'r')]
    pub registration: PathBuf,

    /// Launching user (JSON)
    #[arg(long, short = 'u')]
    pub user: PathBuf,

    /// Role of the user in the context (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<String>,

    /// Custom parameter as name=value (repeatable)
    #[arg(long = "custom", value_parser = parse_key_value)]
    pub custom: Vec<(String, String)>,

    /// Redirect URI the simulated tool asks for; defaults to the first registered one
    #[arg(long)]
    pub redirect_uri: Option<String>,

    /// Opaque state the simulated tool sends
    #[arg(long, default_value = "simulated-state")]
    pub state: String,

    /// Nonce the simulated tool sends
    #[arg(long, default_value = "simulated-nonce")]
    pub nonce: String,
}

/// Vocabulary to translate into
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TargetForm {
    /// LIS v2 URIs
    Modern,
    /// Legacy URNs
    Legacy,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable with colors
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Table format
    Table,
    /// Compact JSON (no pretty print)
    Compact,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("who=$Person.name.full").unwrap(),
            ("who".to_string(), "$Person.name.full".to_string())
        );
        assert_eq!(
            parse_key_value("eq=a=b").unwrap(),
            ("eq".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("=x").is_err());
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from([
            "lti-launch",
            "simulate",
            "-c",
            "platform.toml",
            "-r",
            "tool.json",
            "-u",
            "user.json",
            "--role",
            "Instructor",
            "--custom",
            "who=$Person.name.full",
        ])
        .unwrap();
        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.roles, vec!["Instructor"]);
        assert_eq!(args.custom[0].0, "who");
        assert_eq!(args.state, "simulated-state");
    }
}

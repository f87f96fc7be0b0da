//! Output formatting for CLI

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};
use comfy_table::{Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use lti_launch::{AuthenticationResponse, Claims, FlatParams};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Format and display output based on format preference
pub struct Formatter {
    format: OutputFormat,
    colored: bool,
}

impl Formatter {
    #[must_use]
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    /// Display any serializable value
    pub fn display<T: Serialize + ?Sized>(&self, value: &T) -> CliResult<()> {
        match self.format {
            OutputFormat::Human | OutputFormat::Table => self.display_json(value, true),
            OutputFormat::Json => self.display_json(value, true),
            OutputFormat::Compact => self.display_json(value, false),
            OutputFormat::Yaml => self.display_yaml(value),
        }
    }

    /// Display flat launch parameters
    pub fn display_params(&self, params: &FlatParams) -> CliResult<()> {
        match self.format {
            OutputFormat::Human => {
                if params.is_empty() {
                    self.print_info("No parameters");
                    return Ok(());
                }
                self.print_header("Launch Parameters");
                for (key, value) in params {
                    self.print_kv(key, value);
                }
                self.print_footer(&format!("Total: {} parameters", params.len()));
                Ok(())
            }
            OutputFormat::Table => {
                println!("{}", params_table(params));
                Ok(())
            }
            _ => self.display(params),
        }
    }

    /// Display vocabulary translations, one row per input
    pub fn display_translations(&self, rows: &[(String, Option<String>)]) -> CliResult<()> {
        match self.format {
            OutputFormat::Human => {
                for (input, output) in rows {
                    match output {
                        Some(output) => self.print_kv(input, output),
                        None if self.colored => {
                            println!("  {}: {}", input.bright_green().bold(), "-".bright_black());
                        }
                        None => println!("  {input}: -"),
                    }
                }
                Ok(())
            }
            OutputFormat::Table => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .apply_modifier(UTF8_ROUND_CORNERS)
                    .set_header(vec!["Input", "Output"]);
                for (input, output) in rows {
                    table.add_row(vec![input.as_str(), output.as_deref().unwrap_or("-")]);
                }
                println!("{table}");
                Ok(())
            }
            _ => {
                let outputs: Vec<Option<&str>> =
                    rows.iter().map(|(_, output)| output.as_deref()).collect();
                self.display(&outputs)
            }
        }
    }

    /// Display a simulated launch: the form post and the decoded `id_token`
    pub fn display_launch(
        &self,
        response: &AuthenticationResponse,
        claims: &Claims,
    ) -> CliResult<()> {
        match self.format {
            OutputFormat::Human | OutputFormat::Table => {
                self.print_header("Form Post");
                self.print_kv("redirect_uri", &response.redirect_uri);
                self.print_kv("state", response.state.as_deref().unwrap_or("-"));
                self.print_kv("id_token", &response.id_token);
                self.print_header("Claims");
                self.display_json(claims, true)
            }
            _ => self.display(&serde_json::json!({
                "response": response,
                "claims": claims,
            })),
        }
    }

    /// Display error with suggestions
    pub fn display_error(&self, error: &CliError) {
        if self.colored {
            eprintln!("{}: {}", "Error".bright_red().bold(), error);

            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                eprintln!("\n{}", "Suggestions:".bright_yellow().bold());
                for suggestion in suggestions {
                    eprintln!("  {} {}", "•".bright_blue(), suggestion);
                }
            }
        } else {
            eprintln!("Error: {error}");

            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                eprintln!("\nSuggestions:");
                for suggestion in suggestions {
                    eprintln!("  • {suggestion}");
                }
            }
        }
    }

    // Internal formatting helpers

    fn display_json<T: Serialize + ?Sized>(&self, value: &T, pretty: bool) -> CliResult<()> {
        let json = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{json}");
        Ok(())
    }

    fn display_yaml<T: Serialize + ?Sized>(&self, value: &T) -> CliResult<()> {
        let yaml = serde_yaml::to_string(value)?;
        println!("{yaml}");
        Ok(())
    }

    fn print_header(&self, text: &str) {
        if self.colored {
            println!("\n{}", text.bright_cyan().bold());
            println!("{}", "=".repeat(text.len()).bright_cyan());
        } else {
            println!("\n{text}");
            println!("{}", "=".repeat(text.len()));
        }
    }

    fn print_footer(&self, text: &str) {
        if self.colored {
            println!("\n{}", text.bright_black());
        } else {
            println!("\n{text}");
        }
    }

    fn print_info(&self, text: &str) {
        if self.colored {
            println!("{}", text.bright_blue());
        } else {
            println!("{text}");
        }
    }

    fn print_kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("  {}: {}", key.bright_green().bold(), value);
        } else {
            println!("  {key}: {value}");
        }
    }
}

/// Two-column table of parameters, in input order.
pub fn params_table(params: &FlatParams) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Parameter", "Value"]);
    for (key, value) in params {
        table.add_row(vec![key.as_str(), value.as_str()]);
    }
    table
}

//! Command execution

use crate::cli::*;
use crate::error::{CliError, CliResult};
use crate::formatter::Formatter;
use async_trait::async_trait;
use lti_launch::error::CollaboratorError;
use lti_launch::{
    AuthResult, AuthenticationRequest, ClaimConverter, Claims, FlatParams, LaunchAuthenticator,
    LaunchRequest, LaunchRequestBuilder, Platform, PlatformConfig, RegistrationRepository,
    StandardSubstitutorFactory, ToolRegistration, UserAuthenticator, UserIdentity, Vocabulary,
    convert_content_items_modern_to_legacy,
};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Execute CLI commands
pub struct CommandExecutor {
    pub formatter: Formatter,
    verbose: bool,
}

impl CommandExecutor {
    #[must_use]
    pub fn new(format: OutputFormat, colored: bool, verbose: bool) -> Self {
        Self {
            formatter: Formatter::new(format, colored),
            verbose,
        }
    }

    /// Display an error with rich formatting
    pub fn display_error(&self, error: &CliError) {
        self.formatter.display_error(error);
    }

    /// Execute a command
    pub async fn execute(&self, command: Commands) -> CliResult<()> {
        match command {
            Commands::ToClaims(args) => {
                let params = to_claims_input(&read_input(&args.input)?)?;
                let claims = ClaimConverter::default().params_to_claims(&params);
                self.formatter.display(&claims)
            }
            Commands::ToParams(args) => {
                let claims: Claims = serde_json::from_str(&read_input(&args.input)?)?;
                let params = ClaimConverter::default().claims_to_params(&claims);
                self.formatter.display_params(&params)
            }
            Commands::ContentItems(args) => {
                let legacy = convert_content_items_modern_to_legacy(&read_input(&args.input)?)?;
                let legacy: serde_json::Value = serde_json::from_str(&legacy)?;
                self.formatter.display(&legacy)
            }
            Commands::Roles(args) => self.formatter.display_translations(&translate_roles(&args)),
            Commands::ContextTypes(args) => self
                .formatter
                .display_translations(&translate_context_types(&args)),
            Commands::Jwks(args) => {
                let platform = load_platform(&args.config)?;
                let jwks: serde_json::Value =
                    serde_json::from_str(&platform.key_set().to_json()?)?;
                self.formatter.display(&jwks)
            }
            Commands::Simulate(args) => self.execute_simulate(args).await,
        }
    }

    async fn execute_simulate(&self, args: SimulateArgs) -> CliResult<()> {
        let platform = Arc::new(load_platform(&args.platform.config)?);
        let registration: ToolRegistration =
            serde_json::from_str(&read_input(&args.registration)?)?;
        let user: UserIdentity = serde_json::from_str(&read_input(&args.user)?)?;

        let mut builder =
            LaunchRequestBuilder::new(&platform, &registration, &StandardSubstitutorFactory)
                .roles(args.roles.iter().cloned());
        for (name, value) in &args.custom {
            builder = builder.custom(name, value);
        }

        let login = match builder.build(&user)? {
            LaunchRequest::LoginInitiation(login) => login,
            LaunchRequest::Legacy { url, params } => {
                if self.verbose {
                    eprintln!("Tool uses flat parameters; posting to {url}");
                }
                return self.formatter.display_params(&params);
            }
        };
        debug!(initiate_login_url = %login.initiate_login_url, "Login initiation built");

        let redirect_uri = match args.redirect_uri {
            Some(uri) => uri,
            None => registration
                .redirect_uris()
                .next()
                .map(str::to_string)
                .ok_or_else(|| {
                    CliError::InvalidArguments("registration has no redirect URIs".into())
                })?,
        };
        let request = AuthenticationRequest {
            scope: Some("openid".into()),
            response_type: Some("id_token".into()),
            response_mode: Some("form_post".into()),
            client_id: Some(login.client_id.clone()),
            redirect_uri: Some(redirect_uri),
            login_hint: Some(login.login_hint.clone()),
            nonce: Some(args.nonce),
            state: Some(args.state),
            prompt: Some("none".into()),
            lti_message_hint: Some(login.lti_message_hint.clone()),
            lti_deployment_id: Some(login.lti_deployment_id.clone()),
        };

        let authenticator = LaunchAuthenticator::new(
            platform.clone(),
            Arc::new(SingleRegistration(registration)),
            Arc::new(SingleUser(user)),
            Arc::new(StandardSubstitutorFactory),
        );
        let response = authenticator.authenticate(&request).await?;
        let claims = platform
            .codec()
            .verify(&response.id_token, platform.key_set())?;
        self.formatter.display_launch(&response, &claims)
    }
}

/// Read a file, or stdin for `-`.
pub fn read_input(path: &Path) -> CliResult<String> {
    let result = if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input).map(|_| input)
    } else {
        std::fs::read_to_string(path)
    };
    result.map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a JSON object of flat parameters. Scalar values are accepted and stringified.
pub fn to_claims_input(json: &str) -> CliResult<FlatParams> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
    object
        .into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => Ok((key, s)),
            serde_json::Value::Bool(_) | serde_json::Value::Number(_) => {
                Ok((key, value.to_string()))
            }
            _ => Err(CliError::InvalidArguments(format!(
                "parameter '{key}' must be a string"
            ))),
        })
        .collect()
}

/// Translate each role; unmappable inputs map to `None`.
pub fn translate_roles(args: &VocabularyArgs) -> Vec<(String, Option<String>)> {
    let vocabulary = Vocabulary::standard();
    let inputs: Vec<Option<&str>> = args.values.iter().map(|v| Some(v.as_str())).collect();
    let outputs = match args.to {
        TargetForm::Modern => vocabulary.to_modern_roles(&inputs, args.deprecated_prefixes),
        TargetForm::Legacy => vocabulary.to_legacy_roles(&inputs),
    };
    args.values.iter().cloned().zip(outputs).collect()
}

/// Translate each context type; unmappable inputs map to `None`.
pub fn translate_context_types(args: &VocabularyArgs) -> Vec<(String, Option<String>)> {
    let vocabulary = Vocabulary::standard();
    let inputs: Vec<Option<&str>> = args.values.iter().map(|v| Some(v.as_str())).collect();
    let outputs = match args.to {
        TargetForm::Modern => vocabulary.to_modern_context_types(&inputs),
        TargetForm::Legacy => vocabulary.to_legacy_context_types(&inputs),
    };
    args.values.iter().cloned().zip(outputs).collect()
}

fn load_platform(config: &Path) -> CliResult<Platform> {
    let config = PlatformConfig::from_file(config)?;
    Ok(Platform::from_config(&config)?)
}

/// The registration given on the command line.
struct SingleRegistration(ToolRegistration);

#[async_trait]
impl RegistrationRepository for SingleRegistration {
    async fn get_by_id(&self, id: &str) -> Result<Option<ToolRegistration>, CollaboratorError> {
        Ok((self.0.id == id).then(|| self.0.clone()))
    }
}

/// The user given on the command line, authenticated by id.
struct SingleUser(UserIdentity);

#[async_trait]
impl UserAuthenticator for SingleUser {
    async fn authenticate(&self, login_hint: &str) -> Result<AuthResult, CollaboratorError> {
        if self.0.id == login_hint {
            Ok(AuthResult::success(self.0.clone()))
        } else {
            Ok(AuthResult::failure())
        }
    }
}

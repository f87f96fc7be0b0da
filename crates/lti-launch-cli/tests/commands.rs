//! Integration tests for CLI commands

use std::io::Write;
use std::path::PathBuf;

use lti_launch_cli::cli::{InputArgs, PlatformArgs, SimulateArgs};
use lti_launch_cli::executor::read_input;
use lti_launch_cli::{CliError, CommandExecutor, Commands, OutputFormat};
use tempfile::TempDir;

fn ec_key() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../lti-launch/tests/fixtures/platform_ec.pem")
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn fixtures(dir: &TempDir) -> (PathBuf, PathBuf, PathBuf) {
    let config = write(
        dir,
        "platform.toml",
        &format!(
            "issuer = \"https://lms.example.edu\"\n\
             key_id = \"ec-1\"\n\
             private_key_path = \"{}\"\n\
             key_algorithm = \"ES256\"\n",
            ec_key().display()
        ),
    );
    let registration = write(
        dir,
        "tool.json",
        r#"{
            "id": "7",
            "name": "Quiz Tool",
            "client_id": "quiz-client",
            "redirect_uris": "https://quiz.example.com/launch",
            "deployment_id": "dep-1",
            "version": "1.3.0",
            "send_name": "always",
            "initiate_login_url": "https://quiz.example.com/login",
            "target_link_uri": "https://quiz.example.com/launch"
        }"#,
    );
    let user = write(
        dir,
        "user.json",
        r#"{ "id": "340", "full_name": "Kermit DaFrog" }"#,
    );
    (config, registration, user)
}

fn simulate_args(config: PathBuf, registration: PathBuf, user: PathBuf) -> SimulateArgs {
    SimulateArgs {
        platform: PlatformArgs { config },
        registration,
        user,
        roles: vec!["Instructor".to_string()],
        custom: vec![("who".to_string(), "$Person.name.full".to_string())],
        redirect_uri: None,
        state: "TOOL-STATE-1234".to_string(),
        nonce: "n-1".to_string(),
    }
}

#[test]
fn test_read_input_reports_path() {
    let missing = PathBuf::from("/nonexistent/params.json");
    match read_input(&missing) {
        Err(CliError::Input { path, .. }) => assert_eq!(path, missing),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_simulate_full_launch() {
    let dir = TempDir::new().unwrap();
    let (config, registration, user) = fixtures(&dir);

    let executor = CommandExecutor::new(OutputFormat::Compact, false, false);
    executor
        .execute(Commands::Simulate(simulate_args(config, registration, user)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_simulate_rejects_unregistered_redirect() {
    let dir = TempDir::new().unwrap();
    let (config, registration, user) = fixtures(&dir);

    let mut args = simulate_args(config, registration, user);
    args.redirect_uri = Some("https://evil.example.com".to_string());

    let executor = CommandExecutor::new(OutputFormat::Json, false, false);
    let err = executor.execute(Commands::Simulate(args)).await.unwrap_err();
    assert!(matches!(err, CliError::Launch(_)));
    assert!(err.to_string().contains("Invalid redirect_uri"));
}

#[tokio::test]
async fn test_conversion_commands() {
    let dir = TempDir::new().unwrap();
    let params = write(&dir, "params.json", r#"{"user_id":"42","roles":"Learner"}"#);
    let claims = write(
        &dir,
        "claims.json",
        r#"{
            "sub": "42",
            "https://purl.imsglobal.org/spec/lti/claim/roles": [
                "http://purl.imsglobal.org/vocab/lis/v2/membership#Learner"
            ]
        }"#,
    );
    let items = write(&dir, "items.json", r#"[{"type":"link","url":"https://x"}]"#);
    let broken = write(&dir, "broken.json", "[{");

    let executor = CommandExecutor::new(OutputFormat::Compact, false, false);
    executor
        .execute(Commands::ToClaims(InputArgs { input: params }))
        .await
        .unwrap();
    executor
        .execute(Commands::ToParams(InputArgs { input: claims }))
        .await
        .unwrap();
    executor
        .execute(Commands::ContentItems(InputArgs { input: items }))
        .await
        .unwrap();
    assert!(matches!(
        executor
            .execute(Commands::ContentItems(InputArgs { input: broken }))
            .await,
        Err(CliError::ContentItems(_))
    ));
}

#[tokio::main]
async fn main() {
    if let Err(e) = lti_launch_cli::run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

use clap::Parser;
use fundboard_cli::FundboardCli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = FundboardCli::parse();
    if let Err(error) = fundboard_cli::run(cli).await {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

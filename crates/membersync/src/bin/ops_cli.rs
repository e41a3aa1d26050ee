//! Admin operations CLI: exercise the configured ActiveCampaign credentials
//! without waiting for a real signup.
#![allow(clippy::print_stdout)]

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use activecampaign::{AcClient, AcError};
use attribution::normalize_tag;
use membersync::Config;

#[derive(Parser)]
#[command(name = "membersync-ops", about = "MemberSync admin operations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify the configured API URL and key against the account endpoint.
    TestConnection,
    /// Create/update a contact and assign one tag, end to end.
    TestSend {
        #[arg(long)]
        email: String,
        #[arg(long)]
        tag: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config);

    let cli = Cli::parse();
    let client = build_client(&config)?;

    match cli.command {
        Command::TestConnection => test_connection(&client).await,
        Command::TestSend { email, tag } => test_send(&client, &email, &tag).await,
    }
}

async fn test_connection(client: &AcClient) -> anyhow::Result<()> {
    match client.test_connection().await {
        Ok(user) => {
            let username = if user.username.is_empty() {
                "unknown".to_string()
            } else {
                user.username
            };
            println!("Connection OK, signed in as: {username}");
            Ok(())
        }
        Err(AcError::Http { status, .. }) if status.as_u16() == 403 => {
            bail!("API key rejected (HTTP 403)")
        }
        Err(error) => bail!("connection test failed: {error}"),
    }
}

async fn test_send(client: &AcClient, email: &str, tag: &str) -> anyhow::Result<()> {
    let tag = normalize_tag(tag);
    if tag.is_empty() {
        bail!("tag must not be empty");
    }

    let report = client
        .sync(email, "", "", &[tag.clone()])
        .await
        .map_err(|error| anyhow::anyhow!("test send failed: {error}"))?;

    if report.failed_tags.is_empty() {
        println!(
            "Test sent: contact {} created/updated, tag \"{tag}\" assigned",
            report.contact_id
        );
        Ok(())
    } else {
        bail!(
            "contact {} created/updated, but tag assignment failed for: {}",
            report.contact_id,
            report.failed_tags.join(", ")
        )
    }
}

fn build_client(config: &Config) -> anyhow::Result<AcClient> {
    let ac = config.ac_config().context(
        "API not configured: set MSYNC_API_BASE_URL and MSYNC_API_KEY",
    )?;
    AcClient::new(ac).map_err(|error| anyhow::anyhow!("invalid API configuration: {error}"))
}

fn init_tracing(config: &Config) {
    let default_filter = if config.debug_logging { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

//! `said-identity` CLI
//!
//! Runs the identity startup step outside a host framework.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use said_identity::config::{IdentityConfig, base_dir_from_env};
use said_identity::identity::{WalletStore, action, profile_url};
use said_identity::{AgentMetadata, IdentityManager, Settings};

#[derive(Parser)]
#[command(name = "said-identity", version, about = "Provision and register an agent's SAID identity")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "SAID_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load or create the wallet, register it, and print the identity.
    Init {
        #[arg(long, env = "SAID_AGENT_ID")]
        agent_id: String,
        /// Display name sent to the directory (defaults to the agent id).
        #[arg(long)]
        name: Option<String>,
        /// One-line description sent to the directory.
        #[arg(long)]
        bio: Option<String>,
    },
    /// Print the wallet and profile URL without contacting the directory.
    Show {
        #[arg(long, env = "SAID_AGENT_ID")]
        agent_id: String,
    },
    /// Inspect persisted settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// List all settings with their values.
    List,
    /// Print one setting by dotted path.
    Get { key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let base_dir = base_dir_from_env();
    let settings_path = Settings::path_in(&base_dir);
    let settings = Settings::load_from(&settings_path);

    match cli.command {
        Command::Init {
            agent_id,
            name,
            bio,
        } => {
            let config = IdentityConfig::resolve(&settings).context("invalid configuration")?;
            let mut manager = IdentityManager::from_config(&config)
                .context("failed to build registration client")?;

            let mut metadata = AgentMetadata::new(agent_id);
            metadata.name = name;
            metadata.bio.extend(bio);

            manager
                .initialize(&metadata, None)
                .await
                .context("identity initialization failed")?;
            println!("{}", action::handle(&manager));
            manager.stop();
        }
        Command::Show { agent_id } => {
            let config = IdentityConfig::resolve(&settings).context("invalid configuration")?;
            let store = WalletStore::new(&config.base_dir);
            let record = store
                .load_or_create(&agent_id)
                .with_context(|| format!("failed to load wallet for agent '{agent_id}'"))?;
            println!("Wallet:  {}", record.public_key);
            println!("Profile: {}", profile_url(&config.profile_base_url, &record.public_key));
            println!("Created: {}", record.created_at.to_rfc3339());
            println!("File:    {}", store.wallet_path(&agent_id).display());
        }
        Command::Settings { command } => match command {
            SettingsCommand::List => {
                println!("# {}", settings_path.display());
                for (key, value) in settings.list() {
                    println!("{key} = {value}");
                }
            }
            SettingsCommand::Get { key } => {
                let value = settings
                    .get(&key)
                    .with_context(|| format!("unknown setting '{key}'"))?;
                println!("{value}");
            }
        },
    }

    Ok(())
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("said_identity=info"));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use taleweave::accounts::AccountService;
use taleweave::config::ServerConfig;
use taleweave::error::Error;
use taleweave::ident::IdentifierAllocator;
use taleweave::quota::QuotaEnforcer;
use taleweave::server::{AppState, create_router};
use taleweave::store::{SqliteStore, Store};
use taleweave::types::Tier;

#[derive(Parser)]
#[command(name = "taleweave")]
#[command(about = "A story publishing server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database
    Init {
        /// Data directory for the database and stored assets
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Start the server
    Serve {
        /// TOML config file. Flags below override its values.
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and stored assets
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Suffix appended to account domains (e.g. "taleweave.site")
        #[arg(long)]
        platform_suffix: Option<String>,

        /// Public base URL for external access (e.g., "https://stories.example.com").
        /// Used as the prefix of stored asset URLs. If not set, derived from host and port.
        #[arg(long)]
        public_base_url: Option<String>,
    },

    /// Administrative commands
    Admin {
        /// Data directory for the database and stored assets
        #[arg(long, default_value = "./data", global = true)]
        data_dir: PathBuf,

        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Change an account's tier
    SetTier {
        #[arg(long)]
        email: String,

        /// One of free, basic, pro, premium
        #[arg(long)]
        tier: String,
    },

    /// Recompute the content count of every account
    Recount,
}

fn run_init(data_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(data_dir)?;

    let config = ServerConfig {
        data_dir: data_dir.to_path_buf(),
        ..ServerConfig::default()
    };

    let db_path = config.db_path();
    if db_path.exists() {
        bail!("Server already initialized. Database exists at: {}", db_path.display());
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    fs::create_dir_all(config.assets_dir())?;

    println!("Initialized database at {}", db_path.display());
    Ok(())
}

fn open_store(data_dir: &Path) -> anyhow::Result<Arc<dyn Store>> {
    let config = ServerConfig {
        data_dir: data_dir.to_path_buf(),
        ..ServerConfig::default()
    };

    let db_path = config.db_path();
    if !db_path.exists() {
        bail!("Server not initialized. Run 'taleweave init' first to create the database.");
    }

    let store = SqliteStore::new(&db_path)?;
    // Picks up tables added since the database was created.
    store.initialize()?;
    Ok(Arc::new(store))
}

fn run_admin(data_dir: &Path, command: AdminCommands) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;

    match command {
        AdminCommands::SetTier { email, tier } => {
            let Some(tier) = Tier::parse(&tier) else {
                bail!("Unknown tier '{tier}'. Expected one of: free, basic, pro, premium");
            };

            let allocator = Arc::new(IdentifierAllocator::new(
                store.clone(),
                ServerConfig::default().platform_suffix,
            ));
            let accounts = AccountService::new(store, allocator);

            let account = match accounts.set_tier(&email, tier) {
                Ok(account) => account,
                Err(Error::NotFound) => bail!("No account with email '{email}'"),
                Err(e) => return Err(e.into()),
            };

            println!(
                "{} is now on the {} tier ({} of {} items used)",
                account.email,
                account.tier,
                account.content_count,
                account.tier.content_limit()
            );
        }
        AdminCommands::Recount => {
            let quota = QuotaEnforcer::new(store);
            let counts = quota.recompute_all()?;

            for (account_id, count) in &counts {
                println!("{account_id}\t{count}");
            }
            println!("Recomputed {} accounts", counts.len());
        }
    }

    Ok(())
}

fn load_config(
    file: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    platform_suffix: Option<String>,
    public_base_url: Option<String>,
) -> anyhow::Result<ServerConfig> {
    let mut config = match file {
        Some(path) => ServerConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServerConfig::default(),
    };

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    if let Some(suffix) = platform_suffix {
        config.platform_suffix = suffix;
    }
    if public_base_url.is_some() {
        config.public_base_url = public_base_url;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("taleweave=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            run_init(&data_dir)?;
        }
        Commands::Admin { data_dir, command } => {
            run_admin(&data_dir, command)?;
        }
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            platform_suffix,
            public_base_url,
        } => {
            let config = load_config(config, host, port, data_dir, platform_suffix, public_base_url)?;

            let store = open_store(&config.data_dir)?;
            fs::create_dir_all(config.assets_dir())?;

            let addr = config.socket_addr()?;
            info!(
                "Serving domains under .{} with assets at {}/assets",
                config.platform_suffix,
                config.asset_base_url()
            );

            let state = Arc::new(AppState::new(store, config));
            let app = create_router(state);

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

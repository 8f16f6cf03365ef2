use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quarry_lock::api::{self, AppState, SecurityConfig};
use quarry_lock::config::Config;
use quarry_lock::db::Database;
use quarry_lock::groups::GroupDirectory;
use quarry_lock::host::SharedHost;
use quarry_lock::lang::Lang;
use quarry_lock::permissions::Permissions;
use quarry_lock::placement::PlacementRegistry;
use quarry_lock::plugin::{PluginContext, QuarryLock, ServerStart};
use quarry_lock::tasks::TaskRegistry;
use quarry_lock::world::World;

#[derive(Parser)]
#[command(name = "quarrylock")]
#[command(about = "Code locks for quarry and pump jack sub-components")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the host bridge: load the world, reconcile gates, serve hooks
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Database file (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Config file (defaults to the platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the gate placement table
    Placements,
    /// Print the effective configuration, migrating it if needed
    Config {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

/// Initialize tracing with output to stdout
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "quarry_lock=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(&path),
        None => Config::load_default(),
    }
}

async fn serve(port: u16, db: Option<PathBuf>, config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config)?;

    let db = match db {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    let world = Arc::new(Mutex::new(World::restore(db.load_world()?)));
    let host: SharedHost = world.clone();
    let permissions = Arc::new(Permissions::new());
    let groups = GroupDirectory::new();

    let plugin = Arc::new(QuarryLock::load(PluginContext {
        config,
        host,
        permissions: permissions.clone(),
        lang: Lang::new(),
        groups: groups.resolver(),
        tasks: Arc::new(TaskRegistry::new()),
    }));
    plugin.on_server_initialized(ServerStart::Cold);

    let app = api::create_router_with_security(
        AppState {
            plugin: plugin.clone(),
            world: world.clone(),
            permissions,
            groups,
            db: Some(db.clone()),
        },
        SecurityConfig::from_env(),
    );

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Quarry Lock listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    plugin.unload();
    let snapshot = world.lock().expect("world lock poisoned").snapshot();
    db.save_world(&snapshot)?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port, db, config }) => serve(port, db, config).await?,
        Some(Commands::Placements) => {
            for entry in PlacementRegistry::new().entries() {
                println!(
                    "{:<7} {:<7} offset ({:>5.2}, {:>5.2}, {:>5.2})  yaw {:>5.1}",
                    entry.variant.as_str(),
                    entry.role.as_str(),
                    entry.offset.x,
                    entry.offset.y,
                    entry.offset.z,
                    entry.euler.y
                );
            }
        }
        Some(Commands::Config { path }) => {
            let config = load_config(path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        None => serve(3000, None, None).await?,
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harbour::config::AppConfig;
use harbour::models::{EndpointId, ExecuteAction, Preferences, StackId};
use harbour::portainer_repo::{PortainerApi, PortainerRepo};
use harbour::preferences_repo::PreferencesRepo;
use harbour::stacks_query::visible_containers;
use harbour::stacks_view::StacksViewModel;
use harbour::store::PortainerStore;
use harbour::version;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser)]
#[command(name = version::NAME)]
#[command(version = version::VERSION)]
#[command(about = "Portainer containers, stacks and endpoints from the terminal", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to $CONFIG_FILE, then config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Portainer access token; overrides portainer.api_key
    #[arg(long, env = "HARBOUR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Endpoint to use for this invocation instead of the saved one
    #[arg(short, long, value_name = "ID")]
    endpoint: Option<EndpointId>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List endpoints (environments)
    Endpoints,

    /// List stacks of the selected endpoint
    Stacks {
        /// Filter by name or id
        #[arg(short, long, default_value = "")]
        query: String,

        /// Include stacks inferred from container labels (defaults to the saved preference)
        #[arg(long)]
        include_limited: Option<bool>,

        /// Show stacks of every endpoint
        #[arg(long)]
        all_endpoints: bool,
    },

    /// List containers of the selected endpoint
    Containers {
        /// Filter by name, id, image or stack
        #[arg(short, long, default_value = "")]
        query: String,
    },

    /// Show details of one container
    Inspect { container_id: String },

    /// Start or stop a stack
    Stack {
        #[command(subcommand)]
        command: StackCommands,
    },

    /// Run a lifecycle action (start, stop, restart, kill, pause, unpause) on a container
    Container {
        action: ExecuteAction,
        container_id: String,
    },

    /// Remember the endpoint used by endpoint-scoped commands
    UseEndpoint { endpoint_id: EndpointId },

    /// Show the Portainer message of the day
    Motd,
}

#[derive(Subcommand)]
enum StackCommands {
    Start { stack_id: StackId },
    Stop { stack_id: StackId },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut app_config = match &cli.config {
        Some(path) => AppConfig::load_from_path(&path.to_string_lossy())?,
        None => AppConfig::load()?,
    };
    if let Some(key) = cli.api_key.clone() {
        app_config.portainer.api_key = Some(key);
    }

    let preferences_repo = PreferencesRepo::connect(&app_config.preferences.path).await?;
    preferences_repo.init().await?;
    let mut preferences = preferences_repo.load_or_default().await?;

    let repo = PortainerRepo::connect(&app_config.portainer, app_config.decoding.list_policy)?;
    info!(url = %repo.base_url(), "Using Portainer server");
    let store = Arc::new(PortainerStore::new(Arc::new(repo)));

    match cli.command {
        Commands::Endpoints => {
            let endpoints = store.refresh_endpoints().value().await?;
            print_json(endpoints.as_slice())?;
        }
        Commands::UseEndpoint { endpoint_id } => {
            let endpoints = store.refresh_endpoints().value().await?;
            anyhow::ensure!(
                endpoints.iter().any(|e| e.id == endpoint_id),
                "endpoint {} does not exist",
                endpoint_id
            );
            preferences.selected_endpoint_id = Some(endpoint_id);
            preferences_repo.save(&preferences).await?;
            info!(endpoint_id, "Saved selected endpoint");
        }
        Commands::Motd => {
            print_json(&store.api().motd().await?)?;
        }
        command => {
            select_endpoint(&store, cli.endpoint.or(preferences.selected_endpoint_id)).await?;
            run_endpoint_command(&store, command, preferences).await?;
        }
    }

    Ok(())
}

/// Selects `requested`, or the first endpoint that is up when nothing was chosen.
async fn select_endpoint(
    store: &Arc<PortainerStore>,
    requested: Option<EndpointId>,
) -> Result<()> {
    if let Some(endpoint_id) = requested {
        store.select_endpoint(Some(endpoint_id));
        return Ok(());
    }
    let endpoints = store.refresh_endpoints().value().await?;
    let endpoint = endpoints
        .iter()
        .find(|e| e.is_up())
        .or_else(|| endpoints.first())
        .context("Portainer has no endpoints")?;
    info!(
        endpoint_id = endpoint.id,
        name = ?endpoint.name,
        "No endpoint selected, using the first one"
    );
    store.select_endpoint(Some(endpoint.id));
    Ok(())
}

async fn run_endpoint_command(
    store: &Arc<PortainerStore>,
    command: Commands,
    mut preferences: Preferences,
) -> Result<()> {
    match command {
        Commands::Stacks {
            query,
            include_limited,
            all_endpoints,
        } => {
            if all_endpoints {
                preferences.filter_by_active_endpoint = false;
            }
            let view = Arc::new(StacksViewModel::new(Arc::clone(store), preferences));
            view.set_query(query);
            view.get_stacks(include_limited).value().await?;
            print_json(&view.stacks())?;
        }
        Commands::Containers { query } => {
            let containers = store.refresh_containers().value().await?;
            print_json(&visible_containers(&containers, &query))?;
        }
        Commands::Inspect { container_id } => {
            print_json(&store.inspect_container(&container_id).await?)?;
        }
        Commands::Stack { command } => {
            let (stack_id, started) = match command {
                StackCommands::Start { stack_id } => (stack_id, true),
                StackCommands::Stop { stack_id } => (stack_id, false),
            };
            let view = StacksViewModel::new(Arc::clone(store), preferences);
            view.set_stack_state(stack_id, started).await?.value().await?;
            info!(stack_id, started, "Stack state changed");
        }
        Commands::Container {
            action,
            container_id,
        } => {
            let containers = store.execute(&container_id, action).await?.value().await?;
            let state = containers
                .iter()
                .find(|c| c.id.starts_with(&container_id))
                .and_then(|c| c.state);
            info!(
                %action,
                container_id = %container_id,
                ?state,
                expected = %action.expected_state(),
                "Action executed"
            );
        }
        Commands::Endpoints | Commands::UseEndpoint { .. } | Commands::Motd => {}
    }
    Ok(())
}

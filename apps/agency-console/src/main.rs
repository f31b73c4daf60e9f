use std::path::{Path, PathBuf};
use std::sync::Arc;

use agency_sync::contract::client::AgencyApi;
use agency_sync::contract::model::{
    ClientPatch, ClientPlan, ClientStatus, NewClient, NewCredential, NewTransaction, Secret,
    TransactionStatus, TransactionType,
};
use agency_sync::domain::entity::Entity;
use agency_sync::domain::repo::RecordStore;
use agency_sync::domain::resource::{Resource, ResourceStatus};
use agency_sync::domain::service::AgencyService;
use agency_sync::gateways::local::AgencyLocalClient;
use agency_sync::infra::store::{InMemoryRecordStore, RestRecordStore};
use agency_sync::AgencySyncConfig;
use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use runtime::{default_logging_config, AppConfig, CliArgs};
use rust_decimal::Decimal;
use uuid::Uuid;

mod render;

/// Agency console - clients, billing and credential vault
#[derive(Parser)]
#[command(name = "agency-console")]
#[command(about = "Agency console - clients, billing and credential vault")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use the built-in demo data instead of the hosted store
    #[arg(long)]
    mock: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline metrics and totals
    Dashboard,
    /// Manage clients
    #[command(subcommand)]
    Clients(ClientCommand),
    /// Income and expenses
    #[command(subcommand)]
    Financial(FinancialCommand),
    /// Stored access credentials
    #[command(subcommand)]
    Vault(VaultCommand),
}

#[derive(Subcommand)]
enum ClientCommand {
    /// List clients ordered by name
    List(SearchArgs),
    /// Register a new client
    Add(AddClientArgs),
    /// Change a client's status
    SetStatus {
        id: Uuid,
        status: ClientStatus,
    },
    /// Delete a client
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum FinancialCommand {
    /// List the most recent transactions
    List(SearchArgs),
    /// Income, expense and balance over the loaded transactions
    Stats,
    /// Record a transaction
    Add(AddTransactionArgs),
    /// Mark a transaction as paid
    MarkPaid { id: Uuid },
    /// Delete a transaction
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum VaultCommand {
    /// List credentials ordered by title
    List {
        #[command(flatten)]
        search: SearchArgs,
        /// Show passwords in clear text
        #[arg(long)]
        reveal: bool,
    },
    /// Store a credential
    Add(AddCredentialArgs),
    /// Delete a credential
    Delete { id: Uuid },
}

#[derive(Args)]
struct SearchArgs {
    /// Case-insensitive filter
    #[arg(short, long)]
    search: Option<String>,
}

#[derive(Args)]
struct AddClientArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    slug: String,
    #[arg(long, default_value = "essential")]
    plan: ClientPlan,
    #[arg(long, default_value = "active")]
    status: ClientStatus,
    /// Monthly fee, e.g. 1299.90
    #[arg(long)]
    monthly_value: Decimal,
    /// Next due date (YYYY-MM-DD)
    #[arg(long)]
    due_date: NaiveDate,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args)]
struct AddTransactionArgs {
    #[arg(long = "type")]
    kind: TransactionType,
    #[arg(long)]
    amount: Decimal,
    #[arg(long)]
    description: String,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    due_date: NaiveDate,
    #[arg(long, default_value = "pending")]
    status: TransactionStatus,
    #[arg(long)]
    client_id: Option<String>,
    #[arg(long)]
    client_name: Option<String>,
}

#[derive(Args)]
struct AddCredentialArgs {
    #[arg(long)]
    client_id: String,
    #[arg(long)]
    client_name: Option<String>,
    #[arg(long)]
    title: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        verbose: cli.verbose,
        mock: cli.mock,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.home_dir));

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let module_config: AgencySyncConfig = config.module_config("agency_sync")?;
    let store = build_store(&config, &module_config, cli.mock)?;

    let service = Arc::new(AgencyService::mount(store, &module_config).await);
    let command = cli.command.unwrap_or(Commands::Dashboard);

    let api = AgencyLocalClient::new(service.clone());
    let result = match ensure_loaded(&service, &command) {
        Ok(()) => execute(&api, command, cli.json).await,
        Err(e) => Err(e),
    };
    service.close();
    result
}

fn build_store(
    config: &AppConfig,
    module_config: &AgencySyncConfig,
    mock: bool,
) -> Result<Arc<dyn RecordStore>> {
    if mock {
        tracing::info!("Using in-memory demo store");
        return Ok(Arc::new(InMemoryRecordStore::demo(
            &module_config.collections,
        )));
    }
    match config.store {
        Some(ref store) => {
            tracing::info!(base_url = %store.base_url, "Using hosted record store");
            Ok(Arc::new(RestRecordStore::from_config(store)?))
        }
        None => bail!(
            "No record store configured: set `store.base_url` in the config file or pass --mock"
        ),
    }
}

/// Fail a command only when a collection it reads could not be loaded.
fn ensure_loaded(service: &AgencyService, command: &Commands) -> Result<()> {
    let needed = match command {
        Commands::Dashboard => vec![
            load_failure(service.clients()),
            load_failure(service.transactions()),
        ],
        Commands::Clients(_) => vec![load_failure(service.clients())],
        Commands::Financial(_) => vec![load_failure(service.transactions())],
        Commands::Vault(_) => vec![load_failure(service.credentials())],
    };
    match needed.into_iter().flatten().next() {
        Some((collection, message)) => bail!("Failed to load {collection}: {message}"),
        None => Ok(()),
    }
}

fn load_failure<E: Entity>(resource: &Resource<E>) -> Option<(String, String)> {
    (resource.status() == ResourceStatus::Error).then(|| {
        (
            resource.collection().to_string(),
            resource.error().unwrap_or_default(),
        )
    })
}

async fn execute(api: &AgencyLocalClient, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Dashboard => {
            let metrics = api.dashboard().await?;
            let stats = api.financial_stats().await?;
            let activity = api.recent_activity(10).await?;
            render::dashboard(&metrics, &stats, &activity, json)
        }
        Commands::Clients(cmd) => clients(api, cmd, json).await,
        Commands::Financial(cmd) => financial(api, cmd, json).await,
        Commands::Vault(cmd) => vault(api, cmd, json).await,
    }
}

async fn clients(api: &AgencyLocalClient, cmd: ClientCommand, json: bool) -> Result<()> {
    match cmd {
        ClientCommand::List(args) => {
            let clients = api.list_clients(args.search).await?;
            render::clients(&clients, json)
        }
        ClientCommand::Add(args) => {
            let created = api
                .create_client(NewClient {
                    name: args.name,
                    slug: args.slug,
                    status: args.status,
                    plan: args.plan,
                    due_date: args.due_date,
                    monthly_value: args.monthly_value,
                    notes: args.notes,
                })
                .await?;
            render::clients(std::slice::from_ref(&created), json)
        }
        ClientCommand::SetStatus { id, status } => {
            let updated = api
                .update_client(
                    id,
                    ClientPatch {
                        status: Some(status),
                        ..ClientPatch::default()
                    },
                )
                .await?;
            render::clients(std::slice::from_ref(&updated), json)
        }
        ClientCommand::Delete { id } => {
            api.delete_client(id).await?;
            render::deleted("client", id, json)
        }
    }
}

async fn financial(api: &AgencyLocalClient, cmd: FinancialCommand, json: bool) -> Result<()> {
    match cmd {
        FinancialCommand::List(args) => {
            let txs = api.list_transactions(args.search).await?;
            render::transactions(&txs, json)
        }
        FinancialCommand::Stats => render::stats(&api.financial_stats().await?, json),
        FinancialCommand::Add(args) => {
            let paid_at = (args.status == TransactionStatus::Paid).then(chrono::Utc::now);
            let created = api
                .create_transaction(NewTransaction {
                    client_id: args.client_id,
                    client_name: args.client_name,
                    kind: args.kind,
                    status: args.status,
                    amount: args.amount,
                    description: args.description,
                    due_date: args.due_date,
                    paid_at,
                })
                .await?;
            render::transactions(std::slice::from_ref(&created), json)
        }
        FinancialCommand::MarkPaid { id } => {
            let paid = api.mark_paid(id).await?;
            render::transactions(std::slice::from_ref(&paid), json)
        }
        FinancialCommand::Delete { id } => {
            api.delete_transaction(id).await?;
            render::deleted("transaction", id, json)
        }
    }
}

async fn vault(api: &AgencyLocalClient, cmd: VaultCommand, json: bool) -> Result<()> {
    match cmd {
        VaultCommand::List { search, reveal } => {
            let creds = api.list_credentials(search.search).await?;
            render::credentials(&creds, reveal, json)
        }
        VaultCommand::Add(args) => {
            let created = api
                .create_credential(NewCredential {
                    client_id: args.client_id,
                    client_name: args.client_name,
                    title: args.title,
                    username: args.username,
                    password: Secret::new(args.password),
                    url: args.url,
                    notes: args.notes,
                })
                .await?;
            render::credentials(std::slice::from_ref(&created), false, json)
        }
        VaultCommand::Delete { id } => {
            api.delete_credential(id).await?;
            render::deleted("credential", id, json)
        }
    }
}

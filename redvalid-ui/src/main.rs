//! RedValid client - command-line front end
//!
//! Drives the query and upload views from the terminal. Progress events
//! from the views are printed to stderr as they happen; results go to
//! stdout.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use redvalid_common::config::{
    default_config_path, load_toml_config, write_toml_config, ConfigOverrides, ConfigResolver,
    TomlConfig, DEFAULT_BACKEND_URL,
};
use redvalid_common::events::{EventBus, RedValidEvent};
use redvalid_ui::display::{
    render_phase, render_query_state, render_upload_result, shorten_address,
};
use redvalid_ui::error::ClientError;
use redvalid_ui::models::UploadMode;
use redvalid_ui::shell::{Shell, Tab};
use redvalid_ui::views::{QueryState, ReporterStatus, UploadView};
use redvalid_ui::AppContext;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for redvalid-ui
#[derive(Parser, Debug)]
#[command(name = "redvalid-ui")]
#[command(about = "Check and register video provenance on RedValid")]
#[command(version)]
struct Args {
    /// Path to config file (default: platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides REDVALID_BACKEND_URL and config file)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Wallet bridge base URL (overrides REDVALID_WALLET_BRIDGE_URL and config file)
    #[arg(long, global = true)]
    wallet_bridge_url: Option<String>,

    /// Network name passed to the wallet when signing
    #[arg(long, global = true)]
    network: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up the verification record of a video
    Query(QueryArgs),

    /// Register a video on chain with the connected wallet
    Upload(UploadArgs),

    /// Reporter profile commands
    #[command(subcommand)]
    Reporter(ReporterCommand),

    /// Wallet commands
    #[command(subcommand)]
    Wallet(WalletCommand),

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(ClapArgs, Debug)]
struct QueryArgs {
    /// Video URL to look up
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    url: Option<String>,

    /// Look up by video file content instead
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct UploadArgs {
    /// Video URL to register
    #[arg(long, required_unless_present = "file", conflicts_with = "file")]
    url: Option<String>,

    /// Video file to register
    #[arg(long)]
    file: Option<PathBuf>,

    /// Full name used to register the reporter if the wallet has none yet
    #[arg(long)]
    name: Option<String>,

    /// Institution for a new reporter profile
    #[arg(long, requires = "name")]
    institution: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ReporterCommand {
    /// Show the reporter profile for a wallet (default: connected wallet)
    Show {
        #[arg(long)]
        wallet: Option<String>,
    },
    /// Create a reporter profile for the connected wallet
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        institution: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    /// Show whether a wallet is connected (never prompts)
    Status,
    /// Ask the wallet for access and show the address
    Connect,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.config.as_deref());

    if let Command::Config(ConfigCommand::Init { force }) = &args.command {
        return init_config(args.config.as_deref(), *force);
    }

    let overrides = ConfigOverrides {
        backend_url: args.backend_url.clone(),
        wallet_bridge_url: args.wallet_bridge_url.clone(),
        network: args.network.clone(),
    };
    let config = ConfigResolver::load(overrides, args.config.as_deref())
        .context("Failed to load configuration")?
        .resolve();

    info!(
        backend_url = %config.backend_url,
        network = %config.network.name,
        wallet_bridge = config.wallet_bridge_url.as_deref().unwrap_or("none"),
        "RedValid client starting"
    );

    let ctx = AppContext::new(config).context("Failed to initialize backend client")?;
    let printer = spawn_event_printer(&ctx.event_bus);

    let outcome = match args.command {
        Command::Query(query) => run_query(&ctx, query).await,
        Command::Upload(upload) => run_upload(&ctx, upload).await,
        Command::Reporter(cmd) => run_reporter(&ctx, cmd).await,
        Command::Wallet(cmd) => run_wallet(&ctx, cmd).await,
        Command::Config(_) => Ok(()),
    };

    // Dropping the last sender closes the bus once queued events are printed
    drop(ctx);
    if let Err(e) = printer.await {
        warn!("Event printer stopped abnormally: {}", e);
    }
    outcome
}

/// Tracing goes to stderr; RUST_LOG wins over the config file level
fn init_tracing(config_path: Option<&Path>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config_path
            .map(Path::to_path_buf)
            .or_else(default_config_path)
            .and_then(|path| load_toml_config(&path).ok().flatten())
            .map(|toml| toml.logging.level)
            .unwrap_or_else(|| "info".to_string());
        tracing_subscriber::EnvFilter::new(level)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(default_config_path)
        .ok_or_else(|| anyhow!("Could not determine config directory; pass --config"))?;

    if path.exists() && !force {
        bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let config = TomlConfig {
        backend_url: Some(DEFAULT_BACKEND_URL.to_string()),
        ..TomlConfig::default()
    };
    write_toml_config(&config, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote {}", path.display());
    Ok(())
}

fn spawn_event_printer(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                RedValidEvent::UploadPhaseChanged { phase: Some(phase), .. } => {
                    eprintln!("{}", render_phase(Some(phase)));
                }
                RedValidEvent::WalletConnected { address, .. } => {
                    eprintln!("Connected: {}", shorten_address(&address));
                }
                RedValidEvent::ReporterRegistered { wallet_address, .. } => {
                    eprintln!("Reporter registered for {}", shorten_address(&wallet_address));
                }
                other => debug!(event = other.event_type(), "Event"),
            }
        }
    })
}

async fn run_query(ctx: &AppContext, args: QueryArgs) -> Result<()> {
    let mut shell = Shell::new();

    let state = match (args.url, args.file) {
        (Some(url), _) => {
            shell.set_search_input(url);
            if !shell.submit_search() {
                bail!("{}", redvalid_ui::messages::ENTER_VIDEO_URL);
            }
            let mut view = ctx.query_view(shell.seeded_query());
            view.enter().await.clone()
        }
        (None, Some(path)) => {
            shell.select_tab(Tab::Check);
            let mut view = ctx.query_view(None);
            view.submit_file_path(&path).await.clone()
        }
        (None, None) => bail!("{}", redvalid_ui::messages::ENTER_VIDEO_URL),
    };

    match &state {
        QueryState::Failed(message) => bail!("{}", message),
        other => println!("{}", render_query_state(other)),
    }
    Ok(())
}

/// Reconnect silently, falling back to an explicit connect
async fn connected_view(ctx: &AppContext) -> Result<UploadView> {
    let mut view = ctx.upload_view();
    if view.mount().await.is_none() {
        view.connect().await.map_err(|_| view_error(&view))?;
    }
    Ok(view)
}

fn view_error(view: &UploadView) -> anyhow::Error {
    anyhow!(
        "{}",
        view.error().unwrap_or(redvalid_ui::messages::GENERIC_FAILURE)
    )
}

async fn run_upload(ctx: &AppContext, args: UploadArgs) -> Result<()> {
    let mut view = connected_view(ctx).await?;

    let needs_profile = matches!(view.reporter(), ReporterStatus::Missing);
    if let (true, Some(name)) = (needs_profile, args.name.as_deref()) {
        view.register(name, args.institution.as_deref())
            .await
            .map_err(|_| view_error(&view))?;
    }

    match (args.url, args.file) {
        (Some(url), _) => {
            view.set_mode(UploadMode::Url);
            view.set_video_url(url);
        }
        (None, Some(path)) => {
            view.set_mode(UploadMode::File);
            view.select_file_path(&path)
                .await
                .map_err(|_| view_error(&view))?;
        }
        (None, None) => bail!("{}", redvalid_ui::messages::ENTER_VIDEO_URL),
    }

    let result = view.upload().await.map_err(|_| view_error(&view))?;
    println!("{}", render_upload_result(&result));
    Ok(())
}

async fn run_reporter(ctx: &AppContext, cmd: ReporterCommand) -> Result<()> {
    match cmd {
        ReporterCommand::Show { wallet } => {
            let wallet = match wallet {
                Some(wallet) => wallet,
                None => connected_view(ctx)
                    .await?
                    .wallet_address()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("{}", redvalid_ui::messages::CONNECT_WALLET_FIRST))?,
            };

            match ctx.backend.get_reporter(&wallet).await {
                Ok(profile) => {
                    println!("Name:        {}", profile.full_name);
                    println!("Wallet:      {}", profile.wallet_address);
                    if let Some(institution) = &profile.institution {
                        println!("Institution: {}", institution);
                    }
                    if let Some(kyc) = profile.kyc_verified {
                        println!("KYC:         {}", if kyc { "verified" } else { "not verified" });
                    }
                }
                Err(ClientError::NotFound(_)) => {
                    println!("No reporter registered for {}", shorten_address(&wallet));
                }
                Err(e) => bail!("{}", redvalid_ui::messages::client_message(&e)),
            }
        }
        ReporterCommand::Register { name, institution } => {
            let mut view = connected_view(ctx).await?;
            let profile = view
                .register(&name, institution.as_deref())
                .await
                .map_err(|_| view_error(&view))?;
            println!(
                "Registered {} for {}",
                profile.full_name,
                shorten_address(&profile.wallet_address)
            );
        }
    }
    Ok(())
}

async fn run_wallet(ctx: &AppContext, cmd: WalletCommand) -> Result<()> {
    let mut view = ctx.upload_view();
    match cmd {
        WalletCommand::Status => match view.mount().await {
            Some(address) => println!("Connected: {}", address),
            None if !ctx.wallet.is_present() => {
                println!("{}", redvalid_ui::messages::WALLET_NOT_INSTALLED)
            }
            None => println!("Not connected"),
        },
        WalletCommand::Connect => {
            let address = view.connect().await.map_err(|_| view_error(&view))?;
            println!("Connected: {}", address);
            match view.reporter() {
                ReporterStatus::Registered(profile) => {
                    println!("Reporter:  {}", profile.full_name)
                }
                ReporterStatus::Missing => {
                    println!("{}", redvalid_ui::messages::REGISTER_BEFORE_UPLOAD)
                }
                ReporterStatus::Unknown => {}
            }
        }
    }
    Ok(())
}

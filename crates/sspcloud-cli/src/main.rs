//! SSPCloud CLI - launcher URLs and extension settings from the terminal
//!
//! Usage:
//!   sspcloud url <repo>              Print the launcher URL for a repository
//!   sspcloud open <repo>             Open the launcher in the browser
//!   sspcloud detect <page-url>       Run project detection on a page URL
//!   sspcloud forges list|add|remove  Manage configured forges
//!   sspcloud config show|set|reset   Manage launcher parameters
//!   sspcloud registrations           Show content scripts for GitLab forges
//!   sspcloud watch --manifest <file> Keep a registration manifest in sync

mod detect;
mod repository;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sspcloud_core::{
    build_launch_url, usable_template, Forge, ForgeKind, Settings, LAUNCHER_KEYS,
};
use sspcloud_page::{PageForge, PageLocation};
use sspcloud_registry::{
    run_registration_service, ContentScriptSpec, FileStorage, ManifestRegistrar, SettingsStore,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::detect::PageHints;
use crate::repository::parse_repository;

#[derive(Parser)]
#[command(name = "sspcloud")]
#[command(author, version, about = "Open repositories in the SSPCloud launcher")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file
    #[arg(long, global = true, default_value = ".sspcloud/storage.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the launcher URL for a repository
    Url {
        /// owner/repo (nested groups allowed) or a clone URL
        repository: String,

        /// Forge host for the owner/repo form
        #[arg(long)]
        host: Option<String>,

        /// URL template overriding the forge's, with {owner} and {repo}
        #[arg(long)]
        template: Option<String>,
    },

    /// Open the launcher for a repository in the default browser
    Open {
        /// owner/repo (nested groups allowed) or a clone URL
        repository: String,

        /// Forge host for the owner/repo form
        #[arg(long)]
        host: Option<String>,
    },

    /// Detect the project on a forge page
    Detect {
        /// Full page URL
        page_url: String,

        /// GitLab project path attribute rendered on the page
        #[arg(long)]
        project_path: Option<String>,

        /// GitLab body data-page value
        #[arg(long)]
        data_page: Option<String>,
    },

    /// Forge management
    Forges {
        #[command(subcommand)]
        action: ForgeCommands,
    },

    /// Launcher parameters
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show the content scripts GitLab forges get
    Registrations,

    /// Write the registration manifest on every forge change, until Ctrl-C
    Watch {
        /// Manifest file
        #[arg(long)]
        manifest: PathBuf,
    },
}

#[derive(Subcommand)]
enum ForgeCommands {
    /// List configured forges
    List,

    /// Add or replace a forge
    Add {
        /// Domain (scheme and path are stripped)
        domain: String,

        /// github or gitlab
        #[arg(long = "type", default_value = "gitlab")]
        kind: ForgeKind,

        /// URL template with {owner} and {repo}
        #[arg(long)]
        template: Option<String>,
    },

    /// Remove a forge
    Remove {
        domain: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective launcher parameters
    Show,

    /// Set one parameter by its key (baseUrl, version, s3, ...)
    Set { key: String, value: String },

    /// Restore the defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = open_store(&cli.store).await?;

    match cli.command {
        Commands::Url {
            repository,
            host,
            template,
        } => cmd_url(&store, &repository, host.as_deref(), template.as_deref()).await,
        Commands::Open { repository, host } => cmd_open(&store, &repository, host.as_deref()).await,
        Commands::Detect {
            page_url,
            project_path,
            data_page,
        } => {
            let hints = PageHints {
                project_path,
                data_page,
            };
            cmd_detect(&store, &page_url, &hints).await
        }
        Commands::Forges { action } => cmd_forges(&store, action).await,
        Commands::Config { action } => cmd_config(&store, action).await,
        Commands::Registrations => cmd_registrations(&store).await,
        Commands::Watch { manifest } => cmd_watch(store, manifest).await,
    }
}

async fn open_store(path: &Path) -> Result<SettingsStore<FileStorage>> {
    let storage = FileStorage::open(path)
        .await
        .with_context(|| format!("Failed to open settings file {}", path.display()))?;
    Ok(SettingsStore::new(storage))
}

async fn load_settings(store: &SettingsStore<FileStorage>) -> Result<Settings> {
    store.load().await.context("Failed to read settings")
}

async fn launch_url(
    store: &SettingsStore<FileStorage>,
    repository: &str,
    host: Option<&str>,
    template: Option<&str>,
) -> Result<String> {
    let repository = parse_repository(repository, host)?;
    let settings = load_settings(store).await?;

    if template.is_some() && usable_template(template).is_none() {
        warn!("Template needs both {{owner}} and {{repo}}, using launcher parameters");
    }
    let template = template.or_else(|| settings.template_for(&repository.host));
    Ok(build_launch_url(&repository, &settings.launcher, template))
}

async fn cmd_url(
    store: &SettingsStore<FileStorage>,
    repository: &str,
    host: Option<&str>,
    template: Option<&str>,
) -> Result<()> {
    println!("{}", launch_url(store, repository, host, template).await?);
    Ok(())
}

async fn cmd_open(
    store: &SettingsStore<FileStorage>,
    repository: &str,
    host: Option<&str>,
) -> Result<()> {
    let url = launch_url(store, repository, host, None).await?;
    open::that(&url).with_context(|| format!("Failed to open a browser for {}", url))?;
    info!("Opened {}", url);
    Ok(())
}

async fn cmd_detect(
    store: &SettingsStore<FileStorage>,
    page_url: &str,
    hints: &PageHints,
) -> Result<()> {
    let location =
        PageLocation::parse(page_url).with_context(|| format!("Invalid page URL: {}", page_url))?;
    let settings = load_settings(store).await?;
    let Some(kind) = settings.forges.kind_for(&location.host) else {
        bail!(
            "No forge configured for {} (add it with 'sspcloud forges add')",
            location.host
        );
    };

    let forge = PageForge::from(kind);
    let detection = detect::detect(page_url, forge, hints);

    println!("Forge: {} ({})", location.host, kind);
    match &detection.identity {
        Some(identity) => println!("Project: {}", identity),
        None => println!("Project: not detected"),
    }
    println!(
        "Button: {}",
        if detection.eligible { "yes" } else { "no" }
    );
    Ok(())
}

async fn cmd_forges(store: &SettingsStore<FileStorage>, action: ForgeCommands) -> Result<()> {
    match action {
        ForgeCommands::List => {
            let forges = store.forges().await.context("Failed to read forges")?;
            if forges.is_empty() {
                println!("No forges configured");
                return Ok(());
            }
            println!("Forges:");
            for forge in forges.iter() {
                match forge.template() {
                    Some(template) => println!("  {} ({}) -> {}", forge.domain, forge.kind, template),
                    None => println!("  {} ({})", forge.domain, forge.kind),
                }
            }
        }
        ForgeCommands::Add {
            domain,
            kind,
            template,
        } => {
            let mut forge = Forge::new(&domain, kind)?;
            if let Some(template) = template {
                forge = forge.with_template(template);
            }
            let domain = forge.domain.clone();
            let forges = store.upsert_forge(forge).await?;
            println!("Saved {} ({} forge(s) configured)", domain, forges.len());
        }
        ForgeCommands::Remove { domain } => {
            let removed = store.remove_forge(&domain).await?;
            println!("Removed {}", removed.domain);
        }
    }
    Ok(())
}

async fn cmd_config(store: &SettingsStore<FileStorage>, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let config = store
                .launcher_config()
                .await
                .context("Failed to read launcher config")?;
            for key in LAUNCHER_KEYS {
                println!("{} = {}", key, config.get(key).unwrap_or_default());
            }
        }
        ConfigCommands::Set { key, value } => {
            let mut config = store.launcher_config().await?;
            config.set(&key, value)?;
            store.save_launcher_config(&config).await?;
            let saved = store.launcher_config().await?;
            println!("{} = {}", key, saved.get(&key).unwrap_or_default());
        }
        ConfigCommands::Reset => {
            store.reset_launcher_config().await?;
            println!("Launcher config reset to defaults");
        }
    }
    Ok(())
}

async fn cmd_registrations(store: &SettingsStore<FileStorage>) -> Result<()> {
    let forges = store.forges().await.context("Failed to read forges")?;
    let scripts: Vec<ContentScriptSpec> = forges.iter().filter_map(ContentScriptSpec::for_forge).collect();
    if scripts.is_empty() {
        println!("No GitLab forges configured");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&scripts)?);
    Ok(())
}

async fn cmd_watch(store: SettingsStore<FileStorage>, manifest: PathBuf) -> Result<()> {
    let storage = store.storage().clone();
    let _watcher = storage
        .watch()
        .with_context(|| format!("Failed to watch {}", storage.path().display()))?;
    let registrar = ManifestRegistrar::new(&manifest);

    info!(
        "Watching {} -> {} (Ctrl-C to stop)",
        storage.path().display(),
        manifest.display()
    );
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler failed: {}", e);
        }
    };
    let set = run_registration_service(&storage, &registrar, shutdown).await;

    println!("Stopped with {} active registration(s)", set.active().len());
    for domain in set.domains() {
        println!("  {}", domain);
    }
    Ok(())
}

mod cli;

use localfiles::config::{self, Config};
use localfiles::registry::{AssetRegistry, Fetcher, RegistrySettings};
use localfiles::renderer;
use localfiles::scheduler::{SchedulerRunner, SchedulerSettings, TargetScheduler};
use localfiles::state::DataFiles;
use localfiles_common::{AssetRef, TargetId};
use localfiles_probe::{CompositeProber, Prober};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, TargetCommand};
use parking_lot::Mutex;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn open_registry(config: &Config) -> Result<AssetRegistry> {
    let files = DataFiles::new(&config.storage.data_dir);
    let registry = AssetRegistry::open(
        RegistrySettings::from(&config.content),
        files,
        Arc::new(CompositeProber::standard()),
    )
    .with_context(|| format!("Failed to load registry from {:?}", config.storage.data_dir))?;
    Ok(registry)
}

fn open_scheduler(config: &Config) -> Result<TargetScheduler> {
    let files = DataFiles::new(&config.storage.data_dir);
    let scheduler = TargetScheduler::open(SchedulerSettings::from(&config.scheduler), files)
        .with_context(|| format!("Failed to load schedule from {:?}", config.storage.data_dir))?;
    Ok(scheduler)
}

async fn run_scheduler(config: Config) -> Result<()> {
    tracing::info!("Starting localfiles");

    std::fs::create_dir_all(&config.content.root)
        .with_context(|| format!("Failed to create content root {:?}", config.content.root))?;

    let mut registry = open_registry(&config)?;
    if config.content.scan_on_start {
        let summary = registry.scan(None, false)?;
        tracing::info!(
            "Startup scan: {} found, {} added, {} skipped, {} failed",
            summary.files_found,
            summary.files_added,
            summary.files_skipped,
            summary.files_failed
        );
    }

    let registry = Arc::new(Mutex::new(registry));
    let scheduler = Arc::new(Mutex::new(open_scheduler(&config)?));

    // Create shutdown channel for the scheduler loop
    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    let runner_handle = if config.scheduler.enabled {
        let renderer = renderer::create_renderer(&config.renderer)?;
        let runner =
            SchedulerRunner::new(registry.clone(), scheduler.clone(), renderer, shutdown_rx);
        Some(tokio::spawn(runner.run()))
    } else {
        tracing::info!("Scheduler disabled in config; waiting for shutdown");
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    // Cleanup
    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(()).await;
    if let Some(handle) = runner_handle {
        let _ = handle.await;
    }

    // Commands run from other processes may have written the tables meanwhile
    {
        let mut registry = registry.lock();
        registry.reload_if_changed()?;
        registry.flush()?;
    }
    let mut scheduler = scheduler.lock();
    scheduler.reload_if_changed()?;
    scheduler.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = config::load_config_or_default(cli.config.as_deref());
    let debug = loaded.as_ref().map(|c| c.debug).unwrap_or(false);

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose || debug {
            "localfiles=debug,localfiles_probe=debug".to_string()
        } else {
            "localfiles=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Run => {
            let config = loaded?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_scheduler(config))
        }
        Commands::Scan { subdir, force } => scan(&loaded?, subdir.as_deref(), force),
        Commands::List { json } => list(&loaded?, json),
        Commands::Fetch { url, dir } => {
            let config = loaded?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(fetch(config, &url, dir.as_deref()))
        }
        Commands::Info { asset } => info(&loaded?, &asset),
        Commands::Delete { asset } => {
            let mut registry = open_registry(&loaded?)?;
            let removed = registry.delete(&AssetRef::parse(&asset))?;
            println!("Deleted {} (key {})", removed.file_name, removed.key);
            Ok(())
        }
        Commands::Rename { asset, new_name } => {
            let mut registry = open_registry(&loaded?)?;
            registry.rename(&AssetRef::parse(&asset), &new_name)?;
            println!("Renamed {} to {}", asset, new_name);
            Ok(())
        }
        Commands::Category { asset, category } => {
            let mut registry = open_registry(&loaded?)?;
            registry.set_category(&AssetRef::parse(&asset), &category)?;
            Ok(())
        }
        Commands::DescribeFile { asset, text } => {
            let mut registry = open_registry(&loaded?)?;
            registry.set_description(&AssetRef::parse(&asset), &text)?;
            Ok(())
        }
        Commands::Content { asset, out } => content(&loaded?, &asset, out.as_deref()),
        Commands::Target(command) => target(&loaded?, command),
        Commands::Probe { file, json } => probe_file(&file, json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::InitConfig { path } => {
            if config::persist::write_default_config(&path)? {
                println!("Wrote default config to {:?}", path);
            } else {
                println!("Config already exists at {:?}", path);
            }
            Ok(())
        }
        Commands::Version => {
            println!("localfiles {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn scan(config: &Config, subdir: Option<&Path>, force: bool) -> Result<()> {
    let mut registry = open_registry(config)?;
    let summary = registry.scan(subdir, force)?;

    println!("Files found:   {}", summary.files_found);
    println!("Files added:   {}", summary.files_added);
    println!("Files skipped: {}", summary.files_skipped);
    if summary.files_failed > 0 {
        println!("Files failed:  {}", summary.files_failed);
    }
    Ok(())
}

fn list(config: &Config, json: bool) -> Result<()> {
    let registry = open_registry(config)?;
    let rows = registry.list();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        match &row.category {
            Some(category) => println!("{:>8}  {}  [{}]", row.key, row.file_name, category),
            None => println!("{:>8}  {}", row.key, row.file_name),
        }
    }
    println!("\n{} files", rows.len());
    Ok(())
}

async fn fetch(config: Config, url: &str, dir: Option<&Path>) -> Result<()> {
    let fetcher = Fetcher::new(&config.fetch);
    let registry = Arc::new(Mutex::new(open_registry(&config)?));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let key = fetcher.fetch_into(&registry, url, dir, &cancel).await?;
    println!("Fetched {} as key {}", url, key);
    Ok(())
}

fn info(config: &Config, asset: &str) -> Result<()> {
    let registry = open_registry(config)?;
    let record = registry.info(&AssetRef::parse(asset))?;
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

fn content(config: &Config, asset: &str, out: Option<&Path>) -> Result<()> {
    let registry = open_registry(config)?;
    let bytes = registry.content(&AssetRef::parse(asset))?;

    match out {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Wrote {} bytes to {:?}", bytes.len(), path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn target(config: &Config, command: TargetCommand) -> Result<()> {
    let mut scheduler = open_scheduler(config)?;

    match command {
        TargetCommand::Register { target } => scheduler.register(TargetId::new(target))?,
        TargetCommand::Deregister { target } => {
            scheduler.deregister(TargetId::new(target))?;
        }
        TargetCommand::Category { target, category } => {
            scheduler.set_category_mode(TargetId::new(target), &category)?
        }
        TargetCommand::AddUrl { target, url } => scheduler.add_url(TargetId::new(target), &url)?,
        TargetCommand::RemoveUrl { target, url } => {
            scheduler.remove_url(TargetId::new(target), &url)?
        }
        TargetCommand::Interval { target, ticks } => {
            scheduler.set_interval(TargetId::new(target), ticks)?
        }
        TargetCommand::Enable { target } => scheduler.set_enabled(TargetId::new(target), true)?,
        TargetCommand::Disable { target } => {
            scheduler.set_enabled(TargetId::new(target), false)?
        }
        TargetCommand::Toggle { target } => {
            let enabled = scheduler.toggle_enabled(TargetId::new(target))?;
            println!(
                "Target {} is now {}",
                target,
                if enabled { "enabled" } else { "disabled" }
            );
        }
        TargetCommand::Describe { target } => {
            println!("{}", scheduler.describe(TargetId::new(target))?);
        }
        TargetCommand::List => {
            for (id, info) in scheduler.targets() {
                println!(
                    "{:>20}  every {} ticks  {} entries  {}",
                    id,
                    info.interval_ticks,
                    info.entries.len(),
                    if info.enabled { "enabled" } else { "disabled" }
                );
            }
        }
    }

    Ok(())
}

fn probe_file(file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let prober = CompositeProber::standard();
    let info = prober.probe(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("File: {}", file.display());
        println!("MIME type: {}", info.mime_type);
        if info.has_dimensions() {
            println!("Dimensions: {}x{}", info.width, info.height);
        }
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Content root: {:?}", config.content.root);
    println!("  Data dir: {:?}", config.storage.data_dir);
    println!(
        "  Scheduler: {} ({}s per tick, {} ticks default interval)",
        if config.scheduler.enabled { "enabled" } else { "disabled" },
        config.scheduler.period_secs,
        config.scheduler.default_interval_ticks
    );
    println!("  Local files: {}", config.scheduler.use_local_files);
    println!("  Renderer: {:?}", config.renderer.kind);

    Ok(())
}

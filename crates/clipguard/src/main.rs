mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

use clipguard::catalog;
use clipguard::crypto::generate_hex_key;
use clipguard::{
    load_config, AccountId, ArtifactStore, Catalog, Completion, Config, Database, JobSubmission,
    VideoCipher, WorkerPool,
};

fn config_path(cli_path: Option<PathBuf>) -> Result<PathBuf> {
    match cli_path {
        Some(path) => Ok(path),
        None => dirs::home_dir()
            .map(|h| h.join(".clipguard").join("config.json"))
            .context("Could not determine home directory; pass --config"),
    }
}

fn open_catalog(config: &Config) -> Result<Database> {
    catalog::open_configured(config).context("Failed to open catalog")
}

fn artifact_store(config: &Config) -> ArtifactStore {
    ArtifactStore::new(&config.video_directory, &config.metadata_directory)
}

async fn process(
    config: &Config,
    account: i64,
    chain: String,
    name: String,
    video: &Path,
    metadata: &Path,
    key: &Path,
) -> Result<()> {
    let catalog: Arc<dyn Catalog> = Arc::new(open_catalog(config)?);
    let pool = WorkerPool::from_config(config, catalog);

    let open = |path: &Path| {
        std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))
    };
    let submission = JobSubmission::new(
        AccountId(account),
        chain,
        name.clone(),
        open(video)?,
        open(metadata)?,
        open(key)?,
    );

    let handle = pool.submit(submission)?;
    tracing::info!(job_id = handle.job_id(), "Job submitted");

    let completion = match config.job_timeout_secs {
        Some(secs) => handle.completion_timeout(Duration::from_secs(secs)).await?,
        None => handle.completion().await,
    };

    let store = pool.factory().store().clone();
    tokio::task::spawn_blocking(move || {
        pool.shutdown();
        pool.wait();
    })
    .await?;

    println!("{}", serde_json::to_string_pretty(&completion)?);

    match completion {
        Completion::Success { .. } => {
            println!(
                "Stored {}",
                store.video_path(AccountId(account), &name).display()
            );
            Ok(())
        }
        Completion::Failure { .. } => bail!("{}", completion.summary()),
    }
}

fn list(config: &Config, account: i64) -> Result<()> {
    let db = open_catalog(config)?;
    let records = db.list_artifacts(AccountId(account))?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn info(config: &Config, id: i64) -> Result<()> {
    let db = open_catalog(config)?;
    let info = catalog::video_info(&db, &artifact_store(config), id)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn delete(config: &Config, id: i64) -> Result<()> {
    let db = open_catalog(config)?;
    let record = catalog::delete_with_files(&db, &artifact_store(config), id)?;
    println!("Deleted {} ({})", record.video_name, id);
    Ok(())
}

fn encrypt(key: &str, input: &Path, output: &Path) -> Result<()> {
    let cipher = VideoCipher::from_hex_key(key)?;
    let plaintext =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let sealed = cipher.encrypt(&plaintext)?;
    std::fs::write(output, sealed)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Encrypt { key, input, output } => return encrypt(key, input, output),
        Commands::Keygen => {
            println!("{}", generate_hex_key()?);
            return Ok(());
        }
        _ => {}
    }

    let path = config_path(cli.config)?;
    let config =
        load_config(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    clipguard::logging::init(&config.logging);

    match cli.command {
        Commands::Process {
            account,
            chain,
            name,
            video,
            metadata,
            key,
        } => process(&config, account, chain, name, &video, &metadata, &key).await,
        Commands::List { account } => list(&config, account),
        Commands::Info { id } => info(&config, id),
        Commands::Delete { id } => delete(&config, id),
        Commands::Encrypt { .. } | Commands::Keygen => Ok(()),
    }
}

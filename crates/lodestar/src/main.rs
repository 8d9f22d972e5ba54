use anyhow::Context;
use clap::{Parser, Subcommand};
use lodestar_e::WebDriverBackend;
use lodestar_engine::LocatorEngine;
use lodestar_engine::backend::Backend;
use lodestar_engine::cli::{self, FileErrorMode, FileOptions, OutputHandlers};
use lodestar_engine::config::{ConfigLoader, LodestarConfig};
use lodestar_engine::mapping::PageObjectPayload;
use lodestar_engine::models::ModelService;
use lodestar_h::HeadlessBackend;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lodestar", version, about = "Locate page elements from plain-language intents")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Configuration file (defaults to ./lodestar.yaml, then ~/.lodestar/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Page to open before resolving
    #[arg(long, global = true)]
    url: Option<String>,

    /// Steps file to process line by line
    #[arg(long, global = true)]
    file: Option<String>,

    /// Intent to resolve (repeatable)
    #[arg(long = "intent", global = true)]
    intents: Vec<String>,

    /// Print ranked candidates instead of resolving
    #[arg(long, global = true)]
    explain: bool,

    /// Write the page-object payload collected from --file to this path
    #[arg(long, global = true)]
    payload: Option<PathBuf>,

    /// Scenario name recorded in the payload
    #[arg(long, global = true, default_value = "scenario")]
    scenario: String,

    /// Instruction recorded in the payload
    #[arg(
        long,
        global = true,
        default_value = "Generate a page object from these element mappings"
    )]
    instruction: String,
}

#[derive(Subcommand)]
enum Mode {
    /// Use a headless browser (Chromium) via CDP
    Headless {
        /// Launch browser in visible mode (not headless)
        #[arg(long)]
        visible: bool,
    },
    /// Use a running WebDriver server
    Webdriver {
        /// WebDriver URL, e.g. http://localhost:4444
        #[arg(long)]
        driver_url: String,
        /// Request a headless browser session
        #[arg(long)]
        headless: bool,
    },
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<LodestarConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConfigLoader::load_default()
            .await
            .context("loading default config")?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref()).await?;

    let models = ModelService::init(&config.models)
        .await
        .context("initialising models")?;
    let models = Arc::new(models);

    let mut backend: Box<dyn Backend> = match &args.mode {
        Mode::Headless { visible } => Box::new(HeadlessBackend::new_with_visibility(*visible)),
        Mode::Webdriver {
            driver_url,
            headless,
        } => Box::new(WebDriverBackend::with_url(driver_url.clone()).headless(*headless)),
    };

    backend.launch().await.context("launching backend")?;
    if let Some(url) = &args.url {
        let nav = backend.navigate(url).await.context("navigating")?;
        info!("Opened {} ({})", nav.url, nav.title);
    }

    let mut engine = LocatorEngine::with_cache(models.clone(), config).await;
    let output = OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    };

    let outcome = run(&mut *backend, &mut engine, output, &args).await;

    backend.close().await?;
    models.shutdown().await;
    outcome
}

async fn run(
    backend: &mut dyn Backend,
    engine: &mut LocatorEngine,
    output: OutputHandlers,
    args: &Args,
) -> anyhow::Result<()> {
    if !args.intents.is_empty() {
        if args.explain {
            cli::run_explain(backend, engine, output, &args.intents).await;
        } else {
            let failures = cli::run_intents(backend, engine, output, &args.intents).await;
            if failures > 0 {
                info!("{} of {} intents unresolved", failures, args.intents.len());
            }
        }
    }

    if let Some(file_path) = &args.file {
        let mut payload = PageObjectPayload::new(&args.instruction, &args.scenario);
        cli::run_file(
            backend,
            engine,
            output,
            file_path,
            FileOptions {
                stop_on_error: false,
                error_mode: FileErrorMode::WithLine,
            },
            &mut payload,
        )
        .await
        .map_err(|e| anyhow::anyhow!("processing {}: {}", file_path, e))?;

        if let Some(path) = &args.payload {
            tokio::fs::write(path, payload.to_json()?)
                .await
                .with_context(|| format!("writing payload {}", path.display()))?;
            info!(
                "Wrote {} mappings to {}",
                payload.mappings.len(),
                path.display()
            );
        }
    }

    Ok(())
}

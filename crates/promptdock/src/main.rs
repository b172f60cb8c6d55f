mod prompts;

use anyhow::Context;
use clap::{Parser, Subcommand};
use promptdock_engine::backend::Backend;
use promptdock_engine::cli::{OutputHandlers, ReplOptions, Session};
use promptdock_engine::config::{ConfigLoader, DockConfig};
use promptdock_engine::dom::PageDom;
use promptdock_engine::executor::{SessionExecutor, normalize_url};
use promptdock_engine::facade::CommandHandler;
use promptdock_engine::store::JsonFileStore;
use promptdock_h::backend::HeadlessBackend;
use promptdock_r::server::CommandServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "promptdock", version, about = "Drop saved prompts into AI chat inputs")]
struct Args {
    /// Config file (default: ./promptdock.yaml, then ~/.promptdock/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Drive a local Chromium page from a REPL or script
    Headless {
        /// Launch browser in visible mode (not headless)
        #[arg(long)]
        visible: bool,
        /// Page to open before the first command
        #[arg(long)]
        url: Option<String>,
        /// Script to execute (non-interactive mode)
        #[arg(long)]
        file: Option<String>,
    },
    /// Answer APPLY_PROMPT / CLEAR_INPUT over WebSocket
    Serve {
        #[arg(long, default_value_t = 9010)]
        port: u16,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        visible: bool,
    },
    /// Manage the prompt library
    Prompts {
        #[command(subcommand)]
        action: prompts::PromptAction,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await,
        None => ConfigLoader::load_default().await,
    }
    .context("loading configuration")?;

    match args.mode {
        Mode::Headless { visible, url, file } => {
            run_headless(&config, visible, url.as_deref(), file.as_deref()).await
        }
        Mode::Serve { port, url, visible } => run_server(&config, port, url.as_deref(), visible).await,
        Mode::Prompts { action } => {
            let store = JsonFileStore::new(&config.store.path);
            prompts::run(&store, action).await
        }
    }
}

fn launch_backend(config: &DockConfig, visible: bool) -> HeadlessBackend {
    HeadlessBackend::new_with_visibility(visible || config.browser.visible)
        .with_user_data_dir(config.browser.user_data_dir.clone())
}

async fn open_start_page(backend: &mut HeadlessBackend, url: Option<&str>) -> anyhow::Result<()> {
    if let Some(url) = url {
        let url = normalize_url(url)?;
        let nav = backend.navigate(&url).await?;
        info!("Opened {} ({})", nav.url, nav.title);
    }
    Ok(())
}

async fn run_headless(
    config: &DockConfig,
    visible: bool,
    url: Option<&str>,
    file: Option<&str>,
) -> anyhow::Result<()> {
    let registry = Arc::new(config.registry()?);
    let store = Arc::new(JsonFileStore::new(&config.store.path));
    let mut executor =
        SessionExecutor::new(registry, config.timing.timings()).with_store(store);

    let mut backend = launch_backend(config, visible);
    backend.launch().await.context("launching browser")?;
    open_start_page(&mut backend, url).await?;

    let mut session = Session {
        backend: &mut backend,
        executor: &mut executor,
        output: OutputHandlers {
            out: |msg| println!("{}", msg),
            err: |msg| eprintln!("{}", msg),
        },
    };

    let outcome = match file {
        Some(path) => session.run_file(path, true).await,
        None => {
            session
                .run_repl(ReplOptions {
                    banner_lines: &[
                        "Browser launched. Commands: goto, apply, use, clear, site, prompts.",
                        "Type 'exit' or 'quit' to close.",
                    ],
                    prompt: "> ",
                    exit_commands: &["exit", "quit"],
                    handle_ctrl_c: true,
                })
                .await
        }
    };

    backend.close().await?;
    outcome.map_err(|e| anyhow::anyhow!("{}", e))
}

async fn run_server(
    config: &DockConfig,
    port: u16,
    url: Option<&str>,
    visible: bool,
) -> anyhow::Result<()> {
    let registry = Arc::new(config.registry()?);

    let mut backend = launch_backend(config, visible);
    backend.launch().await.context("launching browser")?;
    open_start_page(&mut backend, url).await?;

    let dom: Arc<dyn PageDom> = backend.page_dom()?;
    let handler = CommandHandler::new(dom, registry, config.timing.timings());
    let handle = CommandServer::new(port, handler)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("starting command server: {}", e))?;
    println!("Listening on ws://{}", handle.local_addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.shutdown();
    backend.close().await?;
    Ok(())
}

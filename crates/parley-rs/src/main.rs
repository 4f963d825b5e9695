//! Parley: a memory-augmented chat assistant, driven from the console.

mod console;

use anyhow::{Context, bail};
use autoagents_llm::LLMProvider;
use autoagents_llm::backends::openai::OpenAI;
use autoagents_llm::builder::LLMBuilder;
use clap::Parser;
use console::{ConsoleSession, ConsoleSink};
use directories::UserDirs;
use log::{debug, info, warn};
use parley_rs_config::{LayeredConfigOptions, ParleyConfig, USER_DIR_NAME};
use parley_rs_core::{
    LlmSummarizer, ModelClient, ModelSettings, Orchestrator, OrchestratorParts,
};
use parley_rs_memory::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_DB_FILE: &str = "parley.db";

/// Command-line options for the console assistant.
#[derive(Parser, Debug)]
#[command(name = "parley", version)]
struct Cli {
    /// Extra parley.json5 applied over the discovered layers
    #[arg(long)]
    config: Option<PathBuf>,
    /// Model name override
    #[arg(long)]
    model: Option<String>,
    /// SQLite database path override
    #[arg(long)]
    db: Option<PathBuf>,
    /// Channel id that console input is posted to
    #[arg(long, default_value = "console")]
    channel: String,
    /// User id console input is attributed to
    #[arg(long, default_value = "local-user")]
    user: String,
    /// Optional guild id for the console channel
    #[arg(long)]
    guild: Option<String>,
    /// Account id the assistant answers mentions for
    #[arg(long, default_value = "parley")]
    bot_id: String,
}

/// Entry point for the console assistant.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    info!(
        "starting parley (config_set={}, model_set={}, db_set={})",
        cli.config.is_some(),
        cli.model.is_some(),
        cli.db.is_some()
    );
    let mut config = load_config(&cli)?;
    if let Some(model) = cli.model.as_ref() {
        config.model.name = model.clone();
    }

    let Ok(api_key) = std::env::var("OPENAI_API_KEY") else {
        bail!("OPENAI_API_KEY is required to run parley");
    };
    let reply_llm = build_provider(&api_key, &config, config.model.reply_temperature)
        .context("failed to build reply LLM provider")?;
    let summary_llm = build_provider(&api_key, &config, config.model.summary_temperature)
        .context("failed to build summary LLM provider")?;

    let db_path = resolve_db_path(&cli, &config)?;
    let store = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("failed to open store at {}", db_path.display()))?,
    );

    let summarizer = LlmSummarizer::new(ModelClient::new(
        summary_llm,
        ModelSettings::for_summaries(&config.model),
    ))
    .with_max_words(config.memory.summary_max_words);
    let sink = Arc::new(ConsoleSink::new());
    let prefix = config.assistant.prefix.clone();
    let orchestrator = Arc::new(
        Orchestrator::new(OrchestratorParts {
            config,
            store: store.clone(),
            reply_llm,
            summarizer: Arc::new(summarizer),
            sink: sink.clone(),
            bot_user_id: cli.bot_id.clone(),
        })
        .context("failed to build orchestrator")?,
    );

    eprintln!(
        "parley is listening on #{} as {}. Address it with `{} ...` or <@{}>; \
         /memory, /forget, /reset manage memory. Ctrl-D to quit.",
        cli.channel, cli.user, prefix, cli.bot_id
    );
    let session = ConsoleSession {
        guild_id: cli.guild.clone(),
        channel_id: cli.channel.clone(),
        user_id: cli.user.clone(),
    };
    console::run(orchestrator.clone(), sink, session).await;

    info!("shutting down");
    orchestrator.shutdown().await;
    if let Err(err) = store.close().await {
        warn!("failed to close store cleanly (error={})", err);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ParleyConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        options = options.with_runtime_path(path);
    }
    let layered =
        ParleyConfig::load_layered_with_options(options).context("failed to load config")?;
    for layer in &layered.layers {
        debug!("config layer applied (origin={})", layer.origin());
    }
    Ok(layered.config)
}

fn build_provider(
    api_key: &str,
    config: &ParleyConfig,
    temperature: f32,
) -> anyhow::Result<Arc<dyn LLMProvider>> {
    info!(
        "building LLM provider (provider={}, model={}, temperature={})",
        config.model.provider, config.model.name, temperature
    );
    let llm: Arc<dyn LLMProvider> = LLMBuilder::<OpenAI>::new()
        .api_key(api_key)
        .model(config.model.name.clone())
        .temperature(temperature)
        .build()?;
    Ok(llm)
}

/// `--db`, then `store.path`, then `~/.parley/parley.db`.
fn resolve_db_path(cli: &Cli, config: &ParleyConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.db.as_ref() {
        return Ok(path.clone());
    }
    if let Some(path) = config.store.path.as_ref() {
        return Ok(PathBuf::from(path));
    }
    let Some(dirs) = UserDirs::new() else {
        bail!("cannot locate a home directory; pass --db or set store.path");
    };
    Ok(dirs.home_dir().join(USER_DIR_NAME).join(DEFAULT_DB_FILE))
}

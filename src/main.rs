use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use action_flow::{Platform, YoutubeSurface};
use action_primitives::InteractionEngine;
use agent_core::{AgentError, AgentRunner, ArgumentRecord, FailureRecord, SessionStore, YtDlpMetadata};
use anyhow::{bail, Context, Result};
use cdp_adapter::ChromiumDriver;
use clap::{Args, Parser, Subcommand};
use sockpuppet_cli::{
    init_logging, load_config, save_config, AgentLogFile, Config, CsvChannels, CsvVideos,
};
use sockpuppet_core_types::{AgentId, MetadataProvider, NoMetadata};
use sockpuppet_scheduler::{
    ConcurrencyGate, Orchestrator, ProcessLauncher, SysinfoProbe, TrainingMode,
};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// Sockpuppet - recommendation audit with scripted browser agents
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one agent from its argument record
    Agent(AgentArgs),
    /// Write one argument record per cohort and dispatch an agent for each
    Run(BatchArgs),
    /// Write the argument records without dispatching anything
    Simulate(BatchArgs),
}

#[derive(Args)]
struct AgentArgs {
    /// Argument record written by `run` or `simulate`
    #[arg(long, value_name = "FILE")]
    args: PathBuf,

    /// Show the browser window
    #[arg(long)]
    headful: bool,
}

#[derive(Args, Clone, Debug, Default)]
struct BatchArgs {
    /// Train from channel tables or from video tables
    #[arg(long)]
    mode: Option<TrainingMode>,

    /// Output root for records, logs and profiles
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    training_channels: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    training_videos: Option<PathBuf>,

    /// Seed table with a `video_id` column
    #[arg(long, value_name = "FILE")]
    testing_videos: Option<PathBuf>,

    #[arg(long)]
    search_query: Option<String>,

    #[arg(long)]
    channels_per_ideology: Option<usize>,

    #[arg(long)]
    videos_per_channel: Option<usize>,

    #[arg(long)]
    max_results: Option<usize>,

    #[arg(long)]
    max_recommendations: Option<usize>,

    /// Concurrency ceiling on running agents
    #[arg(long)]
    max_agents: Option<usize>,

    /// Gate poll interval, e.g. `1m` or `30s`
    #[arg(long, value_parser = humantime::parse_duration)]
    sleep_duration: Option<Duration>,

    /// Fixed sampling seed
    #[arg(long)]
    seed: Option<u64>,
}

impl BatchArgs {
    fn apply(self, config: &mut Config) {
        let batch = &mut config.batch;
        if let Some(mode) = self.mode {
            batch.mode = mode;
        }
        if let Some(output) = self.output {
            batch.output_dir = output;
        }
        if let Some(query) = self.search_query {
            batch.search_query = query;
        }
        if let Some(n) = self.channels_per_ideology {
            batch.channels_per_cohort = n;
        }
        if let Some(n) = self.videos_per_channel {
            batch.videos_per_channel = n;
        }
        if let Some(n) = self.max_results {
            batch.max_search_results = n;
        }
        if let Some(n) = self.max_recommendations {
            batch.max_recommendations = n;
        }
        if let Some(n) = self.max_agents {
            batch.max_concurrency = n;
        }
        if let Some(interval) = self.sleep_duration {
            batch.poll_interval_ms = interval.as_millis().try_into().unwrap_or(u64::MAX);
        }
        if self.seed.is_some() {
            batch.rng_seed = self.seed;
        }

        let data = &mut config.data;
        if let Some(path) = self.training_channels {
            data.channels_file = path;
        }
        if self.training_videos.is_some() {
            data.videos_file = self.training_videos;
        }
        if self.testing_videos.is_some() {
            data.seeds_file = self.testing_videos;
        }
        batch.channels_file = Some(data.channels_file.clone());
    }
}

/// Global flags, shared by every command and handed on to dispatched agents.
struct Globals {
    config: Option<PathBuf>,
    log_level: String,
    debug: bool,
}

impl Globals {
    fn init_logging(&self, agent_log: Option<&AgentLogFile>) -> Result<Option<WorkerGuard>> {
        let guard = init_logging(&self.log_level, self.debug, agent_log)?;
        info!("Starting sockpuppet v{}", env!("CARGO_PKG_VERSION"));
        Ok(guard)
    }

    async fn load_config(&self) -> Result<Config> {
        load_config(self.config.as_deref()).await
    }

    /// Flags placed before `agent` on a dispatched agent's command line.
    fn agent_flags(&self, config_path: &Path) -> Vec<OsString> {
        let mut flags = vec![
            OsString::from("--config"),
            config_path.as_os_str().to_os_string(),
            OsString::from("--log-level"),
            OsString::from(&self.log_level),
        ];
        if self.debug {
            flags.push(OsString::from("--debug"));
        }
        flags
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        config,
        log_level,
        debug,
        command,
    } = Cli::parse();
    let globals = Globals {
        config,
        log_level,
        debug,
    };

    let mut guard = None;
    let result = match command {
        Commands::Agent(args) => cmd_agent(args, &globals, &mut guard).await,
        Commands::Run(args) => {
            guard = globals.init_logging(None)?;
            let config = globals.load_config().await?;
            cmd_run(args, config, &globals).await
        }
        Commands::Simulate(args) => {
            guard = globals.init_logging(None)?;
            let config = globals.load_config().await?;
            cmd_simulate(args, config)
        }
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            // exit() skips destructors; flush the agent log file first.
            drop(guard);
            std::process::exit(1);
        }
    }
}

/// Every path out of here leaves the agent's log or its failure record,
/// including a failed logging or configuration setup.
async fn cmd_agent(
    args: AgentArgs,
    globals: &Globals,
    guard: &mut Option<WorkerGuard>,
) -> Result<()> {
    let record = match ArgumentRecord::load(&args.args) {
        Ok(record) => record,
        Err(err) => {
            *guard = globals.init_logging(None).unwrap_or_default();
            record_unreadable_args(&args.args, &err)?;
            bail!("cannot start agent: {err}");
        }
    };

    let agent_log = AgentLogFile::new(record.log_dir(), &record.agent_id.file_name());
    match globals.init_logging(Some(&agent_log)) {
        Ok(installed) => *guard = installed,
        Err(err) => {
            eprintln!("sockpuppet agent {}: {:#}", record.agent_id, err);
            record_setup_failure(&record, &err)?;
            return Err(err.context("Failed to initialize logging"));
        }
    }
    let config = match globals.load_config().await {
        Ok(config) => config,
        Err(err) => {
            record_setup_failure(&record, &err)?;
            return Err(err);
        }
    };

    let mut browser = config.browser.clone().with_profile(record.profile_dir());
    if args.headful {
        browser.headless = false;
    }
    let metadata: Arc<dyn MetadataProvider> = if record.collect_metadata {
        Arc::new(YtDlpMetadata::new(
            &config.metadata.binary,
            config.metadata.timeout(),
        ))
    } else {
        Arc::new(NoMetadata)
    };
    let channels_file = record
        .channels_file
        .clone()
        .unwrap_or_else(|| config.data.channels_file.clone());

    let runner = AgentRunner::for_args(&record)
        .with_metadata(metadata)
        .with_channels(Arc::new(CsvChannels::new(channels_file)));
    let timings = config.timings.clone();
    let catalog = config.catalog.clone();
    let scroll = config.surface.search_scroll_steps;

    info!(
        agent = %record.agent_id,
        steps = %record.steps,
        profile = %browser.user_data_dir.display(),
        "agent starting"
    );
    let outcome = runner
        .run(record, || async move {
            let driver = ChromiumDriver::launch(&browser)
                .await
                .map_err(|err| AgentError::fatal(format!("browser launch failed: {err}")))?;
            let engine = InteractionEngine::new(Arc::new(driver), timings);
            let surface = YoutubeSurface::new(engine, catalog).with_search_scroll(scroll);
            Ok(Box::new(surface) as Box<dyn Platform>)
        })
        .await?;

    if !outcome.is_completed() {
        bail!("agent failed, see {}", outcome.path().display());
    }
    info!(log = %outcome.path().display(), "agent finished");
    Ok(())
}

/// An unreadable record still leaves a failure record, keyed by the record's
/// file name, under the batch output (`<output>/args/<id>.json`).
fn record_unreadable_args(path: &Path, err: &AgentError) -> Result<()> {
    let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
        warn!(path = %path.display(), "no agent id in record path, no failure record written");
        return Ok(());
    };
    let output = path
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));
    write_failure(output, FailureRecord::new(AgentId::new(stem), err))
}

fn record_setup_failure(record: &ArgumentRecord, err: &anyhow::Error) -> Result<()> {
    let failure = FailureRecord::new(record.agent_id.clone(), format!("{err:#}"));
    write_failure(&record.output_dir, failure)
}

fn write_failure(output: &Path, failure: FailureRecord) -> Result<()> {
    let written = SessionStore::new(output)
        .write_failure(&failure)
        .context("Failed to write failure record")?;
    warn!(path = %written.display(), "failure record written");
    Ok(())
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let channels = CsvChannels::new(config.data.channels_file.clone());
    let videos = CsvVideos::new(config.data.videos_file.clone(), config.data.seeds_file.clone());

    let orchestrator = Orchestrator::new(config.batch.clone())
        .context("Invalid batch configuration")?
        .with_channels(Arc::new(channels))
        .with_videos(Arc::new(videos));
    Ok(orchestrator)
}

fn cmd_simulate(args: BatchArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config);
    let orchestrator = build_orchestrator(&config)?;
    let report = orchestrator.simulate()?;
    for agent in &report.agents {
        println!("{}", agent.args_path.display());
    }
    Ok(())
}

async fn cmd_run(args: BatchArgs, mut config: Config, globals: &Globals) -> Result<()> {
    args.apply(&mut config);
    let orchestrator = build_orchestrator(&config)?;

    // Agents load this file instead of whatever their own config lookup finds.
    let config_path = absolute(&config.batch.output_dir.join("config.yaml"))?;
    save_config(&config, &config_path)?;
    info!(path = %config_path.display(), "batch configuration written");

    let batch = orchestrator.config();
    let marker = batch.args_dir().to_string_lossy().into_owned();
    let gate = ConcurrencyGate::new(
        Arc::new(SysinfoProbe::new(marker)),
        batch.max_concurrency,
        batch.poll_interval(),
    );
    let launcher =
        ProcessLauncher::current_exe()?.with_global_args(globals.agent_flags(&config_path));

    let report = orchestrator.run(&gate, &launcher).await?;
    if report.dispatched.is_empty() && !report.agents.is_empty() {
        bail!("no agent could be dispatched");
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    Ok(cwd.join(path))
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sensorwatch::connect::{connect_publisher, connect_subscriber};
use sensorwatch::error::EXIT_RUNTIME;
use sensorwatch::shutdown::{block_on, shutdown_signal};
use sensorwatch::{
    load_csv, load_json, settings, ConfigurationError, ConsumerContext, ConsumerSettings,
    PipelineError, ProducerContext, ProducerSettings, Settings, SourceKind,
};

type Builder = ConfigBuilder<DefaultState>;

#[derive(Parser, Debug)]
#[command(name = "sensorwatch")]
#[command(about = "Stream sensor readings through a broker and alert on stable values")]
struct Args {
    /// Config file (TOML, YAML, JSON, ...) layered under the environment
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Topic to publish to or consume from
    #[arg(short, long, global = true)]
    topic: Option<String>,

    /// Kafka bootstrap servers (host:port[,host:port])
    #[arg(short, long, global = true)]
    brokers: Option<String>,

    /// Transport to use: kafka or stdio
    #[arg(long, global = true)]
    transport: Option<String>,

    /// Record field used as the message key and window key
    #[arg(long, global = true)]
    key_field: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish the rows of a sensor CSV file
    ProduceCsv(ProduceArgs),
    /// Publish the elements of a JSON array file
    ProduceJson(ProduceArgs),
    /// Consume readings and alert on stable windows
    Consume(ConsumeArgs),
}

#[derive(ClapArgs, Debug)]
struct ProduceArgs {
    /// Source file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Seconds to wait after each message
    #[arg(short, long)]
    interval: Option<u64>,

    /// Cycle through the file until interrupted
    #[arg(long, conflicts_with = "once")]
    repeat: bool,

    /// Send the file once and exit
    #[arg(long)]
    once: bool,
}

impl ProduceArgs {
    fn repeat(&self) -> Option<bool> {
        match (self.repeat, self.once) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn overrides(&self, builder: Builder, path_key: &str) -> Result<Builder, ConfigError> {
        builder
            .set_override_option(path_key, self.file.as_ref().map(|p| p.display().to_string()))?
            .set_override_option("interval_secs", self.interval.map(|s| s.to_string()))?
            .set_override_option("repeat", self.repeat())
    }
}

#[derive(ClapArgs, Debug)]
struct ConsumeArgs {
    /// Consumer group ID
    #[arg(short, long)]
    group_id: Option<String>,

    /// Number of readings per window
    #[arg(short, long)]
    window_size: Option<u64>,

    /// Largest max-min spread that counts as stable
    #[arg(short, long)]
    alert_threshold: Option<f64>,

    /// Numeric field to track
    #[arg(short, long)]
    field: Option<String>,
}

impl ConsumeArgs {
    fn overrides(&self, builder: Builder) -> Result<Builder, ConfigError> {
        builder
            .set_override_option("group_id", self.group_id.clone())?
            .set_override_option("window_size", self.window_size.map(|n| n.to_string()))?
            .set_override_option(
                "alert_threshold",
                self.alert_threshold.map(|t| t.to_string()),
            )?
            .set_override_option("field", self.field.clone())
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays free for the stdio transport.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<PipelineError>() {
            Some(pipeline) => {
                error!("{}", pipeline);
                ExitCode::from(pipeline.exit_code())
            }
            None => {
                error!("{:#}", e);
                ExitCode::from(EXIT_RUNTIME)
            }
        },
    }
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args)?;

    block_on(async {
        match args.command {
            Command::ProduceCsv(_) => produce(&settings, SourceKind::Csv).await,
            Command::ProduceJson(_) => produce(&settings, SourceKind::Json).await,
            Command::Consume(_) => consume(&settings).await,
        }
    })
    .context("Failed to start the async runtime")??;
    Ok(())
}

/// Resolve settings with command-line flags taking precedence.
fn load_settings(args: &Args) -> Result<Settings, PipelineError> {
    let builder = settings::builder(args.config.as_deref())
        .set_override_option("topic", args.topic.clone())
        .and_then(|b| b.set_override_option("brokers", args.brokers.clone()))
        .and_then(|b| b.set_override_option("transport", args.transport.clone()))
        .and_then(|b| b.set_override_option("key_field", args.key_field.clone()))
        .and_then(|b| match &args.command {
            Command::ProduceCsv(produce) => produce.overrides(b, "csv_path"),
            Command::ProduceJson(produce) => produce.overrides(b, "json_path"),
            Command::Consume(consume) => consume.overrides(b),
        })
        .map_err(ConfigurationError::from)?;

    let config = builder.build().map_err(ConfigurationError::from)?;
    Ok(Settings::from_config(&config)?)
}

async fn produce(settings: &Settings, kind: SourceKind) -> Result<(), PipelineError> {
    // Load the whole source before connecting, so a bad file fails fast.
    let records = match kind {
        SourceKind::Csv => load_csv(&settings.csv_path)?,
        SourceKind::Json => load_json(&settings.json_path)?,
    };

    let producer_settings = ProducerSettings::from_settings(settings, kind);
    let publisher = connect_publisher(settings).await?;

    ProducerContext::new(publisher, producer_settings)
        .run(&records, shutdown_signal())
        .await?;
    Ok(())
}

async fn consume(settings: &Settings) -> Result<(), PipelineError> {
    let subscriber = connect_subscriber(settings).await?;
    ConsumerContext::new(subscriber, ConsumerSettings::from_settings(settings))
        .run(shutdown_signal())
        .await;
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rollout::config::AppConfig;
use rollout::deploy::{Deployer, Environment, TokioCommandRunner};
use rollout::github::{GitHubClient, Notifier};
use rollout::workflow::{self, dispatch, publish};

#[derive(Parser)]
#[command(name = "rollout", about = "Deploy from CI events and publish Play Store rollouts")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy according to the CI event (branch push or PR comment command)
    Dispatch {
        /// Event name; defaults to GITHUB_EVENT_NAME
        #[arg(long)]
        event_name: Option<String>,
        /// Event payload file; defaults to GITHUB_EVENT_PATH
        #[arg(long)]
        event_path: Option<PathBuf>,
    },
    /// Deploy the working directory to one environment
    Deploy {
        /// `dev`/`development` or `prod`/`production`
        #[arg(long = "env")]
        environment: Environment,
    },
    /// Upload a bundle to Google Play and start a staged rollout
    PublishPlay(publish::PublishArgs),
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout is reserved for command results
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn env_or(value: Option<String>, flag: &str, var: &str) -> anyhow::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => std::env::var(var).with_context(|| format!("--{flag} not given and {var} is unset")),
    }
}

fn build_deployer(config: &AppConfig) -> Deployer {
    let runner = TokioCommandRunner::new(config.deploy.timeout());
    Deployer::new(config.deploy.clone(), Arc::new(runner))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Dispatch {
            event_name,
            event_path,
        } => {
            let config = AppConfig::load(cli.config.as_deref())?;
            let event_name = env_or(event_name, "event-name", "GITHUB_EVENT_NAME")?;
            let event_path = match event_path {
                Some(path) => path,
                None => PathBuf::from(env_or(None, "event-path", "GITHUB_EVENT_PATH")?),
            };

            let event = dispatch::load_event(&event_name, &event_path)?;
            let deployer = build_deployer(&config);
            let notifier = config
                .github_token()
                .map(|token| GitHubClient::new(&token))
                .transpose()?;

            let outcome = dispatch::run(
                &event,
                &deployer,
                notifier.as_ref().map(|n| n as &dyn Notifier),
                workflow::step_output_path().as_deref(),
            )
            .await?;

            if let Some(deployment) = outcome {
                println!("{}", deployment.url);
            }
        }
        Command::Deploy { environment } => {
            let config = AppConfig::load(cli.config.as_deref())?;
            let deployment = build_deployer(&config).deploy(environment).await?;
            println!("{}", deployment.url);
        }
        Command::PublishPlay(args) => {
            let result = publish::run(&args).await?;
            tracing::info!(
                version_code = %result.version_code,
                halted_previous = result.halted_previous,
                "Play rollout complete"
            );
            println!("{}", result.version_code);
        }
    }

    Ok(())
}

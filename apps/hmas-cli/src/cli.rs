use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use hmas_client::{CrawlLimits, HypermediaClient};
use hmas_config::{load_config, validate_config, HmasConfig};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

#[derive(Debug, Parser)]
#[command(name = "hmas", about = "Hypermedia client for HMAS simulated environments")]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// YAML config; only the client, crawl and observability sections are used
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover every workspace and artifact reachable from ROOT
    Crawl(CrawlArgs),
    /// List the sub-workspaces and artifacts of a workspace
    Children { workspace: String },
    /// List the property and action affordances of an artifact
    Affordances { artifact: String },
    /// Read a property by URL, or by artifact URI and name
    Read(ReadArgs),
    /// Invoke an action by URL, or by artifact URI and name
    Invoke(InvokeArgs),
}

#[derive(Debug, Args)]
struct CrawlArgs {
    root: String,
    #[arg(long)]
    max_depth: Option<usize>,
    #[arg(long)]
    max_nodes: Option<usize>,
}

#[derive(Debug, Args)]
struct ReadArgs {
    /// Property URL, or artifact URI when --name is given
    target: String,
    #[arg(long)]
    name: Option<String>,
}

#[derive(Debug, Args)]
struct InvokeArgs {
    /// Action URL, or artifact URI when --name is given
    target: String,
    #[arg(long)]
    name: Option<String>,
    /// JSON object sent as the request body
    #[arg(long, default_value = "{}")]
    params: String,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.global.config()?;
        init_tracing(&config.observability.log_level, self.global.verbose);
        let client = HypermediaClient::from_config(&config).context("build http client")?;

        match self.command {
            Command::Crawl(args) => {
                let limits = CrawlLimits {
                    max_depth: args.max_depth.unwrap_or(config.crawl.max_depth),
                    max_nodes: args.max_nodes.unwrap_or(config.crawl.max_nodes),
                };
                let client = client.with_limits(limits);
                let cancel = CancellationToken::new();
                let on_interrupt = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        on_interrupt.cancel();
                    }
                });
                let report = client.crawl(&args.root, &cancel).await?;
                if report.truncated {
                    tracing::warn!(
                        max_depth = limits.max_depth,
                        max_nodes = limits.max_nodes,
                        "crawl stopped at a ceiling; results are partial"
                    );
                }
                print_json(&report)
            }
            Command::Children { workspace } => print_json(&client.list_children(&workspace).await?),
            Command::Affordances { artifact } => {
                print_json(&client.list_affordances(&artifact).await?)
            }
            Command::Read(args) => {
                let value = match &args.name {
                    Some(name) => client.read_property_by_name(&args.target, name).await?,
                    None => client.read_property(&args.target).await?,
                };
                print_json(&value)
            }
            Command::Invoke(args) => {
                let payload = parse_params(&args.params)?;
                let value = match &args.name {
                    Some(name) => {
                        client
                            .invoke_action_by_name(&args.target, name, &payload)
                            .await?
                    }
                    None => client.invoke_action(&args.target, &payload).await?,
                };
                print_json(&value)
            }
        }
    }
}

impl GlobalArgs {
    fn config(&self) -> anyhow::Result<HmasConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path).with_context(|| format!("load config {}", path.display()))?,
            None => HmasConfig::default(),
        };
        if let Some(ms) = self.timeout_ms {
            config.client.timeout_ms = ms;
        }
        validate_config(&config)?;
        Ok(config)
    }
}

fn parse_params(raw: &str) -> anyhow::Result<Value> {
    let value: Value = serde_json::from_str(raw).context("--params must be valid JSON")?;
    if !value.is_object() {
        anyhow::bail!("--params must be a JSON object");
    }
    Ok(value)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(level: &str, verbose: bool) {
    TRACING_INIT.get_or_init(|| {
        let fallback = if verbose { "debug" } else { level };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hmas_config::{load_config, validate_config, HmasConfig, World};

#[derive(Debug, Parser)]
#[command(name = "hmas-server", about = "Serve simulated TD-described devices over HTTP")]
struct Args {
    /// YAML config; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    listen: Option<String>,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    world: Option<World>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Log and serve 500s for actions without handlers instead of refusing to start
    #[arg(long)]
    lenient_handlers: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<HmasConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => HmasConfig::default(),
        };
        if let Some(listen) = self.listen {
            config.server.listen = listen;
        }
        if let Some(base_url) = self.base_url {
            config.server.base_url = base_url;
        }
        if let Some(world) = self.world {
            config.server.world = world;
        }
        if let Some(data_dir) = self.data_dir {
            config.server.data_dir = data_dir;
        }
        if self.lenient_handlers {
            config.server.strict_handlers = false;
        }
        validate_config(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    hmas_server::init_tracing(&config.observability.log_level);
    hmas_server::run_server(config).await
}

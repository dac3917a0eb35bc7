//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::Client;
use crate::config::ClientConfig;
use crate::types::JsonValue;
use anyhow::{Context, Result};
use futures::StreamExt;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch {
                path,
                offset,
                limit,
                params,
                path_params,
            } => {
                self.fetch(path, *offset, *limit, params, path_params)
                    .await
            }
            Commands::Validate => self.validate(),
        }
    }

    /// Load the client configuration
    fn load_config(&self) -> Result<ClientConfig> {
        let path = self
            .cli
            .config
            .as_deref()
            .context("Config file not specified (use -c flag)")?;
        Self::load_config_from(path)
    }

    fn load_config_from(path: &Path) -> Result<ClientConfig> {
        ClientConfig::from_file(path)
            .with_context(|| format!("Invalid client config '{}'", path.display()))
    }

    async fn fetch(
        &self,
        path: &str,
        offset: u64,
        limit: Option<usize>,
        params: &[(String, String)],
        path_params: &[(String, String)],
    ) -> Result<()> {
        let config = self.load_config()?;
        let client = Client::new(config).context("Failed to build client")?;

        let mut query = client.get(path)?;
        for (key, value) in params {
            query = query.param(key, value);
        }
        for (key, value) in path_params {
            query = query.path_param(key, value);
        }

        let mut results = client.results::<JsonValue>(&query, offset);
        let limit = limit.unwrap_or(usize::MAX);
        let mut count = 0;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        while count < limit {
            let Some(item) = results.next().await else {
                break;
            };
            let item = item.with_context(|| format!("Fetching {}", query.endpoint()))?;
            self.write_item(&mut out, &item)?;
            count += 1;
        }

        if self.cli.verbose {
            info!("Fetched {} items from {}", count, query.endpoint());
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        let rendered = serde_json::to_string_pretty(&config)?;
        println!("{rendered}");
        Ok(())
    }

    fn write_item(&self, out: &mut impl Write, item: &JsonValue) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => writeln!(out, "{item}")?,
            OutputFormat::Pretty => writeln!(out, "{}", serde_json::to_string_pretty(item)?)?,
        }
        Ok(())
    }
}

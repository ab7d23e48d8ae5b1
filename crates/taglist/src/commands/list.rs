//! Default command: list, filter and rank a repository's tags

use crate::cli::QueryArgs;
use crate::output;
use anyhow::{Context, Result};
use camino::Utf8Path;
use std::time::Duration;
use taglist_core::{Settings, SettingsLoader};
use taglist_image::{ClientOptions, QueryOutcome, RegistryClient, TagQuery};
use tracing::debug;

/// Resolve settings from every source and run the query
pub async fn run(args: QueryArgs, config: Option<&Utf8Path>) -> Result<()> {
    let loaded = SettingsLoader::new()
        .load(config)
        .context("Failed to load settings")?;

    if let Some(path) = &loaded.config_file {
        output::status(&format!("Using config file: {}", path));
    }

    let settings = loaded.settings.merge(args.into_overrides());
    debug!("Effective settings: {:?}", settings);

    execute(settings).await
}

/// Query the registry with fully merged settings and print the result
async fn execute(settings: Settings) -> Result<()> {
    let query = TagQuery {
        repository: settings.repository()?.to_string(),
        constraint: settings.constraint().map(str::to_string),
        latest: settings.latest,
    };

    let client = RegistryClient::new(ClientOptions {
        plain_http: settings.plain_http,
        timeout: Duration::from_secs(settings.http_timeout_secs),
    })?;

    let outcome = query
        .execute(&client)
        .await
        .with_context(|| format!("Error querying tags for '{}'", query.repository))?;

    match outcome {
        QueryOutcome::Latest(tag) => println!("{}", tag),
        QueryOutcome::Tags(tags) => println!("{}", output::render_tags(&tags, settings.output)?),
    }

    Ok(())
}

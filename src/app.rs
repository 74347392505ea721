use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config;
use crate::data::{self, DummyJsonFeedService, FeedService};
use crate::dummyjson;
use crate::logging;
use crate::ui;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config_file: Option<PathBuf>,
}

pub fn run(opts: RunOptions) -> Result<()> {
    let cfg = config::load(config::LoadOptions {
        config_file: opts.config_file,
        env_prefix: None,
    })
    .context("load config")?;

    let log_path = match logging::init(&cfg.log) {
        Ok(path) => path,
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };
    tracing::info!(
        version = crate::VERSION,
        page_size = cfg.feed.page_size,
        "starting feedscroll"
    );

    let mut feed_service: Option<Arc<dyn FeedService + Send + Sync>> = None;
    let status = match dummyjson::Client::new(dummyjson::ClientConfig {
        user_agent: cfg.api.user_agent.clone(),
        timeout: Some(cfg.api.timeout),
        base_url: None,
        http_client: None,
    }) {
        Ok(client) => {
            feed_service = Some(Arc::new(DummyJsonFeedService::new(Arc::new(client))));
            "Fetching posts, users and comments...".to_string()
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize api client");
            format!("Failed to initialize API client: {err}")
        }
    };

    if let Some(path) = &log_path {
        tracing::debug!(path = %path.display(), "logging to file");
    }

    let options = ui::Options {
        status_message: status,
        feed_service,
        page_size: cfg.feed.page_size,
        failure_hook: data::logging_hook(),
    };

    let mut model = ui::Model::new(options);
    model.run()?;

    tracing::info!("feedscroll exiting");
    Ok(())
}

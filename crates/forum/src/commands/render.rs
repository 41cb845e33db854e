//! `forum render` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use forum_config::{CliSettings, Config};
use forum_enrich::{
    DEFAULT_USER_AGENT, DirectoryUser, FetchSettings, HttpFetcher, MemoryUserDirectory,
};
use forum_pipeline::{MessagePipeline, PipelineOptions, ProcessedMessage, Smiley, SmileyTable};

use crate::error::CliError;
use crate::output::Output;

/// Output format of the render command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// Display HTML followed by link cards.
    #[default]
    Html,
    /// The whole processed message.
    Json,
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Path to the post body.
    file: PathBuf,

    /// Id of the user writing the post (excluded from mentions).
    #[arg(short, long)]
    author: Option<String>,

    /// Path to configuration file (default: auto-discover forum.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Remote fetch timeout in milliseconds (overrides config).
    #[arg(long, env = "FORUM_FETCH_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if config loading, reading the file or processing fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            fetch_timeout_ms: self.timeout_ms,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::debug!(path = %path.display(), "Loaded configuration");
        }

        let raw = std::fs::read_to_string(&self.file)?;
        output.info(&format!("Rendering {}...", self.file.display()));

        let pipeline = build_pipeline(&config);
        let message = pipeline.process(&raw, self.author.as_deref())?;

        match self.format {
            Format::Html => print_html(&output, &message),
            Format::Json => output.result(&serde_json::to_string_pretty(&message)?),
        }
        Ok(())
    }
}

fn build_pipeline(config: &Config) -> MessagePipeline {
    let fetcher = HttpFetcher::new(fetch_settings(config));
    MessagePipeline::new(Arc::new(fetcher))
        .with_smileys(smiley_table(config))
        .with_users(Arc::new(user_directory(config)))
        .with_options(pipeline_options(config))
}

fn fetch_settings(config: &Config) -> FetchSettings {
    let enrichment = &config.enrichment;
    FetchSettings {
        timeout: enrichment.fetch_timeout(),
        max_redirects: enrichment.max_redirects,
        user_agent: enrichment
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
    }
}

fn smiley_table(config: &Config) -> SmileyTable {
    SmileyTable::new(
        config
            .smileys
            .iter()
            .map(|smiley| Smiley::new(smiley.code.clone(), smiley.path.clone()))
            .collect(),
    )
}

fn user_directory(config: &Config) -> MemoryUserDirectory {
    MemoryUserDirectory::new(
        config
            .users
            .iter()
            .map(|user| {
                DirectoryUser::new(
                    user.id.clone(),
                    user.display_name.clone(),
                    user.login.clone(),
                )
            })
            .collect(),
    )
}

fn pipeline_options(config: &Config) -> PipelineOptions {
    PipelineOptions {
        max_matches: config.enrichment.max_matches,
        short_preview_length: config.preview.short_length,
        long_preview_length: config.preview.long_length,
        empty_preview_text: config.preview.empty_text.clone(),
    }
}

fn print_html(output: &Output, message: &ProcessedMessage) {
    output.result(&message.display);
    if !message.cards.is_empty() {
        output.highlight(&format!("\n{} card(s)", message.cards.len()));
        output.result(&message.cards_html());
    }
    if !message.mentioned_users.is_empty() {
        let users: Vec<&str> = message.mentioned_users.iter().map(String::as_str).collect();
        output.info(&format!("Mentioned: {}", users.join(", ")));
    }
}

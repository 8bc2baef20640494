//! `analyze` subcommand -- run the detection pipeline end to end.
//!
//! Loads and validates the configuration, expands log source globs, builds
//! one file source per file (merged chronologically when there are several),
//! runs every selected rule engine over the stream, renders the report and
//! fires webhooks. Ctrl-C cancels the run through a shared token.

use std::path::PathBuf;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use negalog_analysis::analyzer::{AnalysisResult, AnalyzerBuilder};
use negalog_analysis::source::{expand_globs, FileSource, MergedSource, RecordSource};
use negalog_analysis::timestamp::TimestampExtractor;
use negalog_analysis::AnalysisError;
use negalog_core::config::{Config, WebhookConfig, WebhookTrigger, DEFAULT_WEBHOOK_TIMEOUT};
use negalog_core::duration::parse_duration;
use negalog_core::types::TimeRange;
use negalog_report::{
    FormatOptions, JsonFormatter, Report, SendOptions, TextFormatter, WebhookClient,
};

use crate::cli::{AnalyzeArgs, OutputFormat};
use crate::error::CliError;

/// Run the analyze command. Returns the process exit code
/// (0 = clean, 1 = issues detected).
pub async fn execute(args: AnalyzeArgs) -> Result<i32, CliError> {
    let config = Config::load(&args.config)?;

    let files = expand_globs(&config.log_sources)?;
    if files.is_empty() {
        return Err(CliError::Command(format!(
            "no log files matched patterns: {:?}",
            config.log_sources
        )));
    }

    let time_range = parse_time_range(args.time_range.as_deref())?;

    // Ctrl-C cancels the blocking analysis through the shared token
    let cancel = CancellationToken::new();
    let signal_task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let result = run_analysis(
        config.clone(),
        files,
        time_range,
        args.rules.clone(),
        cancel,
    )
    .await?;
    signal_task.abort();

    let report = Report::from_analysis(&result, args.config.display().to_string());

    let opts = FormatOptions {
        verbose: args.verbose,
        quiet: args.quiet,
    };
    {
        let mut stdout = std::io::stdout().lock();
        match args.output {
            OutputFormat::Text => TextFormatter::new(opts).format(&report, &mut stdout)?,
            OutputFormat::Json => JsonFormatter::new(opts).format(&report, &mut stdout)?,
        }
    }

    // Webhook failures are logged but never fail the analysis
    send_webhooks(&config, &args, &report).await;

    Ok(if report.has_issues() { 1 } else { 0 })
}

/// Parse the `--time-range` flag into a window ending now.
fn parse_time_range(raw: Option<&str>) -> Result<Option<TimeRange>, CliError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let window = parse_duration(raw)
        .map_err(|e| CliError::Command(format!("invalid time-range '{raw}': {e}")))?;
    let window = chrono::Duration::from_std(window)
        .map_err(|_| CliError::Command(format!("time-range '{raw}' is too large")))?;
    let end = Utc::now();
    Ok(Some(TimeRange {
        start: end - window,
        end,
    }))
}

/// Run the synchronous analysis pipeline on the blocking thread pool.
async fn run_analysis(
    config: Config,
    files: Vec<String>,
    time_range: Option<TimeRange>,
    rule_filter: Vec<String>,
    cancel: CancellationToken,
) -> Result<AnalysisResult, CliError> {
    let pattern = config
        .timestamp_format
        .compiled_pattern()
        .cloned()
        .ok_or_else(|| {
            CliError::Command("internal: config was not validated before analysis".to_owned())
        })?;
    let layout = config.timestamp_format.layout.clone();

    let outcome = tokio::task::spawn_blocking(move || -> Result<AnalysisResult, AnalysisError> {
        let mut builder = AnalyzerBuilder::new()
            .rule_filter(rule_filter)
            .cancellation(cancel.clone());
        if let Some(range) = time_range {
            builder = builder.time_range(range);
        }
        let mut analyzer = builder.build(&config)?;

        let extractor = TimestampExtractor::new(pattern, layout);
        let paths: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();

        // A single file streams directly; several files merge chronologically
        let mut source: Box<dyn RecordSource> = if paths.len() == 1 {
            Box::new(FileSource::new(paths, extractor).with_cancellation(cancel))
        } else {
            let sources = paths
                .into_iter()
                .map(|path| {
                    Box::new(
                        FileSource::new(vec![path], extractor.clone())
                            .with_cancellation(cancel.clone()),
                    ) as Box<dyn RecordSource>
                })
                .collect();
            Box::new(MergedSource::new(sources))
        };

        let outcome = analyzer.analyze(source.as_mut());
        let close_outcome = source.close();
        let result = outcome?;
        close_outcome?;
        Ok(result)
    })
    .await
    .map_err(|e| CliError::Command(format!("analysis task failed: {e}")))?;

    Ok(outcome?)
}

/// Send the report to configured and CLI-provided webhooks.
async fn send_webhooks(config: &Config, args: &AnalyzeArgs, report: &Report) {
    let webhooks = collect_webhooks(config, args);
    if webhooks.is_empty() {
        return;
    }

    let client = WebhookClient::new();
    for webhook in &webhooks {
        if !webhook.trigger.should_fire(report.has_issues()) {
            continue;
        }

        let response = client
            .send(
                report,
                &SendOptions {
                    url: webhook.url.clone(),
                    token: webhook.token.clone(),
                    timeout: webhook.timeout,
                },
            )
            .await;

        let name = webhook.display_name();
        if response.success() {
            eprintln!(
                "Webhook {name}: sent ({}, {:?})",
                response.status.unwrap_or_default(),
                response.duration
            );
        } else {
            let reason = response.error.as_deref().unwrap_or("unknown error");
            warn!(webhook = name, reason, "webhook delivery failed");
            eprintln!("Webhook {name}: failed ({reason})");
        }
    }
}

/// Merge config file webhooks with the one given on the command line.
fn collect_webhooks(config: &Config, args: &AnalyzeArgs) -> Vec<WebhookConfig> {
    let mut webhooks = config.webhooks.clone();

    if let Some(url) = &args.webhook_url {
        let trigger =
            WebhookTrigger::from_str_loose(&args.webhook_trigger).unwrap_or_default();
        webhooks.push(WebhookConfig {
            name: "cli".to_owned(),
            url: url.clone(),
            token: args.webhook_token.clone().unwrap_or_default(),
            trigger,
            timeout: Some(DEFAULT_WEBHOOK_TIMEOUT),
        });
    }

    webhooks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_args(webhook_url: Option<&str>, trigger: &str) -> AnalyzeArgs {
        AnalyzeArgs {
            config: PathBuf::from("negalog.yaml"),
            output: OutputFormat::Text,
            time_range: None,
            rules: Vec::new(),
            verbose: false,
            quiet: false,
            webhook_url: webhook_url.map(str::to_owned),
            webhook_token: None,
            webhook_trigger: trigger.to_owned(),
        }
    }

    #[test]
    fn test_parse_time_range_none() {
        assert!(parse_time_range(None).unwrap().is_none());
    }

    #[test]
    fn test_parse_time_range_window_ends_now() {
        let range = parse_time_range(Some("2h")).unwrap().unwrap();
        let window = range.end - range.start;
        assert_eq!(window, chrono::Duration::hours(2));
    }

    #[test]
    fn test_parse_time_range_invalid_is_command_error() {
        let err = parse_time_range(Some("soon")).unwrap_err();
        assert!(err.to_string().contains("invalid time-range"));
    }

    #[test]
    fn test_collect_webhooks_adds_cli_webhook() {
        let config = Config::default();
        let args = analyze_args(Some("https://hooks.example.com/x"), "always");
        let webhooks = collect_webhooks(&config, &args);
        assert_eq!(webhooks.len(), 1);
        assert_eq!(webhooks[0].name, "cli");
        assert_eq!(webhooks[0].trigger, WebhookTrigger::Always);
    }

    #[test]
    fn test_collect_webhooks_unknown_trigger_defaults_to_on_issues() {
        let config = Config::default();
        let args = analyze_args(Some("https://hooks.example.com/x"), "sometimes");
        let webhooks = collect_webhooks(&config, &args);
        assert_eq!(webhooks[0].trigger, WebhookTrigger::OnIssues);
    }

    #[test]
    fn test_collect_webhooks_without_cli_url_uses_config_only() {
        let config = Config::default();
        let args = analyze_args(None, "on_issues");
        assert!(collect_webhooks(&config, &args).is_empty());
    }
}

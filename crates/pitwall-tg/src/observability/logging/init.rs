use crate::config::from_env_or_default;
use crate::observability::GLOBAL_LABELS;
use crate::prelude::*;
use serde::Deserialize;
use serde_with::serde_as;
use std::collections::HashMap;
use std::ops::Deref;
use tracing_subscriber::prelude::*;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Background task that ships the logs to Loki, if it's configured.
pub struct LoggingTask {
    loki: Option<LokiTask>,
}

struct LokiTask {
    task: tokio::task::JoinHandle<()>,
    controller: tracing_loki::BackgroundTaskController,
}

impl LoggingTask {
    pub async fn shutdown(self) {
        let Some(loki) = self.loki else {
            return;
        };

        info!("Waiting for the logging task to finish nicely...");

        let ((), duration) = loki.controller.shutdown().with_duration().await;

        eprintln!(
            "Stopped logging task in {:.2?}: {:?}",
            duration,
            loki.task.await
        );
    }
}

pub fn init_logging() -> LoggingTask {
    from_env_or_default::<LoggingConfig>().init_logging()
}

#[serde_as]
#[derive(Deserialize, Default)]
struct LoggingConfig {
    /// Filter directives in the `tracing_subscriber::EnvFilter` syntax
    log_level: Option<String>,

    loki_url: Option<url::Url>,

    #[serde_as(as = "Option<serde_with::json::JsonString>")]
    #[serde(default)]
    loki_labels: Option<HashMap<String, String>>,
}

impl LoggingConfig {
    fn init_logging(self) -> LoggingTask {
        let directives = self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);

        let env_filter = tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|err| {
            eprintln!("Invalid LOG_LEVEL `{directives}` ({err}), using `{DEFAULT_LOG_LEVEL}`");
            tracing_subscriber::EnvFilter::new(DEFAULT_LOG_LEVEL)
        });

        let fmt = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(std::env::var("COLORS").as_deref() != Ok("0"))
            .pretty();

        let (loki_layer, loki) = match self.loki_url {
            Some(url) => match build_loki(url, self.loki_labels.unwrap_or_default()) {
                Ok((layer, controller, task)) => {
                    let task = tokio::spawn(task);
                    (Some(layer), Some(LokiTask { task, controller }))
                }
                Err(err) => {
                    eprintln!("Failed to set up Loki logging, continuing without it: {err}");
                    (None, None)
                }
            },
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(fmt)
            .with(loki_layer)
            .with(env_filter)
            .with(tracing_error::ErrorLayer::default())
            .init();

        init_panic_hook();

        LoggingTask { loki }
    }
}

fn build_loki(
    url: url::Url,
    mut labels: HashMap<String, String>,
) -> Result<
    (
        tracing_loki::Layer,
        tracing_loki::BackgroundTaskController,
        tracing_loki::BackgroundTask,
    ),
    tracing_loki::Error,
> {
    let additional_labels = GLOBAL_LABELS.iter().chain(&[("source", "pitwall-tg")]);

    labels.extend(additional_labels.map(|(k, v)| ((*k).to_owned(), (*v).to_owned())));

    labels
        .into_iter()
        .try_fold(tracing_loki::builder(), |builder, (key, value)| {
            builder.label(key, value)
        })?
        .build_controller_url(url)
}

fn init_panic_hook() {
    let current_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        // It's super-important to call the default panic hook, otherwise
        // we may not see it in the logs at all, because the panic may
        // happen inside of `tracing` logging system itself.
        current_hook(panic_info);

        let backtrace = std::backtrace::Backtrace::capture();
        let location = panic_info.location().map(|location| {
            format!(
                "{}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            )
        });

        // If the panic message was formatted using interpolated values,
        // it will be a `String`. Otherwise, it will be a `&str`.
        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<String>()
            .map(<_>::deref)
            .or_else(|| payload.downcast_ref::<&str>().map(<_>::deref))
            .unwrap_or("<unknown>");

        let span_trace = tracing_error::SpanTrace::capture();

        error!(
            target: "panic",
            thread = std::thread::current().name(),
            location,
            span_trace = %span_trace,
            backtrace = format_args!("\n{backtrace}"),
            "{message}"
        );
    }));
}

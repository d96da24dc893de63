use super::GLOBAL_LABELS;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Histogram buckets to measure the distribution of request durations in seconds
pub(crate) const DEFAULT_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Logging in through the browser takes way longer than a regular request
const SESSION_DURATION_BUCKETS: &[f64] = &[1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 90.0, 120.0];

/// Renders the metrics in the Prometheus exposition format
pub type MetricsHandle = PrometheusHandle;

pub fn init_metrics() -> MetricsHandle {
    let mut builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("session_acquisition_duration_seconds".to_owned()),
            SESSION_DURATION_BUCKETS,
        )
        .and_then(|builder| {
            builder.set_buckets_for_metric(
                Matcher::Full("http_request_duration_seconds".to_owned()),
                DEFAULT_DURATION_BUCKETS,
            )
        })
        .expect("BUG: histogram buckets must not be empty");

    for (key, value) in GLOBAL_LABELS {
        builder = builder.add_global_label(*key, *value);
    }

    let handle = builder
        .install_recorder()
        .expect("BUG: failed to install the metrics recorder");

    describe();

    handle
}

fn describe() {
    metrics::describe_counter!(
        "session_acquisitions_total",
        "Number of attempts to log in and capture the session cookie"
    );
    metrics::describe_histogram!(
        "session_acquisition_duration_seconds",
        metrics::Unit::Seconds,
        "Time it took to log in and capture the session cookie"
    );
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        metrics::Unit::Seconds,
        "Duration of a single HTTP request to the Fantasy API"
    );
    metrics::describe_counter!(
        "tg_updates_total",
        "Number of updates received from Telegram"
    );
    metrics::describe_counter!(
        "tg_commands_total",
        "Number of bot commands processed, by command and result"
    );
    metrics::describe_counter!("reminders_fired_total", "Number of reminders sent to chats");
}

//! Logging initialization (SPEC_FULL.md §10.1): console `tracing-subscriber`
//! with `EnvFilter`, controlled by `RUST_LOG` or the `--verbose` flag,
//! formatted with the same `trace_id`/`span_id` layer as the teacher's CLI
//! (see [`crate::log_format::TextWithSpanIds`]).

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initializes the process-wide `tracing` subscriber.
///
/// `RUST_LOG` (e.g. `agentmap=debug`) takes precedence; `verbose` is the
/// `--verbose` CLI flag's fallback (`debug` when set, `info` otherwise).
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let layer = tracing_subscriber::fmt::layer()
        .event_format(crate::log_format::TextWithSpanIds::new())
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(layer).try_init()?;
    Ok(())
}

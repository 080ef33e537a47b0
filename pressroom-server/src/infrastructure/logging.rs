use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info,pressroom_server=debug";

/// One JSON line per event, fields flattened, RFC 3339 UTC timestamps.
/// `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .unwrap();

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

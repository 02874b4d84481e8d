use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Console logging with `RUST_LOG` filtering, `info` by default.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

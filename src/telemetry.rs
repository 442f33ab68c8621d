use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// `RUST_LOG` wins when set; otherwise info globally and debug for this crate.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mailora_campaigns=debug,tower_http=info"));
    let fmt_layer = fmt::layer().with_target(false);

    // try_init: a second call (tests, CLI re-entry) keeps the first subscriber
    let _ = Registry::default().with(env_filter).with(fmt_layer).try_init();
}

use tracing_subscriber::EnvFilter;
use tracing_subscriber_wasm::MakeConsoleWriter;

pub const DEFAULT_LOG_FILTER: &str = "showapp_frontend=debug,showapp_api=debug,showapp_shared=debug";

/// Routes `tracing` events to the browser console, the filter comes from `SHOWAPP_LOG` at build time.
pub fn web_logger_init() {
    let filter = option_env!("SHOWAPP_LOG").unwrap_or(DEFAULT_LOG_FILTER);
    let _ = tracing_subscriber::fmt()
        .with_writer(MakeConsoleWriter::default().map_trace_level_to(tracing::Level::DEBUG))
        .with_ansi(false)
        .without_time()
        .with_env_filter(EnvFilter::new(filter))
        .try_init();
}

use std::process;

use tracing_loki::url::{ParseError, Url};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid LOKI_URL: {0}")]
    Url(#[from] ParseError),

    #[error("failed to build Loki layer: {0}")]
    Loki(#[from] tracing_loki::Error),
}

/// Installs the global subscriber: `RUST_LOG` filtering, console output, and
/// Loki shipping when `loki_url` is given.
///
/// Must be called from within a tokio runtime when Loki is enabled.
pub fn init(loki_url: Option<&str>) -> Result<(), LoggingError> {
    let filter_layer = EnvFilter::from_default_env();
    let fmt_layer = fmt::layer().with_target(false).with_line_number(true);

    let loki_layer = match loki_url {
        Some(url) => {
            let (layer, task) = tracing_loki::builder()
                .label("service", "scheduler")?
                .extra_field("pid", format!("{}", process::id()))?
                .build_url(Url::parse(url)?)?;

            tokio::spawn(task);
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(loki_layer)
        .init();

    Ok(())
}

//! Global tracing subscriber

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber; `RUST_LOG` wins over the configured level
///
/// Only the first call installs anything.
pub fn init_logging(config: &LoggingConfig) {
    let installed = tracing_subscriber::registry()
        .with(output_layer(&config.format))
        .with(level_filter(&config.level))
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(level = %config.level, format = ?config.format, "Logging initialized");
    }
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn output_layer(format: &LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_level_falls_back() {
        let filter = level_filter("definitely=not=a=level");

        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_repeat_init_is_harmless() {
        let config = LoggingConfig::default();

        init_logging(&config);
        init_logging(&config);
    }
}

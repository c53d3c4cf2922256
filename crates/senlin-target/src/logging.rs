//! Log setup for a plugin process.

use tracing::Span;
use tracing_subscriber::EnvFilter;

use senlin_core::PLUGIN_NAME;

const DEFAULT_FILTER: &str = "info,senlin_target=debug,senlin_scaleutils=debug";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// JSON output suits hosts that collect plugin stderr as structured logs.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!(e))
}

/// The span every [`SenlinTarget`](crate::SenlinTarget) call is logged under.
pub fn plugin_span() -> Span {
    tracing::info_span!("plugin", name = PLUGIN_NAME)
}

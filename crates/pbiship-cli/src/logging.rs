//! Subscriber setup and runtime verbosity control.

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt};

use pbiship_core::logging::VerbosityControl;

const DEFAULT_FILTER: &str = "pbiship=info,pbiship_core=info,warn";
const VERBOSE_FILTER: &str = "pbiship=debug,pbiship_core=debug,warn";

/// Adjusts the global level cap installed by [`init`].
#[derive(Clone)]
pub struct ReloadControl {
    handle: reload::Handle<LevelFilter, Registry>,
}

impl VerbosityControl for ReloadControl {
    fn current(&self) -> LevelFilter {
        self.handle.clone_current().unwrap_or(LevelFilter::TRACE)
    }

    fn set(&self, level: LevelFilter) -> Result<()> {
        self.handle
            .modify(|current| *current = level)
            .map_err(|e| anyhow::anyhow!("Failed to update log level: {}", e))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) -> ReloadControl {
    let (cap, handle) = reload::Layer::new(LevelFilter::TRACE);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            VERBOSE_FILTER.into()
        } else {
            DEFAULT_FILTER.into()
        }
    });

    tracing_subscriber::registry()
        .with(cap)
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    ReloadControl { handle }
}

//! Logging setup. Everything goes to stderr so stdout stays machine readable.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "SHEETCALC_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber. The filter comes from [`LOG_ENV`], then
/// the config file, then [`DEFAULT_FILTER`]. Returns a warning if the
/// configured filter is invalid.
pub fn init(config_filter: Option<&str>) -> Option<String> {
    let mut warning = None;
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => match config_filter.map(EnvFilter::try_new) {
            Some(Ok(filter)) => filter,
            Some(Err(err)) => {
                warning = Some(format!("Invalid log filter in config: {}", err));
                EnvFilter::new(DEFAULT_FILTER)
            }
            None => EnvFilter::new(DEFAULT_FILTER),
        },
    };

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    warning
}

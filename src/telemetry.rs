//! Opt-in tracing setup for hosts embedding `geomag-chart`.
//!
//! Reconciliation, fetch and shared-state events are emitted under the
//! `geomag_chart` target. Hosts with their own subscriber need nothing from
//! this module.

/// Environment variable read before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "GEOMAG_CHART_LOG";

/// Filter used when neither environment variable is set.
pub const DEFAULT_FILTER: &str = "warn,geomag_chart=info";

/// Filter directives from the environment, falling back to
/// [`DEFAULT_FILTER`].
#[must_use]
pub fn filter_directives() -> String {
    [LOG_ENV_VAR, "RUST_LOG"]
        .into_iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
}

/// Installs a compact `fmt` subscriber using [`filter_directives`].
///
/// Returns `false` when the `telemetry` feature is disabled, when the
/// directives do not parse, or when the host already set a global
/// subscriber.
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(&filter_directives())
}

/// Installs a compact `fmt` subscriber with explicit filter directives.
#[must_use]
pub fn init_tracing(directives: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        let Ok(filter) = tracing_subscriber::EnvFilter::try_new(directives) else {
            return false;
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok()
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = directives;
        false
    }
}

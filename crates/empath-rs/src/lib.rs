//! Public SDK surface for Empath.
//!
//! Re-exports the relay building blocks so an embedder can wire a relay to
//! its own transport, and provides a logging helper shared with the binary.

/// Re-export for convenience.
pub use empath_rs_config as config;
pub use empath_rs_core as core;
/// Re-export for convenience.
pub use empath_rs_history as history;
/// Re-export for convenience.
pub use empath_rs_telegram as telegram;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// Defaults to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::init_logging;

    #[test]
    fn init_logging_can_run_twice() {
        init_logging();
        init_logging();
        log::info!("logging initialized twice");
    }
}

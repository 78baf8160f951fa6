// SPDX-License-Identifier: MIT OR Apache-2.0

//! Downstream context refresh signal.

/// Receives the signal published after a remote property source was swapped.
///
/// Implementations typically rebind configuration-properties beans or restart
/// refresh-scoped components. The call happens on the push-channel thread.
pub trait ContextRefresher: Send + Sync {
    /// Triggers a refresh. `reason` describes the document that changed.
    fn refresh(&self, reason: &str);
}

/// A refresher that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingRefresher;

impl ContextRefresher for LoggingRefresher {
    fn refresh(&self, reason: &str) {
        tracing::info!("Context refresh requested: {}", reason);
    }
}

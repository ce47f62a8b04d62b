//! Signals delivered by the host environment.

/// Notification from the host the engine is embedded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// First user gesture. Grants playback consent on platforms that restrict autoplay.
    UserInteraction,
    /// The host surface was hidden or shown again.
    VisibilityChanged { visible: bool },
}

/// Autoplay consent lifecycle owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentState {
    /// Waiting for the first [`HostSignal::UserInteraction`]. Playback is deferred.
    Pending,
    Granted,
}

impl ConsentState {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

//! Typed lifecycle events and the listener registry the engine publishes them through.

use std::sync::Arc;

use crate::instance::InstanceId;

/// Discriminant of an [`AudioEvent`], used to filter subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioEventKind {
    Played,
    Paused,
    Ended,
    Released,
    VolumeChanged,
    TimeUpdate,
}

/// Lifecycle event emitted synchronously by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Played {
        instance: InstanceId,
        type_id: Arc<str>,
    },
    Paused {
        instance: InstanceId,
        type_id: Arc<str>,
    },
    Ended {
        instance: InstanceId,
        type_id: Arc<str>,
    },
    Released {
        instance: InstanceId,
        type_id: Arc<str>,
    },
    /// `volume` is the new volume multiplier of the instance.
    VolumeChanged {
        instance: InstanceId,
        type_id: Arc<str>,
        volume: f32,
    },
    /// `time_ms` is the elapsed playback time of the active unit.
    TimeUpdate {
        instance: InstanceId,
        type_id: Arc<str>,
        time_ms: f64,
    },
}

impl AudioEvent {
    pub fn kind(&self) -> AudioEventKind {
        match self {
            Self::Played { .. } => AudioEventKind::Played,
            Self::Paused { .. } => AudioEventKind::Paused,
            Self::Ended { .. } => AudioEventKind::Ended,
            Self::Released { .. } => AudioEventKind::Released,
            Self::VolumeChanged { .. } => AudioEventKind::VolumeChanged,
            Self::TimeUpdate { .. } => AudioEventKind::TimeUpdate,
        }
    }

    pub fn instance(&self) -> InstanceId {
        match self {
            Self::Played { instance, .. }
            | Self::Paused { instance, .. }
            | Self::Ended { instance, .. }
            | Self::Released { instance, .. }
            | Self::VolumeChanged { instance, .. }
            | Self::TimeUpdate { instance, .. } => *instance,
        }
    }

    pub fn type_id(&self) -> &str {
        match self {
            Self::Played { type_id, .. }
            | Self::Paused { type_id, .. }
            | Self::Ended { type_id, .. }
            | Self::Released { type_id, .. }
            | Self::VolumeChanged { type_id, .. }
            | Self::TimeUpdate { type_id, .. } => type_id,
        }
    }
}

/// Token returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

type Listener = Box<dyn FnMut(&AudioEvent)>;

struct Subscription {
    token: ListenerToken,
    filter: Option<AudioEventKind>,
    listener: Listener,
}

/// Listener registry. Listeners run in subscription order on the emitting thread.
#[derive(Default)]
pub struct EventBus {
    next_token: u64,
    subscriptions: Vec<Subscription>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every event.
    pub fn subscribe(&mut self, listener: impl FnMut(&AudioEvent) + 'static) -> ListenerToken {
        self.insert(None, Box::new(listener))
    }

    /// Register a listener for a single event kind.
    pub fn subscribe_kind(
        &mut self,
        kind: AudioEventKind,
        listener: impl FnMut(&AudioEvent) + 'static,
    ) -> ListenerToken {
        self.insert(Some(kind), Box::new(listener))
    }

    /// Remove a listener. Returns `false` if the token was not registered.
    pub fn unsubscribe(&mut self, token: ListenerToken) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.token != token);
        self.subscriptions.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn emit(&mut self, event: &AudioEvent) {
        let kind = event.kind();
        for sub in self.subscriptions.iter_mut() {
            if sub.filter.map_or(true, |filter| filter == kind) {
                (sub.listener)(event);
            }
        }
    }

    fn insert(&mut self, filter: Option<AudioEventKind>, listener: Listener) -> ListenerToken {
        self.next_token += 1;
        let token = ListenerToken(self.next_token);
        self.subscriptions.push(Subscription {
            token,
            filter,
            listener,
        });
        token
    }
}

//! Headless backend that records every call instead of producing sound.
//!
//! Clones share state, so a caller can keep one handle for inspection after handing another
//! to an engine.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::BackendError;

use super::{PlaybackBackend, PlaybackUnit, UnitSignal};

/// Recorded state of a mock unit.
#[derive(Debug, Clone, PartialEq)]
pub struct MockUnitSnapshot {
    pub source: String,
    pub looping: bool,
    pub volume: f32,
    pub playback_rate: f32,
    pub paused: bool,
    pub play_calls: usize,
    pub current_time: f64,
    pub removed: bool,
}

#[derive(Debug, Default)]
struct MockState {
    units: Vec<MockUnitSnapshot>,
    pending: Vec<VecDeque<UnitSignal>>,
    reject_play: bool,
    missing_sources: Vec<String>,
}

/// Mock implementation of [`PlaybackBackend`].
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Rc<RefCell<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `play` call fail as if the platform refused it.
    pub fn set_reject_play(&self, reject: bool) {
        self.state.borrow_mut().reject_play = reject;
    }

    /// Make unit creation fail for `source`.
    pub fn fail_source(&self, source: &str) {
        self.state.borrow_mut().missing_sources.push(source.to_string());
    }

    /// Snapshot of every unit created so far, in creation order.
    pub fn units(&self) -> Vec<MockUnitSnapshot> {
        self.state.borrow().units.clone()
    }

    pub fn unit(&self, index: usize) -> Option<MockUnitSnapshot> {
        self.state.borrow().units.get(index).cloned()
    }

    pub fn unit_count(&self) -> usize {
        self.state.borrow().units.len()
    }

    /// Units that have not been torn down.
    pub fn live_unit_count(&self) -> usize {
        self.state.borrow().units.iter().filter(|unit| !unit.removed).count()
    }

    /// Units currently producing (simulated) sound.
    pub fn sounding_unit_count(&self) -> usize {
        self.state
            .borrow()
            .units
            .iter()
            .filter(|unit| !unit.removed && !unit.paused)
            .count()
    }

    /// Simulate the end of a play-through on unit `index`.
    pub fn finish(&self, index: usize) {
        let mut state = self.state.borrow_mut();
        if let Some(unit) = state.units.get_mut(index) {
            unit.paused = true;
        }
        if let Some(queue) = state.pending.get_mut(index) {
            queue.push_back(UnitSignal::Ended);
        }
    }

    /// Simulate a progress report on unit `index`.
    pub fn report_time(&self, index: usize, seconds: f64) {
        let mut state = self.state.borrow_mut();
        if let Some(unit) = state.units.get_mut(index) {
            unit.current_time = seconds;
        }
        if let Some(queue) = state.pending.get_mut(index) {
            queue.push_back(UnitSignal::TimeUpdate { seconds });
        }
    }
}

impl PlaybackBackend for MockBackend {
    fn create_unit(
        &mut self,
        source: &str,
        looping: bool,
    ) -> Result<Box<dyn PlaybackUnit>, BackendError> {
        let mut state = self.state.borrow_mut();
        if state.missing_sources.iter().any(|missing| missing == source) {
            return Err(BackendError::Source {
                source: source.to_string(),
                reason: "not found".to_string(),
            });
        }
        let index = state.units.len();
        state.units.push(MockUnitSnapshot {
            source: source.to_string(),
            looping,
            volume: 1.0,
            playback_rate: 1.0,
            paused: true,
            play_calls: 0,
            current_time: 0.0,
            removed: false,
        });
        state.pending.push(VecDeque::new());
        Ok(Box::new(MockUnit {
            index,
            state: self.state.clone(),
        }))
    }
}

struct MockUnit {
    index: usize,
    state: Rc<RefCell<MockState>>,
}

impl MockUnit {
    fn read<T>(&self, f: impl FnOnce(&MockUnitSnapshot) -> T) -> T {
        f(&self.state.borrow().units[self.index])
    }

    fn write(&self, f: impl FnOnce(&mut MockUnitSnapshot)) {
        f(&mut self.state.borrow_mut().units[self.index]);
    }
}

impl PlaybackUnit for MockUnit {
    fn volume(&self) -> f32 {
        self.read(|unit| unit.volume)
    }

    fn set_volume(&mut self, volume: f32) {
        self.write(|unit| unit.volume = volume);
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.write(|unit| unit.playback_rate = rate);
    }

    fn play(&mut self) -> Result<(), BackendError> {
        let reject = self.state.borrow().reject_play;
        if reject {
            return Err(BackendError::Rejected(
                "mock backend rejects playback".to_string(),
            ));
        }
        self.write(|unit| {
            unit.paused = false;
            unit.play_calls += 1;
        });
        Ok(())
    }

    fn pause(&mut self) {
        self.write(|unit| unit.paused = true);
    }

    fn is_paused(&self) -> bool {
        self.read(|unit| unit.paused)
    }

    fn current_time(&self) -> f64 {
        self.read(|unit| unit.current_time)
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.write(|unit| unit.current_time = seconds.max(0.0));
    }

    fn remove(&mut self) {
        self.write(|unit| {
            unit.paused = true;
            unit.removed = true;
        });
        if let Some(queue) = self.state.borrow_mut().pending.get_mut(self.index) {
            queue.clear();
        }
    }

    fn poll(&mut self) -> Option<UnitSignal> {
        self.state
            .borrow_mut()
            .pending
            .get_mut(self.index)
            .and_then(|queue| queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_record_calls() {
        let mut backend = MockBackend::new();
        let mut unit = backend.create_unit("a.wav", true).expect("create unit");
        unit.set_volume(0.5);
        unit.set_playback_rate(1.5);
        unit.set_current_time(2.0);
        unit.play().expect("play");

        let snapshot = backend.unit(0).expect("unit 0");
        assert_eq!(snapshot.source, "a.wav");
        assert!(snapshot.looping);
        assert_eq!(snapshot.volume, 0.5);
        assert_eq!(snapshot.playback_rate, 1.5);
        assert_eq!(snapshot.current_time, 2.0);
        assert!(!snapshot.paused);
        assert_eq!(snapshot.play_calls, 1);
        assert_eq!(backend.sounding_unit_count(), 1);
    }

    #[test]
    fn finish_queues_single_ended_signal() {
        let mut backend = MockBackend::new();
        let mut unit = backend.create_unit("a.wav", false).expect("create unit");
        unit.play().expect("play");
        backend.finish(0);

        assert!(unit.is_paused());
        assert_eq!(unit.poll(), Some(UnitSignal::Ended));
        assert_eq!(unit.poll(), None);
    }

    #[test]
    fn rejection_and_missing_sources() {
        let mut backend = MockBackend::new();
        backend.fail_source("missing.wav");
        assert!(matches!(
            backend.create_unit("missing.wav", false),
            Err(BackendError::Source { .. })
        ));

        backend.set_reject_play(true);
        let mut unit = backend.create_unit("a.wav", false).expect("create unit");
        assert!(matches!(unit.play(), Err(BackendError::Rejected(_))));
        assert!(unit.is_paused());
    }

    #[test]
    fn removed_units_drop_pending_signals() {
        let mut backend = MockBackend::new();
        let mut unit = backend.create_unit("a.wav", false).expect("create unit");
        backend.report_time(0, 0.25);
        unit.remove();

        assert_eq!(unit.poll(), None);
        assert_eq!(backend.live_unit_count(), 0);
    }
}

use std::collections::VecDeque;

use crate::instance::InstanceId;

/// Idle cache and active set of one sound type.
///
/// An id is never in both at once.
#[derive(Debug, Default)]
pub(crate) struct TypePool {
    idle: VecDeque<InstanceId>,
    active: Vec<InstanceId>,
}

impl TypePool {
    /// Take the oldest idle instance.
    pub(crate) fn pop_idle(&mut self) -> Option<InstanceId> {
        self.idle.pop_front()
    }

    pub(crate) fn push_idle(&mut self, id: InstanceId) {
        self.remove_active(id);
        if !self.idle.contains(&id) {
            self.idle.push_back(id);
        }
    }

    pub(crate) fn push_active(&mut self, id: InstanceId) {
        self.remove_idle(id);
        if !self.active.contains(&id) {
            self.active.push(id);
        }
    }

    pub(crate) fn remove_idle(&mut self, id: InstanceId) -> bool {
        match self.idle.iter().position(|idle| *idle == id) {
            Some(index) => {
                self.idle.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_active(&mut self, id: InstanceId) -> bool {
        match self.active.iter().position(|active| *active == id) {
            Some(index) => {
                self.active.remove(index);
                true
            }
            None => false,
        }
    }

    /// Active ids in the order they started playing.
    pub(crate) fn active(&self) -> &[InstanceId] {
        &self.active
    }

    pub(crate) fn idle(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.idle.iter().copied()
    }

    pub(crate) fn idle_len(&self) -> usize {
        self.idle.len()
    }
}

// src/lifecycle.rs
//! Host visibility lifecycle
//!
//! The windowing host reports visibility transitions (resume, pause,
//! destroy) and interested parties subscribe to them. The render session
//! uses this to gate continuous frame production: frames run only between
//! resume and pause, and a destroyed lifecycle drops every observer.

use std::cell::RefCell;
use std::rc::Rc;

/// Callbacks for host visibility transitions. All methods default to no-ops
/// so observers implement only what they care about.
pub trait LifecycleObserver {
    fn on_resume(&mut self) {}
    fn on_pause(&mut self) {}
    fn on_destroy(&mut self) {}
}

/// Handle returned by [`Lifecycle::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Created,
    Resumed,
    Paused,
    Destroyed,
}

/// Dispatches visibility transitions to subscribed observers in
/// subscription order.
#[derive(Default)]
pub struct Lifecycle {
    observers: Vec<(SubscriptionId, Rc<RefCell<dyn LifecycleObserver>>)>,
    next_id: u64,
    phase: Phase,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Rc<RefCell<dyn LifecycleObserver>>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.observers.retain(|(sub_id, _)| *sub_id != id);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn is_resumed(&self) -> bool {
        self.phase == Phase::Resumed
    }

    pub fn resume(&mut self) {
        if self.phase == Phase::Destroyed {
            return;
        }
        self.phase = Phase::Resumed;
        for (_, observer) in &self.observers {
            observer.borrow_mut().on_resume();
        }
    }

    pub fn pause(&mut self) {
        if self.phase == Phase::Destroyed {
            return;
        }
        self.phase = Phase::Paused;
        for (_, observer) in &self.observers {
            observer.borrow_mut().on_pause();
        }
    }

    /// Terminal transition. Observers get `on_destroy` and are then dropped,
    /// so nothing fires after this.
    pub fn destroy(&mut self) {
        if self.phase == Phase::Destroyed {
            return;
        }
        self.phase = Phase::Destroyed;
        for (_, observer) in &self.observers {
            observer.borrow_mut().on_destroy();
        }
        self.observers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<&'static str>,
    }

    impl LifecycleObserver for Recorder {
        fn on_resume(&mut self) {
            self.events.push("resume");
        }
        fn on_pause(&mut self) {
            self.events.push("pause");
        }
        fn on_destroy(&mut self) {
            self.events.push("destroy");
        }
    }

    #[test]
    fn test_observer_receives_transitions_in_order() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut lifecycle = Lifecycle::new();
        lifecycle.subscribe(recorder.clone());

        lifecycle.resume();
        lifecycle.pause();
        lifecycle.resume();
        assert_eq!(recorder.borrow().events, ["resume", "pause", "resume"]);
        assert!(lifecycle.is_resumed());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut lifecycle = Lifecycle::new();
        let id = lifecycle.subscribe(recorder.clone());

        lifecycle.resume();
        lifecycle.unsubscribe(id);
        lifecycle.pause();
        assert_eq!(recorder.borrow().events, ["resume"]);
        assert_eq!(lifecycle.observer_count(), 0);
    }

    #[test]
    fn test_destroy_is_terminal_and_drops_observers() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut lifecycle = Lifecycle::new();
        lifecycle.subscribe(recorder.clone());

        lifecycle.resume();
        lifecycle.destroy();
        assert_eq!(lifecycle.observer_count(), 0);
        assert!(!lifecycle.is_resumed());

        // Transitions after destroy do not fire.
        lifecycle.resume();
        assert_eq!(recorder.borrow().events, ["resume", "destroy"]);
    }
}

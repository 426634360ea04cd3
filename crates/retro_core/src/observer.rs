//! Synchronous movement notifications.
//!
//! The simulation owns an [`ObserverRegistry`] and calls every observer
//! before the triggering command returns. Observers get a borrowed view
//! of the unit for the duration of the call and must not keep it.

use crate::components::Unit;
use crate::math::Vec2Fixed;

/// Receives unit movement transitions.
pub trait UnitObserver {
    /// The unit moved this tick. `direction` is the requested direction,
    /// before normalization.
    fn on_unit_move(&mut self, unit: &Unit, direction: Vec2Fixed);

    /// The unit did not move this tick.
    fn on_unit_stop(&mut self, unit: &Unit);
}

/// Fan-out list of observers, notified in registration order.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Box<dyn UnitObserver>>,
}

impl ObserverRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.
    pub fn add(&mut self, observer: Box<dyn UnitObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver a move event to every observer.
    pub fn notify_move(&mut self, unit: &Unit, direction: Vec2Fixed) {
        for observer in &mut self.observers {
            observer.on_unit_move(unit, direction);
        }
    }

    /// Deliver a stop event to every observer.
    pub fn notify_stop(&mut self, unit: &Unit) {
        for observer in &mut self.observers {
            observer.on_unit_stop(unit);
        }
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// A recorded notification, as captured by [`EventLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    /// `on_unit_move` was called.
    Moved {
        /// Unit handle.
        unit: crate::components::EntityId,
        /// Direction as delivered.
        direction: Vec2Fixed,
    },
    /// `on_unit_stop` was called.
    Stopped {
        /// Unit handle.
        unit: crate::components::EntityId,
    },
}

/// Observer that appends every notification to a shared log.
///
/// Useful for tests and tooling that need to inspect the event stream
/// after the simulation has taken ownership of the observer.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: std::rc::Rc<std::cell::RefCell<Vec<MotionEvent>>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<MotionEvent> {
        self.events.borrow().clone()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl UnitObserver for EventLog {
    fn on_unit_move(&mut self, unit: &Unit, direction: Vec2Fixed) {
        self.events.borrow_mut().push(MotionEvent::Moved {
            unit: unit.id,
            direction,
        });
    }

    fn on_unit_stop(&mut self, unit: &Unit) {
        self.events
            .borrow_mut()
            .push(MotionEvent::Stopped { unit: unit.id });
    }
}

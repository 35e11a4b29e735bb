//! Collision event hooks (spec §6): `CreatingPair`, `PairUpdated`, `PairTouching`,
//! `InitialCollisionDetected`, `CollisionEnded`. Delivered synchronously at the point
//! in the step where the narrow phase observes the transition — handlers must not
//! re-enter the solver (spec §9, "Event dispatch").

use crate::collider::ColliderPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEvent {
    CreatingPair(ColliderPair),
    PairUpdated(ColliderPair),
    PairTouching(ColliderPair),
    InitialCollisionDetected(ColliderPair),
    CollisionEnded(ColliderPair),
}

/// Callback table owned by `Space`, keyed by collider id rather than modeled as a
/// subscription list on the collidable itself (spec §9's replacement for the
/// source's event-subscription pattern). The character controller registers here to
/// zero out friction on its own pairs when they're created.
#[derive(Default)]
pub struct EventHandlers {
    handlers: Vec<Box<dyn FnMut(&CollisionEvent) + Send>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl FnMut(&CollisionEvent) + Send + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn dispatch(&mut self, event: &CollisionEvent) {
        for handler in &mut self.handlers {
            handler(event);
        }
    }

    pub fn dispatch_all(&mut self, events: &[CollisionEvent]) {
        for event in events {
            self.dispatch(event);
        }
    }
}

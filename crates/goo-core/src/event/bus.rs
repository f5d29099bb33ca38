// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use thiserror::Error;

use super::types::{Event, EventData, EventKind, EventPtr};

/// A subscriber to one or more event kinds.
///
/// `C` is the dispatch context handed to every call, so handlers can reach
/// shared services without global state.
pub trait EventListener<C> {
    /// A short name used in log messages.
    fn listener_name(&self) -> &str {
        "listener"
    }

    /// Handles one event.
    ///
    /// ## Arguments
    /// * `event` - The event being delivered.
    /// * `bus` - The bus itself, so the handler can queue or trigger follow-ups.
    /// * `ctx` - The dispatch context.
    ///
    /// ## Returns
    /// `true` if the event was consumed. For queued events this stops the
    /// delivery to later listeners; for triggered events it is only reported.
    fn handle_event(&mut self, event: &EventPtr, bus: &mut EventBus<C>, ctx: &mut C) -> bool;
}

/// Shared handle to a listener, as passed to [`EventBus::add_listener`].
pub type ListenerHandle<C> = Rc<RefCell<dyn EventListener<C>>>;

/// Identity of a listener: the address of its shared allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    /// Computes the identity of a listener handle.
    pub fn of<C>(listener: &ListenerHandle<C>) -> Self {
        Self(Rc::as_ptr(listener) as *const () as usize)
    }
}

/// Usage errors reported by the [`EventBus`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The listener is already registered for this kind.
    #[error("listener already registered for {0}")]
    DuplicateRegistration(EventKind),
    /// The listener was not registered for this kind.
    #[error("listener not registered for {0}")]
    NotRegistered(EventKind),
    /// Nobody listens to this kind; the event was dropped.
    #[error("no listener registered for {0}, event dropped")]
    NoListeners(EventKind),
}

struct Registration<C> {
    id: ListenerId,
    listener: Weak<RefCell<dyn EventListener<C>>>,
}

/// Type-keyed publish/subscribe router with a double-buffered deferred queue.
///
/// Queued events go to the active buffer. [`EventBus::update`] flips the
/// buffers and drains the previous one, so anything queued while draining
/// waits for the next update. [`EventBus::trigger_event`] bypasses the queue.
///
/// The bus only keeps weak references: listeners are owned elsewhere and must
/// unregister before they are dropped.
pub struct EventBus<C> {
    listeners: HashMap<EventKind, Vec<Registration<C>>>,
    queues: [VecDeque<EventPtr>; 2],
    active: usize,
    clock: f64,
}

impl<C> EventBus<C> {
    /// Creates an empty bus with its clock at zero.
    pub fn new() -> Self {
        log::info!("EventBus initialized.");
        Self {
            listeners: HashMap::new(),
            queues: [VecDeque::new(), VecDeque::new()],
            active: 0,
            clock: 0.0,
        }
    }

    /// Seconds accumulated by [`EventBus::update`].
    pub fn now(&self) -> f64 {
        self.clock
    }

    /// Builds an event stamped with the current bus time.
    pub fn stamp(&self, data: EventData) -> EventPtr {
        Event::shared(self.clock, data)
    }

    /// Registers `listener` for `kind`.
    ///
    /// ## Returns
    /// [`BusError::DuplicateRegistration`] if the pair already exists.
    pub fn add_listener(
        &mut self,
        listener: &ListenerHandle<C>,
        kind: EventKind,
    ) -> Result<(), BusError> {
        let id = ListenerId::of(listener);
        let registrations = self.listeners.entry(kind).or_default();
        if registrations.iter().any(|r| r.id == id) {
            log::warn!("Attempted to register a listener twice for {kind}.");
            return Err(BusError::DuplicateRegistration(kind));
        }
        registrations.push(Registration {
            id,
            listener: Rc::downgrade(listener),
        });
        log::trace!("Listener {id:?} registered for {kind}.");
        Ok(())
    }

    /// Unregisters `listener` from `kind`.
    ///
    /// ## Returns
    /// [`BusError::NotRegistered`] if the pair does not exist.
    pub fn remove_listener(
        &mut self,
        listener: &ListenerHandle<C>,
        kind: EventKind,
    ) -> Result<(), BusError> {
        let id = ListenerId::of(listener);
        let Some(registrations) = self.listeners.get_mut(&kind) else {
            log::warn!("Attempted to remove an unregistered listener from {kind}.");
            return Err(BusError::NotRegistered(kind));
        };
        match registrations.iter().position(|r| r.id == id) {
            Some(index) => {
                registrations.remove(index);
                if registrations.is_empty() {
                    self.listeners.remove(&kind);
                }
                Ok(())
            }
            None => {
                log::warn!("Attempted to remove an unregistered listener from {kind}.");
                Err(BusError::NotRegistered(kind))
            }
        }
    }

    /// Unregisters `listener` from every kind.
    ///
    /// ## Returns
    /// The number of registrations removed.
    pub fn remove_listener_from_all(&mut self, listener: &ListenerHandle<C>) -> usize {
        let id = ListenerId::of(listener);
        let mut removed = 0;
        self.listeners.retain(|_, registrations| {
            let before = registrations.len();
            registrations.retain(|r| r.id != id);
            removed += before - registrations.len();
            !registrations.is_empty()
        });
        removed
    }

    /// Returns `true` if at least one listener is registered for `kind`.
    pub fn has_listeners(&self, kind: EventKind) -> bool {
        self.listeners
            .get(&kind)
            .is_some_and(|registrations| !registrations.is_empty())
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Appends an event to the active queue.
    ///
    /// ## Returns
    /// [`BusError::NoListeners`] if nobody listens to the event's kind. The
    /// event is dropped in that case.
    pub fn queue_event(&mut self, event: EventPtr) -> Result<(), BusError> {
        let kind = event.kind();
        if !self.has_listeners(kind) {
            log::debug!("Dropping queued {kind}: no listener registered.");
            return Err(BusError::NoListeners(kind));
        }
        self.queues[self.active].push_back(event);
        Ok(())
    }

    /// Delivers an event synchronously to every listener of its kind.
    ///
    /// ## Returns
    /// `true` if at least one listener consumed it. Consumption does not stop
    /// the fan-out.
    pub fn trigger_event(&mut self, event: &EventPtr, ctx: &mut C) -> bool {
        let mut consumed = false;
        for listener in self.snapshot(event.kind()) {
            consumed |= self.deliver(&listener, event, ctx);
        }
        consumed
    }

    /// Removes pending events of `kind` from the active queue.
    ///
    /// ## Arguments
    /// * `kind` - The kind to remove.
    /// * `all_of_kind` - Remove every matching event instead of only the first.
    ///
    /// ## Returns
    /// `true` if something was removed.
    pub fn abort_event(&mut self, kind: EventKind, all_of_kind: bool) -> bool {
        let queue = &mut self.queues[self.active];
        if all_of_kind {
            let before = queue.len();
            queue.retain(|event| event.kind() != kind);
            before != queue.len()
        } else {
            match queue.iter().position(|event| event.kind() == kind) {
                Some(index) => {
                    queue.remove(index);
                    true
                }
                None => false,
            }
        }
    }

    /// Flips the buffers and drains the events queued since the last update.
    ///
    /// Events are delivered in FIFO order. For each event, listeners run in
    /// registration order and the first one returning `true` stops delivery
    /// of that event.
    ///
    /// ## Returns
    /// The number of events drained.
    pub fn update(&mut self, dt: f32, ctx: &mut C) -> usize {
        self.clock += f64::from(dt);

        let draining = self.active;
        self.active = (self.active + 1) % 2;
        self.queues[self.active].clear();

        let mut pending = std::mem::take(&mut self.queues[draining]);
        let drained = pending.len();
        while let Some(event) = pending.pop_front() {
            for listener in self.snapshot(event.kind()) {
                if self.deliver(&listener, &event, ctx) {
                    break;
                }
            }
        }
        drained
    }

    /// Discards every pending event in both buffers.
    pub fn empty_event_queues(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
    }

    /// Number of events waiting for the next update.
    pub fn pending_count(&self) -> usize {
        self.queues[self.active].len()
    }

    /// Live listeners of `kind`, copied so handlers may (un)register freely.
    fn snapshot(&mut self, kind: EventKind) -> Vec<ListenerHandle<C>> {
        let Some(registrations) = self.listeners.get_mut(&kind) else {
            return Vec::new();
        };
        let before = registrations.len();
        registrations.retain(|r| r.listener.strong_count() > 0);
        if registrations.len() != before {
            log::warn!(
                "{} listener(s) of {kind} were dropped without unregistering.",
                before - registrations.len()
            );
        }
        registrations
            .iter()
            .filter_map(|r| r.listener.upgrade())
            .collect()
    }

    fn deliver(&mut self, listener: &ListenerHandle<C>, event: &EventPtr, ctx: &mut C) -> bool {
        match listener.try_borrow_mut() {
            Ok(mut guard) => guard.handle_event(event, self, ctx),
            Err(_) => {
                log::warn!(
                    "Skipping re-entrant delivery of {} to a listener that is already running.",
                    event.kind()
                );
                false
            }
        }
    }
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BodyHandle;

    /// Records every delivery into the shared context.
    struct Recorder {
        tag: &'static str,
        consume: bool,
        requeue: Option<EventData>,
    }

    impl Recorder {
        fn handle(tag: &'static str, consume: bool) -> ListenerHandle<Vec<&'static str>> {
            Rc::new(RefCell::new(Recorder {
                tag,
                consume,
                requeue: None,
            }))
        }
    }

    impl EventListener<Vec<&'static str>> for Recorder {
        fn handle_event(
            &mut self,
            _event: &EventPtr,
            bus: &mut EventBus<Vec<&'static str>>,
            ctx: &mut Vec<&'static str>,
        ) -> bool {
            ctx.push(self.tag);
            if let Some(data) = self.requeue.take() {
                let follow_up = bus.stamp(data);
                bus.queue_event(follow_up).unwrap();
            }
            self.consume
        }
    }

    fn out_of_limits() -> EventData {
        EventData::OutOfLimits {
            agent: None,
            body: BodyHandle(1),
        }
    }

    #[test]
    fn test_add_listener_twice_fails_and_remove_clears_single_registration() {
        let mut bus = EventBus::new();
        let listener = Recorder::handle("a", false);

        assert_eq!(bus.add_listener(&listener, EventKind::MoveBlob), Ok(()));
        assert_eq!(
            bus.add_listener(&listener, EventKind::MoveBlob),
            Err(BusError::DuplicateRegistration(EventKind::MoveBlob))
        );
        assert_eq!(bus.listener_count(EventKind::MoveBlob), 1);

        assert_eq!(bus.remove_listener(&listener, EventKind::MoveBlob), Ok(()));
        assert!(!bus.has_listeners(EventKind::MoveBlob));
        assert_eq!(
            bus.remove_listener(&listener, EventKind::MoveBlob),
            Err(BusError::NotRegistered(EventKind::MoveBlob))
        );
    }

    #[test]
    fn test_remove_listener_from_all_unregisters_every_kind() {
        let mut bus: EventBus<Vec<&'static str>> = EventBus::new();
        let listener = Recorder::handle("a", false);
        let other = Recorder::handle("b", false);
        bus.add_listener(&listener, EventKind::MoveBlob).unwrap();
        bus.add_listener(&listener, EventKind::ShootBlob).unwrap();
        bus.add_listener(&other, EventKind::ShootBlob).unwrap();

        assert_eq!(bus.remove_listener_from_all(&listener), 2);
        assert!(!bus.has_listeners(EventKind::MoveBlob));
        assert_eq!(bus.listener_count(EventKind::ShootBlob), 1);
    }

    #[test]
    fn test_queue_without_listener_is_dropped() {
        let mut bus: EventBus<Vec<&'static str>> = EventBus::new();
        let event = bus.stamp(EventData::ChangeBlobControl);
        assert_eq!(
            bus.queue_event(event),
            Err(BusError::NoListeners(EventKind::ChangeBlobControl))
        );
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_events_queued_during_update_wait_for_next_update() {
        let mut bus = EventBus::new();
        let first = Rc::new(RefCell::new(Recorder {
            tag: "move",
            consume: true,
            requeue: Some(EventData::ChangeBlobControl),
        }));
        let first_handle: ListenerHandle<Vec<&'static str>> = first.clone();
        let second = Recorder::handle("change", true);
        bus.add_listener(&first_handle, EventKind::MoveBlob).unwrap();
        bus.add_listener(&second, EventKind::ChangeBlobControl).unwrap();

        let mut log = Vec::new();
        let event = bus.stamp(EventData::MoveBlob {
            direction: crate::math::Vec2::X,
        });
        bus.queue_event(event).unwrap();

        assert_eq!(bus.update(0.016, &mut log), 1);
        assert_eq!(log, vec!["move"]);
        assert_eq!(bus.pending_count(), 1);

        assert_eq!(bus.update(0.016, &mut log), 1);
        assert_eq!(log, vec!["move", "change"]);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_trigger_reaches_all_but_queued_drain_stops_at_first_consumer() {
        let mut bus = EventBus::new();
        let l1 = Recorder::handle("l1", true);
        let l2 = Recorder::handle("l2", true);
        bus.add_listener(&l1, EventKind::OutOfLimits).unwrap();
        bus.add_listener(&l2, EventKind::OutOfLimits).unwrap();

        let mut log = Vec::new();
        let event = bus.stamp(out_of_limits());
        assert!(bus.trigger_event(&event, &mut log));
        assert_eq!(log, vec!["l1", "l2"]);

        log.clear();
        bus.queue_event(event).unwrap();
        bus.update(0.0, &mut log);
        assert_eq!(log, vec!["l1"]);
    }

    #[test]
    fn test_unconsumed_queued_event_reaches_every_listener() {
        let mut bus = EventBus::new();
        let l1 = Recorder::handle("l1", false);
        let l2 = Recorder::handle("l2", false);
        bus.add_listener(&l1, EventKind::OutOfLimits).unwrap();
        bus.add_listener(&l2, EventKind::OutOfLimits).unwrap();

        let mut log = Vec::new();
        let event = bus.stamp(out_of_limits());
        assert!(!bus.trigger_event(&event, &mut log));
        bus.queue_event(event).unwrap();
        bus.update(0.0, &mut log);
        assert_eq!(log, vec!["l1", "l2", "l1", "l2"]);
    }

    #[test]
    fn test_abort_event_first_or_all() {
        let mut bus = EventBus::new();
        let listener = Recorder::handle("a", false);
        bus.add_listener(&listener, EventKind::SacrificeBlob).unwrap();
        bus.add_listener(&listener, EventKind::ChangeBlobControl)
            .unwrap();

        for _ in 0..3 {
            let event = bus.stamp(EventData::SacrificeBlob);
            bus.queue_event(event).unwrap();
        }
        let event = bus.stamp(EventData::ChangeBlobControl);
        bus.queue_event(event).unwrap();

        assert!(bus.abort_event(EventKind::SacrificeBlob, false));
        assert_eq!(bus.pending_count(), 3);
        assert!(bus.abort_event(EventKind::SacrificeBlob, true));
        assert_eq!(bus.pending_count(), 1);
        assert!(!bus.abort_event(EventKind::SacrificeBlob, true));

        let mut log = Vec::new();
        bus.update(0.0, &mut log);
        assert_eq!(log, vec!["a"]);
    }

    #[test]
    fn test_empty_event_queues_discards_pending() {
        let mut bus = EventBus::new();
        let listener = Recorder::handle("a", false);
        bus.add_listener(&listener, EventKind::SacrificeBlob).unwrap();
        let event = bus.stamp(EventData::SacrificeBlob);
        bus.queue_event(event).unwrap();

        bus.empty_event_queues();
        let mut log = Vec::new();
        assert_eq!(bus.update(0.0, &mut log), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn test_clock_advances_with_update_and_stamps_events() {
        let mut bus: EventBus<Vec<&'static str>> = EventBus::new();
        let mut log = Vec::new();
        bus.update(0.5, &mut log);
        bus.update(0.25, &mut log);
        let event = bus.stamp(EventData::SacrificeBlob);
        assert!((event.timestamp() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_dropped_listener_is_pruned_on_dispatch() {
        let mut bus = EventBus::new();
        let listener = Recorder::handle("gone", true);
        bus.add_listener(&listener, EventKind::OutOfLimits).unwrap();
        drop(listener);

        let mut log = Vec::new();
        let event = bus.stamp(out_of_limits());
        assert!(!bus.trigger_event(&event, &mut log));
        assert!(log.is_empty());
        assert_eq!(bus.listener_count(EventKind::OutOfLimits), 0);
    }

    /// Triggers the same kind from inside its own handler.
    struct Echo {
        depth: u32,
    }

    impl EventListener<Vec<&'static str>> for Echo {
        fn handle_event(
            &mut self,
            event: &EventPtr,
            bus: &mut EventBus<Vec<&'static str>>,
            ctx: &mut Vec<&'static str>,
        ) -> bool {
            self.depth += 1;
            ctx.push("echo");
            bus.trigger_event(event, ctx)
        }
    }

    #[test]
    fn test_reentrant_delivery_is_skipped() {
        let mut bus = EventBus::new();
        let echo = Rc::new(RefCell::new(Echo { depth: 0 }));
        let handle: ListenerHandle<Vec<&'static str>> = echo.clone();
        bus.add_listener(&handle, EventKind::OutOfLimits).unwrap();

        let mut log = Vec::new();
        let event = bus.stamp(out_of_limits());
        assert!(!bus.trigger_event(&event, &mut log));
        assert_eq!(echo.borrow().depth, 1);
        assert_eq!(log, vec!["echo"]);
    }
}

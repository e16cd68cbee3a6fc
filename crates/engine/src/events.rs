//! Host event types and per-listener channels.
//!
//! Each listener gets its own channel. Hosts push events through an
//! [`EventHub`]; listeners drain their [`Subscription`] with non-blocking
//! polls once per loop turn. Dropping a subscription releases it: the hub
//! notices the dead receiver and prunes the sender.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use gridext_core::{Mutation, Selection, SheetRef};

/// What a listener wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Selection moved (keyboard navigation, clicks).
    Selection,
    /// A mutation was executed on the host bus.
    Mutation,
    /// The viewport scrolled.
    Scroll,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Selection => "selection",
            Topic::Mutation => "mutation",
            Topic::Scroll => "scroll",
        }
    }
}

/// Events delivered to subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    SelectionChanged(SelectionChangedEvent),
    MutationExecuted(MutationExecutedEvent),
    Scrolled(ScrollMetrics),
}

impl HostEvent {
    pub fn topic(&self) -> Topic {
        match self {
            HostEvent::SelectionChanged(_) => Topic::Selection,
            HostEvent::MutationExecuted(_) => Topic::Mutation,
            HostEvent::Scrolled(_) => Topic::Scroll,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChangedEvent {
    pub sheet: SheetRef,
    pub selection: Selection,
}

/// Emitted after the host applied a mutation (undo/redo included).
#[derive(Debug, Clone, PartialEq)]
pub struct MutationExecutedEvent {
    pub mutation: Mutation,
}

/// Scroll position and geometry of the viewport, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_left: f64,
    pub viewport_height: f64,
    pub viewport_width: f64,
    pub content_height: f64,
    pub content_width: f64,
}

impl ScrollMetrics {
    /// Pixels left below the visible area.
    pub fn distance_to_bottom(&self) -> f64 {
        (self.content_height - (self.scroll_top + self.viewport_height)).max(0.0)
    }

    /// Pixels left to the right of the visible area.
    pub fn distance_to_right(&self) -> f64 {
        (self.content_width - (self.scroll_left + self.viewport_width)).max(0.0)
    }
}

/// Receiving end of one listener registration.
pub struct Subscription {
    topic: Topic,
    rx: Receiver<HostEvent>,
    _alive: Rc<()>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Drain pending events. Non-blocking; returns an empty vec when idle.
    pub fn poll(&self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("topic", &self.topic).finish()
    }
}

#[derive(Debug)]
struct Listener {
    topic: Topic,
    tx: Sender<HostEvent>,
    alive: Weak<()>,
}

/// Fan-out point for host events. Cloning shares the listener list.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `topic`.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let alive = Rc::new(());
        self.listeners.borrow_mut().push(Listener {
            topic,
            tx,
            alive: Rc::downgrade(&alive),
        });
        Subscription { topic, rx, _alive: alive }
    }

    /// Deliver an event to every live listener of its topic.
    pub fn broadcast(&self, event: HostEvent) {
        let topic = event.topic();
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|l| l.alive.strong_count() > 0);
        for listener in listeners.iter().filter(|l| l.topic == topic) {
            let _ = listener.tx.send(event.clone());
        }
    }

    /// Live listeners, all topics.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.alive.strong_count() > 0)
            .count()
    }

    pub fn has_listeners(&self, topic: Topic) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|l| l.topic == topic && l.alive.strong_count() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridext_core::GridBounds;

    fn scrolled(top: f64) -> HostEvent {
        HostEvent::Scrolled(ScrollMetrics { scroll_top: top, ..Default::default() })
    }

    #[test]
    fn test_events_routed_by_topic() {
        let hub = EventHub::new();
        let scroll = hub.subscribe(Topic::Scroll);
        let selection = hub.subscribe(Topic::Selection);

        hub.broadcast(scrolled(10.0));
        hub.broadcast(scrolled(20.0));

        assert_eq!(scroll.poll(), vec![scrolled(10.0), scrolled(20.0)]);
        assert!(scroll.poll().is_empty());
        assert!(selection.poll().is_empty());
    }

    #[test]
    fn test_dropping_subscription_releases_listener() {
        let hub = EventHub::new();
        let a = hub.subscribe(Topic::Mutation);
        let b = hub.subscribe(Topic::Mutation);
        assert_eq!(hub.listener_count(), 2);

        drop(a);
        assert_eq!(hub.listener_count(), 1);
        assert!(hub.has_listeners(Topic::Mutation));

        drop(b);
        assert_eq!(hub.listener_count(), 0);
        hub.broadcast(HostEvent::MutationExecuted(MutationExecutedEvent {
            mutation: Mutation::SetRowCount {
                sheet: SheetRef::new("u", "s"),
                row_count: GridBounds::new(10, 1).row_count,
            },
        }));
        assert!(hub.listeners.borrow().is_empty());
    }

    #[test]
    fn test_scroll_distances() {
        let m = ScrollMetrics {
            scroll_top: 900.0,
            scroll_left: 0.0,
            viewport_height: 100.0,
            viewport_width: 400.0,
            content_height: 1000.0,
            content_width: 2000.0,
        };
        assert_eq!(m.distance_to_bottom(), 0.0);
        assert_eq!(m.distance_to_right(), 1600.0);
    }
}

//! The internal event bus: a single-threaded queue with per-type
//! subscriber lists, drained fully on each pass.

use bitflags::bitflags;
use hashbrown::HashMap;

use crate::containers::Fifo;

/// Small `Copy` identifiers standing in for the source's opaque
/// "subject pointer" (§3, "Subject (ADDED)"): the core owns all of its
/// characters/animations/power-up statuses in dense collections and can
/// hand out ids instead of references.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    None,
    Character(u32),
    PowerupStatus(u32),
    Animation(String),
}

/// Distinguishes the engine's two cooperative timers when a `TimerTick`
/// event's `data` field carries one (§5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSource {
    Principal,
    Animation,
}

impl TimerSource {
    pub fn as_data(&self) -> i64 {
        match self {
            TimerSource::Principal => 0,
            TimerSource::Animation => 1,
        }
    }

    pub fn from_data(data: i64) -> TimerSource {
        if data == 1 {
            TimerSource::Animation
        } else {
            TimerSource::Principal
        }
    }
}

/// User-visible key bindings (§6), encoded into a `KeyDown` event's
/// `data` field the same way `TimerSource` is encoded into `TimerTick`'s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Up,
    Down,
    Left,
    Right,
    Space,
    Escape,
    Enter,
    Mute,
    /// A per-power-up activation trigger, `'A'..='Z'`.
    Trigger(char),
}

impl KeyCode {
    pub fn as_data(&self) -> i64 {
        match self {
            KeyCode::Up => 0,
            KeyCode::Down => 1,
            KeyCode::Left => 2,
            KeyCode::Right => 3,
            KeyCode::Space => 4,
            KeyCode::Escape => 5,
            KeyCode::Enter => 6,
            KeyCode::Mute => 7,
            KeyCode::Trigger(c) => 1000 + *c as i64,
        }
    }

    pub fn from_data(data: i64) -> Option<KeyCode> {
        match data {
            0 => Some(KeyCode::Up),
            1 => Some(KeyCode::Down),
            2 => Some(KeyCode::Left),
            3 => Some(KeyCode::Right),
            4 => Some(KeyCode::Space),
            5 => Some(KeyCode::Escape),
            6 => Some(KeyCode::Enter),
            7 => Some(KeyCode::Mute),
            n if (1000..=1000 + 'Z' as i64).contains(&n) => {
                char::from_u32((n - 1000) as u32).filter(|c| c.is_ascii_uppercase()).map(KeyCode::Trigger)
            }
            _ => None,
        }
    }
}

/// The fixed event-type enumeration (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Unknown,
    TimerTick,
    KeyDown,
    Exit,
    PowerupUse,
    MapNext,
    LevelNext,
    AnimationBegan,
    AnimationEnded,
    GameStatusChanged,
    GameReload,
    GameLost,
    GameWon,
    ScreenRedraw,
}

bitflags! {
    /// Bit-flag layout of [`EventKind`] so a caller may subscribe to, or
    /// observe, a mask of several types at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventMask: u32 {
        const UNKNOWN             = 1 << 0;
        const TIMER_TICK          = 1 << 1;
        const KEY_DOWN            = 1 << 2;
        const EXIT                = 1 << 3;
        const POWERUP_USE         = 1 << 4;
        const MAP_NEXT            = 1 << 5;
        const LEVEL_NEXT          = 1 << 6;
        const ANIMATION_BEGAN     = 1 << 7;
        const ANIMATION_ENDED     = 1 << 8;
        const GAME_STATUS_CHANGED = 1 << 9;
        const GAME_RELOAD         = 1 << 10;
        const GAME_LOST           = 1 << 11;
        const GAME_WON            = 1 << 12;
        const SCREEN_REDRAW       = 1 << 13;
    }
}

impl EventKind {
    pub fn mask(&self) -> EventMask {
        match self {
            EventKind::Unknown => EventMask::UNKNOWN,
            EventKind::TimerTick => EventMask::TIMER_TICK,
            EventKind::KeyDown => EventMask::KEY_DOWN,
            EventKind::Exit => EventMask::EXIT,
            EventKind::PowerupUse => EventMask::POWERUP_USE,
            EventKind::MapNext => EventMask::MAP_NEXT,
            EventKind::LevelNext => EventMask::LEVEL_NEXT,
            EventKind::AnimationBegan => EventMask::ANIMATION_BEGAN,
            EventKind::AnimationEnded => EventMask::ANIMATION_ENDED,
            EventKind::GameStatusChanged => EventMask::GAME_STATUS_CHANGED,
            EventKind::GameReload => EventMask::GAME_RELOAD,
            EventKind::GameLost => EventMask::GAME_LOST,
            EventKind::GameWon => EventMask::GAME_WON,
            EventKind::ScreenRedraw => EventMask::SCREEN_REDRAW,
        }
    }
}

/// A queued occurrence: a typed tag, a subject, and an opaque integer
/// payload (a `TimerSource` for `TimerTick`, a key code for `KeyDown`,
/// unused otherwise).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub subject: Subject,
    pub data: i64,
}

impl Event {
    pub fn new(kind: EventKind, subject: Subject, data: i64) -> Self {
        Self { kind, subject, data }
    }
}

/// The narrow capability a handler gets during `drain`: it can publish
/// further events onto the same pass's queue, but cannot subscribe or
/// otherwise reach into the bus.
pub struct EventSink<'a> {
    queue: &'a mut Fifo<Event>,
}

impl EventSink<'_> {
    pub fn publish(&mut self, kind: EventKind, subject: Subject, data: i64) {
        self.queue.push(Event::new(kind, subject, data));
    }
}

type Handler = Box<dyn FnMut(&Event, &mut EventSink)>;

/// The typed event queue plus its per-type subscriber table. Handlers
/// are infallible by contract (§4.8): a panicking handler is a defect in
/// the handler, not something the bus recovers from.
#[derive(Default)]
pub struct EventBus {
    queue: Fifo<Event>,
    subscribers: HashMap<EventKind, Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            queue: Fifo::new(),
            subscribers: HashMap::new(),
        }
    }

    /// Register a handler for `kind`, appended after any existing
    /// subscribers (subscription order governs invocation order).
    pub fn subscribe(&mut self, kind: EventKind, handler: impl FnMut(&Event, &mut EventSink) + 'static) {
        self.subscribers.entry(kind).or_default().push(Box::new(handler));
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.get(&kind).map(|v| v.len()).unwrap_or(0)
    }

    /// Enqueue an event for the next `drain`.
    pub fn publish(&mut self, kind: EventKind, subject: Subject, data: i64) {
        self.queue.push(Event::new(kind, subject, data));
    }

    /// Drain the queue to completion, invoking every subscriber of each
    /// event's kind in subscription order. A handler's own `publish`
    /// calls land on the same queue this loop keeps popping from, so
    /// they're visible to later handlers in the same pass. Returns the
    /// union of kinds seen that intersect `observe_mask`, plus the last
    /// such event (a caller-facing snapshot).
    pub fn drain(&mut self, observe_mask: EventMask) -> (EventMask, Option<Event>) {
        let mut observed = EventMask::empty();
        let mut snapshot = None;
        while let Some(event) = self.queue.pop() {
            if let Some(handlers) = self.subscribers.get_mut(&event.kind) {
                let mut sink = EventSink { queue: &mut self.queue };
                for handler in handlers.iter_mut() {
                    handler(&event, &mut sink);
                }
            }
            if observe_mask.contains(event.kind.mask()) {
                observed |= event.kind.mask();
                snapshot = Some(event.clone());
            }
        }
        (observed, snapshot)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drain the queue to completion like [`EventBus::drain`], running
    /// every subscriber as usual, but return every event popped instead
    /// of just a masked snapshot. Used by a caller (the game/level state
    /// machine) that wants to react to its own queue imperatively rather
    /// than through a self-referential subscriber closure (§9).
    pub fn drain_all(&mut self) -> Vec<Event> {
        let mut drained = Vec::new();
        while let Some(event) = self.queue.pop() {
            if let Some(handlers) = self.subscribers.get_mut(&event.kind) {
                let mut sink = EventSink { queue: &mut self.queue };
                for handler in handlers.iter_mut() {
                    handler(&event, &mut sink);
                }
            }
            drained.push(event);
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn each_handler_invoked_once_in_subscription_order() {
        let mut bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            bus.subscribe(EventKind::LevelNext, move |_ev, _sink| order.borrow_mut().push(i));
        }

        bus.publish(EventKind::LevelNext, Subject::None, 0);
        bus.drain(EventMask::empty());

        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn a_handlers_publish_is_visible_later_in_the_same_drain_pass() {
        // A GameLost handler republishes GameStatusChanged via its sink; a
        // single drain() call must still observe it without a second call.
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::GameLost, |_ev, sink| {
            sink.publish(EventKind::GameStatusChanged, Subject::None, 0);
        });
        bus.publish(EventKind::GameLost, Subject::None, 0);
        let (observed, _) = bus.drain(EventMask::GAME_STATUS_CHANGED);
        assert!(observed.contains(EventMask::GAME_STATUS_CHANGED));
    }

    #[test]
    fn unsubscribed_kind_is_a_silent_no_op() {
        let mut bus = EventBus::new();
        bus.publish(EventKind::Exit, Subject::None, 0);
        let (observed, snapshot) = bus.drain(EventMask::EXIT);
        assert_eq!(observed, EventMask::EXIT);
        assert_eq!(snapshot.unwrap().kind, EventKind::Exit);
    }

    #[test]
    fn observe_mask_only_reports_intersecting_kinds() {
        let mut bus = EventBus::new();
        bus.publish(EventKind::KeyDown, Subject::None, 5);
        let (observed, _) = bus.drain(EventMask::GAME_WON);
        assert!(observed.is_empty());
    }

    #[test]
    fn timer_source_round_trips_through_event_data() {
        assert_eq!(TimerSource::from_data(TimerSource::Principal.as_data()), TimerSource::Principal);
        assert_eq!(TimerSource::from_data(TimerSource::Animation.as_data()), TimerSource::Animation);
    }

    #[test]
    fn key_code_round_trips_through_event_data() {
        for key in [
            KeyCode::Up,
            KeyCode::Down,
            KeyCode::Left,
            KeyCode::Right,
            KeyCode::Space,
            KeyCode::Escape,
            KeyCode::Enter,
            KeyCode::Mute,
            KeyCode::Trigger('A'),
            KeyCode::Trigger('Z'),
        ] {
            assert_eq!(KeyCode::from_data(key.as_data()), Some(key));
        }
    }

    #[test]
    fn drain_all_returns_every_event_including_ones_published_by_handlers() {
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::GameLost, |_ev, sink| {
            sink.publish(EventKind::GameStatusChanged, Subject::None, 0);
        });
        bus.publish(EventKind::GameLost, Subject::None, 0);
        let drained = bus.drain_all();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind, EventKind::GameLost);
        assert_eq!(drained[1].kind, EventKind::GameStatusChanged);
        assert!(bus.is_empty());
    }
}

//! Frame-driven animation clips and the scheduler that steps them on the
//! animation tick (§4.7).
//!
//! An `Animation` owns its own frame/loop bookkeeping; the `AnimationScheduler`
//! owns the set of animations currently enlisted to receive ticks, plus the
//! chain mechanism that plays several clips back-to-back as one logical unit
//! (a level-transition fade-out, title card, fade-in).

use hashbrown::HashMap;

use crate::consts::ALPHA_FADE_STEP;
use crate::containers::list::Handle;
use crate::containers::{DList, Fifo};
use crate::event::{Event, EventBus, EventKind, Subject};

/// How many times a clip repeats before it naturally stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loops {
    Count(u32),
    Forever,
}

/// The shape of a clip's per-step behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Cycle through a fixed frame list, `frames_per_loop` ticks per frame.
    FrameCycle,
    /// Ramp `alpha` from 0.0 to 1.0 over the clip's total duration.
    FadeIn,
    /// Ramp `alpha` from 1.0 down to 0.0 over the clip's total duration.
    FadeOut,
    /// A no-op for the scheduler's own `step_once`; progress is driven
    /// externally by chain advancement instead of frame/alpha bookkeeping.
    Progress,
    /// A caller-supplied step function, invoked once per tick.
    Custom,
}

/// Chain bookkeeping installed on a chain's head clip: which member key is
/// currently active, and the FIFO of members still to come.
struct ChainState {
    active: String,
    remaining: Fifo<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    Stopped,
    Running,
    Paused,
}

/// A single named animation clip (§4.7).
pub struct Animation {
    key: String,
    frames: Vec<u32>,
    kind: StepKind,
    loops: Loops,
    current_frame: usize,
    frames_per_loop: u32,
    ticks_into_frame: u32,
    remaining_loops: u32,
    status: AnimationStatus,
    alpha: f32,
    custom_step: Option<Box<dyn FnMut(&mut Animation)>>,
    chain: Option<ChainState>,
}

impl Animation {
    fn base(key: impl Into<String>, kind: StepKind, loops: Loops) -> Self {
        let remaining_loops = match loops {
            Loops::Count(n) => n,
            Loops::Forever => u32::MAX,
        };
        Self {
            key: key.into(),
            frames: Vec::new(),
            kind,
            loops,
            current_frame: 0,
            frames_per_loop: 1,
            ticks_into_frame: 0,
            remaining_loops,
            status: AnimationStatus::Stopped,
            alpha: 1.0,
            custom_step: None,
            chain: None,
        }
    }

    /// A clip that cycles through `frames`, `frames_per_loop` ticks spent
    /// on each frame before advancing, looping `loops` times.
    pub fn frame_cycle(key: impl Into<String>, frames: Vec<u32>, frames_per_loop: u32, loops: Loops) -> Self {
        let mut anim = Self::base(key, StepKind::FrameCycle, loops);
        anim.frames = frames;
        anim.frames_per_loop = frames_per_loop.max(1);
        anim
    }

    /// A clip that ramps `alpha` over `total_ticks` ticks, then loops.
    pub fn fade_in(key: impl Into<String>, total_ticks: u32, loops: Loops) -> Self {
        let mut anim = Self::base(key, StepKind::FadeIn, loops);
        anim.frames_per_loop = total_ticks.max(1);
        anim.alpha = 0.0;
        anim
    }

    pub fn fade_out(key: impl Into<String>, total_ticks: u32, loops: Loops) -> Self {
        let mut anim = Self::base(key, StepKind::FadeOut, loops);
        anim.frames_per_loop = total_ticks.max(1);
        anim.alpha = 1.0;
        anim
    }

    /// A clip held open for `total_ticks` ticks (e.g. a title card) with
    /// no frame or alpha bookkeeping of its own; progress is purely a tick
    /// count, read by the scheduler to decide when the clip is done.
    pub fn progress(key: impl Into<String>, total_ticks: u32) -> Self {
        let mut anim = Self::base(key, StepKind::Progress, Loops::Count(1));
        anim.frames_per_loop = total_ticks.max(1);
        anim
    }

    pub fn custom(key: impl Into<String>, step: impl FnMut(&mut Animation) + 'static) -> Self {
        let mut anim = Self::base(key, StepKind::Custom, Loops::Count(1));
        anim.custom_step = Some(Box::new(step));
        anim
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn status(&self) -> AnimationStatus {
        self.status
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn current_frame(&self) -> Option<u32> {
        self.frames.get(self.current_frame).copied()
    }

    fn reset_counters(&mut self) {
        self.current_frame = 0;
        self.ticks_into_frame = 0;
        self.remaining_loops = match self.loops {
            Loops::Count(n) => n,
            Loops::Forever => u32::MAX,
        };
        self.alpha = match self.kind {
            StepKind::FadeIn => 0.0,
            StepKind::FadeOut => 1.0,
            _ => self.alpha,
        };
    }

    pub fn start(&mut self) {
        self.reset_counters();
        self.status = AnimationStatus::Running;
    }

    pub fn pause(&mut self) {
        if self.status == AnimationStatus::Running {
            self.status = AnimationStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.status == AnimationStatus::Paused {
            self.status = AnimationStatus::Running;
        }
    }

    pub fn stop(&mut self) {
        self.status = AnimationStatus::Stopped;
    }

    /// Advance one tick. Returns whether the clip just finished its last
    /// loop (so the scheduler knows to retire or chain-advance it).
    fn step_once(&mut self) -> bool {
        if self.status != AnimationStatus::Running {
            return false;
        }
        match self.kind {
            StepKind::Custom => {
                if let Some(mut step) = self.custom_step.take() {
                    step(self);
                    self.custom_step = Some(step);
                }
                // The callback decides completion by calling `stop()` on
                // itself; until then the clip keeps ticking indefinitely.
                self.status != AnimationStatus::Running
            }
            StepKind::Progress => {
                self.ticks_into_frame += 1;
                self.ticks_into_frame >= self.frames_per_loop
            }
            StepKind::FrameCycle => {
                self.ticks_into_frame += 1;
                if self.ticks_into_frame >= self.frames_per_loop {
                    self.ticks_into_frame = 0;
                    self.current_frame += 1;
                    if self.current_frame >= self.frames.len().max(1) {
                        self.current_frame = 0;
                        self.remaining_loops = self.remaining_loops.saturating_sub(1);
                        if self.remaining_loops == 0 {
                            return true;
                        }
                    }
                }
                false
            }
            StepKind::FadeIn | StepKind::FadeOut => {
                self.ticks_into_frame += 1;
                let t = (self.ticks_into_frame as f32 / self.frames_per_loop as f32).min(1.0);
                self.alpha = match self.kind {
                    StepKind::FadeIn => t,
                    StepKind::FadeOut => 1.0 - t,
                    _ => unreachable!(),
                };
                if self.ticks_into_frame >= self.frames_per_loop {
                    self.ticks_into_frame = 0;
                    self.remaining_loops = self.remaining_loops.saturating_sub(1);
                    if self.remaining_loops == 0 {
                        return true;
                    }
                    self.alpha = match self.kind {
                        StepKind::FadeIn => 0.0,
                        StepKind::FadeOut => 1.0,
                        _ => unreachable!(),
                    };
                }
                false
            }
        }
    }
}

/// Holds the scheduler's enlisted (ticking) keys in insertion order, with
/// `O(1)` removal by key: a `DList` so the head-to-tail order is cheap to
/// walk, paired with a lookup table from key to the list's own handle.
pub struct AnimationScheduler {
    animations: HashMap<String, Animation>,
    enlisted: DList<String>,
    enlisted_handles: HashMap<String, Handle>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            animations: HashMap::new(),
            enlisted: DList::new(),
            enlisted_handles: HashMap::new(),
        }
    }

    pub fn insert(&mut self, animation: Animation) {
        self.animations.insert(animation.key().to_string(), animation);
    }

    pub fn get(&self, key: &str) -> Option<&Animation> {
        self.animations.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Animation> {
        self.animations.get_mut(key)
    }

    pub fn is_enlisted(&self, key: &str) -> bool {
        self.enlisted_handles.contains_key(key)
    }

    /// Add `key` to the set of clips stepped by `tick`, if not already
    /// enlisted.
    pub fn enlist(&mut self, key: &str) {
        if self.enlisted_handles.contains_key(key) {
            return;
        }
        let handle = self.enlisted.push_back(key.to_string());
        self.enlisted_handles.insert(key.to_string(), handle);
    }

    /// Remove `key` from the ticking set (the clip itself, and any other
    /// chain members, stay registered and can be re-enlisted later).
    pub fn delist(&mut self, key: &str) {
        if let Some(handle) = self.enlisted_handles.remove(key) {
            self.enlisted.remove(handle);
        }
    }

    /// Chain `tail` to play immediately after `head` finishes. `head` keeps
    /// its own step kind (e.g. a fade-out still fades visually while it's
    /// the active chain member); the scheduler steps whichever member is
    /// currently active and advances the FIFO on that member's completion.
    /// Chaining a clip to itself is rejected as a no-op (a self-chain can
    /// never drain).
    pub fn chain(&mut self, head: &str, tail: &str) {
        if head == tail {
            return;
        }
        if !self.animations.contains_key(tail) {
            return;
        }
        let Some(head_anim) = self.animations.get_mut(head) else {
            return;
        };
        match &mut head_anim.chain {
            Some(state) => state.remaining.push(tail.to_string()),
            None => {
                head_anim.chain = Some(ChainState {
                    active: head.to_string(),
                    remaining: {
                        let mut fifo = Fifo::new();
                        fifo.push(tail.to_string());
                        fifo
                    },
                });
            }
        }
    }

    /// Start a chain (or a standalone clip) from its head key: resets the
    /// head's own counters, resets every not-yet-reached member's counters
    /// too, rewinds the chain's active pointer back to the head, enlists
    /// the head, and publishes `AnimationBegan`.
    pub fn start(&mut self, head_key: &str, bus: &mut EventBus) {
        let members = self.chain_members(head_key);
        for member in &members {
            if let Some(anim) = self.animations.get_mut(member) {
                anim.reset_counters();
                anim.status = AnimationStatus::Stopped;
            }
        }
        let Some(head) = self.animations.get_mut(head_key) else {
            return;
        };
        if let Some(state) = &mut head.chain {
            state.active = head_key.to_string();
        }
        head.start();
        self.enlist(head_key);
        bus.publish(EventKind::AnimationBegan, Subject::Animation(head_key.to_string()), 0);
    }

    fn chain_members(&self, head_key: &str) -> Vec<String> {
        let mut members = vec![head_key.to_string()];
        if let Some(head) = self.animations.get(head_key) {
            if let Some(state) = &head.chain {
                members.extend(state.remaining.clone_items());
            }
        }
        members
    }

    pub fn pause(&mut self, key: &str) {
        if let Some(anim) = self.animations.get_mut(key) {
            anim.pause();
        }
    }

    pub fn resume(&mut self, key: &str) {
        if let Some(anim) = self.animations.get_mut(key) {
            anim.resume();
        }
    }

    /// Stop a clip outright and delist it.
    pub fn stop(&mut self, key: &str) {
        if let Some(anim) = self.animations.get_mut(key) {
            anim.stop();
        }
        self.delist(key);
    }

    /// Stop and delist every enlisted clip (§4.9's "pause stops every
    /// running animation").
    pub fn end_all(&mut self) {
        let keys: Vec<String> = self.enlisted.iter().cloned().collect();
        for key in keys {
            self.stop(&key);
        }
    }

    /// Step every enlisted clip once. A chained head delegates its step to
    /// whichever member is currently active; on that member's completion
    /// the chain advances to the next queued member (publishing
    /// `AnimationBegan` for it) or, once the FIFO is empty, stops the head
    /// and publishes `AnimationEnded`. A non-chained clip that finishes its
    /// loops is stopped and delisted the same way.
    pub fn tick(&mut self, bus: &mut EventBus) {
        let keys: Vec<String> = self.enlisted.iter().cloned().collect();
        for key in keys {
            self.tick_one(&key, bus);
        }
    }

    fn tick_one(&mut self, key: &str, bus: &mut EventBus) {
        let is_chain_head = self.animations.get(key).map(|a| a.chain.is_some()).unwrap_or(false);
        if is_chain_head {
            self.tick_chain(key, bus);
        } else {
            let Some(anim) = self.animations.get_mut(key) else {
                return;
            };
            let finished = anim.step_once();
            if finished {
                anim.stop();
                self.delist(key);
                bus.publish(EventKind::AnimationEnded, Subject::Animation(key.to_string()), 0);
            }
        }
    }

    fn tick_chain(&mut self, head_key: &str, bus: &mut EventBus) {
        let active_key = match self.animations.get(head_key).and_then(|h| h.chain.as_ref()) {
            Some(state) => state.active.clone(),
            None => return,
        };

        let finished = match self.animations.get_mut(&active_key) {
            Some(anim) => anim.step_once(),
            None => return,
        };
        if !finished {
            return;
        }

        let next = self
            .animations
            .get_mut(head_key)
            .and_then(|h| h.chain.as_mut())
            .and_then(|state| state.remaining.pop());

        match next {
            Some(next_key) => {
                if let Some(anim) = self.animations.get_mut(&active_key) {
                    anim.stop();
                }
                if let Some(state) = self.animations.get_mut(head_key).and_then(|h| h.chain.as_mut()) {
                    state.active = next_key.clone();
                }
                if let Some(anim) = self.animations.get_mut(&next_key) {
                    anim.start();
                }
                bus.publish(EventKind::AnimationBegan, Subject::Animation(next_key), 0);
            }
            None => {
                if let Some(anim) = self.animations.get_mut(&active_key) {
                    anim.stop();
                }
                self.stop(head_key);
                bus.publish(EventKind::AnimationEnded, Subject::Animation(head_key.to_string()), 0);
            }
        }
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Fifo<String> {
    /// Snapshot the queue's contents without draining it, for chain-member
    /// enumeration. Cloning `String`s here is fine: chains are short and
    /// this only runs on `start`, not on every tick.
    fn clone_items(&self) -> Vec<String> {
        let mut items = Vec::new();
        let mut rest = self.clone();
        while let Some(item) = rest.pop() {
            items.push(item);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events_of_kind(events: &[Event], kind: EventKind) -> Vec<&Event> {
        events.iter().filter(|e| e.kind == kind).collect()
    }

    #[test]
    fn frame_cycle_wraps_after_its_last_frame() {
        let mut anim = Animation::frame_cycle("walk", vec![0, 1, 2], 1, Loops::Count(2));
        anim.start();
        for _ in 0..3 {
            anim.step_once();
        }
        assert_eq!(anim.current_frame(), Some(0));
        // second loop consumed, clip should report finished on the 3rd tick of loop 2
        let mut finished = false;
        for _ in 0..3 {
            finished = anim.step_once();
        }
        assert!(finished);
    }

    #[test]
    fn forever_loop_never_finishes() {
        let mut anim = Animation::frame_cycle("spin", vec![0, 1], 1, Loops::Forever);
        anim.start();
        for _ in 0..1000 {
            assert!(!anim.step_once());
        }
    }

    #[test]
    fn fade_in_interpolates_alpha_from_zero_to_one() {
        let mut anim = Animation::fade_in("fadein", 10, Loops::Count(1));
        anim.start();
        assert_eq!(anim.alpha(), 0.0);
        for _ in 0..10 {
            anim.step_once();
        }
        assert!((anim.alpha() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fade_out_interpolates_alpha_from_one_to_zero() {
        let mut anim = Animation::fade_out("fadeout", 4, Loops::Count(1));
        anim.start();
        for _ in 0..4 {
            anim.step_once();
        }
        assert!(anim.alpha() < 1e-6);
    }

    #[test]
    fn enlist_and_delist_control_whether_tick_steps_a_clip() {
        let mut sched = AnimationScheduler::new();
        sched.insert(Animation::frame_cycle("a", vec![0, 1], 1, Loops::Forever));
        sched.get_mut("a").unwrap().start();
        let mut bus = EventBus::new();

        sched.tick(&mut bus);
        assert_eq!(sched.get("a").unwrap().current_frame(), Some(0));

        sched.enlist("a");
        sched.tick(&mut bus);
        assert_eq!(sched.get("a").unwrap().current_frame(), Some(1));

        sched.delist("a");
        sched.tick(&mut bus);
        assert_eq!(sched.get("a").unwrap().current_frame(), Some(1));
    }

    #[test]
    fn chained_clips_play_in_order_and_emit_began_ended_events() {
        let mut sched = AnimationScheduler::new();
        sched.insert(Animation::progress("fade_out", 2));
        sched.insert(Animation::progress("title", 2));
        sched.insert(Animation::progress("fade_in", 2));
        sched.chain("fade_out", "title");
        sched.chain("fade_out", "fade_in");

        let mut bus = EventBus::new();
        sched.start("fade_out", &mut bus);
        let mut events = bus.drain_all();
        assert_eq!(events_of_kind(&events, EventKind::AnimationBegan).len(), 1);

        // step through fade_out (2 ticks) -> title begins
        sched.tick(&mut bus);
        sched.tick(&mut bus);
        events = bus.drain_all();
        assert_eq!(events_of_kind(&events, EventKind::AnimationBegan).len(), 1);

        // step through title (2 ticks) -> fade_in begins
        sched.tick(&mut bus);
        sched.tick(&mut bus);
        events = bus.drain_all();
        assert_eq!(events_of_kind(&events, EventKind::AnimationBegan).len(), 1);

        // step through fade_in (2 ticks) -> chain ends
        sched.tick(&mut bus);
        sched.tick(&mut bus);
        events = bus.drain_all();
        assert_eq!(events_of_kind(&events, EventKind::AnimationEnded).len(), 1);
        assert!(!sched.is_enlisted("fade_out"));
    }

    #[test]
    fn chained_fade_out_head_still_fades_visually() {
        // A real level transition chain: the head keeps fading alpha down
        // while it's the active member, instead of losing its fade-out
        // behaviour to the chain bookkeeping.
        let mut sched = AnimationScheduler::new();
        sched.insert(Animation::fade_out("fade_out", 4, Loops::Count(1)));
        sched.insert(Animation::progress("title", 2));
        sched.chain("fade_out", "title");

        let mut bus = EventBus::new();
        sched.start("fade_out", &mut bus);
        assert_eq!(sched.get("fade_out").unwrap().alpha(), 1.0);

        sched.tick(&mut bus);
        sched.tick(&mut bus);
        let mid_alpha = sched.get("fade_out").unwrap().alpha();
        assert!(mid_alpha < 1.0, "fade_out alpha did not drop while chained: {mid_alpha}");

        sched.tick(&mut bus);
        sched.tick(&mut bus);
        let final_alpha = sched.get("fade_out").unwrap().alpha();
        assert!(final_alpha < 1e-6, "fade_out alpha should reach ~0: {final_alpha}");
    }

    #[test]
    fn self_chain_is_rejected_as_a_no_op() {
        let mut sched = AnimationScheduler::new();
        sched.insert(Animation::progress("solo", 2));
        sched.chain("solo", "solo");
        assert!(sched.animations.get("solo").unwrap().chain.is_none());
    }

    #[test]
    fn alpha_fade_step_constant_is_available_for_manual_per_tick_fades() {
        assert!(ALPHA_FADE_STEP > 0.0 && ALPHA_FADE_STEP <= 1.0);
    }
}

//! The top-level game/level state machine: owns the level queue, the user
//! and enemy characters, the power-up tables, the event bus, and the two
//! cooperative tick timers, and drives them all from a single `tick` call
//! (§3, §4.9).
//!
//! This module is the one place that reacts to the event bus imperatively
//! via [`EventBus::drain_all`] rather than through subscriber closures —
//! see that method's own doc comment for why.

use std::collections::VecDeque;

use bitflags::bitflags;

use crate::animation::{Animation, AnimationScheduler, Loops};
use crate::character::{check_and_resolve_collision, Character, StepOutcome};
use crate::config::Dict;
use crate::consts::{ANIMATION_TICK_HZ, LEVEL_TITLE_CARD_FRAMES, POWERUP_PLACEMENT_TICK_SECONDS, PRINCIPAL_TICK_HZ};
use crate::event::{EventBus, EventKind, KeyCode, Subject};
use crate::geometry::Direction;
use crate::level::Level;
use crate::map::Map;
use crate::powerup::{self, PowerupStatus, PowerupTemplate};
use crate::rng::GameRng;
use crate::ai::{self, Chaser, PredictPosition, Target, Trap};

bitflags! {
    /// The coarse state machine driving what `tick` and `handle_key` do
    /// (§4.9): whether the game has ever started, is currently simulating,
    /// has ended, and (if ended) whether the user won.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GameState: u8 {
        const STARTED = 1 << 0;
        const RUNNING = 1 << 1;
        const OVER    = 1 << 2;
        const WON     = 1 << 3;
    }
}

/// Key chain identifiers registered with `transition_animations` on
/// construction. Not exposed; an external renderer reacts to
/// `AnimationBegan`/`AnimationEnded` events instead of these names.
const LEVEL_FADE_OUT: &str = "level_fade_out";
const LEVEL_TITLE: &str = "level_title";
const LEVEL_FADE_IN: &str = "level_fade_in";
const GAME_OVER_FADE: &str = "game_over_fade";
const GAME_WON_FADE: &str = "game_won_fade";

const TRANSITION_FADE_FRAMES: u32 = 30;
const END_FADE_FRAMES: u32 = 60;

/// The whole simulation: a queue of levels (the head is the one being
/// played), the persistent user character, the per-level enemy rosters
/// (held on each [`Level`]), the power-up tables, and the plumbing that
/// ties them together one tick at a time.
pub struct Game {
    levels: VecDeque<Level>,
    user: Character,
    powerup_templates: Vec<PowerupTemplate>,
    powerup_statuses: Vec<PowerupStatus>,
    bus: EventBus,
    transition_animations: AnimationScheduler,
    character_animations: AnimationScheduler,
    state: GameState,
    mute: bool,
    rng: GameRng,

    principal_accum: f32,
    character_tick_accum: f32,
    powerup_tick_accum: f32,
    elapsed_seconds: f32,

    reload_requested: bool,
}

impl Game {
    /// Build a game from an already-loaded level queue (each level's enemy
    /// roster populated by the caller), a set of user-character config
    /// overrides, and the power-up template table. Does not yet place the
    /// user or spawn enemies — call [`Game::start`] for that.
    pub fn new(levels: Vec<Level>, user_config: Dict, powerup_templates: Vec<PowerupTemplate>, seed: u64) -> Self {
        assert!(!levels.is_empty(), "a game needs at least one level");

        let first_map = levels[0].current_map();
        let mut user = Character::new(0, true, first_map, first_map.start_index());
        for (key, value) in user_config.iter() {
            user.config.set(key, value.clone());
            user.default_config.set(key, value.clone());
        }

        let mut transition_animations = AnimationScheduler::new();
        transition_animations.insert(Animation::fade_out(LEVEL_FADE_OUT, TRANSITION_FADE_FRAMES, Loops::Count(1)));
        transition_animations.insert(Animation::progress(LEVEL_TITLE, LEVEL_TITLE_CARD_FRAMES));
        transition_animations.insert(Animation::fade_in(LEVEL_FADE_IN, TRANSITION_FADE_FRAMES, Loops::Count(1)));
        transition_animations.chain(LEVEL_FADE_OUT, LEVEL_TITLE);
        transition_animations.chain(LEVEL_FADE_OUT, LEVEL_FADE_IN);
        transition_animations.insert(Animation::fade_out(GAME_OVER_FADE, END_FADE_FRAMES, Loops::Count(1)));
        transition_animations.insert(Animation::fade_out(GAME_WON_FADE, END_FADE_FRAMES, Loops::Count(1)));

        Self {
            levels: levels.into_iter().collect(),
            user,
            powerup_templates,
            powerup_statuses: Vec::new(),
            bus: EventBus::new(),
            transition_animations,
            character_animations: AnimationScheduler::new(),
            state: GameState::empty(),
            mute: false,
            rng: GameRng::new(seed),
            principal_accum: 0.0,
            character_tick_accum: 0.0,
            powerup_tick_accum: 0.0,
            elapsed_seconds: 0.0,
            reload_requested: false,
        }
    }

    /// Spawn the first level's enemies and enter the running state.
    pub fn start(&mut self) {
        let level = self.levels.front_mut().expect("a game needs at least one level");
        level.spawn_enemies_on_current_map();
        self.state = GameState::STARTED | GameState::RUNNING;
        self.bus.publish(EventKind::GameStatusChanged, Subject::None, 0);
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_muted(&self) -> bool {
        self.mute
    }

    /// Whether an Enter-key `GAME_RELOAD` arrived since the last check.
    /// Consuming this is the external driver's cue to dispose of this
    /// `Game` and build a fresh one from the original configuration,
    /// carrying [`Game::is_muted`] forward (§4.9).
    pub fn take_reload_request(&mut self) -> bool {
        std::mem::take(&mut self.reload_requested)
    }

    pub fn user(&self) -> &Character {
        &self.user
    }

    pub fn levels_remaining(&self) -> usize {
        self.levels.len()
    }

    pub fn current_map(&self) -> &Map {
        self.levels.front().expect("a game needs at least one level").current_map()
    }

    pub fn powerup_statuses(&self) -> &[PowerupStatus] {
        &self.powerup_statuses
    }

    /// Route one input event. Movement keys are buffered on the user
    /// character only while running; `Space` pauses/resumes; `Enter`
    /// requests a reload once the game is over; `Escape` raises `Exit`
    /// for the external driver to observe.
    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Space => {
                if !self.state.contains(GameState::OVER) {
                    self.state.toggle(GameState::RUNNING);
                    self.bus.publish(EventKind::GameStatusChanged, Subject::None, 0);
                }
            }
            KeyCode::Escape => self.bus.publish(EventKind::Exit, Subject::None, 0),
            KeyCode::Enter => {
                if self.state.contains(GameState::OVER) {
                    self.bus.publish(EventKind::GameReload, Subject::None, 0);
                }
            }
            KeyCode::Mute => self.mute = !self.mute,
            KeyCode::Up => self.queue_user_direction(Direction::North),
            KeyCode::Down => self.queue_user_direction(Direction::South),
            KeyCode::Left => self.queue_user_direction(Direction::West),
            KeyCode::Right => self.queue_user_direction(Direction::East),
            KeyCode::Trigger(c) => self.activate_triggered(c),
        }
        self.process_events();
    }

    fn queue_user_direction(&mut self, dir: Direction) {
        if self.state.contains(GameState::RUNNING) {
            self.user.queue_direction(dir);
        }
    }

    fn activate_triggered(&mut self, key: char) {
        let user_id = self.user.id;
        let templates = &self.powerup_templates;
        let status_idx = self
            .powerup_statuses
            .iter()
            .position(|s| s.owner_id == user_id && !s.active && templates[s.template_id].trigger_key == Some(key));
        if let Some(idx) = status_idx {
            self.activate_status(user_id, idx);
        }
    }

    /// Advance the simulation by `dt` seconds, draining the principal
    /// (60Hz), animation (5Hz) and power-up (1Hz) timers independently so
    /// a caller can drive this from any frame rate (§5).
    pub fn tick(&mut self, dt: f32) {
        self.principal_accum += dt;
        let principal_len = 1.0 / PRINCIPAL_TICK_HZ;
        while self.principal_accum >= principal_len {
            self.principal_accum -= principal_len;
            self.step_principal_tick();
        }

        self.character_tick_accum += dt;
        let character_len = 1.0 / ANIMATION_TICK_HZ;
        while self.character_tick_accum >= character_len {
            self.character_tick_accum -= character_len;
            self.step_character_tick();
        }

        self.powerup_tick_accum += dt;
        while self.powerup_tick_accum >= POWERUP_PLACEMENT_TICK_SECONDS {
            self.powerup_tick_accum -= POWERUP_PLACEMENT_TICK_SECONDS;
            self.step_powerup_tick();
        }
    }

    fn step_principal_tick(&mut self) {
        self.transition_animations.tick(&mut self.bus);
        if self.state.contains(GameState::RUNNING) {
            self.step_ai();
            self.step_motion();
            self.step_collisions();
        }
        self.process_events();
    }

    /// Directional sprite clips and the alpha fade-in only advance while
    /// running: pausing (or ending) the game stops them outright, and they
    /// resume implicitly once motion resumes next tick (§4.9's
    /// `GAME_STATUS_CHANGED` handler).
    fn step_character_tick(&mut self) {
        if self.state.contains(GameState::RUNNING) {
            if self.user.alpha < 1.0 {
                self.user.fade_in_tick();
            }
            sync_directional_clip(&mut self.character_animations, &mut self.bus, &self.user);

            if let Some(level) = self.levels.front_mut() {
                for enemy in level.enemies.iter_mut() {
                    if enemy.positioned && enemy.alpha < 1.0 {
                        enemy.fade_in_tick();
                    }
                }
                for enemy in level.enemies.iter().filter(|e| e.positioned) {
                    sync_directional_clip(&mut self.character_animations, &mut self.bus, enemy);
                }
            }
            self.character_animations.tick(&mut self.bus);
        }
        self.process_events();
    }

    fn step_powerup_tick(&mut self) {
        if !self.state.contains(GameState::RUNNING) {
            return;
        }
        self.elapsed_seconds += POWERUP_PLACEMENT_TICK_SECONDS;
        let now = self.elapsed_seconds;
        {
            let level = self.levels.front_mut().expect("a level is loaded while running");
            let map = level.current_map_mut();
            powerup::placement_tick(&mut self.rng, map, &mut self.powerup_templates, now);
            powerup::decay_tick(map, &self.powerup_templates, now);
        }
        self.duration_tick_all();
    }

    // -- AI decision + motion ------------------------------------------

    fn step_ai(&mut self) {
        let user_snapshot = self.user.clone();
        let level = self.levels.front_mut().expect("a level is loaded while running");
        let (map, enemies) = level.map_and_enemies_mut();

        for i in 0..enemies.len() {
            if !enemies[i].positioned {
                continue;
            }
            let target = ai::select_target(map, &enemies[i], Some(&user_snapshot));
            match target {
                Target::Chase => {
                    // Matches the Exit/Wander branches below: a freshly
                    // reconstructed path always has the chaser's own
                    // current cell on top (it pops first and queues no
                    // direction), so recomputing every tick would waste
                    // every tick on that leading no-op pop instead of
                    // ever reaching the real next hop.
                    if enemies[i].path.is_empty() {
                        let method = enemies[i].chasing_method_name().to_string();
                        let decoy = enemies
                            .iter()
                            .enumerate()
                            .find(|(j, c)| *j != i && c.positioned)
                            .map(|(_, c)| c.clone());
                        let committed = if method.eq_ignore_ascii_case("trap") {
                            Trap.try_chase(&mut self.rng, map, &mut enemies[i], &user_snapshot, decoy.as_ref())
                        } else {
                            PredictPosition.try_chase(&mut self.rng, map, &mut enemies[i], &user_snapshot, decoy.as_ref())
                        };
                        if !committed {
                            enemies[i].path = crate::containers::Stack::new();
                        }
                    }
                }
                Target::Exit => {
                    if enemies[i].path.is_empty() {
                        if let Some(src) = map.index_of(enemies[i].location) {
                            let end_idx = map.end_index();
                            if let Some(p) = enemies[i].path_finding_method().find(map, src, end_idx) {
                                enemies[i].path = p;
                            }
                        }
                    }
                }
                Target::Wander => {
                    if enemies[i].path.is_empty() {
                        ai::wander(&mut self.rng, map, &mut enemies[i]);
                    }
                }
            }
            if enemies[i].next_direction == Direction::None {
                ai::follow_path(&mut enemies[i], map);
            }
        }
    }

    fn step_motion(&mut self) {
        let tick_seconds = 1.0 / PRINCIPAL_TICK_HZ;
        let mut outcomes: Vec<(u32, StepOutcome)> = Vec::new();
        {
            let level = self.levels.front_mut().expect("a level is loaded while running");
            let (map, enemies) = level.map_and_enemies_mut();
            outcomes.push((self.user.id, self.user.advance(map, tick_seconds)));
            for enemy in enemies.iter_mut() {
                if !enemy.positioned {
                    continue;
                }
                outcomes.push((enemy.id, enemy.advance(map, tick_seconds)));
            }
        }
        for (id, outcome) in outcomes {
            self.handle_step_outcome(id, outcome);
        }
    }

    fn handle_step_outcome(&mut self, char_id: u32, outcome: StepOutcome) {
        let idx = match outcome {
            StepOutcome::EnteredCell(i) | StepOutcome::WrappedTo(i) | StepOutcome::BrokeWall(i) => i,
            _ => return,
        };
        self.handle_powerup_pickup(char_id, idx);

        let end_idx = self
            .levels
            .front()
            .expect("a level is loaded while running")
            .current_map()
            .end_index();
        if idx != end_idx {
            return;
        }

        if char_id == self.user.id {
            let has_next_map = self.levels.front().unwrap().has_next_map();
            if has_next_map {
                self.bus.publish(EventKind::MapNext, Subject::Character(char_id), 0);
            } else {
                self.bus.publish(EventKind::LevelNext, Subject::Character(char_id), 0);
            }
        } else {
            // any enemy reaching the exit first ends the game, regardless
            // of whether more maps remain in the level (§4.5).
            self.bus.publish(EventKind::LevelNext, Subject::Character(char_id), 0);
        }
    }

    fn step_collisions(&mut self) {
        {
            let level = self.levels.front_mut().expect("a level is loaded while running");
            let (map, enemies) = level.map_and_enemies_mut();
            for enemy in enemies.iter_mut() {
                if !enemy.positioned {
                    continue;
                }
                check_and_resolve_collision(&mut self.user, enemy, map, &mut self.rng);
            }
            for i in 0..enemies.len() {
                for j in (i + 1)..enemies.len() {
                    if !enemies[i].positioned || !enemies[j].positioned {
                        continue;
                    }
                    let (left, right) = enemies.split_at_mut(j);
                    check_and_resolve_collision(&mut left[i], &mut right[0], map, &mut self.rng);
                }
            }
        }
        if self.user.lives == 0 {
            self.bus.publish(EventKind::GameLost, Subject::None, 0);
        }
    }

    // -- power-ups --------------------------------------------------------

    fn handle_powerup_pickup(&mut self, char_id: u32, idx: usize) {
        let is_user = char_id == self.user.id;
        let trigger_key;
        let status_idx;
        {
            let level = self.levels.front_mut().expect("a level is loaded while running");
            let (map, enemies) = level.map_and_enemies_mut();
            let Some(slot) = map.cell_at_index(idx).powerup else {
                return;
            };
            let template = &self.powerup_templates[slot.template_id];
            trigger_key = template.trigger_key;

            let mut cell_powerup = Some(slot);
            let acquired = if is_user {
                powerup::try_acquire(&self.user, &mut cell_powerup, template, &mut self.powerup_statuses)
            } else {
                match enemies.iter().find(|c| c.id == char_id) {
                    Some(enemy) => powerup::try_acquire(enemy, &mut cell_powerup, template, &mut self.powerup_statuses),
                    None => return,
                }
            };
            map.cell_at_index_mut(idx).powerup = cell_powerup;
            match acquired {
                Some(i) => status_idx = i,
                None => return,
            }
        }

        let activate_now = trigger_key.is_none() || !is_user;
        if activate_now {
            self.activate_status(char_id, status_idx);
        }
    }

    /// Activate a held-but-inactive status: apply the picker's own effect,
    /// then the "others" effect to every other character in range,
    /// splitting the borrow between the user and the current level's
    /// enemy roster since the two live in separate collections.
    fn activate_status(&mut self, owner_id: u32, status_idx: usize) {
        let template_id = self.powerup_statuses[status_idx].template_id;
        let is_user_owner = owner_id == self.user.id;

        let level = self.levels.front_mut().expect("a level is loaded while running");
        let (map, enemies) = level.map_and_enemies_mut();

        if is_user_owner {
            {
                let template = &self.powerup_templates[template_id];
                let status = &mut self.powerup_statuses[status_idx];
                powerup::activate(&mut self.user, template, status, map, &mut self.rng);
            }
            let owner_snapshot = self.user.clone();
            let mut others: Vec<&mut Character> = enemies.iter_mut().collect();
            let template = &mut self.powerup_templates[template_id];
            let status = &mut self.powerup_statuses[status_idx];
            powerup::apply_to_others(&owner_snapshot, template, status, map, &mut others, &mut self.rng);
        } else {
            let Some(pos) = enemies.iter().position(|c| c.id == owner_id) else {
                return;
            };
            let (before, after) = enemies.split_at_mut(pos);
            let (owner_slice, after) = after.split_at_mut(1);
            let owner = &mut owner_slice[0];
            {
                let template = &self.powerup_templates[template_id];
                let status = &mut self.powerup_statuses[status_idx];
                powerup::activate(owner, template, status, map, &mut self.rng);
            }
            let owner_snapshot = owner.clone();
            let mut others: Vec<&mut Character> = before.iter_mut().chain(after.iter_mut()).collect();
            others.push(&mut self.user);
            let template = &mut self.powerup_templates[template_id];
            let status = &mut self.powerup_statuses[status_idx];
            powerup::apply_to_others(&owner_snapshot, template, status, map, &mut others, &mut self.rng);
        }
    }

    /// Per-second duration tick for every active status, splitting the
    /// owner pool the same way [`Game::activate_status`] does rather than
    /// calling [`powerup::duration_tick`] (which needs one contiguous
    /// owners slice, and the user and the enemy roster are never one).
    fn duration_tick_all(&mut self) {
        let level = self.levels.front_mut().expect("a level is loaded while running");
        let (_map, enemies) = level.map_and_enemies_mut();

        let mut finished = Vec::new();
        for i in 0..self.powerup_statuses.len() {
            if !self.powerup_statuses[i].active {
                continue;
            }
            let template_id = self.powerup_statuses[i].template_id;
            let duration = self.powerup_templates[template_id].duration_seconds;
            if duration == 0 {
                continue;
            }
            self.powerup_statuses[i].elapsed_seconds = (self.powerup_statuses[i].elapsed_seconds + 1) % duration;
            if self.powerup_statuses[i].elapsed_seconds != 0 {
                continue;
            }

            let owner_id = self.powerup_statuses[i].owner_id;
            {
                let template = &self.powerup_templates[template_id];
                let status = &mut self.powerup_statuses[i];
                if owner_id == self.user.id {
                    let mut others: Vec<&mut Character> = enemies.iter_mut().collect();
                    powerup::deactivate_owner_and_others(&mut self.user, template, status, &mut others);
                } else if let Some(pos) = enemies.iter().position(|c| c.id == owner_id) {
                    let (before, after) = enemies.split_at_mut(pos);
                    let (owner_slice, after) = after.split_at_mut(1);
                    let owner = &mut owner_slice[0];
                    let mut others: Vec<&mut Character> = before.iter_mut().chain(after.iter_mut()).collect();
                    others.push(&mut self.user);
                    powerup::deactivate_owner_and_others(owner, template, status, &mut others);
                }
            }

            self.powerup_statuses[i].count = self.powerup_statuses[i].count.saturating_sub(1);
            if self.powerup_statuses[i].count == 0 {
                finished.push(i);
            }
        }
        for i in finished.into_iter().rev() {
            self.powerup_statuses.remove(i);
        }
    }

    // -- event-driven transitions (§4.9) -----------------------------------

    fn process_events(&mut self) {
        let events = self.bus.drain_all();
        for ev in events {
            match ev.kind {
                EventKind::MapNext => self.on_map_next(),
                EventKind::LevelNext => self.on_level_next(ev.subject),
                EventKind::AnimationBegan => self.on_animation_began(ev.subject),
                EventKind::AnimationEnded => self.on_animation_ended(ev.subject),
                EventKind::GameLost => self.on_game_lost(),
                EventKind::GameWon => self.on_game_won(),
                EventKind::GameReload => self.reload_requested = true,
                // GameStatusChanged itself needs no reaction here: the
                // paused-and-not-over stop/resume of directional clips
                // falls directly out of step_character_tick's RUNNING gate.
                EventKind::GameStatusChanged => {}
                _ => {}
            }
        }
    }

    fn on_map_next(&mut self) {
        let level = self.levels.front_mut().expect("a level is loaded while running");
        level.advance_map(&mut self.user);
    }

    fn on_level_next(&mut self, subject: Subject) {
        let is_user = matches!(&subject, Subject::Character(id) if *id == self.user.id);
        if !is_user {
            self.bus.publish(EventKind::GameLost, Subject::None, 0);
            return;
        }
        if self.levels.len() > 1 {
            self.state.remove(GameState::RUNNING);
            self.bus.publish(EventKind::GameStatusChanged, Subject::None, 0);
            self.transition_animations.start(LEVEL_FADE_OUT, &mut self.bus);
        } else {
            self.bus.publish(EventKind::GameWon, Subject::None, 0);
        }
    }

    fn on_animation_began(&mut self, subject: Subject) {
        if let Subject::Animation(key) = subject {
            if key == LEVEL_TITLE {
                self.levels.pop_front();
                if let Some(level) = self.levels.front_mut() {
                    let map = level.current_map();
                    self.user.place_at(map, map.start_index());
                    level.spawn_enemies_on_current_map();
                }
            }
        }
    }

    fn on_animation_ended(&mut self, subject: Subject) {
        if let Subject::Animation(key) = subject {
            if key == LEVEL_FADE_OUT {
                self.state.insert(GameState::RUNNING);
                self.bus.publish(EventKind::GameStatusChanged, Subject::None, 0);
            }
        }
    }

    fn on_game_lost(&mut self) {
        self.state.insert(GameState::OVER);
        self.state.remove(GameState::WON | GameState::RUNNING);
        self.bus.publish(EventKind::GameStatusChanged, Subject::None, 0);
        self.transition_animations.start(GAME_OVER_FADE, &mut self.bus);
    }

    fn on_game_won(&mut self) {
        self.state.insert(GameState::OVER | GameState::WON);
        self.state.remove(GameState::RUNNING);
        self.bus.publish(EventKind::GameStatusChanged, Subject::None, 0);
        self.transition_animations.start(GAME_WON_FADE, &mut self.bus);
    }
}

/// Keep exactly `character`'s current-direction clip enlisted and every
/// other direction's clip delisted, so switching facing direction swaps
/// the running clip rather than layering several.
fn sync_directional_clip(scheduler: &mut AnimationScheduler, bus: &mut EventBus, character: &Character) {
    for (dir, key) in character.directional_animations.iter() {
        if *dir == character.direction {
            if !scheduler.is_enlisted(key) {
                scheduler.start(key, bus);
            }
        } else {
            scheduler.delist(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Value;

    fn fast_user_config() -> Dict {
        let mut dict = Dict::new();
        dict.set("speed", Value::Float(100_000.0));
        dict
    }

    fn map(layout: &str) -> Map {
        let mut m = Map::from_layout(layout).unwrap();
        m.connect();
        m
    }

    #[test]
    fn start_spawns_enemies_and_enters_running_state() {
        let level = Level::new(vec![map("SV E\n")], 0.0);
        let mut level = level;
        let first_map = level.current_map();
        level.enemies.push(Character::unplaced(1));
        let mut game = Game::new(vec![level], Dict::new(), Vec::new(), 1);
        game.start();
        assert_eq!(game.state(), GameState::STARTED | GameState::RUNNING);
        let _ = first_map;
    }

    #[test]
    fn space_toggles_running_but_is_ignored_once_over() {
        let level = Level::new(vec![map("S E\n")], 0.0);
        let mut game = Game::new(vec![level], Dict::new(), Vec::new(), 1);
        game.start();
        game.handle_key(KeyCode::Space);
        assert!(!game.state().contains(GameState::RUNNING));
        game.handle_key(KeyCode::Space);
        assert!(game.state().contains(GameState::RUNNING));
    }

    #[test]
    fn level_progression_runs_the_fade_chain_then_starts_the_next_level() {
        let level1 = Level::new(vec![map("S E\n")], 0.0);
        let level2 = Level::new(vec![map("S E\n")], 0.0);
        let mut game = Game::new(vec![level1, level2], fast_user_config(), Vec::new(), 1);
        game.start();
        game.handle_key(KeyCode::Right);

        for _ in 0..300 {
            game.tick(1.0 / 60.0);
        }

        assert_eq!(game.levels_remaining(), 1);
        assert!(game.state().contains(GameState::RUNNING));
        assert_eq!(game.user().location, game.current_map().start().location);
    }

    #[test]
    fn reaching_the_exit_on_the_last_level_wins_the_game() {
        let level = Level::new(vec![map("S E\n")], 0.0);
        let mut game = Game::new(vec![level], fast_user_config(), Vec::new(), 1);
        game.start();
        game.handle_key(KeyCode::Right);

        for _ in 0..300 {
            game.tick(1.0 / 60.0);
        }

        assert!(game.state().contains(GameState::OVER));
        assert!(game.state().contains(GameState::WON));
        assert!(!game.state().contains(GameState::RUNNING));
    }

    #[test]
    fn an_enemy_reaching_the_exit_first_loses_the_game() {
        let mut level = Level::new(vec![map("SV E\n")], 0.0);
        let first_map = level.current_map();
        let mut enemy = Character::new(1, false, first_map, first_map.start_index());
        enemy.config.set("speed", Value::Float(100_000.0));
        level.enemies.push(enemy);
        level.spawn_enemies_on_current_map();

        let mut game = Game::new(vec![level], Dict::new(), Vec::new(), 1);
        game.start();
        game.levels.front_mut().unwrap().enemies[0].queue_direction(Direction::East);

        for _ in 0..10 {
            game.tick(1.0 / 60.0);
        }

        assert!(game.state().contains(GameState::OVER));
        assert!(!game.state().contains(GameState::WON));
    }

    #[test]
    fn trigger_key_activation_only_fires_for_the_matching_held_status() {
        let level = Level::new(vec![map("S E\n")], 0.0);
        let mut game = Game::new(vec![level], Dict::new(), vec![], 1);
        game.start();

        let mut picker_effects = Dict::new();
        let mut user_effects = Dict::new();
        user_effects.set("speed", Value::Float(50.0));
        picker_effects.set("user", Value::Dict(user_effects));
        let template = PowerupTemplate {
            id: 0,
            name: "dash".into(),
            appearance_probability: 1.0,
            effect_area_cells: None,
            duration_seconds: 0,
            timeout_seconds: 0.0,
            per_level_limit: 1,
            trigger_key: Some('A'),
            user_only: false,
            picker_effects,
            others_effects: Dict::new(),
            placed_count: 0,
        };
        game.powerup_templates.push(template);
        game.powerup_statuses.push(PowerupStatus {
            template_id: 0,
            owner_id: game.user.id,
            active: false,
            count: 1,
            elapsed_seconds: 0,
            affected_others: Vec::new(),
        });

        game.handle_key(KeyCode::Trigger('B'));
        assert!(!game.powerup_statuses[0].active);

        game.handle_key(KeyCode::Trigger('A'));
        assert!(game.powerup_statuses[0].active);
        assert_eq!(game.user().speed(), 50.0);
    }

    #[test]
    fn mute_toggles_independently_of_game_state() {
        let level = Level::new(vec![map("S E\n")], 0.0);
        let mut game = Game::new(vec![level], Dict::new(), Vec::new(), 1);
        assert!(!game.is_muted());
        game.handle_key(KeyCode::Mute);
        assert!(game.is_muted());
    }

    #[test]
    fn enter_while_over_requests_a_reload() {
        let level = Level::new(vec![map("S E\n")], 0.0);
        let mut game = Game::new(vec![level], fast_user_config(), Vec::new(), 1);
        game.start();
        game.handle_key(KeyCode::Right);
        for _ in 0..50 {
            game.tick(1.0 / 60.0);
        }
        assert!(game.state().contains(GameState::OVER));
        game.handle_key(KeyCode::Enter);
        assert!(game.take_reload_request());
        assert!(!game.take_reload_request());
    }

    #[test]
    fn escape_raises_exit_without_changing_game_state() {
        let level = Level::new(vec![map("S E\n")], 0.0);
        let mut game = Game::new(vec![level], Dict::new(), Vec::new(), 1);
        game.start();
        let state_before = game.state();
        game.handle_key(KeyCode::Escape);
        assert_eq!(game.state(), state_before);
    }
}

//! Power-up subsystem: templates, live statuses, placement, decay,
//! acquisition, activation, duration ticking, and deactivation (§4.6).

use crate::character::{self, Character};
use crate::config::{Dict, Value};
use crate::geometry::Size;
use crate::map::Map;
use crate::pathfind::PathFindingMethod;
use crate::rng::GameRng;

/// Effect keys that dispatch to an immediate action on the target instead
/// of being written through to its live `config` (§4.6): a triggers-once
/// teleport, a triggers-once user-only A*-to-exit, and a user-only
/// additive lives delta. None of these leave a config footprint, so they
/// are never part of the key set `deactivate`/`revert_others` restore.
const ACTION_KEYS: &[&str] = &["randomize_position", "show_shortest_path_to_exit", "lives"];

/// An immutable description of one kind of power-up, authored by an
/// external loader (never mutated at runtime except `placed_count`).
#[derive(Debug, Clone)]
pub struct PowerupTemplate {
    pub id: usize,
    pub name: String,
    /// Probability weight used at each eligible cell, each placement
    /// tick; normalised against the template count in `placement_tick`.
    pub appearance_probability: f32,
    /// Area of effect in cells around the picker, applied to `others_effects`.
    /// `None`, or a zero-sized `Size`, means "the whole map".
    pub effect_area_cells: Option<Size>,
    /// 0 means an instant (non-ticking) effect.
    pub duration_seconds: u32,
    /// A placed-but-unpicked instance decays after this many seconds; `<=
    /// 0.0` means it never decays on its own.
    pub timeout_seconds: f32,
    pub per_level_limit: u32,
    /// `None` means "activates immediately on pickup"; `Some(key)` means
    /// the user must press `key` first (AI always activates immediately).
    pub trigger_key: Option<char>,
    pub user_only: bool,
    /// Effects applied to the picker, keyed by "user" or "enemy".
    pub picker_effects: Dict,
    /// Effects applied to every other character within `effect_area_cells`.
    pub others_effects: Dict,
    pub placed_count: u32,
}

impl PowerupTemplate {
    pub fn picker_effects_for(&self, is_user: bool) -> Option<&Dict> {
        let key = if is_user { "user" } else { "enemy" };
        self.picker_effects.get(key).and_then(|v| v.as_dict().ok())
    }
}

/// One character's live relationship with a template: how many copies
/// they hold, whether it is currently exerting its effect, and how far
/// into its duration it has ticked.
#[derive(Debug, Clone)]
pub struct PowerupStatus {
    pub template_id: usize,
    pub owner_id: u32,
    pub active: bool,
    pub count: u32,
    pub elapsed_seconds: u32,
    /// Ids of other characters who received `others_effects` while this
    /// status was activated, so deactivation can revert them even if
    /// they've since left the effect area.
    pub affected_others: Vec<u32>,
}

impl PowerupStatus {
    fn new(template_id: usize, owner_id: u32) -> Self {
        Self {
            template_id,
            owner_id,
            active: false,
            count: 0,
            elapsed_seconds: 0,
            affected_others: Vec::new(),
        }
    }
}

/// Write `effects` onto `target`: passive keys go through to `config`;
/// the three action keys (see [`ACTION_KEYS`]) fire once instead.
fn apply_effects(target: &mut Character, effects: &Dict, map: &mut Map, rng: &mut GameRng) {
    for (key, value) in effects.iter() {
        match key {
            "randomize_position" => {
                if value.as_bool().unwrap_or(false) {
                    character::teleport_to_random_path_cell(target, map, rng);
                }
            }
            "show_shortest_path_to_exit" => {
                if target.is_user && value.as_bool().unwrap_or(false) {
                    if let (Some(source), end) = (map.index_of(target.location), map.end_index()) {
                        if let Some(path) = PathFindingMethod::AStar.find(map, source, end) {
                            target.path = path;
                        }
                    }
                }
            }
            "lives" => {
                if target.is_user {
                    if let Ok(delta) = value.as_int() {
                        target.apply_lives_delta(delta);
                    }
                }
            }
            _ => target.config.set(key, value.clone()),
        }
    }
}

fn revert_effects<'a>(target: &mut Character, keys: impl Iterator<Item = &'a str>) {
    for key in keys {
        match target.default_config.get(key) {
            Some(v) => target.config.set(key, v.clone()),
            None => target.config.remove(key),
        }
    }
}

/// Per-tick (1Hz) placement pass: for every eligible, currently-empty
/// cell, roll each under-limit template's probability (normalised by the
/// template count) and place the first one that hits.
pub fn placement_tick(rng: &mut GameRng, map: &mut Map, templates: &mut [PowerupTemplate], now: f32) {
    if now - map.last_placement < map.min_placement_interval {
        return;
    }
    let placed_on_map = map.cells().iter().filter(|c| c.powerup.is_some()).count();
    if placed_on_map >= map.simultaneous_limit {
        map.last_placement = now;
        return;
    }

    let denom = templates.len().max(1) as f32;
    let eligible: Vec<usize> = map.eligible_cells().collect();
    for idx in eligible {
        if map.cell_at_index(idx).powerup.is_some() {
            continue;
        }
        for (t_idx, template) in templates.iter_mut().enumerate() {
            if template.placed_count >= template.per_level_limit {
                continue;
            }
            if rng.percent(template.appearance_probability / denom) {
                map.cell_at_index_mut(idx).powerup = Some(crate::cell::PowerupSlot {
                    template_id: t_idx,
                    placed_at: now,
                });
                template.placed_count += 1;
                break;
            }
        }
    }
    map.last_placement = now;
}

/// Empty out any placed-but-unpicked instance whose `timeout_seconds` has
/// elapsed.
pub fn decay_tick(map: &mut Map, templates: &[PowerupTemplate], now: f32) {
    for cell in map.cells_mut() {
        if let Some(slot) = cell.powerup {
            let template = &templates[slot.template_id];
            if template.timeout_seconds > 0.0 && now - slot.placed_at > template.timeout_seconds {
                cell.powerup = None;
            }
        }
    }
}

/// Attempt to pick up whatever is on `cell_powerup`. Returns the index
/// into `statuses` for the (possibly just-created) status record, or
/// `None` if there was nothing to pick up or the picker isn't eligible
/// (a user-only template refuses an AI picker).
pub fn try_acquire(
    character: &Character,
    cell_powerup: &mut Option<crate::cell::PowerupSlot>,
    template: &PowerupTemplate,
    statuses: &mut Vec<PowerupStatus>,
) -> Option<usize> {
    let slot = (*cell_powerup)?;
    if template.user_only && !character.is_user {
        return None;
    }
    *cell_powerup = None;

    let existing = statuses
        .iter()
        .position(|s| s.template_id == slot.template_id && s.owner_id == character.id);
    let status_idx = match existing {
        Some(idx) => {
            statuses[idx].count += 1;
            idx
        }
        None => {
            let mut status = PowerupStatus::new(slot.template_id, character.id);
            status.count = 1;
            statuses.push(status);
            statuses.len() - 1
        }
    };
    Some(status_idx)
}

/// Turn a held-but-inactive status into an active one, applying the
/// picker's own effects. Called immediately on pickup unless the
/// template has a trigger key and the picker is the user.
pub fn activate(
    owner: &mut Character,
    template: &PowerupTemplate,
    status: &mut PowerupStatus,
    map: &mut Map,
    rng: &mut GameRng,
) {
    status.active = true;
    status.elapsed_seconds = 0;
    if let Some(effects) = template.picker_effects_for(owner.is_user) {
        apply_effects(owner, effects, map, rng);
    }
}

/// Apply `others_effects` to every other character within the template's
/// effect area, recording who was touched so deactivation can revert them
/// unconditionally later.
pub fn apply_to_others(
    owner: &Character,
    template: &mut PowerupTemplate,
    status: &mut PowerupStatus,
    map: &mut Map,
    others: &mut [&mut Character],
    rng: &mut GameRng,
) {
    for other in others.iter_mut() {
        if other.id == owner.id {
            continue;
        }
        let in_area = match template.effect_area_cells {
            None => true,
            Some(size) if size.width == 0 || size.height == 0 => true,
            Some(size) => {
                let rect = crate::ai::area_rect(owner.position, size, &*map);
                rect.contains_point(other.position)
            }
        };
        if in_area {
            apply_effects(other, &template.others_effects, map, rng);
            if !status.affected_others.contains(&other.id) {
                status.affected_others.push(other.id);
            }
        }
    }
}

/// Revert an active status: restore the owner's and every recorded
/// affected-other's config keys from their default snapshots (or drop
/// the key if no default existed).
fn deactivate(owner: &mut Character, template: &PowerupTemplate, status: &mut PowerupStatus) {
    if let Some(effects) = template.picker_effects_for(owner.is_user) {
        let keys: Vec<&str> = effects
            .iter()
            .map(|(k, _)| k)
            .filter(|k| !ACTION_KEYS.contains(k))
            .collect();
        revert_effects(owner, keys.into_iter());
    }
    status.active = false;
}

/// Deactivate an owner's status and revert every recorded affected
/// other in one call. Exposed for callers whose owner pool spans more
/// than one backing collection (the persistent user character plus a
/// level's per-level enemy roster) and so can't hand `duration_tick` a
/// single contiguous owners slice.
pub fn deactivate_owner_and_others(
    owner: &mut Character,
    template: &PowerupTemplate,
    status: &mut PowerupStatus,
    others: &mut [&mut Character],
) {
    deactivate(owner, template, status);
    revert_others(template, status, others);
}

fn revert_others(template: &PowerupTemplate, status: &mut PowerupStatus, others: &mut [&mut Character]) {
    let keys: Vec<&str> = template
        .others_effects
        .iter()
        .map(|(k, _)| k)
        .filter(|k| !ACTION_KEYS.contains(k))
        .collect();
    for other in others.iter_mut() {
        if status.affected_others.contains(&other.id) {
            revert_effects(other, keys.iter().copied());
        }
    }
    status.affected_others.clear();
}

/// Per-second duration tick for every active status: `elapsed = (elapsed
/// + 1) mod duration`; wrapping to zero deactivates and decrements the
/// held count, dropping the status once the count reaches zero.
pub fn duration_tick(
    statuses: &mut Vec<PowerupStatus>,
    templates: &[PowerupTemplate],
    owners: &mut [Character],
    mut others_by_status: impl FnMut(usize) -> Vec<&mut Character>,
) {
    let mut to_remove = Vec::new();
    for i in 0..statuses.len() {
        if !statuses[i].active {
            continue;
        }
        let template = &templates[statuses[i].template_id];
        if template.duration_seconds == 0 {
            continue;
        }
        statuses[i].elapsed_seconds = (statuses[i].elapsed_seconds + 1) % template.duration_seconds;
        if statuses[i].elapsed_seconds != 0 {
            continue;
        }

        let owner_id = statuses[i].owner_id;
        if let Some(owner) = owners.iter_mut().find(|c| c.id == owner_id) {
            let (template, status) = (template, &mut statuses[i]);
            deactivate(owner, template, status);
        }
        let mut others = others_by_status(i);
        revert_others(template, &mut statuses[i], &mut others);

        statuses[i].count = statuses[i].count.saturating_sub(1);
        if statuses[i].count == 0 {
            to_remove.push(i);
        }
    }
    for i in to_remove.into_iter().rev() {
        statuses.remove(i);
    }
}

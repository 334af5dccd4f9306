//! A level's ordered map sequence, its enemy roster, and map-to-map
//! progression within that sequence (§3, §4.5's "more maps remain" case).

use crate::character::Character;
use crate::map::Map;

/// An ordered sequence of maps the player races through, plus the enemy
/// roster that rides along for the whole level (their *default*
/// configuration, per character, is held on the `Character` itself — see
/// [`crate::powerup`] for how a power-up overlays and later restores it).
pub struct Level {
    maps: Vec<Map>,
    current_map_index: usize,
    pub complexity: f32,
    pub enemies: Vec<Character>,
    pub texture_keys: Vec<String>,
}

impl Level {
    pub fn new(maps: Vec<Map>, complexity: f32) -> Self {
        assert!(!maps.is_empty(), "a level needs at least one map");
        Self {
            maps,
            current_map_index: 0,
            complexity,
            enemies: Vec::new(),
            texture_keys: Vec::new(),
        }
    }

    pub fn current_map(&self) -> &Map {
        &self.maps[self.current_map_index]
    }

    pub fn current_map_mut(&mut self) -> &mut Map {
        &mut self.maps[self.current_map_index]
    }

    pub fn current_map_index(&self) -> usize {
        self.current_map_index
    }

    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    pub fn is_last_map(&self) -> bool {
        self.current_map_index + 1 >= self.maps.len()
    }

    pub fn has_next_map(&self) -> bool {
        !self.is_last_map()
    }

    /// The current map and the enemy roster, borrowed disjointly so AI
    /// decision code can hold both a `&Map`/`&mut Map` and `&mut
    /// [Character]` at once without aliasing the same field.
    pub fn map_and_enemies_mut(&mut self) -> (&mut Map, &mut [Character]) {
        (&mut self.maps[self.current_map_index], &mut self.enemies)
    }

    /// Assign each enemy, in registration order, to one of the current
    /// map's `V` spawn slots. Enemies beyond the slot count are left as
    /// they were (unplaced, if constructed via [`Character::unplaced`]).
    pub fn spawn_enemies_on_current_map(&mut self) {
        let map = &self.maps[self.current_map_index];
        let slots: Vec<usize> = map
            .spawn_slots
            .iter()
            .filter_map(|loc| map.index_of(*loc))
            .collect();
        for (enemy, &slot_idx) in self.enemies.iter_mut().zip(slots.iter()) {
            enemy.place_at(map, slot_idx);
        }
    }

    /// Move to the next map in the sequence, relocating `user` to its
    /// start cell and every enemy to its spawn slots. Returns `false`
    /// (a no-op) if already on the last map.
    pub fn advance_map(&mut self, user: &mut Character) -> bool {
        if self.is_last_map() {
            return false;
        }
        self.current_map_index += 1;
        let map = &self.maps[self.current_map_index];
        user.place_at(map, map.start_index());
        self.spawn_enemies_on_current_map();
        true
    }

    /// Relocate `user` and every enemy back to the first map (used on a
    /// game reload, §4.9's `GAME_RELOAD`).
    pub fn reset_to_first_map(&mut self, user: &mut Character) {
        self.current_map_index = 0;
        let map = &self.maps[0];
        user.place_at(map, map.start_index());
        self.spawn_enemies_on_current_map();
    }
}

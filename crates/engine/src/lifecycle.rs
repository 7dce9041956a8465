//! Cell lifecycle: splitting, decay, virus explosions and the per-kind hooks
//! that run when entities are added, removed, eat or get eaten.

use crate::collision::mass_to_size;
use crate::entity::{Cell, CellKind, EjectedMass, Entity, EntityId, PlayerCell, Virus};
use crate::error::WorldError;
use crate::geometry::angle_of;
use crate::player::PlayerId;
use crate::world::World;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;
use tracing::debug;

/// Size limit for auto-splitting in rec mode.
const REC_MAX_SIZE: f32 = 1e9;

/// Masses of the fragments a virus tears off a cell of `cell_mass`.
///
/// `cells_left` is the owner's remaining cell budget and `split_min` the
/// largest fragment mass worth a separate cell. Three strategies:
/// - equal-pop: as many `split_min`-sized pieces as fit, all equal
/// - power-of-two: when the budget is too large for the mass, the largest
///   power of two that keeps pieces above `split_min`
/// - half-half: the cell keeps half, each fragment takes at most half of
///   what is left
///
/// The cell itself keeps whatever the fragments do not take.
pub fn virus_splits(cell_mass: f32, cells_left: usize, split_min: f32, equal_pop: bool) -> Vec<f32> {
    if cells_left == 0 {
        return Vec::new();
    }

    if equal_pop {
        let count = ((cell_mass / split_min) as usize).min(cells_left);
        let split_mass = cell_mass / (count + 1) as f32;
        return vec![split_mass; count];
    }

    if cell_mass / (cells_left as f32) < split_min {
        let mut split_count: usize = 2;
        let mut split_mass = cell_mass / split_count as f32;
        while split_mass > split_min && 2 * split_count < cells_left {
            split_count *= 2;
            split_mass = cell_mass / split_count as f32;
        }
        let split_count = split_count.min(cells_left);
        // The cell keeps one share
        split_mass = cell_mass / (split_count + 1) as f32;
        return vec![split_mass; split_count];
    }

    let mut splits = Vec::with_capacity(cells_left);
    let mut mass_left = cell_mass / 2.0;
    let mut split_mass = cell_mass / 2.0;
    let mut remaining = cells_left;

    while remaining > 0 {
        remaining -= 1;

        // With no slots left the quotient is +inf and never below split_min
        if mass_left / (remaining as f32) < split_min {
            split_mass = mass_left / remaining as f32;
            while remaining > 0 {
                remaining -= 1;
                splits.push(split_mass);
            }
        }

        while split_mass >= mass_left && remaining > 0 {
            split_mass /= 2.0;
        }

        splits.push(split_mass);
        mass_left -= split_mass;
    }

    splits
}

impl World {
    // ---- hooks ----------------------------------------------------------

    /// Register a freshly inserted entity in its kind list (and its owner's
    /// cell list).
    pub(crate) fn on_added(&mut self, id: EntityId, kind: CellKind, owner: Option<PlayerId>) {
        match kind {
            CellKind::Player => {
                self.player_cells.insert(id);
                if let Some(player) = owner.and_then(|o| self.players.get_mut(o)) {
                    player.cells.push(id);
                }
            }
            CellKind::Food => {
                self.food.insert(id);
            }
            CellKind::Virus => {
                self.viruses.insert(id);
            }
            CellKind::EjectedMass => {
                self.ejected.insert(id);
            }
        }
        if self.entities.get(id).is_some_and(|e| e.data().boost.is_some()) {
            self.moving.insert(id);
        }
    }

    /// Unregister a removed entity. Removing a virus spawns a new one.
    pub(crate) fn on_removed(&mut self, id: EntityId, entity: &Entity) {
        match entity {
            Entity::Player(cell) => {
                self.player_cells.remove(id);
                if let Some(player) = cell.owner().and_then(|o| self.players.get_mut(o)) {
                    player.cells.retain(|&c| c != id);
                }
            }
            Entity::Food(_) => {
                self.food.remove(id);
            }
            Entity::Virus(_) => {
                self.viruses.remove(id);
                self.spawn_virus();
            }
            Entity::Eject(_) => {
                self.ejected.remove(id);
            }
        }
    }

    /// Predator absorbs its prey. A virus that grows past its maximum size
    /// resets and shoots a new virus along the prey's heading.
    pub(crate) fn on_eat(&mut self, predator: EntityId, prey: &Entity) {
        let virus_min = self.config.virus.min_size as f32;
        let virus_max = self.config.virus.max_size as f32;
        let Some(entity) = self.entities.get_mut(predator) else {
            return;
        };

        let is_virus = entity.kind() == CellKind::Virus;
        let data = entity.data_mut();
        data.absorb(prey.data().radius());
        let mut shot_from = None;
        if is_virus && data.size() >= virus_max {
            data.set_size(virus_min);
            shot_from = Some(data.position);
        }
        self.sync_index(predator);

        if let Some(position) = shot_from {
            let angle = match prey.data().boost {
                Some(boost) => angle_of(boost.direction),
                None => self.rng.random_range(0.0..TAU),
            };
            self.shoot_virus(position, angle);
        }
    }

    /// A player cell that eats a virus explodes.
    pub(crate) fn on_eaten(&mut self, prey: &Entity, predator: EntityId) {
        if let Entity::Virus(_) = prey {
            self.explode_cell(predator);
        }
    }

    // ---- splitting ------------------------------------------------------

    /// Split `mass` off a player cell into a new cell launched along `angle`.
    ///
    /// No-op when the parent would drop below the minimum player size.
    pub fn split_player_cell(&mut self, parent: EntityId, angle: f32, mass: f32) -> Option<EntityId> {
        let min_size = self.config.player.min_size as f32;
        let split_speed = self.config.player.split_speed as f32;

        let size = mass_to_size(mass);
        if !(size > 0.0) {
            return None;
        }
        let Some(Entity::Player(cell)) = self.entities.get_mut(parent) else {
            return None;
        };
        let remaining = (cell.cell_data.radius() - size * size).sqrt();
        if !(remaining > 0.0) || remaining < min_size {
            return None;
        }
        let owner = cell.owner()?;

        cell.cell_data.set_size(remaining);
        let position = cell.cell_data.position;
        let color = cell.cell_data.color;
        self.sync_index(parent);

        let mut child = PlayerCell::new(0, owner, position, size, self.tick_count);
        child.cell_data.color = color;
        child.cell_data.set_boost(split_speed * size.powf(0.0122), angle);
        self.add_entity(child.into()).ok()
    }

    /// Split every large enough cell of a player toward its aim point.
    /// Returns the number of new cells.
    pub fn split_player(&mut self, id: PlayerId) -> Result<usize, WorldError> {
        let player = self.players.get(id).ok_or(WorldError::UnknownPlayer(id))?;
        let cells = player.cells.clone();
        let target = player.target;
        let max_cells = player.max_cells(self.config.player.max_cells);
        let min_split = self.config.player.min_split_size as f32;

        let mut created = 0;
        for cell in cells {
            let Some(entity) = self.entities.get(cell) else {
                continue;
            };
            let data = entity.data();
            if data.size() < min_split {
                continue;
            }
            if self.players.get(id).map_or(0, |p| p.cells.len()) >= max_cells {
                break;
            }

            let mut d = target - data.position;
            if d.length_squared() < 1.0 {
                d = Vec2::X;
            }
            let mass = data.mass() * 0.5;
            if self.split_player_cell(cell, angle_of(d), mass).is_some() {
                created += 1;
            }
        }
        if created > 0 {
            debug!("Player {:?} split {} cells", id, created);
        }
        Ok(created)
    }

    /// Cells above the size limit split in a random direction, or are
    /// clamped when the owner cannot have more cells.
    pub(crate) fn auto_split(&mut self, id: EntityId) {
        let Some(Entity::Player(cell)) = self.entities.get(id) else {
            return;
        };
        let Some(owner) = cell.owner().and_then(|o| self.players.get(o)) else {
            return;
        };
        let max_size = if owner.rec_mode {
            REC_MAX_SIZE
        } else {
            self.config.player.max_size as f32
        };
        if owner.merge_override || cell.cell_data.size() < max_size {
            return;
        }

        if owner.cells.len() >= self.config.player.max_cells || self.config.server.mobile_physics {
            if let Some(entity) = self.entities.get_mut(id) {
                entity.data_mut().set_size(max_size);
            }
            self.sync_index(id);
        } else {
            let mass = cell.cell_data.mass() * 0.5;
            let angle = self.rng.random_range(0.0..TAU);
            self.split_player_cell(id, angle, mass);
        }
    }

    /// Shrink a player cell by the decay rate. Runs once per simulated
    /// second.
    pub(crate) fn update_size_decay(&mut self, id: EntityId) {
        let rate = self.config.player.decay_rate as f32;
        let cap = self.config.player.decay_cap as f32;
        let min_size = self.config.player.min_size as f32;
        let decay_mod = self.gamemode.decay_mod();
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };

        let data = entity.data_mut();
        if rate <= 0.0 || data.size() <= min_size {
            return;
        }
        let rate = if cap > 0.0 && data.mass() > cap { rate * 10.0 } else { rate };
        let size = (data.radius() * (1.0 - rate * decay_mod)).sqrt();
        if !(size > 0.0) {
            return;
        }
        data.set_size(size);
        self.sync_index(id);
    }

    /// Tear fragments off a player cell that ate a virus.
    pub(crate) fn explode_cell(&mut self, id: EntityId) {
        let Some(Entity::Player(cell)) = self.entities.get(id) else {
            return;
        };
        let Some(owner) = cell.owner().and_then(|o| self.players.get(o)) else {
            return;
        };
        let budget = self.config.virus_max_cells();
        if owner.cells.len() >= budget {
            return;
        }

        let splits = virus_splits(
            cell.cell_data.mass(),
            budget - owner.cells.len(),
            self.config.virus_split_min_mass(),
            self.config.virus.equal_pop_size,
        );
        debug!(
            "Cell {} popped into {} fragments",
            cell.cell_data.node_id,
            splits.len()
        );
        for mass in splits {
            let angle = self.rng.random_range(0.0..TAU);
            self.split_player_cell(id, angle, mass);
        }
    }

    /// Launch a new minimum-size virus from `position`.
    pub(crate) fn shoot_virus(&mut self, position: Vec2, angle: f32) -> Option<EntityId> {
        let mut virus = Virus::new(0, position, self.config.virus.min_size as f32, self.tick_count);
        virus
            .data_mut()
            .set_boost(self.config.virus.velocity as f32, angle);
        self.add_entity(virus.into()).ok()
    }

    /// Shoot mass from every large enough cell of a player toward its aim
    /// point. Returns the number of pellets ejected.
    pub fn eject_mass(&mut self, id: PlayerId) -> Result<usize, WorldError> {
        let tick = self.tick_count;
        let cooldown = self.config.eject.cooldown;
        let player = self.players.get_mut(id).ok_or(WorldError::UnknownPlayer(id))?;
        if !player.try_eject(tick, cooldown) || player.frozen {
            return Ok(0);
        }
        let cells = player.cells.clone();
        let target = player.target;

        let min_eject = self.config.player.min_eject_size as f32;
        let min_size = self.config.player.min_size as f32;
        let loss = self.config.eject.size_loss as f32;
        let eject_size = self.config.eject.size as f32;
        let eject_speed = self.config.eject.speed as f32;

        let mut ejected = 0;
        for cell in cells {
            let Some(entity) = self.entities.get_mut(cell) else {
                continue;
            };
            let data = entity.data_mut();
            if data.size() < min_eject {
                continue;
            }
            let new_radius = data.radius() - loss * loss;
            if new_radius < 0.0 || new_radius < min_size * min_size {
                continue;
            }
            data.set_size(new_radius.sqrt());

            let d = target - data.position;
            let dist = d.length();
            let dir = if dist > 1.0 { d / dist } else { Vec2::X };
            let position = data.position + dir * data.size();
            let color = data.color;
            self.sync_index(cell);

            let angle = angle_of(dir) + self.rng.random::<f32>() * 0.6 - 0.3;
            let mut pellet: Entity = if self.config.eject.eject_virus {
                Virus::new(0, position, eject_size, tick).into()
            } else {
                EjectedMass::new(0, position, eject_size, tick).into()
            };
            let data = pellet.data_mut();
            data.color = color;
            data.set_boost(eject_speed, angle);
            self.add_entity(pellet)?;
            ejected += 1;
        }
        Ok(ejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use crate::world::test_support::*;

    fn total_mass(world: &World, owner: PlayerId) -> f32 {
        world
            .player(owner)
            .unwrap()
            .cells
            .iter()
            .map(|&id| world.entity(id).unwrap().data().mass())
            .sum()
    }

    #[test]
    fn test_equal_pop_splits() {
        let splits = virus_splits(300.0, 4, 100.0, true);
        assert_eq!(splits, vec![75.0, 75.0, 75.0]);
    }

    #[test]
    fn test_power_of_two_splits() {
        // 100 / 15 < 60: halves are already below the minimum
        let splits = virus_splits(100.0, 15, 60.0, false);
        assert_eq!(splits.len(), 2);
        assert!((splits[0] - 100.0 / 3.0).abs() < 1e-4);

        // 1000 / 15 < 72: doubles to 8 pieces, capped by the budget
        let splits = virus_splits(1000.0, 15, 72.0, false);
        assert_eq!(splits.len(), 8);
        assert!(splits.iter().all(|&m| (m - 1000.0 / 9.0).abs() < 1e-3));

        // One free slot takes one piece
        assert_eq!(virus_splits(30.0, 1, 60.0, false), vec![15.0]);
    }

    #[test]
    fn test_half_half_splits_stay_in_budget() {
        for &(mass, left) in &[(5000.0, 15), (10000.0, 8), (800.0, 3), (400.0, 1)] {
            let splits = virus_splits(mass, left, 36.0, false);
            assert!(!splits.is_empty());
            assert!(splits.len() <= left, "{mass} / {left}: {splits:?}");
            assert!(splits.iter().all(|&m| m > 0.0));
            assert!(splits.iter().sum::<f32>() < mass);
        }
        assert!(virus_splits(1000.0, 0, 36.0, false).is_empty());
    }

    #[test]
    fn test_split_conserves_mass() {
        let mut world = world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 100.0);
        let before = total_mass(&world, p);

        let child = world.split_player_cell(cell, 0.0, 50.0).unwrap();
        assert!((total_mass(&world, p) - before).abs() < 1e-3);
        assert_eq!(world.player(p).unwrap().cells, vec![cell, child]);

        let child = world.entity(child).unwrap().data();
        assert!((child.size() - mass_to_size(50.0)).abs() < 1e-4);
        let boost = child.boost.unwrap();
        assert!((boost.distance - 780.0 * child.size().powf(0.0122)).abs() < 1e-3);
        assert_index_consistent(&world);
    }

    #[test]
    fn test_split_below_min_size_is_noop() {
        let mut world = world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 40.0);
        // Parent would keep sqrt(1600 - 900) = 26.5 < 30
        assert!(world.split_player_cell(cell, 0.0, 9.0).is_none());
        // Splitting off everything leaves nothing
        assert!(world.split_player_cell(cell, 0.0, 16.0).is_none());
        assert!(world.split_player_cell(cell, 0.0, 20.0).is_none());
        assert_eq!(world.entity(cell).unwrap().data().size(), 40.0);
        assert_eq!(world.cell_counts().players, 1);
    }

    #[test]
    fn test_split_player_respects_cell_limit() {
        let mut world = world_with(|c| c.player.max_cells = 3);
        let p = world.add_player(Player::new("a"));
        player_cell(&mut world, p, Vec2::ZERO, 200.0);
        player_cell(&mut world, p, Vec2::new(500.0, 0.0), 200.0);
        world.set_target(p, Vec2::new(0.0, 300.0)).unwrap();

        assert_eq!(world.split_player(p).unwrap(), 1);
        assert_eq!(world.player(p).unwrap().cells.len(), 3);
        assert_eq!(world.split_player(p).unwrap(), 0);
    }

    #[test]
    fn test_split_player_aims_at_target() {
        let mut world = world();
        let p = world.add_player(Player::new("a"));
        player_cell(&mut world, p, Vec2::ZERO, 200.0);
        world.set_target(p, Vec2::new(0.0, 300.0)).unwrap();
        world.split_player(p).unwrap();

        let child = world.player(p).unwrap().cells[1];
        let boost = world.entity(child).unwrap().data().boost.unwrap();
        assert!(boost.direction.x.abs() < 1e-5);
        assert!((boost.direction.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_auto_split_and_clamp() {
        let mut world = world_with(|c| c.player.max_size = 200.0);
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 250.0);
        world.auto_split(cell);
        assert_eq!(world.player(p).unwrap().cells.len(), 2);

        let mut world = world_with(|c| {
            c.player.max_size = 200.0;
            c.server.mobile_physics = true;
        });
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 250.0);
        world.auto_split(cell);
        assert_eq!(world.player(p).unwrap().cells.len(), 1);
        assert_eq!(world.entity(cell).unwrap().data().size(), 200.0);
        assert_index_consistent(&world);
    }

    #[test]
    fn test_size_decay() {
        let mut world = world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 100.0);
        world.update_size_decay(cell);
        let expected = (10000.0f32 * (1.0 - 0.002)).sqrt();
        assert!((world.entity(cell).unwrap().data().size() - expected).abs() < 1e-4);

        let small = player_cell(&mut world, p, Vec2::new(500.0, 0.0), 30.0);
        world.update_size_decay(small);
        assert_eq!(world.entity(small).unwrap().data().size(), 30.0);
    }

    #[test]
    fn test_size_decay_cap_and_zero_rate() {
        let mut world = world_with(|c| c.player.decay_cap = 50.0);
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 100.0);
        world.update_size_decay(cell);
        let expected = (10000.0f32 * (1.0 - 0.02)).sqrt();
        assert!((world.entity(cell).unwrap().data().size() - expected).abs() < 1e-3);

        let mut world = world_with(|c| c.player.decay_rate = 0.0);
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 100.0);
        world.update_size_decay(cell);
        assert_eq!(world.entity(cell).unwrap().data().size(), 100.0);
    }

    #[test]
    fn test_explosion_conserves_mass_within_budget() {
        let mut world = world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 400.0);
        let before = total_mass(&world, p);

        world.explode_cell(cell);
        let cells = world.player(p).unwrap().cells.len();
        assert!(cells > 1);
        assert!(cells <= world.config().virus_max_cells());
        assert!((total_mass(&world, p) - before).abs() < 0.05);
        assert_index_consistent(&world);
    }

    #[test]
    fn test_equal_pop_explosion() {
        // Mass 300, fragment minimum 100, four free slots
        let mut world = world_with(|c| {
            c.virus.equal_pop_size = true;
            c.virus.max_popped_size = 100.0;
            c.virus.max_cells = 5;
        });
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 30000.0f32.sqrt());
        let before = total_mass(&world, p);

        world.explode_cell(cell);
        let cells = world.player(p).unwrap().cells.clone();
        assert_eq!(cells.len(), 4);
        for id in cells {
            assert!((world.entity(id).unwrap().data().mass() - 75.0).abs() < 0.01);
        }
        assert!((total_mass(&world, p) - before).abs() < 0.05);
        assert_index_consistent(&world);
    }

    #[test]
    fn test_power_of_two_explosion() {
        // Halves of 100 are already below 60: two thirds split off
        let mut world = world_with(|c| c.virus.max_popped_size = 6000.0f64.sqrt());
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 100.0);
        let budget = world.config().virus_max_cells() - 1;
        let before = total_mass(&world, p);

        world.explode_cell(cell);
        let cells = world.player(p).unwrap().cells.clone();
        assert_eq!(cells.len(), 3);
        assert!(cells.len() - 1 <= budget);
        for id in cells {
            assert!((world.entity(id).unwrap().data().mass() - 100.0 / 3.0).abs() < 0.01);
        }
        assert!((total_mass(&world, p) - before).abs() < 0.01);

        // Mass 1000 against a minimum of 72 doubles to eight fragments
        let mut world = world_with(|c| c.virus.max_popped_size = 7200.0f64.sqrt());
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 100_000.0f32.sqrt());
        let before = total_mass(&world, p);

        world.explode_cell(cell);
        let cells = world.player(p).unwrap().cells.len();
        assert_eq!(cells, 9);
        assert!(cells - 1 <= budget);
        assert!((total_mass(&world, p) - before).abs() < 0.05);
        assert_index_consistent(&world);
    }

    #[test]
    fn test_explosion_skipped_without_budget() {
        let mut world = world_with(|c| c.virus.max_cells = 2);
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 400.0);
        player_cell(&mut world, p, Vec2::new(900.0, 0.0), 40.0);
        world.explode_cell(cell);
        assert_eq!(world.player(p).unwrap().cells.len(), 2);
    }

    #[test]
    fn test_virus_feeding_shoots_new_virus() {
        let mut world = world_with(|c| {
            c.virus.min_size = 100.0;
            c.virus.max_size = 110.0;
        });
        let v = virus(&mut world, Vec2::ZERO, 100.0);
        let mut pellet: Entity = EjectedMass::new(0, Vec2::new(30.0, 0.0), 50.0, 0).into();
        pellet.data_mut().set_boost(100.0, std::f32::consts::FRAC_PI_2);

        world.on_eat(v, &pellet);
        assert_eq!(world.entity(v).unwrap().data().size(), 100.0);
        assert_eq!(world.cell_counts().viruses, 2);

        let shot = world
            .ids_of(CellKind::Virus)
            .iter()
            .copied()
            .find(|&id| id != v)
            .unwrap();
        let boost = world.entity(shot).unwrap().data().boost.unwrap();
        assert!((boost.direction.y - 1.0).abs() < 1e-5);
        assert_eq!(boost.distance, 780.0);
    }

    #[test]
    fn test_virus_feeding_below_max_only_grows() {
        let mut world = world();
        let v = virus(&mut world, Vec2::ZERO, 100.0);
        let pellet: Entity = EjectedMass::new(0, Vec2::ZERO, 20.0, 0).into();
        world.on_eat(v, &pellet);
        let size = world.entity(v).unwrap().data().size();
        assert!((size - 10400.0f32.sqrt()).abs() < 1e-4);
        assert_eq!(world.cell_counts().viruses, 1);
    }

    #[test]
    fn test_eject_mass() {
        let mut world = world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 100.0);
        world.set_target(p, Vec2::new(200.0, 0.0)).unwrap();

        assert_eq!(world.eject_mass(p).unwrap(), 1);
        let size = world.entity(cell).unwrap().data().size();
        let loss = 41.231f32;
        assert!((size - (10000.0 - loss * loss).sqrt()).abs() < 1e-3);

        let pellet = world.ids_of(CellKind::EjectedMass)[0];
        let data = world.entity(pellet).unwrap().data();
        assert!((data.position.x - size).abs() < 1e-3);
        let angle = angle_of(data.boost.unwrap().direction);
        assert!(angle.abs() <= 0.3 + 1e-5);

        // Cooldown
        assert_eq!(world.eject_mass(p).unwrap(), 0);
    }

    #[test]
    fn test_eject_mass_keeps_min_size() {
        let mut world = world();
        let p = world.add_player(Player::new("a"));
        player_cell(&mut world, p, Vec2::ZERO, 45.0);
        assert_eq!(world.eject_mass(p).unwrap(), 0);

        let mut frozen = Player::new("f");
        frozen.frozen = true;
        let f = world.add_player(frozen);
        player_cell(&mut world, f, Vec2::new(500.0, 0.0), 200.0);
        assert_eq!(world.eject_mass(f).unwrap(), 0);
    }

    #[test]
    fn test_eject_virus_option() {
        let mut world = world_with(|c| c.eject.eject_virus = true);
        let p = world.add_player(Player::new("a"));
        player_cell(&mut world, p, Vec2::ZERO, 200.0);
        assert_eq!(world.eject_mass(p).unwrap(), 1);
        assert_eq!(world.cell_counts().viruses, 1);
        assert_eq!(world.cell_counts().ejected, 0);
    }

    #[test]
    fn test_removing_virus_respawns_one() {
        let mut world = world();
        let v = virus(&mut world, Vec2::ZERO, 100.0);
        world.remove_entity(v).unwrap();
        assert_eq!(world.cell_counts().viruses, 1);
        assert!(world.entity(v).is_none());
    }
}

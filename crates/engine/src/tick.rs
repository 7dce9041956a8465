//! The fixed-step update.
//!
//! One tick runs these phases in order:
//! 1. periodic restart check
//! 2. moving entities: boost step, then collisions against whatever they
//!    touch (ejected mass against ejected mass is rigid)
//! 3. player cells: movement, remerge timer, boost and border for every
//!    cell, then per cell a scan that resolves rigid contacts at once and
//!    queues eat candidates, auto-split and (once per second) size decay
//! 4. queued eats, most recently found first
//! 5. game mode hook, leaderboard refresh (once per second), tick counter
//!
//! Frozen worlds skip phases 2 to 5.

use crate::collision::{Contact, Manifold, Party, can_consume, check_cell_collision, classify, order_by_size, resolve_rigid};
use crate::diff::TickDiff;
use crate::entity::{CellKind, Entity, EntityId};
use crate::gamemodes::ffa::Ffa;
use crate::world::{SimState, World};
use std::time::{Duration, Instant};
use tracing::debug;

impl World {
    /// Advance the world by one step and return everything that changed
    /// since the previous call.
    pub fn tick(&mut self) -> TickDiff {
        let tick_start = Instant::now();

        if self.config.restart_ticks().is_some_and(|limit| self.tick_count > limit) {
            self.restart();
        }

        if self.state == SimState::Running {
            let movement_start = Instant::now();
            self.update_moving_cells();
            let movement_time = movement_start.elapsed();

            let player_start = Instant::now();
            let eats = self.update_player_cells();
            let player_time = player_start.elapsed();

            let eat_start = Instant::now();
            for m in eats.into_iter().rev() {
                self.try_consume(m.a, m.b);
            }
            let eat_time = eat_start.elapsed();

            // Take the mode out so it can borrow the world
            let mut gamemode = std::mem::replace(&mut self.gamemode, Box::new(Ffa::new()));
            gamemode.on_tick(self);
            if (self.tick_count + 7) % self.config.ticks_per_second() == 0 {
                self.leaderboard = gamemode.leaderboard(self);
            }
            self.gamemode = gamemode;

            self.tick_count += 1;

            if self.tick_count % 400 == 0 {
                self.log_timing(tick_start.elapsed(), movement_time, player_time, eat_time);
            }
        }

        self.diff.finish(&self.entities)
    }

    fn log_timing(&self, total: Duration, movement: Duration, players: Duration, eats: Duration) {
        let counts = self.cell_counts();
        debug!(
            "Tick #{}: {:.2}ms total | moving={:.2}ms players={:.2}ms eat={:.2}ms | {} entities ({} moving), {} players",
            self.tick_count,
            total.as_secs_f64() * 1000.0,
            movement.as_secs_f64() * 1000.0,
            players.as_secs_f64() * 1000.0,
            eats.as_secs_f64() * 1000.0,
            counts.total,
            counts.moving,
            self.players.len()
        );
    }

    /// Boost every moving entity and resolve what it runs into.
    fn update_moving_cells(&mut self) {
        let mobile = self.config.server.mobile_physics;
        let moving = self.moving.as_slice().to_vec();

        for id in moving {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            let still_moving = entity.data_mut().update_boost(&self.border);
            self.sync_index(id);

            let Some(entity) = self.entities.get(id) else {
                continue;
            };
            let bounds = entity.data().bounds();
            for other in self.tree.find_all(&bounds) {
                if other == id {
                    continue;
                }
                let (Some(a), Some(b)) = (self.entities.get(id), self.entities.get(other)) else {
                    // The moving entity itself may have been eaten
                    if !self.entities.contains_key(id) {
                        break;
                    }
                    continue;
                };
                if !mobile && a.kind() == CellKind::EjectedMass && b.kind() == CellKind::EjectedMass {
                    self.apply_rigid(id, other);
                } else {
                    self.try_consume(id, other);
                }
            }

            if !still_moving {
                self.moving.remove(id);
            }
        }
    }

    /// Move every player cell and scan it for contacts. Returns the eat
    /// candidates in discovery order.
    fn update_player_cells(&mut self) -> Vec<Manifold> {
        let tps = self.config.ticks_per_second();
        let decay_tick = (self.tick_count + 3) % tps == 0;
        let cells = self.player_cells.as_slice().to_vec();
        let mut eats = Vec::new();

        // Remerge flags must be current for every cell before any scan
        for &id in &cells {
            self.move_player_cell(id);
        }
        for id in cells {
            if !self.entities.contains_key(id) {
                continue;
            }
            self.scan_player_cell(id, &mut eats);
            self.auto_split(id);
            if decay_tick {
                self.update_size_decay(id);
            }
        }
        eats
    }

    /// Step toward the owner's aim point, refresh the remerge flag, apply
    /// any boost and keep the cell inside the border.
    fn move_player_cell(&mut self, id: EntityId) {
        let tick = self.tick_count;
        let tps = self.config.ticks_per_second();
        let speed = self.config.player.speed as f32;
        let merge_time = self.config.player.merge_time as f32;

        let Some(Entity::Player(cell)) = self.entities.get_mut(id) else {
            return;
        };
        let Some(owner) = cell.owner().and_then(|o| self.players.get(o)) else {
            return;
        };

        if !owner.frozen {
            let delta = owner.target - cell.cell_data.position;
            let factor = cell.speed_factor(delta.length(), speed);
            if factor > 0.0 {
                cell.cell_data.position += delta * factor;
            }
        }
        cell.update_merge(tick, merge_time, owner.rec_mode || owner.merge_override, tps);

        if !cell.cell_data.update_boost(&self.border) {
            cell.cell_data.check_border(&self.border);
        }
        self.sync_index(id);
    }

    fn scan_player_cell(&mut self, id: EntityId, eats: &mut Vec<Manifold>) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let bounds = entity.data().bounds();

        for other in self.tree.find_all(&bounds) {
            if other == id {
                continue;
            }
            let (Some(a), Some(b)) = (self.entities.get(id), self.entities.get(other)) else {
                continue;
            };
            let m = check_cell_collision(id, a.data().position, other, b.data().position);
            match classify(&self.party(a), &self.party(b), &self.rules) {
                Contact::Rigid => self.apply_rigid(id, other),
                Contact::Consume => eats.push(m),
                Contact::Ignore => {}
            }
        }
    }

    /// Facts about an entity needed to classify a contact.
    fn party(&self, entity: &Entity) -> Party {
        let data = entity.data();
        let owner = data.owner.and_then(|o| self.players.get(o));
        Party {
            owner: data.owner,
            team: owner.and_then(|p| p.team),
            is_minion: owner.is_some_and(|p| p.is_minion),
            age: data.age(self.tick_count),
            can_remerge: entity.can_remerge(),
            size: data.size(),
        }
    }

    /// Push two overlapping cells apart.
    fn apply_rigid(&mut self, a: EntityId, b: EntityId) {
        let (Some(ea), Some(eb)) = (self.entities.get(a), self.entities.get(b)) else {
            return;
        };
        let (da, db) = (ea.data(), eb.data());
        let m = check_cell_collision(a, da.position, b, db.position);
        let Some((push_a, push_b)) = resolve_rigid(&m, da.size(), da.radius(), db.size(), db.radius()) else {
            return;
        };

        self.entities[a].data_mut().position += push_a;
        self.entities[b].data_mut().position += push_b;
        self.sync_index(a);
        self.sync_index(b);
    }

    /// Let the larger of two cells eat the smaller if the rules allow it.
    /// Distances are measured at resolution time.
    fn try_consume(&mut self, a: EntityId, b: EntityId) -> bool {
        let (Some(ea), Some(eb)) = (self.entities.get(a), self.entities.get(b)) else {
            return false;
        };
        let (pa, pb) = (self.party(ea), self.party(eb));
        let (prey, predator, swapped) = order_by_size(&pa, &pb);
        let (prey_id, predator_id) = if swapped { (b, a) } else { (a, b) };
        let (prey_entity, predator_entity) = if swapped { (eb, ea) } else { (ea, eb) };

        let d = prey_entity.data().position.distance(predator_entity.data().position);
        let virus_room = self.viruses.len() < self.config.virus.max_amount;
        let accepts = predator_entity.can_eat(prey_entity.kind(), virus_room);
        if !can_consume(prey, predator, d, accepts, &self.rules) {
            return false;
        }

        let predator_node = predator_entity.data().node_id;
        let Some(prey_entity) = self.remove_node(prey_id, Some(predator_node)) else {
            return false;
        };
        self.on_eat(predator_id, &prey_entity);
        self.on_eaten(&prey_entity, predator_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::entity::{CellKind, Entity};
    use crate::player::Player;
    use crate::world::SimState;
    use crate::world::test_support::*;
    use glam::Vec2;

    /// World without food top-up so tests see only what they add.
    fn quiet_world() -> crate::World {
        world_with(|c| {
            c.food.min_amount = 0;
            c.virus.min_amount = 0;
        })
    }

    #[test]
    fn test_player_eats_food() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 50.0);
        world.set_target(p, Vec2::ZERO).unwrap();
        let pellet = food(&mut world, Vec2::new(10.0, 0.0), 10.0);
        let _ = world.tick();

        let diff = world.tick();
        assert!(diff.eaten.is_empty());
        assert!(world.entity(pellet).is_none());
        let size = world.entity(cell).unwrap().data().size();
        assert!((size - 2600.0f32.sqrt()).abs() < 1e-3);
        assert_eq!(world.cell_counts().food, 0);
        assert_index_consistent(&world);
    }

    #[test]
    fn test_eat_reported_in_diff() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 50.0);
        world.set_target(p, Vec2::ZERO).unwrap();
        let _ = world.tick();

        let pellet = food(&mut world, Vec2::new(10.0, 0.0), 10.0);
        let pellet_node = world.entity(pellet).unwrap().data().node_id;
        let cell_node = world.entity(cell).unwrap().data().node_id;
        let diff = world.tick();
        assert_eq!(diff.eaten, vec![(pellet_node, cell_node)]);
        // Added and eaten in the same tick: only the eat is reported
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert!(diff.updated.iter().any(|s| s.node_id == cell_node));
    }

    #[test]
    fn test_eat_requires_margin() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let q = world.add_player(Player::new("b"));
        let big = player_cell(&mut world, p, Vec2::ZERO, 22.9);
        let small = player_cell(&mut world, q, Vec2::new(10.0, 0.0), 20.0);
        world.set_target(p, Vec2::ZERO).unwrap();
        world.set_target(q, Vec2::new(10.0, 0.0)).unwrap();
        let _ = world.tick();
        assert!(world.entity(big).is_some());
        assert!(world.entity(small).is_some());
    }

    #[test]
    fn test_cross_owner_eat_at_boundary() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let q = world.add_player(Player::new("b"));
        let big = player_cell(&mut world, p, Vec2::ZERO, 23.0);
        let small = player_cell(&mut world, q, Vec2::new(10.0, 0.0), 20.0);
        world.set_target(p, Vec2::ZERO).unwrap();
        world.set_target(q, Vec2::new(10.0, 0.0)).unwrap();
        let _ = world.tick();
        assert!(world.entity(big).is_some());
        assert!(world.entity(small).is_none());
        assert!(world.player(q).unwrap().cells.is_empty());
    }

    #[test]
    fn test_siblings_push_apart_until_mergeable() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let a = player_cell(&mut world, p, Vec2::ZERO, 50.0);
        let b = player_cell(&mut world, p, Vec2::new(30.0, 0.0), 50.0);
        age(&mut world, a, 20);
        age(&mut world, b, 20);
        world.player_mut(p).unwrap().frozen = true;

        let _ = world.tick();
        let pa = world.entity(a).unwrap().data().position;
        let pb = world.entity(b).unwrap().data().position;
        assert!(pa.distance(pb) > 30.0);
        assert_eq!(world.player(p).unwrap().cells.len(), 2);
    }

    #[test]
    fn test_fresh_siblings_ignore_each_other() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let a = player_cell(&mut world, p, Vec2::ZERO, 50.0);
        let b = player_cell(&mut world, p, Vec2::new(30.0, 0.0), 50.0);
        world.player_mut(p).unwrap().frozen = true;

        let _ = world.tick();
        assert_eq!(world.entity(a).unwrap().data().position, Vec2::ZERO);
        assert_eq!(world.entity(b).unwrap().data().position, Vec2::new(30.0, 0.0));
    }

    #[test]
    fn test_siblings_merge_in_merge_override() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let a = player_cell(&mut world, p, Vec2::ZERO, 50.0);
        let b = player_cell(&mut world, p, Vec2::new(10.0, 0.0), 40.0);
        age(&mut world, a, 20);
        age(&mut world, b, 20);
        let player = world.player_mut(p).unwrap();
        player.frozen = true;
        player.merge_override = true;

        let _ = world.tick();
        let cells = &world.player(p).unwrap().cells;
        assert_eq!(cells.len(), 1);
        let size = world.entity(cells[0]).unwrap().data().size();
        assert!((size - 4100.0f32.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_virus_pops_player() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 300.0);
        world.set_target(p, Vec2::ZERO).unwrap();
        let v = virus(&mut world, Vec2::new(50.0, 0.0), 100.0);

        let _ = world.tick();
        assert!(world.entity(v).is_none());
        assert!(world.entity(cell).is_some());
        let cells = world.player(p).unwrap().cells.len();
        assert!(cells > 1 && cells <= 16);
        // The respawn is skipped if it lands on the player
        assert!(world.cell_counts().viruses <= 1);
        assert_index_consistent(&world);
    }

    #[test]
    fn test_virus_eats_ejected_mass() {
        let mut world = quiet_world();
        let v = virus(&mut world, Vec2::ZERO, 100.0);
        let pellet = ejected(&mut world, Vec2::new(20.0, 0.0), 36.0);
        world.entity_mut(pellet).unwrap().data_mut().set_boost(50.0, std::f32::consts::PI);
        world.refresh(pellet).unwrap();

        let _ = world.tick();
        assert!(world.entity(pellet).is_none());
        let size = world.entity(v).unwrap().data().size();
        assert!((size - (10000.0f32 + 1296.0).sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_ejected_masses_collide_rigidly() {
        let mut world = quiet_world();
        let a = ejected(&mut world, Vec2::ZERO, 36.0);
        let b = ejected(&mut world, Vec2::new(20.0, 0.0), 36.0);
        world.entity_mut(a).unwrap().data_mut().set_boost(5.0, 0.0);
        world.refresh(a).unwrap();

        let _ = world.tick();
        let pa = world.entity(a).unwrap().data().position;
        let pb = world.entity(b).unwrap().data().position;
        assert!(pa.distance(pb) >= 72.0 - 1e-3);
    }

    #[test]
    fn test_boost_settles_and_leaves_moving_set() {
        let mut world = quiet_world();
        let pellet = ejected(&mut world, Vec2::ZERO, 10.0);
        world.entity_mut(pellet).unwrap().data_mut().set_boost(90.0, 0.0);
        world.refresh(pellet).unwrap();
        assert_eq!(world.cell_counts().moving, 1);

        for _ in 0..60 {
            let _ = world.tick();
        }
        assert_eq!(world.cell_counts().moving, 0);
        let data = world.entity(pellet).unwrap().data();
        assert!(data.boost.is_none());
        assert!(data.position.x > 85.0 && data.position.x <= 90.0);
        assert_index_consistent(&world);
    }

    #[test]
    fn test_player_moves_toward_target() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 30.0);
        world.set_target(p, Vec2::new(500.0, 0.0)).unwrap();

        let diff = world.tick();
        let x = world.entity(cell).unwrap().data().position.x;
        assert!(x > 0.0 && x < 500.0);
        let node = world.entity(cell).unwrap().data().node_id;
        // Added this tick, so not reported as updated
        assert!(diff.added.iter().any(|s| s.node_id == node));

        let diff = world.tick();
        assert!(diff.updated.iter().any(|s| s.node_id == node && s.kind == CellKind::Player));
    }

    #[test]
    fn test_player_clamped_to_border() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::new(990.0, 0.0), 40.0);
        world.set_target(p, Vec2::new(5000.0, 0.0)).unwrap();
        for _ in 0..5 {
            let _ = world.tick();
        }
        let x = world.entity(cell).unwrap().data().position.x;
        assert_eq!(x, 1000.0 - 20.0);
    }

    #[test]
    fn test_frozen_world_does_not_advance() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 30.0);
        world.set_target(p, Vec2::new(500.0, 0.0)).unwrap();
        world.freeze();

        let diff = world.tick();
        assert_eq!(diff.added.len(), 1);
        assert_eq!(world.tick_count(), 0);
        assert_eq!(world.entity(cell).unwrap().data().position, Vec2::ZERO);

        world.resume();
        assert_eq!(world.state(), SimState::Running);
        let _ = world.tick();
        assert_eq!(world.tick_count(), 1);
    }

    #[test]
    fn test_periodic_restart() {
        let mut world = world_with(|c| {
            c.server.restart_minutes = 1;
            c.food.min_amount = 0;
            c.virus.min_amount = 0;
        });
        food(&mut world, Vec2::ZERO, 10.0);
        world.tick_count = 60 * 25;
        assert!(!world.tick().reset);

        let diff = world.tick();
        assert!(diff.reset);
        assert_eq!(world.cell_counts().total, 0);
        assert_eq!(world.tick_count(), 1);
    }

    #[test]
    fn test_ffa_tops_up_food() {
        let mut world = world_with(|c| {
            c.food.min_amount = 50;
            c.food.spawn_amount = 20;
            c.virus.min_amount = 2;
        });
        let diff = world.tick();
        assert_eq!(world.cell_counts().food, 20);
        assert_eq!(world.cell_counts().viruses, 2);
        assert_eq!(diff.added.len(), 22);
    }

    #[test]
    fn test_leaderboard_refreshes_once_per_second() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        player_cell(&mut world, p, Vec2::ZERO, 100.0);
        world.player_mut(p).unwrap().frozen = true;

        // First refresh lands on tick 18 at 25 ticks per second
        for _ in 0..18 {
            let _ = world.tick();
            assert!(world.leaderboard().is_empty());
        }
        let _ = world.tick();
        assert_eq!(world.leaderboard().len(), 1);
        assert_eq!(world.leaderboard()[0].player, Some(p));
        assert_eq!(world.stats().leader.map(|e| e.name), Some("a".to_string()));

        let q = world.add_player(Player::new("b"));
        player_cell(&mut world, q, Vec2::new(600.0, 600.0), 200.0);
        world.player_mut(q).unwrap().frozen = true;
        for _ in 0..24 {
            let _ = world.tick();
            assert_eq!(world.leaderboard().len(), 1);
        }
        let _ = world.tick();
        assert_eq!(world.leaderboard()[0].player, Some(q));
        assert!(world.stats().to_string().contains("leader: b"));
    }

    #[test]
    fn test_teams_collide_rigidly() {
        let mut world = world_with(|c| {
            c.server.gamemode = 1;
            c.food.min_amount = 0;
            c.virus.min_amount = 0;
        });
        let mut red = Player::new("a");
        red.team = Some(0);
        red.frozen = true;
        let mut mate = Player::new("b");
        mate.team = Some(0);
        mate.frozen = true;
        let p = world.add_player(red);
        let q = world.add_player(mate);
        let big = player_cell(&mut world, p, Vec2::ZERO, 100.0);
        let small = player_cell(&mut world, q, Vec2::new(40.0, 0.0), 30.0);

        let _ = world.tick();
        assert!(world.entity(small).is_some());
        let d = world.entity(big).unwrap().data().position.distance(world.entity(small).unwrap().data().position);
        assert!(d > 40.0);
    }

    #[test]
    fn test_decay_runs_once_per_second() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        let cell = player_cell(&mut world, p, Vec2::ZERO, 100.0);
        world.player_mut(p).unwrap().frozen = true;

        let mut decays = 0;
        let mut last = 100.0;
        for _ in 0..50 {
            let _ = world.tick();
            let size = world.entity(cell).unwrap().data().size();
            if size < last {
                decays += 1;
                last = size;
            }
        }
        assert_eq!(decays, 2);
    }

    #[test]
    fn test_split_children_fly_and_stay_in_index() {
        let mut world = quiet_world();
        let p = world.add_player(Player::new("a"));
        player_cell(&mut world, p, Vec2::ZERO, 200.0);
        world.set_target(p, Vec2::new(0.0, 800.0)).unwrap();
        world.split_player(p).unwrap();

        for _ in 0..10 {
            let _ = world.tick();
            assert_index_consistent(&world);
        }
        let cells = &world.player(p).unwrap().cells;
        assert_eq!(cells.len(), 2);
        let child = world.entity(cells[1]).unwrap();
        assert!(matches!(child, Entity::Player(_)));
        assert!(child.data().position.y > 100.0);
    }
}

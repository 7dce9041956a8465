//! World state management.
//!
//! The world owns every entity, every player record and the spatial index,
//! and keeps them in step: an entity is registered in its arena, its kind
//! list and the index in one call, and removed from all three in one call.
//! Per-tick processing lives in `tick.rs`, splitting and the per-kind hooks
//! in `lifecycle.rs`.

use crate::collision::CollisionRules;
use crate::config::Config;
use crate::diff::{DiffBuilder, EntitySnapshot};
use crate::entity::{Cell, CellKind, Color, Entity, EntityId, Food, PlayerCell, Virus};
use crate::error::{ConfigError, WorldError};
use crate::gamemodes::{GameMode, LeaderboardEntry, get_gamemode};
use crate::geometry::Bounds;
use crate::player::{Player, PlayerId};
use crate::spatial::QuadTree;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, info, warn};

/// Whether ticks advance the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimState {
    #[default]
    Running,
    Frozen,
}

/// Entity keys of one kind, with O(1) removal.
#[derive(Debug, Default)]
pub(crate) struct KeyList {
    keys: Vec<EntityId>,
    pos: SecondaryMap<EntityId, usize>,
}

impl KeyList {
    pub fn insert(&mut self, id: EntityId) -> bool {
        if self.pos.contains_key(id) {
            return false;
        }
        self.pos.insert(id, self.keys.len());
        self.keys.push(id);
        true
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(pos) = self.pos.remove(id) else {
            return false;
        };
        self.keys.swap_remove(pos);
        if let Some(&moved) = self.keys.get(pos) {
            self.pos.insert(moved, pos);
        }
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[EntityId] {
        &self.keys
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.pos.clear();
    }
}

/// The game world containing all cells.
pub struct World {
    pub(crate) config: Config,
    pub(crate) border: Bounds,
    pub(crate) rules: CollisionRules,

    /// All entities by key.
    pub(crate) entities: SlotMap<EntityId, Entity>,
    pub(crate) players: SlotMap<PlayerId, Player>,
    pub(crate) tree: QuadTree<EntityId>,

    pub(crate) player_cells: KeyList,
    pub(crate) food: KeyList,
    pub(crate) viruses: KeyList,
    pub(crate) ejected: KeyList,
    /// Entities with an active boost.
    pub(crate) moving: KeyList,

    pub(crate) tick_count: u64,
    pub(crate) state: SimState,
    next_node_id: u32,
    pub(crate) rng: StdRng,
    pub(crate) gamemode: Box<dyn GameMode>,
    /// Refreshed once per second while running.
    pub(crate) leaderboard: Vec<LeaderboardEntry>,
    pub(crate) diff: DiffBuilder,

    /// Smoothed tick duration in milliseconds, maintained by the driver.
    pub update_time_avg: f64,
}

impl World {
    /// Create an empty world. The configuration is validated first.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let half_w = (config.border.width / 2.0) as f32;
        let half_h = (config.border.height / 2.0) as f32;
        let border = Bounds::new(-half_w, -half_h, half_w, half_h);
        let gamemode = get_gamemode(config.server.gamemode);
        let rules = CollisionRules::new(&config, gamemode.have_teams());
        let rng = match config.server.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::rng().random()),
        };

        info!(
            "World created: {}x{} border, gamemode {} ({})",
            config.border.width,
            config.border.height,
            gamemode.name(),
            gamemode.id()
        );

        Ok(Self {
            border,
            rules,
            entities: SlotMap::with_capacity_and_key(4096),
            players: SlotMap::with_key(),
            tree: QuadTree::new(border),
            player_cells: KeyList::default(),
            food: KeyList::default(),
            viruses: KeyList::default(),
            ejected: KeyList::default(),
            moving: KeyList::default(),
            tick_count: 0,
            state: SimState::Running,
            next_node_id: 1,
            rng,
            gamemode,
            leaderboard: Vec::new(),
            diff: DiffBuilder::default(),
            update_time_avg: 0.0,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn border(&self) -> Bounds {
        self.border
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[inline]
    pub fn state(&self) -> SimState {
        self.state
    }

    #[inline]
    pub fn gamemode(&self) -> &dyn GameMode {
        self.gamemode.as_ref()
    }

    /// Get the next node ID. 0 is never handed out.
    pub(crate) fn next_id(&mut self) -> u32 {
        let id = self.next_node_id;
        self.next_node_id = self.next_node_id.wrapping_add(1);
        if self.next_node_id == 0 {
            self.next_node_id = 1;
        }
        id
    }

    // ---- entities -------------------------------------------------------

    /// Register an entity in the world and the spatial index.
    ///
    /// The world assigns the node ID and birth tick. Player cells must name
    /// an existing owner and are appended to its cell list.
    pub fn add_entity(&mut self, mut entity: Entity) -> Result<EntityId, WorldError> {
        let size = entity.data().size();
        if !(size.is_finite() && size > 0.0) {
            return Err(WorldError::DegenerateSize(size));
        }
        let owner = entity.owner();
        if let Entity::Player(_) = entity {
            let owner = owner.ok_or(WorldError::MissingOwner)?;
            if !self.players.contains_key(owner) {
                return Err(WorldError::UnknownPlayer(owner));
            }
        }

        let node_id = self.next_id();
        let data = entity.data_mut();
        data.node_id = node_id;
        data.tick_of_birth = self.tick_count;
        let bounds = data.bounds();
        let kind = entity.kind();

        let id = self.entities.insert(entity);
        let handle = self.tree.insert(bounds, id);
        self.entities[id].data_mut().spatial = handle;
        self.on_added(id, kind, owner);
        self.diff.added(id);
        Ok(id)
    }

    /// Remove an entity from the world.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<Entity, WorldError> {
        self.remove_node(id, None).ok_or(WorldError::UnknownEntity(id))
    }

    /// Deindex and drop an entity. `eaten_by` is the predator's node ID.
    pub(crate) fn remove_node(&mut self, id: EntityId, eaten_by: Option<u32>) -> Option<Entity> {
        let mut entity = self.entities.remove(id)?;
        self.tree.remove(entity.data().spatial);
        self.moving.remove(id);

        match eaten_by {
            Some(predator) => {
                entity.data_mut().killed_by = Some(predator);
                self.diff.eaten(entity.data().node_id, predator);
            }
            None => self.diff.removed(EntitySnapshot::of(&entity)),
        }
        self.on_removed(id, &entity);
        Some(entity)
    }

    /// Copy an entity's bounds into the index after it moved or resized.
    ///
    /// Entities that gained a boost join the moving set here.
    pub(crate) fn sync_index(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let data = entity.data();
        let bounds = data.bounds();
        let boosted = data.boost.is_some();
        let handle = data.spatial;

        if boosted {
            self.moving.insert(id);
        }
        if self.tree.get(handle).is_some_and(|(stored, _)| *stored == bounds) {
            return;
        }
        self.tree.update(handle, bounds);
        self.diff.updated(id);
    }

    #[inline]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable access to an entity. Call [`World::refresh`] after changing
    /// its position or size.
    #[inline]
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Resynchronise an entity modified through [`World::entity_mut`].
    pub fn refresh(&mut self, id: EntityId) -> Result<(), WorldError> {
        let size = self
            .entities
            .get(id)
            .ok_or(WorldError::UnknownEntity(id))?
            .data()
            .size();
        if !(size.is_finite() && size > 0.0) {
            return Err(WorldError::DegenerateSize(size));
        }
        self.sync_index(id);
        Ok(())
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    /// Keys of all live entities of one kind.
    pub fn ids_of(&self, kind: CellKind) -> &[EntityId] {
        match kind {
            CellKind::Player => self.player_cells.as_slice(),
            CellKind::Food => self.food.as_slice(),
            CellKind::Virus => self.viruses.as_slice(),
            CellKind::EjectedMass => self.ejected.as_slice(),
        }
    }

    /// Entities whose index box overlaps `query`.
    pub fn query_region(&self, query: &Bounds) -> impl Iterator<Item = &Entity> + '_ {
        self.tree
            .find_all(query)
            .into_iter()
            .filter_map(move |id| self.entities.get(id))
    }

    /// Box stored in the spatial index for an entity.
    pub fn index_bound(&self, id: EntityId) -> Option<Bounds> {
        let entity = self.entities.get(id)?;
        self.tree.get(entity.data().spatial).map(|(bound, _)| *bound)
    }

    /// Number of items in the spatial index.
    #[inline]
    pub fn index_len(&self) -> usize {
        self.tree.len()
    }

    /// Whether a cell of `size` at `position` would overlap a player cell.
    pub fn will_collide(&self, position: Vec2, size: f32) -> bool {
        let bound = Bounds::from_center(position, size);
        self.tree.find(&bound, |&id| matches!(self.entities.get(id), Some(Entity::Player(_))))
    }

    // ---- players --------------------------------------------------------

    pub fn add_player(&mut self, player: Player) -> PlayerId {
        let id = self.players.insert(player);
        debug!("Added player {:?}", id);
        id
    }

    /// Remove a player and all of its cells.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<Player, WorldError> {
        let cells = self
            .players
            .get(id)
            .ok_or(WorldError::UnknownPlayer(id))?
            .cells
            .clone();
        for cell in cells {
            self.remove_node(cell, None);
        }
        self.players.remove(id).ok_or(WorldError::UnknownPlayer(id))
    }

    #[inline]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    #[inline]
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn players(&self) -> impl Iterator<Item = (PlayerId, &Player)> {
        self.players.iter()
    }

    /// Summed mass of a player's live cells. Unknown players weigh nothing.
    pub fn player_mass(&self, id: PlayerId) -> f32 {
        self.players.get(id).map_or(0.0, |player| {
            player
                .cells
                .iter()
                .filter_map(|&cell| self.entities.get(cell))
                .map(|entity| entity.data().mass())
                .sum()
        })
    }

    /// The leaderboard as of the last refresh.
    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Update a player's aim point. Read at the next tick.
    pub fn set_target(&mut self, id: PlayerId, target: Vec2) -> Result<(), WorldError> {
        let player = self.players.get_mut(id).ok_or(WorldError::UnknownPlayer(id))?;
        player.target = target;
        Ok(())
    }

    // ---- spawning -------------------------------------------------------

    /// Get a random position within the border.
    pub fn random_position(&mut self) -> Vec2 {
        Vec2::new(
            self.border.min_x + self.border.width() * self.rng.random::<f32>(),
            self.border.min_y + self.border.height() * self.rng.random::<f32>(),
        )
    }

    pub fn random_color(&mut self) -> Color {
        Color::random(&mut self.rng)
    }

    /// Spawn one food pellet at a random position, unless the food cap is
    /// reached.
    pub fn spawn_food(&mut self) -> Option<EntityId> {
        if self.food.len() >= self.config.food.max_amount {
            return None;
        }
        let min_size = self.config.food.min_size as f32;
        let max_size = self.config.food.max_size as f32;
        let size = if max_size > min_size {
            self.rng.random_range(min_size..max_size)
        } else {
            min_size
        };
        let position = self.random_position();
        let mut food = Food::new(0, position, size, self.tick_count);
        food.data_mut().color = self.random_color();
        self.add_entity(food.into()).ok()
    }

    /// Spawn one virus at a random position. Skipped when it would land on
    /// a player cell or the virus cap is reached.
    pub fn spawn_virus(&mut self) -> Option<EntityId> {
        if self.viruses.len() >= self.config.virus.max_amount {
            return None;
        }
        let size = self.config.virus.min_size as f32;
        let position = self.random_position();
        if self.will_collide(position, size) {
            return None;
        }
        self.add_entity(Virus::new(0, position, size, self.tick_count).into()).ok()
    }

    /// Initial population.
    pub fn spawn_cells(&mut self, viruses: usize, food: usize) {
        for _ in 0..food {
            self.spawn_food();
        }
        for _ in 0..viruses {
            self.spawn_virus();
        }
        let counts = self.cell_counts();
        info!("World populated: {} food, {} viruses", counts.food, counts.viruses);
    }

    /// Top food up toward its minimum (at most `food.spawn_amount` per call)
    /// and viruses up to theirs.
    pub fn replenish(&mut self) {
        let food = self.food.len();
        let food_min = self.config.food.min_amount;
        if food < food_min {
            let count = (food_min - food).min(self.config.food.spawn_amount);
            for _ in 0..count {
                self.spawn_food();
            }
        }

        let viruses = self.viruses.len();
        let virus_min = self.config.virus.min_amount;
        for _ in viruses..virus_min {
            self.spawn_virus();
        }
    }

    /// Give a player a new cell.
    ///
    /// The game mode picks the color (and team). Some spawns start from a
    /// settled ejected mass; a spawn point on top of a player cell is
    /// retried once at a random position.
    pub fn spawn_player(&mut self, id: PlayerId) -> Result<EntityId, WorldError> {
        let player = self.players.get_mut(id).ok_or(WorldError::UnknownPlayer(id))?;
        self.gamemode.on_player_spawn(player, &mut self.rng);
        let is_minion = player.is_minion;
        let mut color = player.color;
        let mut size = player
            .spawn_size
            .unwrap_or(self.config.player.start_size as f32);

        let mut position = self.random_position();
        if !self.ejected.as_slice().is_empty() {
            let index = self.rng.random_range(0..self.ejected.len());
            let roll = self.rng.random::<f64>();
            let eject = self.ejected.as_slice()[index];
            if let Some(eject) = self.entities.get(eject) {
                let data = eject.data();
                if roll <= self.config.eject.spawn_percent && data.boost_distance() < 1.0 {
                    position = data.position;
                    color = data.color;
                    size = size.max(data.size() * crate::collision::PLAYER_EAT_MULT);
                }
            }
        }
        if !is_minion && self.will_collide(position, size) {
            position = self.random_position();
        }

        let mut cell = PlayerCell::new(0, id, position, size, self.tick_count);
        cell.cell_data.color = color;
        let cell_id = self.add_entity(cell.into())?;

        if let Some(player) = self.players.get_mut(id) {
            player.color = color;
            player.target = position;
        }
        debug!("Spawned player cell {:?} for {:?}", cell_id, id);
        Ok(cell_id)
    }

    // ---- administration -------------------------------------------------

    /// Clear every entity and start over on a fresh border. Players stay
    /// registered with no cells.
    pub fn restart(&mut self) {
        let half_w = (self.config.border.width / 2.0) as f32;
        let half_h = (self.config.border.height / 2.0) as f32;
        self.border = Bounds::new(-half_w, -half_h, half_w, half_h);

        self.entities.clear();
        self.tree.reset(self.border);
        self.player_cells.clear();
        self.food.clear();
        self.viruses.clear();
        self.ejected.clear();
        self.moving.clear();
        for player in self.players.values_mut() {
            player.cells.clear();
        }

        self.leaderboard.clear();
        self.next_node_id = 1;
        self.tick_count = 0;
        self.state = SimState::Running;
        self.diff.reset();
        info!("World restarted");
    }

    pub fn freeze(&mut self) {
        if self.state != SimState::Frozen {
            self.state = SimState::Frozen;
            info!("World frozen at tick {}", self.tick_count);
        } else {
            warn!("World is already frozen");
        }
    }

    pub fn resume(&mut self) {
        if self.state != SimState::Running {
            self.state = SimState::Running;
            info!("World resumed at tick {}", self.tick_count);
        } else {
            warn!("World is not frozen");
        }
    }

    /// Get the count of each cell type.
    #[inline]
    pub fn cell_counts(&self) -> CellCounts {
        CellCounts {
            players: self.player_cells.len(),
            food: self.food.len(),
            viruses: self.viruses.len(),
            ejected: self.ejected.len(),
            moving: self.moving.len(),
            total: self.entities.len(),
        }
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            tick: self.tick_count,
            state: self.state,
            gamemode: self.gamemode.name().to_string(),
            counts: self.cell_counts(),
            players: self.players.len(),
            alive_players: self.players.values().filter(|p| p.is_alive()).count(),
            update_time_avg: self.update_time_avg,
            leader: self.leaderboard.first().cloned(),
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick_count)
            .field("state", &self.state)
            .field("gamemode", &self.gamemode.name())
            .field("entities", &self.entities.len())
            .field("players", &self.players.len())
            .field("tree", &self.tree)
            .finish()
    }
}

/// Cell count statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellCounts {
    pub players: usize,
    pub food: usize,
    pub viruses: usize,
    pub ejected: usize,
    pub moving: usize,
    pub total: usize,
}

/// Snapshot for the admin console.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldStats {
    pub tick: u64,
    pub state: SimState,
    pub gamemode: String,
    pub counts: CellCounts,
    pub players: usize,
    pub alive_players: usize,
    pub update_time_avg: f64,
    /// Top leaderboard row, if any.
    pub leader: Option<LeaderboardEntry>,
}

impl std::fmt::Display for WorldStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tick {} ({:?}, {}) | {} players ({} alive) | cells: {} player, {} food, {} virus, {} ejected, {} moving | {:.2}ms/tick",
            self.tick,
            self.state,
            self.gamemode,
            self.players,
            self.alive_players,
            self.counts.players,
            self.counts.food,
            self.counts.viruses,
            self.counts.ejected,
            self.counts.moving,
            self.update_time_avg
        )?;
        if let Some(leader) = &self.leader {
            write!(f, " | leader: {} ({:.2})", leader.name, leader.score)?;
        }
        Ok(())
    }
}

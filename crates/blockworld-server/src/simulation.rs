//! The authoritative simulation.
//!
//! One [`Simulation`] owns the world handle and one [`PlayerSlot`] per
//! player. Each tick every playing slot is advanced in parallel; a slot only
//! ever writes its own state, and the world is only read while the tick
//! runs. Block edits and movement requests are applied between ticks.

use blockworld_core::{BlockRecord, BlockType, Error as CoreError, VoxelCoord};
use blockworld_physics::{
    AuditOutcome, BlockSolidityTable, CollisionDetector, MotionState, OtherPlayer,
    PhysicsIntegrator, TraversalAuditor,
};
use blockworld_world::SharedWorld;
use glam::{Vec2, Vec3};
use hashbrown::HashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::anti_cheat::AntiCheatGate;
use crate::config::ServerConfig;
use crate::connection::ConnectionState;
use crate::error::{Result, SimulationError};
use crate::protocol::{MovementRequest, MovementResponse};

/// Movement intent of a player, applied every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Desired horizontal velocity, X and Z, in blocks per second.
    pub horizontal: Vec2,
    /// Desired vertical velocity while flying.
    pub vertical: f32,
    pub flying: bool,
}

impl PlayerInput {
    /// Walk with the given horizontal velocity.
    pub const fn walk(x: f32, z: f32) -> Self {
        Self {
            horizontal: Vec2::new(x, z),
            vertical: 0.0,
            flying: false,
        }
    }

    /// Fly with the given velocity.
    pub const fn fly(velocity: Vec3) -> Self {
        Self {
            horizontal: Vec2::new(velocity.x, velocity.z),
            vertical: velocity.y,
            flying: true,
        }
    }
}

/// Everything the simulation knows about one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSlot {
    pub motion: MotionState,
    pub connection: ConnectionState,
    pub input: PlayerInput,
    /// Physics is skipped for this player while the tick counter is below
    /// this value.
    pub suppress_until_tick: u64,
}

impl PlayerSlot {
    fn new(spawn: Vec3) -> Self {
        Self {
            motion: MotionState::at(spawn),
            connection: ConnectionState::default(),
            input: PlayerInput::default(),
            suppress_until_tick: 0,
        }
    }

    /// Whether physics is suppressed at `tick`.
    pub const fn suppressed_at(&self, tick: u64) -> bool {
        tick < self.suppress_until_tick
    }

    fn apply_input(&mut self) {
        let input = self.input;
        self.motion.velocity.x = input.horizontal.x;
        self.motion.velocity.z = input.horizontal.y;
        if input.flying {
            self.motion.velocity.y = input.vertical;
            self.motion.on_ground = false;
        } else if self.motion.flying {
            // Landing from flight starts with no vertical speed.
            self.motion.velocity.y = 0.0;
        }
        self.motion.flying = input.flying;
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Tick number just completed.
    pub tick: u64,
    /// Number of slots that were advanced.
    pub simulated: usize,
    /// Players dropped because they ended the tick inside solid geometry.
    pub disconnected: Vec<String>,
}

/// A slot advanced during the parallel part of a tick.
struct Advanced {
    name: String,
    /// Motion state after input, before integration.
    before: MotionState,
    skip: bool,
    embedded: bool,
    /// Sent back to `before` because its body overlapped another.
    reverted: bool,
}

/// The authoritative game state.
#[derive(Debug)]
pub struct Simulation {
    config: ServerConfig,
    world: SharedWorld,
    solidity: BlockSolidityTable,
    detector: CollisionDetector,
    integrator: PhysicsIntegrator,
    gate: AntiCheatGate,
    auditor: TraversalAuditor,
    players: HashMap<String, PlayerSlot>,
    tick: u64,
}

impl Simulation {
    /// Create a simulation over `world`.
    ///
    /// Records already in the world are re-snapshotted under the configured
    /// water policy.
    pub fn new(config: ServerConfig, world: SharedWorld) -> Result<Self> {
        config.validate()?;
        let solidity = BlockSolidityTable::from_config(&config.physics);
        let changed = solidity.apply_to(&mut world.write());
        if changed > 0 {
            tracing::info!(changed, "refreshed block collision flags");
        }

        let detector = CollisionDetector::new(world.clone(), &config.physics);
        let integrator = PhysicsIntegrator::new(&config.physics);
        let gate = AntiCheatGate::new(config.max_move_per_tick, &config.physics);
        tracing::info!(
            tick_rate = config.tick_rate,
            grace_ticks = config.grace_ticks(),
            water_solid = solidity.water_solid(),
            "simulation created"
        );
        Ok(Self {
            config,
            world,
            solidity,
            detector,
            integrator,
            gate,
            auditor: TraversalAuditor::new(),
            players: HashMap::new(),
            tick: 0,
        })
    }

    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub const fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub const fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    pub const fn solidity(&self) -> &BlockSolidityTable {
        &self.solidity
    }

    /// Number of ticks completed.
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn player(&self, player: &str) -> Option<&PlayerSlot> {
        self.players.get(player)
    }

    /// Names of every player with a slot.
    pub fn player_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.players.keys().map(String::as_str)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Swap the whole world. Existing slots are kept.
    pub fn replace_world(&mut self, world: SharedWorld) {
        let changed = self.solidity.apply_to(&mut world.write());
        tracing::info!(changed, "world replaced");
        self.detector.update_world(world.clone());
        self.world = world;
    }

    /// Open a connection for `player` at `spawn` and finish the login, so
    /// the player is simulated from the next tick.
    pub fn join(&mut self, player: &str, spawn: Vec3) -> Result<()> {
        self.begin_join(player, spawn)?;
        self.complete_login(player)
    }

    /// Open a connection for `player` at `spawn`, leaving it in the login
    /// state. The player is not simulated until [`Simulation::complete_login`].
    pub fn begin_join(&mut self, player: &str, spawn: Vec3) -> Result<()> {
        if self.players.contains_key(player) {
            return Err(SimulationError::PlayerExists(player.to_owned()));
        }
        if !self.integrator.resolver().in_bounds(spawn)
            || self.detector.check_block_collision(spawn)
        {
            return Err(SimulationError::InvalidSpawn(player.to_owned()));
        }

        let mut slot = PlayerSlot::new(spawn);
        slot.connection.advance()?;
        slot.motion.on_ground = self
            .integrator
            .has_support(&self.detector, spawn, &self.roster_without(player));
        self.players.insert(player.to_owned(), slot);
        self.gate.register(player, spawn);
        tracing::info!(player, ?spawn, "player connected");
        Ok(())
    }

    /// Move a logged-in player into the play state.
    pub fn complete_login(&mut self, player: &str) -> Result<()> {
        let slot = self.slot_mut(player)?;
        slot.connection.transition(ConnectionState::Play)?;
        tracing::info!(player, "player entered play");
        Ok(())
    }

    /// Close the connection of `player` and drop its slot.
    pub fn leave(&mut self, player: &str) -> Result<PlayerSlot> {
        let mut slot = self
            .players
            .remove(player)
            .ok_or_else(|| SimulationError::UnknownPlayer(player.to_owned()))?;
        slot.connection.disconnect();
        self.gate.forget(player);
        tracing::info!(player, "player left");
        Ok(slot)
    }

    /// Replace the movement input of `player`.
    pub fn set_input(&mut self, player: &str, input: PlayerInput) -> Result<()> {
        self.slot_mut(player)?.input = input;
        Ok(())
    }

    /// Make `player` jump. Returns false when it is not on the ground.
    pub fn jump(&mut self, player: &str) -> Result<bool> {
        let slot = self
            .players
            .get_mut(player)
            .ok_or_else(|| SimulationError::UnknownPlayer(player.to_owned()))?;
        Ok(self.integrator.jump(&mut slot.motion))
    }

    /// Judge a client movement request.
    ///
    /// An accepted position replaces the player's simulated position and
    /// suspends physics for the grace period.
    pub fn handle_move_request(&mut self, request: &MovementRequest) -> Result<MovementResponse> {
        let player = request.player.as_str();
        let state = self
            .players
            .get(player)
            .ok_or_else(|| SimulationError::UnknownPlayer(player.to_owned()))?
            .connection;
        if !state.receives_physics() {
            return Err(SimulationError::NotPlaying {
                player: player.to_owned(),
                state,
            });
        }

        let others = self.roster_without(player);
        let verdict = self
            .gate
            .validate_move(&self.detector, player, request.position, &others)?;

        if verdict.is_ok() {
            let on_ground = self
                .integrator
                .has_support(&self.detector, verdict.position, &others);
            let suppress_until = self.tick + self.config.grace_ticks();
            let slot = self.slot_mut(player)?;
            slot.motion.position = verdict.position;
            slot.motion.velocity.y = 0.0;
            slot.motion.on_ground = on_ground;
            slot.suppress_until_tick = suppress_until;
        }

        Ok(MovementResponse {
            player: request.player.clone(),
            status: verdict.status,
            position: verdict.position,
        })
    }

    /// Place a block, computing its collision flag from the current policy.
    ///
    /// Refused when the voxel lies outside the world or would overlap any
    /// player's body. Placing air clears the cell.
    pub fn place_block(
        &mut self,
        coord: VoxelCoord,
        block_type: BlockType,
        owner: Option<String>,
    ) -> Result<()> {
        self.check_voxel_in_world(coord)?;
        if block_type.is_air() {
            self.remove_block(coord);
            return Ok(());
        }
        let cell = coord.aabb();
        if self
            .players
            .values()
            .any(|slot| {
                self.detector
                    .body_aabb(slot.motion.position)
                    .intersects(&cell)
            })
        {
            return Err(SimulationError::Occupied(coord));
        }

        let record = self.solidity.create_block_data(block_type, None, owner);
        tracing::debug!(%coord, %block_type, collision = record.collision, "block placed");
        self.world.write().insert(coord, record);
        Ok(())
    }

    /// Remove a block, returning it.
    pub fn remove_block(&mut self, coord: VoxelCoord) -> Option<BlockRecord> {
        let removed = self.world.write().remove(coord);
        if let Some(record) = &removed {
            tracing::debug!(%coord, block_type = %record.block_type, "block removed");
        }
        removed
    }

    /// Advance every playing slot by one tick.
    pub fn tick(&mut self) -> TickSummary {
        let tick = self.tick;
        let _span = tracing::trace_span!("tick", tick).entered();

        let dt = self.config.tick_dt();
        let roster = self.roster();
        let detector = &self.detector;
        let integrator = &self.integrator;
        let auditor = &self.auditor;

        let results: Vec<Advanced> = self
            .players
            .par_iter_mut()
            .filter(|(_, slot)| slot.connection.receives_physics())
            .map(|(name, slot)| {
                let others: Vec<OtherPlayer> = roster
                    .iter()
                    .filter(|(other, _)| other != name)
                    .map(|(_, body)| *body)
                    .collect();

                let old = slot.motion.position;
                let skip = slot.suppressed_at(tick);
                if !skip {
                    slot.apply_input();
                }
                let before = slot.motion;
                slot.motion = integrator.update_position(detector, before, dt, &others, skip);

                let outcome = auditor.audit(detector, name, old, slot.motion.position);
                let embedded = matches!(outcome, AuditOutcome::Embedded { .. });
                if outcome.recommend_disconnect() {
                    slot.connection.disconnect();
                }
                Advanced {
                    name: name.clone(),
                    before,
                    skip,
                    embedded,
                    reverted: false,
                }
            })
            .collect();

        let simulated = results.len();
        let mut disconnected = Vec::new();
        let mut advanced = Vec::with_capacity(simulated);
        for result in results {
            if result.embedded {
                tracing::warn!(
                    player = %result.name,
                    "disconnecting player embedded in solid geometry"
                );
                self.players.remove(&result.name);
                self.gate.forget(&result.name);
                disconnected.push(result.name);
            } else {
                advanced.push(result);
            }
        }

        self.separate_players(&mut advanced, dt);
        for result in &advanced {
            if let Some(slot) = self.players.get(&result.name) {
                // Physics moved the player; the next request is judged from here.
                self.gate.register(&result.name, slot.motion.position);
            }
        }

        self.tick += 1;
        TickSummary {
            tick,
            simulated,
            disconnected,
        }
    }

    /// Undo moves that left two bodies overlapping.
    ///
    /// Every slot moved against the roster of the tick start, so two players
    /// can step into the same gap. Overlapping movers go back to where they
    /// started, along with anyone who moved into those starting spots, and
    /// are then moved again one at a time in name order against the current
    /// positions of everyone else.
    fn separate_players(&mut self, advanced: &mut [Advanced], dt: f32) {
        loop {
            let mut changed = false;
            for result in &mut *advanced {
                if result.reverted {
                    continue;
                }
                let Some(slot) = self.players.get(&result.name) else {
                    continue;
                };
                let position = slot.motion.position;
                let others = self.roster_without(&result.name);
                if self.detector.check_player_collision(position, &others) {
                    if let Some(slot) = self.players.get_mut(&result.name) {
                        slot.motion = result.before;
                    }
                    result.reverted = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        advanced.sort_by(|a, b| a.name.cmp(&b.name));
        for result in advanced.iter().filter(|result| result.reverted) {
            let others = self.roster_without(&result.name);
            let motion = self.integrator.update_position(
                &self.detector,
                result.before,
                dt,
                &others,
                result.skip,
            );
            if let Some(slot) = self.players.get_mut(&result.name) {
                slot.motion = motion;
            }
            tracing::debug!(
                player = %result.name,
                position = ?motion.position,
                "player re-resolved"
            );
        }
    }

    fn check_voxel_in_world(&self, coord: VoxelCoord) -> Result<()> {
        let physics = &self.config.physics;
        let size = i64::from(physics.world_size);
        let height = i64::from(physics.world_height);
        let inside = |v: i32, limit: i64| (0..limit).contains(&i64::from(v));
        if inside(coord.x, size) && inside(coord.y, height) && inside(coord.z, size) {
            Ok(())
        } else {
            let message = format!("voxel {coord} is outside the world");
            Err(CoreError::OutOfBounds(message).into())
        }
    }

    fn slot_mut(&mut self, player: &str) -> Result<&mut PlayerSlot> {
        self.players
            .get_mut(player)
            .ok_or_else(|| SimulationError::UnknownPlayer(player.to_owned()))
    }

    /// Bodies of every live player.
    fn roster(&self) -> Vec<(String, OtherPlayer)> {
        let half_width = self.detector.half_width();
        let height = self.detector.height();
        self.players
            .iter()
            .filter(|(_, slot)| slot.connection.is_live())
            .map(|(name, slot)| {
                (
                    name.clone(),
                    OtherPlayer::new(slot.motion.position, half_width, height),
                )
            })
            .collect()
    }

    fn roster_without(&self, player: &str) -> Vec<OtherPlayer> {
        let half_width = self.detector.half_width();
        let height = self.detector.height();
        self.players
            .iter()
            .filter(|(name, slot)| name.as_str() != player && slot.connection.is_live())
            .map(|(_, slot)| OtherPlayer::new(slot.motion.position, half_width, height))
            .collect()
    }
}

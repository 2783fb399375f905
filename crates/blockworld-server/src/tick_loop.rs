//! Fixed-rate tick loop on a dedicated thread.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use blockworld_core::{BlockType, VoxelCoord};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use glam::Vec3;

use crate::error::{Result, SimulationError};
use crate::protocol::{MovementRequest, MovementResponse};
use crate::simulation::{PlayerInput, Simulation, TickSummary};

/// Work sent to the tick loop.
#[derive(Debug, Clone)]
pub enum TickCommand {
    Move(MovementRequest),
    Jump(String),
    Input { player: String, input: PlayerInput },
    Join { player: String, spawn: Vec3 },
    Leave(String),
    PlaceBlock {
        coord: VoxelCoord,
        block_type: BlockType,
        owner: Option<String>,
    },
    RemoveBlock(VoxelCoord),
    Shutdown,
}

impl TickCommand {
    const fn name(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::Jump(_) => "jump",
            Self::Input { .. } => "input",
            Self::Join { .. } => "join",
            Self::Leave(_) => "leave",
            Self::PlaceBlock { .. } => "place_block",
            Self::RemoveBlock(_) => "remove_block",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Results reported by the tick loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    MovementResponse(MovementResponse),
    /// A player was dropped by the simulation.
    Disconnected { player: String },
    Tick(TickSummary),
    /// A command could not be applied.
    Rejected {
        command: &'static str,
        reason: String,
    },
}

/// Handle to a running tick loop.
///
/// Dropping the handle stops the loop and joins its thread.
pub struct TickLoopHandle {
    command_tx: Sender<TickCommand>,
    event_rx: Receiver<TickEvent>,
    thread: Option<JoinHandle<Simulation>>,
}

impl TickLoopHandle {
    /// Move `simulation` onto a new `tick-loop` thread ticking `tick_rate`
    /// times per second.
    pub fn spawn(simulation: Simulation, tick_rate: u32) -> Result<Self> {
        let (command_tx, command_rx) = channel::bounded::<TickCommand>(256);
        let (event_tx, event_rx) = channel::bounded::<TickEvent>(1024);
        let period = Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1)));

        let thread = thread::Builder::new()
            .name("tick-loop".to_string())
            .spawn(move || Self::run(simulation, period, &command_rx, &event_tx))?;
        tracing::info!(tick_rate, "tick loop started");

        Ok(Self {
            command_tx,
            event_rx,
            thread: Some(thread),
        })
    }

    /// Queue a command without blocking.
    pub fn send(&self, command: TickCommand) -> Result<()> {
        self.command_tx.try_send(command).map_err(|err| match err {
            TrySendError::Full(_) => SimulationError::QueueFull,
            TrySendError::Disconnected(_) => SimulationError::TickLoopStopped,
        })
    }

    /// Next event, if one is ready.
    pub fn try_recv(&self) -> Option<TickEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Next event, waiting up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<TickEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Stop the loop and take the simulation back.
    ///
    /// Returns `None` if the loop already stopped or its thread panicked.
    pub fn shutdown(&mut self) -> Option<Simulation> {
        // The loop may already be gone; joining below covers both cases.
        let _ = self.command_tx.send(TickCommand::Shutdown);
        let simulation = self.thread.take()?.join().ok();
        tracing::info!("tick loop stopped");
        simulation
    }

    fn run(
        mut simulation: Simulation,
        period: Duration,
        command_rx: &Receiver<TickCommand>,
        event_tx: &Sender<TickEvent>,
    ) -> Simulation {
        let mut next_tick = Instant::now() + period;
        loop {
            let now = Instant::now();
            if now >= next_tick {
                let summary = simulation.tick();
                for player in &summary.disconnected {
                    let player = player.clone();
                    emit(event_tx, TickEvent::Disconnected { player });
                }
                emit(event_tx, TickEvent::Tick(summary));

                next_tick += period;
                if next_tick < now {
                    // Fell behind; skip the missed ticks rather than bursting.
                    tracing::debug!("tick loop overran its period");
                    next_tick = now + period;
                }
                continue;
            }

            match command_rx.recv_timeout(next_tick - now) {
                Ok(TickCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => Self::apply(&mut simulation, command, event_tx),
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
        simulation
    }

    fn apply(simulation: &mut Simulation, command: TickCommand, event_tx: &Sender<TickEvent>) {
        let name = command.name();
        let result = match command {
            TickCommand::Move(request) => simulation
                .handle_move_request(&request)
                .map(|response| emit(event_tx, TickEvent::MovementResponse(response))),
            TickCommand::Jump(player) => simulation.jump(&player).map(drop),
            TickCommand::Input { player, input } => simulation.set_input(&player, input),
            TickCommand::Join { player, spawn } => simulation.join(&player, spawn),
            TickCommand::Leave(player) => simulation
                .leave(&player)
                .map(|_| emit(event_tx, TickEvent::Disconnected { player })),
            TickCommand::PlaceBlock {
                coord,
                block_type,
                owner,
            } => simulation.place_block(coord, block_type, owner),
            TickCommand::RemoveBlock(coord) => {
                simulation.remove_block(coord);
                Ok(())
            }
            TickCommand::Shutdown => Ok(()),
        };

        if let Err(err) = result {
            tracing::debug!(command = name, %err, "command rejected");
            emit(
                event_tx,
                TickEvent::Rejected {
                    command: name,
                    reason: err.to_string(),
                },
            );
        }
    }
}

impl Drop for TickLoopHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Send an event without blocking the loop. Events are dropped when nobody
/// drains the queue.
fn emit(event_tx: &Sender<TickEvent>, event: TickEvent) {
    if let Err(TrySendError::Full(event)) = event_tx.try_send(event) {
        tracing::trace!(?event, "event queue full, dropping event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockworld_core::BlockRecord;
    use blockworld_world::World;

    use crate::config::ServerConfig;
    use crate::protocol::MoveStatus;

    const WAIT: Duration = Duration::from_secs(5);

    fn spawn_loop() -> TickLoopHandle {
        let mut world = World::new();
        world.fill(
            VoxelCoord::new(0, 4, 0),
            VoxelCoord::new(20, 4, 20),
            &BlockRecord::new(BlockType::Stone, true),
        );
        let config = ServerConfig::default().with_tick_rate(100);
        let simulation = Simulation::new(config, world.into_shared()).unwrap();
        TickLoopHandle::spawn(simulation, 100).unwrap()
    }

    /// Wait for the first event matching `pred`.
    fn wait_for(handle: &TickLoopHandle, pred: impl Fn(&TickEvent) -> bool) -> Option<TickEvent> {
        let deadline = Instant::now() + WAIT;
        while Instant::now() < deadline {
            if let Some(event) = handle.recv_timeout(Duration::from_millis(50)) {
                if pred(&event) {
                    return Some(event);
                }
            }
        }
        None
    }

    #[test]
    fn ticks_are_reported() {
        let handle = spawn_loop();
        let event = wait_for(&handle, |event| matches!(event, TickEvent::Tick(_)));
        assert!(event.is_some());
    }

    #[test]
    fn move_request_gets_a_response() {
        let handle = spawn_loop();
        handle
            .send(TickCommand::Join {
                player: "alice".into(),
                spawn: Vec3::new(10.0, 4.501, 10.0),
            })
            .unwrap();
        let target = Vec3::new(10.5, 4.501, 10.0);
        handle
            .send(TickCommand::Move(MovementRequest::new("alice", target)))
            .unwrap();

        let event = wait_for(&handle, |event| matches!(event, TickEvent::MovementResponse(_)));
        match event {
            Some(TickEvent::MovementResponse(response)) => {
                assert_eq!(response.player, "alice");
                assert_eq!(response.status, MoveStatus::Ok);
            }
            other => panic!("expected a movement response, got {other:?}"),
        }
    }

    #[test]
    fn bad_commands_are_rejected_not_fatal() {
        let handle = spawn_loop();
        handle.send(TickCommand::Jump("ghost".into())).unwrap();
        let event = wait_for(&handle, |event| matches!(event, TickEvent::Rejected { .. }));
        assert!(matches!(
            event,
            Some(TickEvent::Rejected {
                command: "jump",
                ..
            })
        ));

        // Still ticking afterwards.
        let tick = wait_for(&handle, |event| matches!(event, TickEvent::Tick(_)));
        assert!(tick.is_some());
    }

    #[test]
    fn shutdown_returns_simulation() {
        let mut handle = spawn_loop();
        handle
            .send(TickCommand::PlaceBlock {
                coord: VoxelCoord::new(5, 5, 5),
                block_type: BlockType::Log,
                owner: None,
            })
            .unwrap();
        // Commands are applied in order, so the block exists once join is seen.
        handle
            .send(TickCommand::Join {
                player: "bob".into(),
                spawn: Vec3::new(15.0, 4.501, 15.0),
            })
            .unwrap();
        handle.send(TickCommand::Leave("bob".into())).unwrap();
        let left = wait_for(&handle, |event| {
            matches!(event, TickEvent::Disconnected { .. })
        });
        assert!(left.is_some());

        let simulation = handle.shutdown().unwrap();
        assert!(simulation.world().read().contains(VoxelCoord::new(5, 5, 5)));
        assert!(handle.shutdown().is_none());
        assert!(matches!(
            handle.send(TickCommand::Jump("bob".into())),
            Err(SimulationError::TickLoopStopped)
        ));
    }
}

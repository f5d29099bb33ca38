// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Goo sandbox
// Headless run of a scene with a short scripted input sequence.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use goo_agents::player_agent::PlayerAgent;
use goo_sdk::prelude::*;
use goo_sdk::{GameConfig, GameWorld, PlayerCommand};

#[derive(Parser, Debug)]
#[command(name = "sandbox")]
#[command(version, about, long_about = None)]
struct Args {
    /// RON scene to load
    #[arg(default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/scenes/demo.ron"))]
    scene: PathBuf,

    /// Seconds of game time to simulate
    #[arg(short, long, default_value_t = 10.0)]
    seconds: f32,

    /// Name of the player agent to report on
    #[arg(short, long, default_value = "player")]
    player: String,

    /// Disable the scripted input
    #[arg(long)]
    idle: bool,
}

const FRAME: f32 = 1.0 / 60.0;

/// Input replayed by the sandbox, keyed by frame.
const SCRIPT: &[(u64, PlayerCommand)] = &[
    (30, PlayerCommand::Move { direction: Vec2::X }),
    (
        60,
        PlayerCommand::Shoot {
            target: Vec2::new(8.0, 4.0),
            force: 1.0,
        },
    ),
    (120, PlayerCommand::ChangeControl),
    (150, PlayerCommand::Move { direction: Vec2::X }),
    (240, PlayerCommand::ChangeControl),
    (
        300,
        PlayerCommand::Shoot {
            target: Vec2::new(-8.0, 4.0),
            force: 0.5,
        },
    ),
    (420, PlayerCommand::Sacrifice),
];

/// Logs the game-level events presentation code would react to.
struct Reporter {
    game_over: bool,
}

impl EventListener<PhysicsWorld> for Reporter {
    fn handle_event(
        &mut self,
        event: &EventPtr,
        _bus: &mut EventBus<PhysicsWorld>,
        _ctx: &mut PhysicsWorld,
    ) -> bool {
        match event.data() {
            EventData::BlobHealthChanged {
                integrity, is_main, ..
            } => {
                log::info!(
                    "[{:6.2}s] blob integrity {integrity:.0} (main: {is_main})",
                    event.timestamp()
                );
            }
            EventData::Collected { points, .. } => {
                log::info!("[{:6.2}s] collected {points} points", event.timestamp());
            }
            EventData::BlobDeath(info) => {
                log::info!(
                    "[{:6.2}s] blob died at ({:.1}, {:.1}), {} bodies hit",
                    event.timestamp(),
                    info.position.x,
                    info.position.y,
                    info.affected_bodies.len()
                );
            }
            EventData::GameOver { .. } => {
                log::warn!("[{:6.2}s] game over", event.timestamp());
                self.game_over = true;
            }
            _ => {}
        }
        false
    }

    fn listener_name(&self) -> &str {
        "sandbox-reporter"
    }
}

fn report(world: &GameWorld, player: &str) {
    let Some(agent) = world.agent_as::<PlayerAgent>(player) else {
        log::info!("'{player}' is gone.");
        return;
    };
    if let Some(main) = agent.main_blob() {
        let position = main.position();
        log::info!(
            "main blob at ({:.2}, {:.2}), integrity {:.0}%, radius {:.2}, {} skin contacts",
            position.x,
            position.y,
            main.integrity_percent() * 100.0,
            main.radius(),
            main.skin_contacts()
        );
    }
    log::info!(
        "score {}, {} thrown blob(s), controlling {}",
        agent.score(),
        agent.scattered_blobs().len() + usize::from(agent.secondary_blob().is_some()),
        if agent.is_controlling_secondary() {
            "secondary"
        } else {
            "main"
        }
    );
}

fn main() -> Result<()> {
    goo_infra::logging::init("info");
    let args = Args::parse();

    let config = GameConfig::load(&args.scene)?;
    let mut world = GameWorld::from_config(&config)
        .with_context(|| format!("Failed to build scene '{}'", args.scene.display()))?;

    let reporter = Rc::new(RefCell::new(Reporter { game_over: false }));
    let handle: ListenerHandle<PhysicsWorld> = reporter.clone();
    for kind in [
        EventKind::BlobHealthChanged,
        EventKind::Collected,
        EventKind::BlobDeath,
        EventKind::GameOver,
    ] {
        world.add_listener(&handle, kind)?;
    }

    let frames = (args.seconds / FRAME).round() as u64;
    let mut lines = DebugLines::default();
    log::info!("Running '{}' for {frames} frames.", args.scene.display());
    for frame in 0..frames {
        if !args.idle {
            for (_, command) in SCRIPT.iter().filter(|(at, _)| *at == frame) {
                world.inbox().send(*command);
            }
        }
        world.tick(FRAME);

        if frame % 60 == 59 {
            lines.clear();
            world.debug_draw(&mut lines);
            log::info!(
                "--- t = {:.1}s, {} debug lines ---",
                world.bus().now(),
                lines.line_count()
            );
            report(&world, &args.player);
        }
        if reporter.borrow().game_over {
            break;
        }
    }

    world.remove_listener(&handle);
    world.shutdown();
    Ok(())
}

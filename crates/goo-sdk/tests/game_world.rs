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

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;

use approx::assert_relative_eq;
use goo_agents::player_agent::{PlayerAgent, PlayerParams};
use goo_agents::solid_agent::SolidParams;
use goo_agents::{AgentParams, AgentSpec};
use goo_core::event::{EventBus, EventKind, EventListener, EventPtr, ListenerHandle};
use goo_core::math::{Aabb, Vec2};
use goo_infra::NativeWorld;
use goo_lanes::blob_lane::BlobParams;
use goo_lanes::physics_lane::{DebugLines, PhysicsConfig, PhysicsWorld};
use goo_sdk::{GameConfig, GameWorld, PlayerCommand};

#[derive(Default)]
struct Observer {
    kinds: Vec<EventKind>,
}

impl EventListener<PhysicsWorld> for Observer {
    fn handle_event(
        &mut self,
        event: &EventPtr,
        _bus: &mut EventBus<PhysicsWorld>,
        _ctx: &mut PhysicsWorld,
    ) -> bool {
        self.kinds.push(event.kind());
        false
    }
}

fn player_at(position: Vec2) -> AgentParams {
    AgentParams::Player(PlayerParams {
        blob: BlobParams {
            position,
            ..Default::default()
        },
        ..Default::default()
    })
}

fn scene(player: Vec2) -> GameConfig {
    GameConfig {
        physics: PhysicsConfig::default(),
        agents: vec![
            AgentSpec {
                name: "ground".into(),
                params: AgentParams::Solid(SolidParams::static_box(
                    Vec2::new(0.0, -0.5),
                    Vec2::new(20.0, 0.5),
                )),
            },
            AgentSpec {
                name: "player".into(),
                params: player_at(player),
            },
        ],
    }
}

#[test]
fn test_world_spawns_scene_agents_in_order() {
    let world = GameWorld::from_config(&scene(Vec2::new(0.0, 2.5))).unwrap();
    let registry = world.registry();
    assert_eq!(registry.names(), vec!["ground", "player"]);
    assert_eq!(world.physics().body_count(), 10);
}

#[test]
fn test_duplicate_scene_agent_fails_the_build() {
    let mut config = scene(Vec2::ZERO);
    config.agents.push(config.agents[0].clone());
    assert!(GameWorld::from_config(&config).is_err());
}

#[test]
fn test_blob_lands_on_the_ground() {
    let mut world = GameWorld::from_config(&scene(Vec2::new(0.0, 2.5))).unwrap();
    let mut steps = 0;
    for _ in 0..120 {
        steps += world.tick(1.0 / 60.0);
    }
    assert!(steps >= 118, "only {steps} steps in two seconds");
    assert_eq!(world.ticks(), 120);

    let player = world.agent_as::<PlayerAgent>("player").unwrap();
    let main = player.main_blob().unwrap();
    assert!(main.skin_contacts() > 0);
    let center = main.position();
    assert!(center.y > 0.5 && center.y < 2.5, "center at {center:?}");
    assert_relative_eq!(main.integrity(), 100.0);
}

#[test]
fn test_commands_from_another_thread_reach_the_player() {
    let mut world = GameWorld::from_config(&scene(Vec2::new(0.0, 2.5))).unwrap();
    let sender = world.command_sender();
    thread::spawn(move || {
        sender
            .send(PlayerCommand::Shoot {
                target: Vec2::new(10.0, 2.5),
                force: 1.0,
            })
            .unwrap();
    })
    .join()
    .unwrap();
    assert_eq!(world.inbox().len(), 1);

    world.tick(1.0 / 60.0);
    assert!(world.inbox().is_empty());
    let player = world.agent_as::<PlayerAgent>("player").unwrap();
    assert!(player.secondary_blob().is_some());
    assert!(!player.is_controlling_secondary());
    assert_relative_eq!(player.main_blob().unwrap().integrity(), 80.0);
}

#[test]
fn test_leaving_the_world_ends_the_game() {
    let mut config = scene(Vec2::new(0.0, 60.0));
    config.physics.world_bounds = Some(Aabb::from_min_max(
        Vec2::new(-50.0, -50.0),
        Vec2::new(50.0, 50.0),
    ));
    let mut world = GameWorld::from_config(&config).unwrap();
    let observer = Rc::new(RefCell::new(Observer::default()));
    let handle: ListenerHandle<PhysicsWorld> = observer.clone();
    world.add_listener(&handle, EventKind::GameOver).unwrap();

    world.tick(1.0 / 60.0);
    assert_eq!(observer.borrow().kinds, vec![EventKind::GameOver]);
    assert!(world.registry().agent("player").is_none());
    assert_eq!(world.physics().body_count(), 1);
    assert_eq!(world.remove_listener(&handle), 1);
}

#[test]
fn test_shutdown_releases_everything() {
    let mut world = GameWorld::from_config(&scene(Vec2::new(0.0, 2.5))).unwrap();
    assert!(world.move_blob(Vec2::X));
    world.shutdown();

    assert_eq!(world.physics().body_count(), 0);
    assert_eq!(world.registry().live_count(), 0);
    assert_eq!(world.bus().pending_count(), 0);
    // Nobody listens any more.
    assert!(!world.move_blob(Vec2::X));
    world.shutdown();
}

#[test]
fn test_debug_draw_collects_lines() {
    let world = GameWorld::new(Box::new(NativeWorld::default()), PhysicsConfig::default()).unwrap();
    let mut lines = DebugLines::default();
    world.debug_draw(&mut lines);
    assert_eq!(lines.line_count(), 0);

    let world = GameWorld::from_config(&scene(Vec2::ZERO)).unwrap();
    world.debug_draw(&mut lines);
    assert!(lines.line_count() > 0);
}

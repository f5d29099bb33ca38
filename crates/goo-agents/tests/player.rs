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

mod common;

use approx::assert_relative_eq;
use common::{contact, Harness};
use goo_agents::player_agent::{PlayerAgent, PlayerParams};
use goo_agents::solid_agent::{SolidAgent, SolidParams};
use goo_agents::collectable_agent::{CollectableAgent, CollectableParams};
use goo_agents::AgentParams;
use goo_core::agent::AgentId;
use goo_core::event::{EventData, EventKind};
use goo_core::math::Vec2;
use goo_core::physics::{BodyHandle, ContactPhase};

fn spawn_player(h: &mut Harness) -> AgentId {
    h.create("player", AgentParams::Player(PlayerParams::default()))
}

fn spawn_ground(h: &mut Harness) -> (AgentId, BodyHandle) {
    let id = h.create(
        "ground",
        AgentParams::Solid(SolidParams::static_box(
            Vec2::new(0.0, -6.0),
            Vec2::new(20.0, 1.0),
        )),
    );
    let body = h
        .registry
        .borrow()
        .agent_as::<SolidAgent>("ground")
        .and_then(|s| s.body())
        .unwrap();
    (id, body)
}

fn with_player<R>(h: &Harness, f: impl FnOnce(&PlayerAgent) -> R) -> R {
    let registry = h.registry.borrow();
    f(registry.agent_as::<PlayerAgent>("player").unwrap())
}

fn main_outer(h: &Harness) -> BodyHandle {
    with_player(h, |p| p.main_blob().unwrap().outer_bodies()[0])
}

fn throw(h: &mut Harness) {
    h.queue(EventData::ShootBlob {
        target: Vec2::new(5.0, 0.0),
        force: 1.0,
    });
    h.tick_agents(0.0);
}

#[test]
fn test_small_hit_from_static_body_costs_ten_integrity() {
    let mut h = Harness::new();
    let (ground, ground_body) = spawn_ground(&mut h);
    let player = spawn_player(&mut h);
    let outer = main_outer(&h);

    let delivered = h.trigger(contact(
        ContactPhase::Result,
        (ground_body, Some(ground)),
        (outer, Some(player)),
        25.0,
    ));
    assert!(delivered);

    with_player(&h, |p| {
        let main = p.main_blob().unwrap();
        assert_relative_eq!(main.integrity(), 90.0);
        assert_relative_eq!(main.radius(), 2.0 - 2.0 / 30.0, epsilon = 1e-5);
    });

    h.tick_agents(0.0);
    let recorder = h.recorder.borrow();
    assert_eq!(recorder.count(EventKind::BlobHealthChanged), 1);
    assert!(matches!(
        recorder.events[0].data(),
        EventData::BlobHealthChanged { integrity, is_main: true, .. } if *integrity == 90.0
    ));
}

#[test]
fn test_hit_at_twice_the_threshold_takes_the_heavy_tier() {
    let mut h = Harness::new();
    let (ground, ground_body) = spawn_ground(&mut h);
    let player = spawn_player(&mut h);
    let outer = main_outer(&h);
    let threshold = with_player(&h, |p| p.main_blob().unwrap().params().damage_force);

    assert!(h.trigger(contact(
        ContactPhase::Result,
        (ground_body, Some(ground)),
        (outer, Some(player)),
        2.0 * threshold,
    )));

    with_player(&h, |p| {
        let main = p.main_blob().unwrap();
        assert_relative_eq!(main.integrity(), 80.0);
        assert_relative_eq!(main.radius(), 2.0 - 2.0 / 10.0, epsilon = 1e-5);
    });
}

#[test]
fn test_contact_between_own_blobs_does_no_damage() {
    let mut h = Harness::new();
    let player = spawn_player(&mut h);
    throw(&mut h);
    let (outer, thrown) = with_player(&h, |p| {
        (
            p.main_blob().unwrap().outer_bodies()[0],
            p.secondary_blob().unwrap().id(),
        )
    });

    h.trigger(contact(
        ContactPhase::Result,
        (outer, Some(player)),
        (thrown, Some(player)),
        500.0,
    ));
    with_player(&h, |p| assert_relative_eq!(p.main_blob().unwrap().integrity(), 80.0));
}

#[test]
fn test_throw_then_change_keeps_main_in_control() {
    let mut h = Harness::new();
    spawn_player(&mut h);

    h.queue(EventData::ShootBlob {
        target: Vec2::new(5.0, 0.0),
        force: 1.0,
    });
    h.queue(EventData::ChangeBlobControl);
    h.tick_agents(0.0);

    with_player(&h, |p| {
        assert!(p.secondary_blob().is_some());
        assert!(!p.is_controlling_secondary());
        assert!(p.main_blob().unwrap().is_active());
        assert_relative_eq!(p.main_blob().unwrap().integrity(), 80.0);
        let thrown = p.secondary_blob().unwrap();
        assert_relative_eq!(thrown.radius(), 1.0);
        assert_relative_eq!(thrown.integrity(), 50.0);
        assert_eq!(thrown.bodies().count(), 7);
        let main_params = p.main_blob().unwrap().params();
        assert_relative_eq!(
            thrown.params().spoke_frequency,
            main_params.spoke_frequency * 0.5
        );
    });

    // Lockout over: control goes to the thrown blob.
    h.tick_agents(0.6);
    h.queue(EventData::ChangeBlobControl);
    h.tick_agents(0.0);
    with_player(&h, |p| {
        assert!(p.is_controlling_secondary());
        assert!(p.secondary_blob().unwrap().is_active());
        assert!(!p.main_blob().unwrap().is_active());
    });

    // Locked out again right after the change.
    h.queue(EventData::ChangeBlobControl);
    h.tick_agents(0.0);
    with_player(&h, |p| assert!(p.is_controlling_secondary()));

    h.tick_agents(0.6);
    h.queue(EventData::ChangeBlobControl);
    h.tick_agents(0.0);
    with_player(&h, |p| {
        assert!(!p.is_controlling_secondary());
        assert!(p.secondary_blob().is_none());
        assert_eq!(p.scattered_blobs().len(), 1);
        assert!(!p.scattered_blobs()[0].is_active());
        assert!(p.main_blob().unwrap().is_active());
    });
}

#[test]
fn test_throw_needs_integrity_and_no_secondary() {
    let mut h = Harness::new();
    spawn_player(&mut h);
    throw(&mut h);
    throw(&mut h);
    with_player(&h, |p| {
        assert_relative_eq!(p.main_blob().unwrap().integrity(), 80.0);
        assert!(p.scattered_blobs().is_empty());
    });

    let mut h = Harness::new();
    h.create(
        "player",
        AgentParams::Player(PlayerParams {
            critical_integrity: 100.0,
            ..Default::default()
        }),
    );
    throw(&mut h);
    with_player(&h, |p| assert!(p.secondary_blob().is_none()));
}

#[test]
fn test_touching_blob_merges_back_after_merge_time() {
    let mut h = Harness::new();
    let player = spawn_player(&mut h);
    throw(&mut h);
    let (outer, thrown) = with_player(&h, |p| {
        (
            p.main_blob().unwrap().outer_bodies()[0],
            p.secondary_blob().unwrap().outer_bodies()[4],
        )
    });
    let thrown_id = with_player(&h, |p| p.secondary_blob().unwrap().id());

    for (a, b) in [(outer, thrown), (thrown, outer)] {
        h.trigger(contact(
            ContactPhase::Added,
            (a, Some(player)),
            (b, Some(player)),
            0.0,
        ));
    }
    with_player(&h, |p| assert_eq!(p.merge_contacts(thrown_id), 2));

    h.tick_agents(0.6);
    with_player(&h, |p| assert!(p.secondary_blob().is_some()));
    h.tick_agents(0.6);
    with_player(&h, |p| {
        assert!(p.secondary_blob().is_none());
        assert!(p.scattered_blobs().is_empty());
        assert_relative_eq!(p.main_blob().unwrap().integrity(), 90.0);
    });
    assert_eq!(h.recorder.borrow().count(EventKind::BlobDeath), 1);
    assert_eq!(h.world().body_count(), 9);
}

#[test]
fn test_contact_ending_cancels_merge() {
    let mut h = Harness::new();
    let player = spawn_player(&mut h);
    throw(&mut h);
    let (outer, thrown) = with_player(&h, |p| {
        (
            p.main_blob().unwrap().outer_bodies()[0],
            p.secondary_blob().unwrap().id(),
        )
    });

    h.trigger(contact(ContactPhase::Added, (outer, Some(player)), (thrown, Some(player)), 0.0));
    h.tick_agents(0.6);
    h.trigger(contact(ContactPhase::Removed, (outer, Some(player)), (thrown, Some(player)), 0.0));
    h.tick_agents(0.6);
    with_player(&h, |p| assert!(p.secondary_blob().is_some()));
}

#[test]
fn test_collectable_is_claimed_once() {
    let mut h = Harness::new();
    let player = spawn_player(&mut h);
    let coin = h.create(
        "coin",
        AgentParams::Collectable(CollectableParams {
            position: Vec2::new(10.0, 0.0),
            points: 25,
            ..Default::default()
        }),
    );
    let coin_body = h
        .registry
        .borrow()
        .agent_as::<CollectableAgent>("coin")
        .and_then(|c| c.body())
        .unwrap();
    let outer = main_outer(&h);

    for _ in 0..2 {
        h.trigger(contact(
            ContactPhase::Added,
            (outer, Some(player)),
            (coin_body, Some(coin)),
            0.0,
        ));
    }
    h.tick_agents(0.0);

    assert_eq!(h.recorder.borrow().count(EventKind::Collected), 1);
    with_player(&h, |p| assert_eq!(p.score(), 25));
    {
        let registry = h.registry.borrow();
        let coin_agent = registry.agent_as::<CollectableAgent>("coin").unwrap();
        assert_eq!(coin_agent.collected_by(), Some(player));
    }

    h.tick_agents(1.0);
    assert!(!h.registry.borrow().is_live(coin));
    h.tick_agents(0.0);
    assert!(h.registry.borrow().agent("coin").is_none());
}

#[test]
fn test_no_pickup_while_a_blob_is_thrown() {
    let mut h = Harness::new();
    let player = spawn_player(&mut h);
    let coin = h.create(
        "coin",
        AgentParams::Collectable(CollectableParams {
            position: Vec2::new(-10.0, 0.0),
            ..Default::default()
        }),
    );
    let coin_body = h
        .registry
        .borrow()
        .agent_as::<CollectableAgent>("coin")
        .and_then(|c| c.body())
        .unwrap();
    throw(&mut h);
    let outer = main_outer(&h);

    h.trigger(contact(
        ContactPhase::Added,
        (outer, Some(player)),
        (coin_body, Some(coin)),
        0.0,
    ));
    h.tick_agents(0.0);
    assert_eq!(h.recorder.borrow().count(EventKind::Collected), 0);
}

#[test]
fn test_lethal_hit_ends_the_game() {
    let mut h = Harness::new();
    let (ground, ground_body) = spawn_ground(&mut h);
    let player = spawn_player(&mut h);
    throw(&mut h);
    let outer = main_outer(&h);

    h.trigger(contact(
        ContactPhase::Result,
        (ground_body, Some(ground)),
        (outer, Some(player)),
        60.0,
    ));

    // Triggered synchronously, before any drain.
    assert_eq!(h.recorder.borrow().count(EventKind::GameOver), 1);
    assert!(!h.registry.borrow().is_live(player));
    assert_eq!(h.world().body_count(), 1);

    h.tick_agents(0.0);
    assert!(h.registry.borrow().agent("player").is_none());
    assert_eq!(h.registry.borrow().live_count(), 1);
    assert_eq!(h.recorder.borrow().count(EventKind::BlobDeath), 2);
}

#[test]
fn test_out_of_limits_kills_player_only_for_main_blob() {
    let mut h = Harness::new();
    let player = spawn_player(&mut h);
    throw(&mut h);
    let thrown = with_player(&h, |p| p.secondary_blob().unwrap().id());

    assert!(h.trigger(EventData::OutOfLimits {
        agent: Some(player),
        body: thrown,
    }));
    with_player(&h, |p| assert!(p.secondary_blob().is_none()));
    assert!(h.registry.borrow().is_live(player));

    let outer = main_outer(&h);
    h.trigger(EventData::OutOfLimits {
        agent: Some(player),
        body: outer,
    });
    assert!(!h.registry.borrow().is_live(player));
    assert_eq!(h.recorder.borrow().count(EventKind::GameOver), 1);
}

#[test]
fn test_sacrifice_prefers_secondary_then_newest_scattered() {
    let mut h = Harness::new();
    spawn_player(&mut h);
    throw(&mut h);
    h.tick_agents(0.6);
    h.queue(EventData::ChangeBlobControl);
    h.tick_agents(0.0);
    h.tick_agents(0.6);
    h.queue(EventData::ChangeBlobControl);
    h.tick_agents(0.0);
    throw(&mut h);
    with_player(&h, |p| {
        assert_eq!(p.scattered_blobs().len(), 1);
        assert!(p.secondary_blob().is_some());
    });

    h.queue(EventData::SacrificeBlob);
    h.tick_agents(0.0);
    with_player(&h, |p| {
        assert!(p.secondary_blob().is_none());
        assert_eq!(p.scattered_blobs().len(), 1);
    });

    h.queue(EventData::SacrificeBlob);
    h.tick_agents(0.0);
    with_player(&h, |p| assert!(p.scattered_blobs().is_empty()));

    h.queue(EventData::SacrificeBlob);
    h.tick_agents(0.0);
    h.tick_agents(0.0);
    assert_eq!(h.recorder.borrow().count(EventKind::BlobDeath), 2);
}

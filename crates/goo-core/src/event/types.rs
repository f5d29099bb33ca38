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

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::math::Vec2;
use crate::physics::{BodyHandle, ContactId, ContactPhase, ShapeHandle};

/// Shared, read-only pointer to an event.
pub type EventPtr = Arc<Event>;

/// The routing key of an event. Listeners subscribe per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Two shapes started touching.
    NewCollision,
    /// Two shapes kept touching.
    PersistentCollision,
    /// Two shapes stopped touching.
    EndCollision,
    /// Solver impulses for a touching point.
    CollisionResult,
    /// A body left the world limits.
    OutOfLimits,
    /// Player input: move the controlled blob.
    MoveBlob,
    /// Player input: throw a part of the main blob.
    ShootBlob,
    /// Player input: switch the controlled blob.
    ChangeBlobControl,
    /// Player input: sacrifice the secondary or a scattered blob.
    SacrificeBlob,
    /// Presentation: move an agent to a render layer.
    RenderInLayer,
    /// Turn collectables into sensors.
    DropCollision,
    /// A blob was destroyed.
    BlobDeath,
    /// The main blob integrity changed.
    BlobHealthChanged,
    /// A collectable was picked up.
    Collected,
    /// The player died.
    GameOver,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 15] = [
        EventKind::NewCollision,
        EventKind::PersistentCollision,
        EventKind::EndCollision,
        EventKind::CollisionResult,
        EventKind::OutOfLimits,
        EventKind::MoveBlob,
        EventKind::ShootBlob,
        EventKind::ChangeBlobControl,
        EventKind::SacrificeBlob,
        EventKind::RenderInLayer,
        EventKind::DropCollision,
        EventKind::BlobDeath,
        EventKind::BlobHealthChanged,
        EventKind::Collected,
        EventKind::GameOver,
    ];

    /// The four contact kinds.
    pub const COLLISIONS: [EventKind; 4] = [
        EventKind::NewCollision,
        EventKind::PersistentCollision,
        EventKind::EndCollision,
        EventKind::CollisionResult,
    ];

    /// Maps a contact phase to the event kind it is published as.
    pub fn from_phase(phase: ContactPhase) -> Self {
        match phase {
            ContactPhase::Added => EventKind::NewCollision,
            ContactPhase::Persisted => EventKind::PersistentCollision,
            ContactPhase::Removed => EventKind::EndCollision,
            ContactPhase::Result => EventKind::CollisionResult,
        }
    }

    /// Returns `true` for the four contact kinds.
    pub fn is_collision(self) -> bool {
        Self::COLLISIONS.contains(&self)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A contact between two shapes, with both owners already resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// Which transition this contact went through.
    pub phase: ContactPhase,
    /// First shape.
    pub shape_a: ShapeHandle,
    /// Second shape.
    pub shape_b: ShapeHandle,
    /// Body of the first shape.
    pub body_a: BodyHandle,
    /// Body of the second shape.
    pub body_b: BodyHandle,
    /// Owner of the first body at the time of the step.
    pub owner_a: Option<AgentId>,
    /// Owner of the second body at the time of the step.
    pub owner_b: Option<AgentId>,
    /// Point identifier inside the pair manifold.
    pub id: ContactId,
    /// World position of the point.
    pub position: Vec2,
    /// Normal from A to B.
    pub normal: Vec2,
    /// Penetration depth, negative when overlapping.
    pub separation: f32,
    /// Normal impulse (meaningful for [`ContactPhase::Result`]).
    pub normal_impulse: f32,
    /// Friction impulse (meaningful for [`ContactPhase::Result`]).
    pub tangent_impulse: f32,
}

impl ContactEvent {
    /// Returns the body on the other side of `body`, if `body` takes part.
    pub fn other_body(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }

    /// Returns the owner tag of `body`, if `body` takes part.
    pub fn owner_of(&self, body: BodyHandle) -> Option<AgentId> {
        if self.body_a == body {
            self.owner_a
        } else if self.body_b == body {
            self.owner_b
        } else {
            None
        }
    }

    /// Returns `true` if the two bodies belong to different agents (or to none).
    pub fn between_different_agents(&self) -> bool {
        match (self.owner_a, self.owner_b) {
            (Some(a), Some(b)) => a != b,
            _ => true,
        }
    }
}

/// Payload of a [`EventKind::BlobDeath`] event.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobDeathInfo {
    /// Agent owning the destroyed blob.
    pub owner: Option<AgentId>,
    /// Last center position.
    pub position: Vec2,
    /// Last tracked radius.
    pub radius: f32,
    /// Whether the blob was the main blob of its player.
    pub is_main: bool,
    /// Dynamic bodies near the blob when it died.
    pub affected_bodies: Vec<BodyHandle>,
}

/// Typed payload of an event. The variant determines the [`EventKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    /// Any of the four contact kinds, selected by `phase`.
    Collision(ContactEvent),
    /// A body crossed the world limits.
    OutOfLimits {
        /// Owner of the body, if tagged.
        agent: Option<AgentId>,
        /// The offending body.
        body: BodyHandle,
    },
    /// Move the controlled blob.
    MoveBlob {
        /// Desired direction, not necessarily normalized.
        direction: Vec2,
    },
    /// Throw a part of the main blob.
    ShootBlob {
        /// World point to throw toward.
        target: Vec2,
        /// Force fraction, clamped to `0..=1` by the receiver.
        force: f32,
    },
    /// Switch the controlled blob.
    ChangeBlobControl,
    /// Sacrifice the secondary or newest scattered blob.
    SacrificeBlob,
    /// Move a named agent to a render layer.
    RenderInLayer {
        /// Agent name.
        agent: String,
        /// Target layer.
        layer: i32,
    },
    /// Drop collision of one named collectable, or all when `None`.
    DropCollision {
        /// Optional agent name.
        agent: Option<String>,
    },
    /// A blob was destroyed.
    BlobDeath(BlobDeathInfo),
    /// The main blob integrity changed.
    BlobHealthChanged {
        /// Owning player.
        agent: AgentId,
        /// New integrity, 0 to 100.
        integrity: f32,
        /// Whether the blob is the main blob.
        is_main: bool,
    },
    /// A collectable was claimed.
    Collected {
        /// The collectable agent.
        collectable: AgentId,
        /// The agent that picked it up.
        collector: AgentId,
        /// Score value.
        points: u32,
    },
    /// The player died.
    GameOver {
        /// The dead player.
        player: AgentId,
    },
}

impl EventData {
    /// The routing kind for this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            EventData::Collision(contact) => EventKind::from_phase(contact.phase),
            EventData::OutOfLimits { .. } => EventKind::OutOfLimits,
            EventData::MoveBlob { .. } => EventKind::MoveBlob,
            EventData::ShootBlob { .. } => EventKind::ShootBlob,
            EventData::ChangeBlobControl => EventKind::ChangeBlobControl,
            EventData::SacrificeBlob => EventKind::SacrificeBlob,
            EventData::RenderInLayer { .. } => EventKind::RenderInLayer,
            EventData::DropCollision { .. } => EventKind::DropCollision,
            EventData::BlobDeath(_) => EventKind::BlobDeath,
            EventData::BlobHealthChanged { .. } => EventKind::BlobHealthChanged,
            EventData::Collected { .. } => EventKind::Collected,
            EventData::GameOver { .. } => EventKind::GameOver,
        }
    }
}

/// An immutable, timestamped event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    timestamp: f64,
    data: EventData,
}

impl Event {
    /// Creates a new event stamped at `timestamp` seconds.
    pub fn new(timestamp: f64, data: EventData) -> Self {
        Self { timestamp, data }
    }

    /// Wraps a new event in an [`EventPtr`].
    pub fn shared(timestamp: f64, data: EventData) -> EventPtr {
        Arc::new(Self::new(timestamp, data))
    }

    /// The routing kind.
    pub fn kind(&self) -> EventKind {
        self.data.kind()
    }

    /// Time of creation in bus seconds.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// The payload.
    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// The contact payload, for collision events.
    pub fn contact(&self) -> Option<&ContactEvent> {
        match &self.data {
            EventData::Collision(contact) => Some(contact),
            _ => None,
        }
    }
}

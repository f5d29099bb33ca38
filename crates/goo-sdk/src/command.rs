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

//! Player input crossing from input threads into the game thread.

use goo_core::event::EventData;
use goo_core::math::Vec2;
use serde::{Deserialize, Serialize};

/// One player action, as produced by an input layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Push the controlled blob along `direction`.
    Move { direction: Vec2 },
    /// Throw a part of the main blob toward `target`.
    Shoot { target: Vec2, force: f32 },
    /// Swap control between the main and the secondary blob.
    ChangeControl,
    /// Destroy the secondary or the newest scattered blob.
    Sacrifice,
}

impl PlayerCommand {
    /// The bus event carrying this command to the player agent.
    pub fn into_event(self) -> EventData {
        match self {
            Self::Move { direction } => EventData::MoveBlob { direction },
            Self::Shoot { target, force } => EventData::ShootBlob { target, force },
            Self::ChangeControl => EventData::ChangeBlobControl,
            Self::Sacrifice => EventData::SacrificeBlob,
        }
    }
}

/// An unbounded channel of [`PlayerCommand`]s.
///
/// Senders are `Send` and may live on any thread; the owning `GameWorld`
/// drains the receiver at the start of every tick.
#[derive(Debug)]
pub struct CommandInbox {
    sender: flume::Sender<PlayerCommand>,
    receiver: flume::Receiver<PlayerCommand>,
}

impl CommandInbox {
    /// Creates an empty inbox.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    /// Returns a clone of the sending end.
    ///
    /// ## Returns
    /// A sender that stays valid as long as the inbox lives.
    pub fn sender(&self) -> flume::Sender<PlayerCommand> {
        self.sender.clone()
    }

    /// Sends a command from the owning thread.
    pub fn send(&self, command: PlayerCommand) {
        log::trace!("Inbox received {command:?}.");
        if let Err(e) = self.sender.send(command) {
            log::error!("Failed to send command: {e}.");
        }
    }

    /// Number of commands waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Takes every waiting command, oldest first, without blocking.
    pub fn drain(&self) -> Vec<PlayerCommand> {
        self.receiver.try_iter().collect()
    }
}

impl Default for CommandInbox {
    fn default() -> Self {
        Self::new()
    }
}

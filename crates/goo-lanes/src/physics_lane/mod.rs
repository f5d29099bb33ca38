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

//! Physics Lane
//!
//! Wraps the simulator in a name-keyed resource layer, steps it with a fixed
//! timestep and turns the buffered contacts into bus events.

mod bridge;
mod config;
mod contact_buffer;
mod debug;
mod world;

pub use bridge::PhysicsBridge;
pub use config::PhysicsConfig;
pub use contact_buffer::{ContactBuffer, ContactKey};
pub use debug::DebugLines;
pub use world::{PhysicsError, PhysicsWorld, MAX_QUERY_BODIES};

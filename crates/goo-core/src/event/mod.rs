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

//! Provides foundational primitives for event-driven communication.
//!
//! Game code never calls across subsystems directly. Producers build an
//! immutable [`Event`], wrap it in an [`EventPtr`] and either trigger it right
//! away or queue it on the double-buffered [`EventBus`] for the next drain.

mod bus;
mod types;

pub use self::bus::{BusError, EventBus, EventListener, ListenerHandle, ListenerId};
pub use self::types::{BlobDeathInfo, ContactEvent, Event, EventData, EventKind, EventPtr};

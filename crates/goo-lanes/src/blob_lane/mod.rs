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

//! Blob Lane
//!
//! Soft-body "blobs": one center body ringed by outer bodies, tied together
//! with spoke and rim distance joints. The lane builds them, tracks their
//! integrity and radius, and tears them down exactly once.

mod builder;
mod controller;
mod params;

pub use builder::*;
pub use controller::*;
pub use params::*;

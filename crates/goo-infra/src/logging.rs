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

//! `env_logger` bootstrap shared by binaries and integration tests.

use env_logger::{Builder, Env};

/// Installs the global logger, honoring `RUST_LOG` and falling back to
/// `default_filter`.
///
/// Calling it more than once is harmless: later calls leave the first
/// logger in place.
pub fn init(default_filter: &str) {
    let result = Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init();
    if result.is_ok() {
        log::debug!("Logger initialized with default filter '{default_filter}'.");
    }
}

/// Logger for tests: output is captured by the test harness.
pub fn init_for_tests() {
    let _ = Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir Vectorizer

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Wire format of the embedding payload; bumped only on breaking changes
pub const WIRE_FORMAT: &str = "base64-f32le";

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir Vectorizer {} ({})", VERSION_NUMBER, WIRE_FORMAT)
}

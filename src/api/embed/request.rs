// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedRequest type for POST /embed

use serde::{Deserialize, Serialize};

/// Request body for POST /embed
///
/// Order of `texts` is significant: response item `i` belongs to `texts[i]`.
/// Duplicates are allowed and embedded independently.
///
/// # Example
/// ```json
/// { "texts": ["Hello world", "Another text"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbedRequest {
    pub texts: Vec<String>,
}

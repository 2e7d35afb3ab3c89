// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch validation for the embed endpoint

use super::errors::InvalidInput;

/// Checks that a batch can be handed to the model
///
/// # Validation Rules
/// 1. **texts**: must contain at least one item
/// 2. **whitespace**: no text may be empty or whitespace-only
///
/// Elements are checked in request order and the first offending index is
/// reported. Trimming is only used for the check; callers keep passing the
/// original strings to the model.
pub fn validate_texts<S: AsRef<str>>(texts: &[S]) -> Result<(), InvalidInput> {
    if texts.is_empty() {
        return Err(InvalidInput::EmptyBatch);
    }

    match texts.iter().position(|text| text.as_ref().trim().is_empty()) {
        Some(index) => Err(InvalidInput::EmptyText { index }),
        None => Ok(()),
    }
}

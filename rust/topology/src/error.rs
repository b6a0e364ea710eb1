// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for model store operations.

use crate::keys::EntityKey;

/// Result type alias for model store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during model store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced entity was not found in the store.
    #[error("{0} not found")]
    NotFound(EntityKey),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

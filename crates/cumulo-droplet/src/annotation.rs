// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Droplet-source annotation.
//!
//! The only link between a running app and the droplet it was launched
//! from is an opaque annotation on the app record. Schema (v1, no version
//! field on the wire):
//!
//! ```json
//! {"droplet_source":{"droplet_name":"<name>"}}
//! ```
//!
//! Apps may be launched by other subsystems with annotations in other
//! shapes, so decoding is defensive: anything that does not match the
//! envelope is "not a match", never an error.

use serde::{Deserialize, Serialize};

/// Inner payload naming the source droplet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropletSource {
    /// Name of the droplet the app was launched from.
    pub droplet_name: String,
}

/// The annotation envelope attached to apps launched from droplets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropletAnnotation {
    /// Source droplet reference.
    pub droplet_source: DropletSource,
}

impl DropletAnnotation {
    /// Build an annotation naming the given droplet.
    pub fn for_droplet(droplet_name: impl Into<String>) -> Self {
        Self {
            droplet_source: DropletSource {
                droplet_name: droplet_name.into(),
            },
        }
    }

    /// Encode to the wire string attached to the app record.
    ///
    /// Serialization of this fixed shape cannot fail.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode a wire annotation defensively.
    ///
    /// Returns `None` for any payload that is not a v1 droplet-source
    /// envelope, including non-JSON and foreign JSON.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Whether this annotation names the given droplet.
    pub fn matches(&self, droplet_name: &str) -> bool {
        self.droplet_source.droplet_name == droplet_name
    }
}

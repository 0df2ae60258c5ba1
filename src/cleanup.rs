// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Intent-session cleanup
//!
//! An evaluation session registers intents on the remote service; after
//! the run they are deleted again through the admin collaborator.
//! Deletion is best-effort: one failed delete does not abort the rest.

use crate::classifier::IntentAdmin;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Manifest of intents registered on the remote service for one session.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentSessionManifest {
    pub intent_session_ids: Vec<String>,
}

impl IntentSessionManifest {
    /// Load the manifest. A malformed manifest is fatal: deletions must
    /// come from an accurate id list.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| {
            format!("failed to open intent session manifest: {}", path.display())
        })?;
        serde_json::from_reader(file).with_context(|| {
            format!("failed to parse intent session manifest: {}", path.display())
        })
    }
}

/// Delete every intent listed in the manifest. Individual failures are
/// logged and skipped; returns how many deletions succeeded.
pub fn delete_intents(admin: &dyn IntentAdmin, manifest: &IntentSessionManifest) -> usize {
    let mut deleted = 0;
    for intent_id in &manifest.intent_session_ids {
        match admin.delete_intent(intent_id) {
            Ok(()) => {
                tracing::debug!("Deleted intent {}", intent_id);
                deleted += 1;
            }
            Err(err) => {
                tracing::warn!("Failed to delete intent {}: {:#}", intent_id, err);
            }
        }
    }
    deleted
}

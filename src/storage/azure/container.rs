// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Blob container holding the bucket's objects.

use super::arm::{ArmClient, ArmError};
use super::naming::ResourceIds;
use crate::constants::STORAGE_API_VERSION;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Private container carrying the bucket tags as metadata.
#[must_use]
pub fn container_body(metadata: &BTreeMap<String, String>) -> Value {
    json!({
        "properties": {
            "publicAccess": "None",
            "metadata": metadata
        }
    })
}

/// Whether the container exists in the bucket's storage account.
pub async fn exists(arm: &ArmClient, ids: &ResourceIds) -> Result<bool, ArmError> {
    match arm.get(&ids.container(), STORAGE_API_VERSION).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Create the container or replace its properties.
pub async fn upsert(
    arm: &ArmClient,
    ids: &ResourceIds,
    metadata: &BTreeMap<String, String>,
) -> Result<(), ArmError> {
    arm.put(&ids.container(), STORAGE_API_VERSION, &container_body(metadata))
        .await?;
    Ok(())
}

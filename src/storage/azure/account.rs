// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Storage account backing a bucket (one account per bucket).

use super::arm::{ArmClient, ArmError};
use super::naming::ResourceIds;
use crate::constants::{AZURE_ACCESS_KEY_NAME, STORAGE_API_VERSION};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Request body of a storage account.
///
/// Blob-only, locally redundant, hot tier, HTTPS with TLS 1.2 or later and
/// Microsoft-managed encryption. Public network access is turned off for
/// private clusters, which reach the account through a private endpoint.
#[must_use]
pub fn account_body(location: &str, private: bool, tags: &BTreeMap<String, String>) -> Value {
    json!({
        "kind": "BlobStorage",
        "sku": {
            "name": "Standard_LRS"
        },
        "location": location,
        "tags": tags,
        "properties": {
            "accessTier": "Hot",
            "allowSharedKeyAccess": true,
            "supportsHttpsTrafficOnly": true,
            "minimumTlsVersion": "TLS1_2",
            "publicNetworkAccess": if private { "Disabled" } else { "Enabled" },
            "encryption": {
                "keySource": "Microsoft.Storage",
                "services": {
                    "blob": {
                        "enabled": true,
                        "keyType": "Account"
                    }
                }
            }
        }
    })
}

/// Whether the storage account exists.
pub async fn exists(arm: &ArmClient, ids: &ResourceIds) -> Result<bool, ArmError> {
    match arm.get(&ids.storage_account(), STORAGE_API_VERSION).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Create or update the storage account and wait for provisioning.
pub async fn upsert(arm: &ArmClient, ids: &ResourceIds, body: &Value) -> Result<Value, ArmError> {
    arm.put(&ids.storage_account(), STORAGE_API_VERSION, body).await
}

/// Delete the storage account; its containers go with it.
///
/// Returns `false` when the account was already gone.
pub async fn delete(arm: &ArmClient, ids: &ResourceIds) -> Result<bool, ArmError> {
    match arm.delete(&ids.storage_account(), STORAGE_API_VERSION).await {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Value of the account access key handed to workloads.
pub async fn access_key(arm: &ArmClient, ids: &ResourceIds) -> Result<Option<String>, ArmError> {
    let keys = arm.post(&ids.list_keys(), STORAGE_API_VERSION).await?;
    Ok(find_key(&keys, AZURE_ACCESS_KEY_NAME))
}

/// Look up a key by name in a `listKeys` response.
#[must_use]
pub fn find_key(keys: &Value, name: &str) -> Option<String> {
    keys.get("keys")?
        .as_array()?
        .iter()
        .find(|key| key.get("keyName").and_then(Value::as_str) == Some(name))
        .and_then(|key| key.get("value"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod account_tests;

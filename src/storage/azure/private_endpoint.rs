// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Private networking for storage accounts of private clusters.
//!
//! A private cluster reaches its storage account through a private endpoint
//! in the node subnet. Name resolution goes through the
//! `privatelink.blob.core.windows.net` zone, linked to the cluster VNet, with
//! an A record per account pointing at the endpoint addresses.

use super::arm::{ArmClient, ArmError};
use super::naming::ResourceIds;
use crate::constants::{
    AZURE_A_RECORD_TTL_SECS, AZURE_BLOB_GROUP_ID, NETWORK_API_VERSION, PRIVATE_DNS_API_VERSION,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Private DNS zones are global resources.
const PRIVATE_ZONE_LOCATION: &str = "global";

#[must_use]
pub fn private_zone_body(tags: &BTreeMap<String, String>) -> Value {
    json!({
        "location": PRIVATE_ZONE_LOCATION,
        "tags": tags
    })
}

#[must_use]
pub fn vnet_link_body(vnet_id: &str, tags: &BTreeMap<String, String>) -> Value {
    json!({
        "location": PRIVATE_ZONE_LOCATION,
        "tags": tags,
        "properties": {
            "registrationEnabled": false,
            "virtualNetwork": {
                "id": vnet_id
            }
        }
    })
}

#[must_use]
pub fn private_endpoint_body(
    ids: &ResourceIds,
    location: &str,
    tags: &BTreeMap<String, String>,
) -> Value {
    let bucket_name = ids.bucket_name();
    json!({
        "location": location,
        "tags": tags,
        "properties": {
            "customNetworkInterfaceName": format!("{bucket_name}-nodes-nic"),
            "privateLinkServiceConnections": [
                {
                    "name": bucket_name,
                    "properties": {
                        "privateLinkServiceId": ids.storage_account(),
                        "groupIds": [AZURE_BLOB_GROUP_ID]
                    }
                }
            ],
            "subnet": {
                "id": ids.subnet()
            }
        }
    })
}

/// Addresses assigned to a private endpoint, from its custom DNS configs.
#[must_use]
pub fn endpoint_addresses(endpoint: &Value) -> Vec<String> {
    endpoint
        .pointer("/properties/customDnsConfigs")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|config| config.get("ipAddresses").and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

#[must_use]
pub fn a_record_body(addresses: &[String], metadata: &BTreeMap<String, String>) -> Value {
    let records: Vec<Value> = addresses
        .iter()
        .map(|ip| json!({ "ipv4Address": ip }))
        .collect();
    json!({
        "properties": {
            "ttl": AZURE_A_RECORD_TTL_SECS,
            "aRecords": records,
            "metadata": metadata
        }
    })
}

/// Ensure the zone, its VNet link, the endpoint and the account A record.
pub async fn ensure(
    arm: &ArmClient,
    ids: &ResourceIds,
    location: &str,
    tags: &BTreeMap<String, String>,
) -> Result<(), ArmError> {
    arm.put(&ids.private_zone(), PRIVATE_DNS_API_VERSION, &private_zone_body(tags))
        .await?;
    arm.put(
        &ids.vnet_link(),
        PRIVATE_DNS_API_VERSION,
        &vnet_link_body(&ids.vnet(), tags),
    )
    .await?;

    let endpoint = arm
        .put(
            &ids.private_endpoint(),
            NETWORK_API_VERSION,
            &private_endpoint_body(ids, location, tags),
        )
        .await?;

    let addresses = endpoint_addresses(&endpoint);
    debug!(
        endpoint = %ids.bucket_name(),
        addresses = ?addresses,
        "Creating A record for private endpoint"
    );
    arm.put(
        &ids.a_record(),
        PRIVATE_DNS_API_VERSION,
        &a_record_body(&addresses, tags),
    )
    .await?;

    info!(account = %ids.account_name(), "Private endpoint ready");
    Ok(())
}

/// Remove the account A record and the private endpoint; absent ones are skipped.
///
/// The zone and VNet link are shared by every bucket of the cluster and stay.
pub async fn remove(arm: &ArmClient, ids: &ResourceIds) -> Result<(), ArmError> {
    for (path, api_version) in [
        (ids.a_record(), PRIVATE_DNS_API_VERSION),
        (ids.private_endpoint(), NETWORK_API_VERSION),
    ] {
        match arm.delete(&path, api_version).await {
            Ok(()) => debug!(resource = %path, "Deleted private networking resource"),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "private_endpoint_tests.rs"]
mod private_endpoint_tests;

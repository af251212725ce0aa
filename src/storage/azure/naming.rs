// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Names and Resource Manager ids of the Azure resources backing a bucket.

use crate::cluster::azure::AzureClusterContext;
use crate::constants::{
    AZURE_BLOB_PRIVATE_ZONE, AZURE_MANAGEMENT_POLICY_NAME, AZURE_VNET_LINK_NAME,
    STORAGE_ACCOUNT_NAME_MAX_LEN,
};
use std::collections::BTreeMap;

/// Storage account name for a bucket.
///
/// Storage account names are 3-24 lowercase alphanumeric characters, so every
/// other character is dropped and the result truncated. The mapping is pure:
/// create, configure and delete all agree on the account.
#[must_use]
pub fn storage_account_name(bucket_name: &str) -> String {
    bucket_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(STORAGE_ACCOUNT_NAME_MAX_LEN)
        .collect()
}

/// Tags as accepted by container metadata, which forbids `-` in keys.
#[must_use]
pub fn metadata_tags(tags: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    tags.iter()
        .map(|(k, v)| (k.replace('-', "_"), v.clone()))
        .collect()
}

/// Resource Manager ids derived from the cluster context and a bucket name.
#[derive(Debug, Clone)]
pub struct ResourceIds {
    subscription_id: String,
    resource_group: String,
    vnet_name: String,
    subnet_name: String,
    bucket_name: String,
    account_name: String,
}

impl ResourceIds {
    #[must_use]
    pub fn new(cluster: &AzureClusterContext, bucket_name: &str) -> Self {
        Self {
            subscription_id: cluster.subscription_id.clone(),
            resource_group: cluster.resource_group.clone(),
            vnet_name: cluster.vnet_name(),
            subnet_name: cluster.subnet_name().to_string(),
            bucket_name: bucket_name.to_string(),
            account_name: storage_account_name(bucket_name),
        }
    }

    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    fn resource_group_id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )
    }

    #[must_use]
    pub fn storage_account(&self) -> String {
        format!(
            "{}/providers/Microsoft.Storage/storageAccounts/{}",
            self.resource_group_id(),
            self.account_name
        )
    }

    #[must_use]
    pub fn list_keys(&self) -> String {
        format!("{}/listKeys", self.storage_account())
    }

    /// The blob container; also the scope of bucket role assignments.
    #[must_use]
    pub fn container(&self) -> String {
        format!(
            "{}/blobServices/default/containers/{}",
            self.storage_account(),
            self.bucket_name
        )
    }

    #[must_use]
    pub fn management_policy(&self) -> String {
        format!(
            "{}/managementPolicies/{AZURE_MANAGEMENT_POLICY_NAME}",
            self.storage_account()
        )
    }

    #[must_use]
    pub fn role_assignment(&self, assignment_id: &str) -> String {
        format!(
            "{}/providers/Microsoft.Authorization/roleAssignments/{assignment_id}",
            self.container()
        )
    }

    #[must_use]
    pub fn vnet(&self) -> String {
        format!(
            "{}/providers/Microsoft.Network/virtualNetworks/{}",
            self.resource_group_id(),
            self.vnet_name
        )
    }

    #[must_use]
    pub fn subnet(&self) -> String {
        format!("{}/subnets/{}", self.vnet(), self.subnet_name)
    }

    #[must_use]
    pub fn private_endpoint(&self) -> String {
        format!(
            "{}/providers/Microsoft.Network/privateEndpoints/{}",
            self.resource_group_id(),
            self.bucket_name
        )
    }

    #[must_use]
    pub fn private_zone(&self) -> String {
        format!(
            "{}/providers/Microsoft.Network/privateDnsZones/{AZURE_BLOB_PRIVATE_ZONE}",
            self.resource_group_id()
        )
    }

    #[must_use]
    pub fn vnet_link(&self) -> String {
        format!(
            "{}/virtualNetworkLinks/{AZURE_VNET_LINK_NAME}",
            self.private_zone()
        )
    }

    /// A record named after the storage account inside the private zone.
    #[must_use]
    pub fn a_record(&self) -> String {
        format!("{}/A/{}", self.private_zone(), self.account_name)
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod naming_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definition for object-storage buckets.
//!
//! A [`Bucket`] records the desired state of one cloud bucket (an S3 bucket on
//! AWS, a storage account + blob container pair on Azure) and of the optional
//! access role bound to it. The operator owns the `status` subresource.
//!
//! # Example
//!
//! ```yaml
//! apiVersion: objectstorage.giantswarm.io/v1alpha1
//! kind: Bucket
//! metadata:
//!   name: loki
//!   namespace: loki
//! spec:
//!   name: giantswarm-glippy-loki
//!   reclaimPolicy: Delete
//!   expirationPolicy:
//!     days: 100
//!   accessRole:
//!     roleName: giantswarm-glippy-loki
//!     serviceAccountName: loki
//!     serviceAccountNamespace: loki
//!   tags:
//!     - key: app
//!       value: loki
//! ```

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired state of a cloud object-storage bucket.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "objectstorage.giantswarm.io",
    version = "v1alpha1",
    kind = "Bucket",
    namespaced,
    shortname = "bkt",
    doc = "Bucket is a cloud object-storage bucket (S3 bucket or Azure storage account and blob container) with an optional access role bound to a workload service account.",
    printcolumn = r#"{"name":"Bucket","type":"string","description":"Provider bucket name","jsonPath":".spec.name"}"#,
    printcolumn = r#"{"name":"Ready","type":"boolean","description":"Whether the bucket is provisioned","jsonPath":".status.bucketReady"}"#,
    printcolumn = r#"{"name":"Reclaim","type":"string","jsonPath":".spec.reclaimPolicy"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "BucketStatus")]
#[serde(rename_all = "camelCase")]
pub struct BucketSpec {
    /// Name of the bucket to create on the provider.
    ///
    /// On Azure this is also the container name; the storage account name is
    /// derived from it.
    pub name: String,

    /// Expiration policy applied to every object in the bucket.
    ///
    /// When absent, any previously configured expiration rule is removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_policy: Option<BucketExpirationPolicy>,

    /// What happens to the provider bucket when this resource is deleted.
    #[serde(default)]
    pub reclaim_policy: ReclaimPolicy,

    /// Access role that workloads can assume to reach the bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_role: Option<BucketAccessRole>,

    /// Tags added to the bucket. Entries with an empty key or value are ignored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<BucketTag>,
}

/// Disposition of the provider bucket once its record is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ReclaimPolicy {
    /// Leave the provider bucket (and its data) in place.
    #[default]
    Retain,

    /// Purge and delete the provider bucket and its access role.
    Delete,
}

/// Access role granting a service account read/write access to the bucket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BucketAccessRole {
    /// Name of the role to create in the cloud account.
    pub role_name: String,

    /// Additional buckets the role may access, for workloads spanning several buckets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_bucket_names: Vec<String>,

    /// Name of the service account allowed to assume the role.
    pub service_account_name: String,

    /// Namespace of the service account allowed to assume the role.
    pub service_account_namespace: String,
}

/// Expiration policy on all objects contained in the bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BucketExpirationPolicy {
    /// Number of days after which objects expire.
    pub days: i32,
}

/// A single bucket tag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BucketTag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// Observed state of a [`Bucket`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BucketStatus {
    /// True once every provider step of the last reconciliation succeeded.
    #[serde(default)]
    pub bucket_ready: bool,

    /// Provider identifier of the bucket.
    #[serde(default, rename = "bucketID", skip_serializing_if = "Option::is_none")]
    pub bucket_id: Option<String>,

    /// Azure role assignment bound to the container, if any.
    #[serde(
        default,
        rename = "bucketAzureRoleAssignmentID",
        skip_serializing_if = "Option::is_none"
    )]
    pub bucket_azure_role_assignment_id: Option<String>,
}

impl BucketSpec {
    /// Bucket tags with empty entries dropped; the last value wins on duplicate keys.
    #[must_use]
    pub fn normalized_tags(&self) -> BTreeMap<String, String> {
        self.tags
            .iter()
            .filter(|tag| !tag.key.is_empty() && !tag.value.is_empty())
            .map(|tag| (tag.key.clone(), tag.value.clone()))
            .collect()
    }

    /// The access role, if one was requested with a non-empty role name.
    #[must_use]
    pub fn requested_access_role(&self) -> Option<&BucketAccessRole> {
        self.access_role
            .as_ref()
            .filter(|role| !role.role_name.is_empty())
    }

    /// Expiration in days, if an expiration policy is set.
    #[must_use]
    pub fn expiration_days(&self) -> Option<i32> {
        self.expiration_policy.map(|policy| policy.days)
    }
}

impl Bucket {
    /// Whether the control plane has marked this record for deletion.
    #[must_use]
    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Whether `finalizer` is present on the record.
    #[must_use]
    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.finalizers().iter().any(|f| f == finalizer)
    }

    /// Status fields recorded after a successful reconciliation.
    ///
    /// Provider correlation fields already on the record are carried over.
    #[must_use]
    pub fn ready_status(&self) -> BucketStatus {
        BucketStatus {
            bucket_ready: true,
            bucket_id: Some(self.spec.name.clone()),
            bucket_azure_role_assignment_id: self
                .status
                .as_ref()
                .and_then(|status| status.bucket_azure_role_assignment_id.clone()),
        }
    }
}

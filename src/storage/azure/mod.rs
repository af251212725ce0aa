// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Azure adapters.
//!
//! A bucket is a storage account paired 1:1 with a blob container of the
//! bucket's name. Create and update share one "ensure" path that re-applies
//! the full desired state:
//!
//! 1. storage account
//! 2. blob container
//! 3. private endpoint and DNS (private clusters only)
//! 4. access-key secret in the bucket namespace
//!
//! All Resource Manager calls go through [`arm::ArmClient`], authenticated
//! with the cluster identity.

pub mod access;
pub mod account;
pub mod arm;
pub mod container;
pub mod credential;
pub mod lifecycle;
pub mod naming;
pub mod private_endpoint;
pub mod secret;

use self::access::AzureAccessRole;
use self::account::account_body;
use self::arm::{ArmClient, ArmError};
use self::credential::credential_for;
use self::naming::{metadata_tags, ResourceIds};
use self::secret::{BucketSecretWriter, KubeSecretWriter};
use super::{merge_tags, ObjectStorageService, ProviderServices};
use crate::cluster::azure::AzureClusterContext;
use crate::constants::{ARM_ENDPOINT, AZURE_ACCESS_KEY_NAME};
use crate::crd::Bucket;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use kube::{Client, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Build the Azure adapters for `cluster`.
///
/// # Errors
///
/// Returns a resolution error when no credential can be built for the
/// cluster identity.
pub fn services(
    cluster: &AzureClusterContext,
    client: &Client,
    http: &reqwest::Client,
) -> Result<ProviderServices> {
    let credential = credential_for(&cluster.name, &cluster.identity, http)?;
    let base_url = Url::parse(ARM_ENDPOINT).map_err(|e| Error::resolution(&cluster.name, e.to_string()))?;
    let arm = Arc::new(ArmClient::new(http.clone(), base_url, credential));

    Ok(ProviderServices {
        storage: Box::new(AzureObjectStorage::new(
            arm.clone(),
            cluster.clone(),
            Box::new(KubeSecretWriter::new(client.clone())),
        )),
        access_role: Box::new(AzureAccessRole::new(arm, cluster.clone())),
    })
}

/// [`ObjectStorageService`] backed by Azure Storage.
pub struct AzureObjectStorage {
    arm: Arc<ArmClient>,
    cluster: AzureClusterContext,
    secrets: Box<dyn BucketSecretWriter>,
}

impl AzureObjectStorage {
    #[must_use]
    pub fn new(
        arm: Arc<ArmClient>,
        cluster: AzureClusterContext,
        secrets: Box<dyn BucketSecretWriter>,
    ) -> Self {
        Self {
            arm,
            cluster,
            secrets,
        }
    }

    fn ids(&self, bucket: &Bucket) -> ResourceIds {
        ResourceIds::new(&self.cluster, &bucket.spec.name)
    }

    fn tags(&self, bucket: &Bucket) -> BTreeMap<String, String> {
        metadata_tags(&merge_tags(&self.cluster.tags, &bucket.spec))
    }

    /// Apply the complete desired state; shared by create and update.
    async fn ensure(&self, bucket: &Bucket) -> Result<()> {
        let name = bucket.spec.name.as_str();
        let namespace = bucket_namespace(bucket)?;
        let ids = self.ids(bucket);
        let tags = self.tags(bucket);
        let arm = self.arm.as_ref();

        account::upsert(
            arm,
            &ids,
            &account_body(&self.cluster.region, self.cluster.private, &tags),
        )
        .await
        .map_err(provider(name, "upsert storage account"))?;
        info!(bucket = %name, account = %ids.account_name(), "Storage account ready");

        container::upsert(arm, &ids, &tags)
            .await
            .map_err(provider(name, "upsert blob container"))?;

        if self.cluster.private {
            private_endpoint::ensure(arm, &ids, &self.cluster.region, &tags)
                .await
                .map_err(provider(name, "ensure private endpoint"))?;
        }

        let key = account::access_key(arm, &ids)
            .await
            .map_err(provider(name, "list storage account keys"))?
            .ok_or_else(|| {
                Error::provider(
                    name,
                    "list storage account keys",
                    format!(
                        "access key '{AZURE_ACCESS_KEY_NAME}' not found on storage account {}",
                        ids.account_name()
                    ),
                )
            })?;

        self.secrets
            .apply(&namespace, name, ids.account_name(), &key)
            .await
    }
}

fn provider<'a>(bucket: &'a str, operation: &'static str) -> impl FnOnce(ArmError) -> Error + 'a {
    move |e| Error::provider(bucket, operation, e)
}

fn bucket_namespace(bucket: &Bucket) -> Result<String> {
    bucket.namespace().ok_or_else(|| Error::InvalidBucket {
        bucket: bucket.name_any(),
        reason: "bucket has no namespace".to_string(),
    })
}

#[async_trait]
impl ObjectStorageService for AzureObjectStorage {
    /// True only when both the account and the container exist.
    async fn exists_bucket(&self, bucket: &Bucket) -> Result<bool> {
        let name = bucket.spec.name.as_str();
        let ids = self.ids(bucket);

        if !account::exists(&self.arm, &ids)
            .await
            .map_err(provider(name, "get storage account"))?
        {
            return Ok(false);
        }
        container::exists(&self.arm, &ids)
            .await
            .map_err(provider(name, "get blob container"))
    }

    async fn create_bucket(&self, bucket: &Bucket) -> Result<()> {
        self.ensure(bucket).await
    }

    async fn update_bucket(&self, bucket: &Bucket) -> Result<()> {
        self.ensure(bucket).await
    }

    async fn delete_bucket(&self, bucket: &Bucket) -> Result<()> {
        let name = bucket.spec.name.as_str();
        let namespace = bucket_namespace(bucket)?;
        let ids = self.ids(bucket);

        private_endpoint::remove(&self.arm, &ids)
            .await
            .map_err(provider(name, "delete private endpoint"))?;

        let deleted = account::delete(&self.arm, &ids)
            .await
            .map_err(provider(name, "delete storage account"))?;
        info!(
            bucket = %name,
            account = %ids.account_name(),
            existed = deleted,
            "Deleted storage account and blob container"
        );

        self.secrets.delete(&namespace, name).await
    }

    async fn configure_bucket(&self, bucket: &Bucket) -> Result<()> {
        let name = bucket.spec.name.as_str();
        let ids = self.ids(bucket);

        lifecycle::apply(&self.arm, &ids, bucket.spec.expiration_days())
            .await
            .map_err(provider(name, "set lifecycle policy"))?;

        container::upsert(&self.arm, &ids, &self.tags(bucket))
            .await
            .map_err(provider(name, "set container metadata"))
    }
}

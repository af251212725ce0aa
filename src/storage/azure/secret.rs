// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Access-key secret generated for Azure buckets.
//!
//! Workloads read the storage account name and key from a secret named after
//! the bucket, in the bucket's namespace. The secret carries its own
//! finalizer so it outlives accidental deletion until the bucket teardown
//! removes it.

use crate::constants::{
    AZURE_SECRET_FINALIZER, FIELD_MANAGER, SECRET_ACCOUNT_KEY_KEY, SECRET_ACCOUNT_NAME_KEY,
};
use crate::errors::Result;
use crate::labels::generated_secret_labels;
use crate::reconcilers::finalizers::remove_finalizer;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::{DeleteParams, Patch, PatchParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Writes and removes the generated access-key secret.
#[async_trait]
pub trait BucketSecretWriter: Send + Sync {
    /// Create or update the secret.
    async fn apply(&self, namespace: &str, name: &str, account_name: &str, account_key: &str)
        -> Result<()>;

    /// Release the finalizer and delete the secret; an absent secret is not an error.
    async fn delete(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Desired state of the access-key secret.
#[must_use]
pub fn build_secret(namespace: &str, name: &str, account_name: &str, account_key: &str) -> Secret {
    let data = BTreeMap::from([
        (
            SECRET_ACCOUNT_NAME_KEY.to_string(),
            ByteString(account_name.as_bytes().to_vec()),
        ),
        (
            SECRET_ACCOUNT_KEY_KEY.to_string(),
            ByteString(account_key.as_bytes().to_vec()),
        ),
    ]);

    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(generated_secret_labels()),
            finalizers: Some(vec![AZURE_SECRET_FINALIZER.to_string()]),
            ..Default::default()
        },
        data: Some(data),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

/// [`BucketSecretWriter`] talking to the Kubernetes API.
pub struct KubeSecretWriter {
    client: Client,
}

impl KubeSecretWriter {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BucketSecretWriter for KubeSecretWriter {
    async fn apply(
        &self,
        namespace: &str,
        name: &str,
        account_name: &str,
        account_key: &str,
    ) -> Result<()> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = build_secret(namespace, name, account_name, account_key);

        api.patch(
            name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&secret),
        )
        .await?;

        info!(namespace, secret = name, "Applied storage account access secret");
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        let Some(secret) = api.get_opt(name).await? else {
            debug!(namespace, secret = name, "Access secret already gone");
            return Ok(());
        };

        remove_finalizer(&self.client, &secret, AZURE_SECRET_FINALIZER).await?;

        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => {}
            Err(kube::Error::Api(e)) if e.code == 404 => {}
            Err(e) => return Err(e.into()),
        }

        info!(namespace, secret = name, "Deleted storage account access secret");
        Ok(())
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod secret_tests;

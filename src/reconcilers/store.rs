// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Control-plane access for `Bucket` records.
//!
//! The engine only needs four operations on the record, kept behind
//! [`BucketStore`] so the state machine can run against an in-memory store.

use super::finalizers::{ensure_finalizer, remove_finalizer};
use super::retry::retry_api_call;
use crate::constants::BUCKET_FINALIZER;
use crate::crd::{Bucket, BucketStatus};
use crate::errors::Result;
use async_trait::async_trait;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;

/// Read and write access to `Bucket` records.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Load a record; `None` when it no longer exists.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Bucket>>;

    /// Persist the bucket finalizer on the record.
    async fn add_finalizer(&self, bucket: &Bucket) -> Result<()>;

    /// Drop the bucket finalizer from the record.
    async fn remove_finalizer(&self, bucket: &Bucket) -> Result<()>;

    /// Replace the record status.
    async fn patch_status(&self, bucket: &Bucket, status: &BucketStatus) -> Result<()>;
}

/// [`BucketStore`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeBucketStore {
    client: Client,
}

impl KubeBucketStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BucketStore for KubeBucketStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Bucket>> {
        let api: Api<Bucket> = Api::namespaced(self.client.clone(), namespace);
        retry_api_call(|| api.get_opt(name), "get bucket").await
    }

    async fn add_finalizer(&self, bucket: &Bucket) -> Result<()> {
        if bucket.has_finalizer(BUCKET_FINALIZER) {
            return Ok(());
        }
        ensure_finalizer(&self.client, bucket, BUCKET_FINALIZER).await
    }

    async fn remove_finalizer(&self, bucket: &Bucket) -> Result<()> {
        if !bucket.has_finalizer(BUCKET_FINALIZER) {
            return Ok(());
        }
        remove_finalizer(&self.client, bucket, BUCKET_FINALIZER).await
    }

    async fn patch_status(&self, bucket: &Bucket, status: &BucketStatus) -> Result<()> {
        let namespace = bucket.namespace().unwrap_or_default();
        let name = bucket.name_any();
        let api: Api<Bucket> = Api::namespaced(self.client.clone(), &namespace);
        let patch = json!({ "status": status });

        retry_api_call(
            || {
                let api = api.clone();
                let name = name.clone();
                let patch = patch.clone();
                async move {
                    api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
                        .await
                }
            },
            "patch bucket status",
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;

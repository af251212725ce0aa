// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider adapters for buckets and their access roles.
//!
//! Each cloud implements two capability sets:
//!
//! - [`ObjectStorageService`] - existence check, create, update, delete and
//!   configure (lifecycle, policy, tags) of the bucket itself
//! - [`AccessRoleService`] - create/update and delete of the role workloads use
//!   to reach the bucket
//!
//! A [`ServiceFactory`] picks the implementation for the resolved
//! [`ClusterContext`] once per reconciliation, handing the freshly resolved
//! credentials to the adapters it builds.

pub mod aws;
pub mod azure;

use crate::cluster::ClusterContext;
use crate::crd::{Bucket, BucketSpec};
use crate::errors::Result;
use async_trait::async_trait;
use kube::Client;
use std::collections::BTreeMap;

/// Lifecycle operations on the provider bucket.
///
/// `exists_bucket` distinguishes "not found" (`Ok(false)`) from any other
/// failure (`Err`); callers must never treat an error as absence.
/// `configure_bucket` is idempotent and removes the expiration rule when the
/// record no longer sets one.
#[async_trait]
pub trait ObjectStorageService: Send + Sync {
    /// Whether the provider bucket exists.
    async fn exists_bucket(&self, bucket: &Bucket) -> Result<bool>;

    /// Create the provider bucket.
    async fn create_bucket(&self, bucket: &Bucket) -> Result<()>;

    /// Converge an existing provider bucket towards the spec.
    async fn update_bucket(&self, bucket: &Bucket) -> Result<()>;

    /// Remove the provider bucket and everything in it.
    async fn delete_bucket(&self, bucket: &Bucket) -> Result<()>;

    /// Apply lifecycle rules, access policy and tags.
    async fn configure_bucket(&self, bucket: &Bucket) -> Result<()>;
}

/// Lifecycle operations on the access role bound to a bucket.
#[async_trait]
pub trait AccessRoleService: Send + Sync {
    /// Create the role or converge an existing one.
    async fn configure_role(&self, bucket: &Bucket) -> Result<()>;

    /// Delete the role; an absent role is not an error.
    async fn delete_role(&self, bucket: &Bucket) -> Result<()>;
}

/// Adapters selected for one reconciliation.
pub struct ProviderServices {
    /// Bucket adapter
    pub storage: Box<dyn ObjectStorageService>,
    /// Access role adapter
    pub access_role: Box<dyn AccessRoleService>,
}

/// Builds provider adapters from a resolved [`ClusterContext`].
#[async_trait]
pub trait ServiceFactory: Send + Sync {
    /// Build the adapters for `cluster`.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials cannot be set up for the cluster identity.
    async fn services(&self, cluster: &ClusterContext) -> Result<ProviderServices>;
}

/// [`ServiceFactory`] backed by the real cloud APIs.
#[derive(Clone)]
pub struct CloudServiceFactory {
    client: Client,
    http_client: reqwest::Client,
}

impl CloudServiceFactory {
    /// Create a factory sharing the Kubernetes and HTTP clients across reconciliations.
    #[must_use]
    pub fn new(client: Client, http_client: reqwest::Client) -> Self {
        Self {
            client,
            http_client,
        }
    }
}

#[async_trait]
impl ServiceFactory for CloudServiceFactory {
    async fn services(&self, cluster: &ClusterContext) -> Result<ProviderServices> {
        match cluster {
            ClusterContext::Aws(aws_cluster) => Ok(aws::services(aws_cluster).await),
            ClusterContext::Azure(azure_cluster) => {
                azure::services(azure_cluster, &self.client, &self.http_client)
            }
        }
    }
}

/// Tags applied to provider resources: cluster tags overlaid with bucket tags.
///
/// Entries with an empty key or value are dropped from both sources.
#[must_use]
pub fn merge_tags(cluster_tags: &BTreeMap<String, String>, spec: &BucketSpec) -> BTreeMap<String, String> {
    let mut tags: BTreeMap<String, String> = cluster_tags
        .iter()
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    tags.extend(spec.normalized_tags());
    tags
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bucket reconciliation engine.
//!
//! Every invocation re-derives what to do from the record and from a fresh
//! existence check against the provider; nothing is remembered between runs.
//!
//! ## Normal path
//!
//! 1. Persist the finalizer (before any provider mutation)
//! 2. Create the bucket when absent, update it otherwise
//! 3. Configure lifecycle, policy and tags
//! 4. Configure the access role, when one is requested
//! 5. Patch status to ready
//!
//! A failing step aborts the invocation before the status patch, so a bucket
//! is only reported ready when every step of the same run succeeded.
//!
//! ## Deletion path
//!
//! With `reclaimPolicy: Delete` an existing bucket is deleted, then its access
//! role. With `Retain` the provider side is left alone. In both cases the
//! finalizer is removed afterwards so the record can go away.

use super::store::BucketStore;
use crate::cluster::ClusterResolver;
use crate::crd::{Bucket, ReclaimPolicy};
use crate::errors::Result;
use crate::metrics;
use crate::storage::{ProviderServices, ServiceFactory};
use kube::ResourceExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// What a reconciliation invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The record no longer exists
    Gone,
    /// The record is being deleted and its finalizer was released
    Released,
    /// The bucket is provisioned and configured
    Ready,
}

/// Drives the provider adapters from the state of `Bucket` records.
#[derive(Clone)]
pub struct BucketReconciler {
    store: Arc<dyn BucketStore>,
    resolver: Arc<dyn ClusterResolver>,
    factory: Arc<dyn ServiceFactory>,
}

impl BucketReconciler {
    #[must_use]
    pub fn new(
        store: Arc<dyn BucketStore>,
        resolver: Arc<dyn ClusterResolver>,
        factory: Arc<dyn ServiceFactory>,
    ) -> Self {
        Self {
            store,
            resolver,
            factory,
        }
    }

    /// Run one reconciliation of the record `namespace/name`.
    ///
    /// # Errors
    ///
    /// Returns the first failing step: loading the record, resolving the
    /// cluster context, a provider call or a control-plane write.
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<ReconcileOutcome> {
        let Some(bucket) = self.store.get(namespace, name).await? else {
            debug!(namespace, name, "Bucket record is gone, nothing to do");
            return Ok(ReconcileOutcome::Gone);
        };

        let cluster = self.resolver.resolve().await?;
        let provider = cluster.provider().to_string();
        debug!(
            namespace,
            name,
            cluster = cluster.name(),
            region = cluster.region(),
            provider = %provider,
            "Resolved cluster context"
        );
        let services = self.factory.services(&cluster).await?;
        let step = Step {
            provider: &provider,
            services: &services,
            bucket: &bucket,
        };

        if bucket.is_being_deleted() {
            self.release(&step).await
        } else {
            self.converge(&step).await
        }
    }

    async fn release(&self, step: &Step<'_>) -> Result<ReconcileOutcome> {
        let bucket = step.bucket;
        let name = bucket.spec.name.as_str();

        info!(
            namespace = %bucket.namespace().unwrap_or_default(),
            bucket = %name,
            reclaim_policy = ?bucket.spec.reclaim_policy,
            "Bucket is being deleted"
        );

        let exists = step
            .observe("exists_bucket", step.services.storage.exists_bucket(bucket))
            .await?;

        if !exists {
            debug!(bucket = %name, "Provider bucket already absent");
        } else if bucket.spec.reclaim_policy == ReclaimPolicy::Delete {
            step.observe("delete_bucket", step.services.storage.delete_bucket(bucket))
                .await?;
            metrics::record_bucket_delete(name);
            info!(bucket = %name, "Deleted provider bucket");

            if bucket.spec.requested_access_role().is_some() {
                step.observe("delete_role", step.services.access_role.delete_role(bucket))
                    .await?;
                info!(bucket = %name, "Deleted access role");
            }
        } else {
            info!(bucket = %name, "Retaining provider bucket");
        }

        self.store.remove_finalizer(bucket).await?;
        Ok(ReconcileOutcome::Released)
    }

    async fn converge(&self, step: &Step<'_>) -> Result<ReconcileOutcome> {
        let bucket = step.bucket;
        let name = bucket.spec.name.as_str();
        let storage = &step.services.storage;

        self.store.add_finalizer(bucket).await?;

        let exists = step
            .observe("exists_bucket", storage.exists_bucket(bucket))
            .await?;
        if exists {
            step.observe("update_bucket", storage.update_bucket(bucket))
                .await?;
            debug!(bucket = %name, "Updated provider bucket");
        } else {
            step.observe("create_bucket", storage.create_bucket(bucket))
                .await?;
            info!(bucket = %name, "Created provider bucket");
        }

        step.observe("configure_bucket", storage.configure_bucket(bucket))
            .await?;

        if bucket.spec.requested_access_role().is_some() {
            step.observe(
                "configure_role",
                step.services.access_role.configure_role(bucket),
            )
            .await?;
        }

        let status = bucket.ready_status();
        if bucket.status.as_ref() == Some(&status) {
            debug!(bucket = %name, "Status unchanged");
        } else {
            self.store.patch_status(bucket, &status).await?;
        }

        info!(bucket = %name, "Bucket is ready");
        Ok(ReconcileOutcome::Ready)
    }
}

/// Everything one reconciliation step needs.
struct Step<'a> {
    provider: &'a str,
    services: &'a ProviderServices,
    bucket: &'a Bucket,
}

impl Step<'_> {
    /// Await an adapter call, recording its outcome and duration.
    async fn observe<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = call.await;
        metrics::record_provider_operation(self.provider, operation, result.is_ok(), start.elapsed());
        result
    }
}

#[cfg(test)]
#[path = "bucket_tests.rs"]
mod bucket_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context handed to every reconciliation.
//!
//! Wires the Kubernetes-backed store and cluster resolver, and the cloud
//! adapter factory, into one [`BucketReconciler`]. Cloud credentials are not
//! part of the context: the factory builds them per reconciliation.

use crate::cluster::KubeClusterResolver;
use crate::config::ManagementCluster;
use crate::reconcilers::{BucketReconciler, KubeBucketStore};
use crate::storage::CloudServiceFactory;
use kube::Client;
use std::sync::Arc;

/// Shared context passed to the `Bucket` controller.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Management cluster every bucket is provisioned for
    pub management_cluster: ManagementCluster,

    /// Reconciliation engine
    pub reconciler: BucketReconciler,
}

impl Context {
    /// Build the production context.
    #[must_use]
    pub fn new(
        client: Client,
        management_cluster: ManagementCluster,
        http_client: reqwest::Client,
    ) -> Self {
        let reconciler = BucketReconciler::new(
            Arc::new(KubeBucketStore::new(client.clone())),
            Arc::new(KubeClusterResolver::new(
                client.clone(),
                management_cluster.clone(),
            )),
            Arc::new(CloudServiceFactory::new(client.clone(), http_client)),
        );

        Self {
            client,
            management_cluster,
            reconciler,
        }
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster credential resolution.
//!
//! Every reconciliation starts by turning the management cluster settings into
//! a [`ClusterContext`]: region, account or subscription, assumable role or
//! managed identity, resource group, base domain and the tags merged into
//! every provisioned resource. The context is read from Cluster API
//! infrastructure records and is never cached, since the credentials it leads
//! to are short-lived.
//!
//! Field extraction is kept in pure functions over the raw records so it can
//! be tested without an API server.

pub mod aws;
pub mod azure;

use crate::config::{ManagementCluster, Provider};
use crate::constants::CAPI_INFRASTRUCTURE_GROUP;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use kube::api::{ApiResource, DynamicObject};
use kube::core::GroupVersionKind;
use kube::{Api, Client};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

pub use aws::AwsClusterContext;
pub use azure::{AzureClusterContext, AzureIdentity};

/// Cloud connection context of the management cluster, one variant per provider.
#[derive(Debug, Clone)]
pub enum ClusterContext {
    /// AWS account reached through an assumable IAM role
    Aws(AwsClusterContext),
    /// Azure subscription reached through a managed identity or service principal
    Azure(AzureClusterContext),
}

impl ClusterContext {
    /// Management cluster name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Aws(c) => &c.name,
            Self::Azure(c) => &c.name,
        }
    }

    /// Cloud region or location.
    #[must_use]
    pub fn region(&self) -> &str {
        match self {
            Self::Aws(c) => &c.region,
            Self::Azure(c) => &c.region,
        }
    }

    /// Provider this context belongs to.
    #[must_use]
    pub fn provider(&self) -> Provider {
        match self {
            Self::Aws(_) => Provider::Aws,
            Self::Azure(_) => Provider::Azure,
        }
    }
}

/// Resolves the management cluster's [`ClusterContext`].
#[async_trait]
pub trait ClusterResolver: Send + Sync {
    /// Read the infrastructure records and build a fresh context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] when a record or a required field is missing,
    /// or the identity type is not supported.
    async fn resolve(&self) -> Result<ClusterContext>;
}

/// [`ClusterResolver`] reading Cluster API records from the Kubernetes API.
#[derive(Clone)]
pub struct KubeClusterResolver {
    client: Client,
    management_cluster: ManagementCluster,
}

impl KubeClusterResolver {
    /// Create a resolver for `management_cluster`.
    #[must_use]
    pub fn new(client: Client, management_cluster: ManagementCluster) -> Self {
        Self {
            client,
            management_cluster,
        }
    }
}

#[async_trait]
impl ClusterResolver for KubeClusterResolver {
    async fn resolve(&self) -> Result<ClusterContext> {
        debug!(
            cluster = %self.management_cluster.name,
            provider = %self.management_cluster.provider,
            "Resolving management cluster context"
        );
        match self.management_cluster.provider {
            Provider::Aws => aws::resolve(&self.client, &self.management_cluster)
                .await
                .map(ClusterContext::Aws),
            Provider::Azure => azure::resolve(&self.client, &self.management_cluster)
                .await
                .map(ClusterContext::Azure),
        }
    }
}

/// Fetch a Cluster API infrastructure record.
///
/// `namespace` is `None` for cluster-scoped kinds. A missing record is a
/// resolution error naming the record.
pub(crate) async fn get_infrastructure_record(
    client: &Client,
    cluster: &ManagementCluster,
    version: &str,
    kind: &str,
    namespace: Option<&str>,
    name: &str,
) -> Result<Value> {
    let gvk = GroupVersionKind::gvk(CAPI_INFRASTRUCTURE_GROUP, version, kind);
    let resource = ApiResource::from_gvk(&gvk);
    let api: Api<DynamicObject> = match namespace {
        Some(ns) => Api::namespaced_with(client.clone(), ns, &resource),
        None => Api::all_with(client.clone(), &resource),
    };

    match api.get_opt(name).await? {
        Some(object) => Ok(object.data),
        None => Err(Error::resolution(
            &cluster.name,
            format!(
                "{kind} {}{name} not found",
                namespace.map(|ns| format!("{ns}/")).unwrap_or_default()
            ),
        )),
    }
}

/// Look up a string at `path` inside a record.
pub(crate) fn nested_str<'a>(record: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(record, |value, key| value.get(key))
        .and_then(Value::as_str)
}

/// Look up a non-empty string at `path`, failing with a resolution error.
pub(crate) fn required_str(
    cluster: &str,
    record_desc: &str,
    record: &Value,
    path: &[&str],
) -> Result<String> {
    nested_str(record, path)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            Error::resolution(
                cluster,
                format!("missing or incorrect {} in {record_desc}", path.join(".")),
            )
        })
}

/// Read an optional string map (such as `spec.additionalTags`) from a record.
///
/// An absent map is empty; a map with non-string values is malformed.
pub(crate) fn nested_string_map(
    cluster: &str,
    record_desc: &str,
    record: &Value,
    path: &[&str],
) -> Result<BTreeMap<String, String>> {
    let Some(value) = path.iter().try_fold(record, |value, key| value.get(key)) else {
        return Ok(BTreeMap::new());
    };
    if value.is_null() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_value(value.clone()).map_err(|e| {
        Error::resolution(
            cluster,
            format!("malformed {} in {record_desc}: {e}", path.join(".")),
        )
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;

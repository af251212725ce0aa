// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Azure management cluster resolution.
//!
//! Reads the `AzureCluster` named after the management cluster, the
//! `AzureClusterIdentity` it references and, for service principals, the
//! secret holding the client secret. Whether the cluster is private is read
//! from the cluster's rendered values ConfigMap.

use super::{get_infrastructure_record, nested_str, nested_string_map, required_str};
use crate::config::ManagementCluster;
use crate::constants::{
    AZURE_CLIENT_SECRET_KEY, AZURE_NODE_SUBNET, CAPZ_API_VERSION, CLUSTER_VALUES_KEY,
    CLUSTER_VALUES_SUFFIX, KIND_AZURE_CLUSTER, KIND_AZURE_CLUSTER_IDENTITY, NETWORK_MODE_PRIVATE,
};
use crate::errors::{Error, Result};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, Client};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// How the operator authenticates against Azure.
#[derive(Clone, PartialEq, Eq)]
pub enum AzureIdentity {
    /// User-assigned managed identity, tokens from the instance metadata service
    UserAssignedMsi {
        /// Client id of the managed identity
        client_id: String,
    },
    /// Service principal with a client secret
    ManualServicePrincipal {
        /// Azure AD tenant
        tenant_id: String,
        /// Application (client) id
        client_id: String,
        /// Client secret read from the referenced Kubernetes secret
        client_secret: String,
    },
    /// Federated workload identity using the projected service account token
    WorkloadIdentity {
        /// Azure AD tenant
        tenant_id: String,
        /// Application (client) id
        client_id: String,
    },
}

impl fmt::Debug for AzureIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserAssignedMsi { client_id } => f
                .debug_struct("UserAssignedMsi")
                .field("client_id", client_id)
                .finish(),
            Self::ManualServicePrincipal {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ManualServicePrincipal")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            Self::WorkloadIdentity {
                tenant_id,
                client_id,
            } => f
                .debug_struct("WorkloadIdentity")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish(),
        }
    }
}

/// Connection context for an Azure management cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureClusterContext {
    /// Management cluster name
    pub name: String,
    /// Management cluster namespace
    pub namespace: String,
    /// Base domain of the installation
    pub base_domain: String,
    /// Azure location
    pub region: String,
    /// Subscription hosting the storage accounts
    pub subscription_id: String,
    /// Resource group hosting the storage accounts
    pub resource_group: String,
    /// `spec.additionalTags` of the `AzureCluster`
    pub tags: BTreeMap<String, String>,
    /// Credentials used for Resource Manager calls
    pub identity: AzureIdentity,
    /// Whether the cluster network is private
    pub private: bool,
}

impl AzureClusterContext {
    /// Virtual network of the cluster.
    #[must_use]
    pub fn vnet_name(&self) -> String {
        format!("{}-vnet", self.name)
    }

    /// Subnet receiving private endpoints.
    #[must_use]
    pub fn subnet_name(&self) -> &'static str {
        AZURE_NODE_SUBNET
    }
}

/// Identity fields read from an `AzureClusterIdentity`, before the client
/// secret (if any) is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySpec {
    /// `UserAssignedMSI`
    UserAssignedMsi { client_id: String },
    /// `ManualServicePrincipal` with a reference to the secret holding the password
    ManualServicePrincipal {
        tenant_id: String,
        client_id: String,
        secret_name: String,
        secret_namespace: String,
    },
    /// `WorkloadIdentity`
    WorkloadIdentity { tenant_id: String, client_id: String },
}

/// Name and namespace of the identity referenced by an `AzureCluster`.
///
/// The namespace falls back to the management cluster namespace.
///
/// # Errors
///
/// Returns a resolution error when `spec.identityRef.name` is missing or empty.
pub fn identity_ref(cluster: &ManagementCluster, azure_cluster: &Value) -> Result<(String, String)> {
    let name = nested_str(azure_cluster, &["spec", "identityRef", "name"])
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::resolution(
                &cluster.name,
                format!(
                    "missing identityRef in AzureCluster {}/{}",
                    cluster.namespace, cluster.name
                ),
            )
        })?;
    let namespace = match nested_str(azure_cluster, &["spec", "identityRef", "namespace"]) {
        Some(ns) if !ns.is_empty() => ns,
        _ => {
            debug!(cluster = %cluster.name, "Missing identity namespace, using management cluster namespace");
            &cluster.namespace
        }
    };
    Ok((name.to_string(), namespace.to_string()))
}

/// Parse the identity fields of an `AzureClusterIdentity`.
///
/// # Errors
///
/// Returns a resolution error for a missing field or an unsupported `spec.type`.
pub fn parse_identity(
    cluster: &ManagementCluster,
    identity_desc: &str,
    identity: &Value,
) -> Result<IdentitySpec> {
    let field = |path: &[&str]| required_str(&cluster.name, identity_desc, identity, path);

    match field(&["spec", "type"])?.as_str() {
        "UserAssignedMSI" => Ok(IdentitySpec::UserAssignedMsi {
            client_id: field(&["spec", "clientID"])?,
        }),
        "ManualServicePrincipal" => Ok(IdentitySpec::ManualServicePrincipal {
            tenant_id: field(&["spec", "tenantID"])?,
            client_id: field(&["spec", "clientID"])?,
            secret_name: field(&["spec", "clientSecret", "name"])?,
            secret_namespace: field(&["spec", "clientSecret", "namespace"])?,
        }),
        "WorkloadIdentity" => Ok(IdentitySpec::WorkloadIdentity {
            tenant_id: field(&["spec", "tenantID"])?,
            client_id: field(&["spec", "clientID"])?,
        }),
        other => Err(Error::resolution(
            &cluster.name,
            format!("unsupported identity type '{other}' in {identity_desc}"),
        )),
    }
}

/// Whether a rendered cluster values document declares a private network.
///
/// # Errors
///
/// Returns an error when the document is not valid YAML.
pub fn is_private_network(values: &str) -> std::result::Result<bool, serde_yaml::Error> {
    let document: serde_yaml::Value = serde_yaml::from_str(values)?;
    Ok(document
        .get("global")
        .and_then(|v| v.get("connectivity"))
        .and_then(|v| v.get("network"))
        .and_then(|v| v.get("mode"))
        .and_then(serde_yaml::Value::as_str)
        == Some(NETWORK_MODE_PRIVATE))
}

/// Decide whether the cluster is private from its (optional) values ConfigMap.
///
/// A missing ConfigMap or key means a public cluster. An unreadable document
/// is a resolution error rather than a silent downgrade to public access.
///
/// # Errors
///
/// Returns a resolution error when the values document cannot be parsed.
pub fn private_from_config_map(cluster: &ManagementCluster, config_map: Option<&ConfigMap>) -> Result<bool> {
    let Some(values) = config_map
        .and_then(|cm| cm.data.as_ref())
        .and_then(|data| data.get(CLUSTER_VALUES_KEY))
    else {
        return Ok(false);
    };
    is_private_network(values).map_err(|e| {
        Error::resolution(
            &cluster.name,
            format!(
                "unreadable {CLUSTER_VALUES_KEY} in ConfigMap {}/{}{CLUSTER_VALUES_SUFFIX}: {e}",
                cluster.namespace, cluster.name
            ),
        )
    })
}

/// Read the client secret from the service principal's secret.
///
/// # Errors
///
/// Returns a resolution error when the key is missing or not UTF-8.
pub fn client_secret_from(
    cluster: &ManagementCluster,
    secret_desc: &str,
    secret: &Secret,
) -> Result<String> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(AZURE_CLIENT_SECRET_KEY))
        .and_then(|bytes| String::from_utf8(bytes.0.clone()).ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::resolution(
                &cluster.name,
                format!("missing {AZURE_CLIENT_SECRET_KEY} in secret {secret_desc}"),
            )
        })
}

/// Build the context from an `AzureCluster`, its resolved identity and the private flag.
///
/// # Errors
///
/// Returns a resolution error when the resource group or subscription is
/// missing, or the additional tags are malformed.
pub fn context_from_records(
    cluster: &ManagementCluster,
    azure_cluster: &Value,
    identity: AzureIdentity,
    private: bool,
) -> Result<AzureClusterContext> {
    let desc = format!("{KIND_AZURE_CLUSTER} {}/{}", cluster.namespace, cluster.name);
    Ok(AzureClusterContext {
        name: cluster.name.clone(),
        namespace: cluster.namespace.clone(),
        base_domain: cluster.base_domain.clone(),
        region: cluster.region.clone(),
        subscription_id: required_str(&cluster.name, &desc, azure_cluster, &[
            "spec",
            "subscriptionID",
        ])?,
        resource_group: required_str(&cluster.name, &desc, azure_cluster, &[
            "spec",
            "resourceGroup",
        ])?,
        tags: nested_string_map(&cluster.name, &desc, azure_cluster, &["spec", "additionalTags"])?,
        identity,
        private,
    })
}

/// Resolve the Azure context from the Kubernetes API.
///
/// # Errors
///
/// Returns a resolution error if a record, field or secret is missing, or a
/// control-plane error if the API server cannot be reached.
pub async fn resolve(client: &Client, cluster: &ManagementCluster) -> Result<AzureClusterContext> {
    let azure_cluster = get_infrastructure_record(
        client,
        cluster,
        CAPZ_API_VERSION,
        KIND_AZURE_CLUSTER,
        Some(&cluster.namespace),
        &cluster.name,
    )
    .await?;

    let (identity_name, identity_namespace) = identity_ref(cluster, &azure_cluster)?;
    let identity_record = get_infrastructure_record(
        client,
        cluster,
        CAPZ_API_VERSION,
        KIND_AZURE_CLUSTER_IDENTITY,
        Some(&identity_namespace),
        &identity_name,
    )
    .await?;
    let identity_desc =
        format!("{KIND_AZURE_CLUSTER_IDENTITY} {identity_namespace}/{identity_name}");

    let identity = match parse_identity(cluster, &identity_desc, &identity_record)? {
        IdentitySpec::UserAssignedMsi { client_id } => AzureIdentity::UserAssignedMsi { client_id },
        IdentitySpec::WorkloadIdentity {
            tenant_id,
            client_id,
        } => AzureIdentity::WorkloadIdentity {
            tenant_id,
            client_id,
        },
        IdentitySpec::ManualServicePrincipal {
            tenant_id,
            client_id,
            secret_name,
            secret_namespace,
        } => {
            let secret_desc = format!("{secret_namespace}/{secret_name}");
            let secrets: Api<Secret> = Api::namespaced(client.clone(), &secret_namespace);
            let secret = secrets.get_opt(&secret_name).await?.ok_or_else(|| {
                Error::resolution(
                    &cluster.name,
                    format!("client secret {secret_desc} for {identity_desc} not found"),
                )
            })?;
            AzureIdentity::ManualServicePrincipal {
                tenant_id,
                client_id,
                client_secret: client_secret_from(cluster, &secret_desc, &secret)?,
            }
        }
    };

    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), &cluster.namespace);
    let values = config_maps
        .get_opt(&format!("{}{CLUSTER_VALUES_SUFFIX}", cluster.name))
        .await?;
    let private = private_from_config_map(cluster, values.as_ref())?;

    let context = context_from_records(cluster, &azure_cluster, identity, private)?;
    info!(
        cluster = %context.name,
        subscription = %context.subscription_id,
        resource_group = %context.resource_group,
        private = context.private,
        "Resolved Azure management cluster"
    );
    Ok(context)
}

#[cfg(test)]
#[path = "azure_tests.rs"]
mod azure_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! AWS management cluster resolution.
//!
//! Reads the `AWSCluster` named after the management cluster and the
//! cluster-scoped `AWSClusterRoleIdentity` it references.

use super::{get_infrastructure_record, nested_str, nested_string_map, required_str};
use crate::config::ManagementCluster;
use crate::constants::{
    AWS_CHINA_PARTITION, AWS_CHINA_REGION_PREFIX, AWS_PARTITION, CAPA_API_VERSION,
    KIND_AWS_CLUSTER, KIND_AWS_CLUSTER_ROLE_IDENTITY,
};
use crate::errors::{Error, Result};
use kube::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Connection context for an AWS management cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsClusterContext {
    /// Management cluster name
    pub name: String,
    /// Management cluster namespace
    pub namespace: String,
    /// Base domain of the installation
    pub base_domain: String,
    /// AWS region
    pub region: String,
    /// Role assumed for every provider call
    pub role_arn: String,
    /// Account owning the role
    pub account_id: String,
    /// `spec.additionalTags` of the `AWSCluster`
    pub tags: BTreeMap<String, String>,
}

impl AwsClusterContext {
    /// Whether the cluster runs in the AWS China partition.
    #[must_use]
    pub fn is_china(&self) -> bool {
        self.region.starts_with(AWS_CHINA_REGION_PREFIX)
    }

    /// ARN partition (`aws` or `aws-cn`).
    #[must_use]
    pub fn partition(&self) -> &'static str {
        if self.is_china() {
            AWS_CHINA_PARTITION
        } else {
            AWS_PARTITION
        }
    }

    /// Domain of the OIDC provider issuing service account tokens.
    ///
    /// China regions serve the discovery documents from S3 instead of a
    /// CloudFront distribution.
    #[must_use]
    pub fn irsa_domain(&self) -> String {
        if self.is_china() {
            format!(
                "s3.{}.amazonaws.com.cn/{}-g8s-{}-oidc-pod-identity-v3",
                self.region, self.account_id, self.name
            )
        } else {
            format!("irsa.{}.{}", self.name, self.base_domain)
        }
    }
}

/// Extract the account id from an IAM ARN (`arn:partition:service:region:account:resource`).
#[must_use]
pub fn account_id_from_arn(arn: &str) -> Option<&str> {
    let mut parts = arn.splitn(6, ':');
    if parts.next() != Some("arn") {
        return None;
    }
    parts
        .nth(3)
        .filter(|account| !account.is_empty() && account.chars().all(|c| c.is_ascii_digit()))
}

/// Name of the role identity referenced by an `AWSCluster`.
///
/// # Errors
///
/// Returns a resolution error when `spec.identityRef.name` is missing or empty.
pub fn identity_ref_name(cluster: &ManagementCluster, aws_cluster: &Value) -> Result<String> {
    nested_str(aws_cluster, &["spec", "identityRef", "name"])
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            Error::resolution(
                &cluster.name,
                format!(
                    "missing identityRef in AWSCluster {}/{}",
                    cluster.namespace, cluster.name
                ),
            )
        })
}

/// Build the context from an `AWSCluster` and its `AWSClusterRoleIdentity`.
///
/// # Errors
///
/// Returns a resolution error when the role ARN is missing or malformed, or the
/// additional tags are not a string map.
pub fn context_from_records(
    cluster: &ManagementCluster,
    aws_cluster: &Value,
    identity_name: &str,
    identity: &Value,
) -> Result<AwsClusterContext> {
    let identity_desc = format!("{KIND_AWS_CLUSTER_ROLE_IDENTITY} {identity_name}");
    let role_arn = required_str(&cluster.name, &identity_desc, identity, &["spec", "roleARN"])?;
    let account_id = account_id_from_arn(&role_arn)
        .ok_or_else(|| {
            Error::resolution(
                &cluster.name,
                format!("malformed roleARN '{role_arn}' in {identity_desc}"),
            )
        })?
        .to_string();

    let cluster_desc = format!("{KIND_AWS_CLUSTER} {}/{}", cluster.namespace, cluster.name);
    let tags = nested_string_map(&cluster.name, &cluster_desc, aws_cluster, &[
        "spec",
        "additionalTags",
    ])?;
    if tags.is_empty() {
        debug!(cluster = %cluster.name, "No cluster tags found");
    }

    Ok(AwsClusterContext {
        name: cluster.name.clone(),
        namespace: cluster.namespace.clone(),
        base_domain: cluster.base_domain.clone(),
        region: cluster.region.clone(),
        role_arn,
        account_id,
        tags,
    })
}

/// Resolve the AWS context from the Kubernetes API.
///
/// # Errors
///
/// Returns a resolution error if either record is missing or incomplete, or a
/// control-plane error if the API server cannot be reached.
pub async fn resolve(client: &Client, cluster: &ManagementCluster) -> Result<AwsClusterContext> {
    let aws_cluster = get_infrastructure_record(
        client,
        cluster,
        CAPA_API_VERSION,
        KIND_AWS_CLUSTER,
        Some(&cluster.namespace),
        &cluster.name,
    )
    .await?;
    let identity_name = identity_ref_name(cluster, &aws_cluster)?;
    let identity = get_infrastructure_record(
        client,
        cluster,
        CAPA_API_VERSION,
        KIND_AWS_CLUSTER_ROLE_IDENTITY,
        None,
        &identity_name,
    )
    .await?;

    let context = context_from_records(cluster, &aws_cluster, &identity_name, &identity)?;
    info!(
        cluster = %context.name,
        account = %context.account_id,
        region = %context.region,
        "Resolved AWS management cluster"
    );
    Ok(context)
}

#[cfg(test)]
#[path = "aws_tests.rs"]
mod aws_tests;

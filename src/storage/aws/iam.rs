// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! IAM access role adapter.
//!
//! The role trusts the workload cluster's OIDC issuer for exactly one service
//! account and carries one inline policy named after the role.

use super::policy::{role_policy, trust_policy, TrustPolicyParams};
use crate::cluster::aws::AwsClusterContext;
use crate::crd::{Bucket, BucketAccessRole};
use crate::errors::{Error, Result};
use crate::storage::{merge_tags, AccessRoleService};
use async_trait::async_trait;
use aws_sdk_iam::error::BuildError;
use aws_sdk_iam::types::{Role, Tag};
use aws_sdk_iam::Client;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// [`AccessRoleService`] backed by AWS IAM.
pub struct IamAccessRole {
    client: Client,
    cluster: AwsClusterContext,
}

impl IamAccessRole {
    #[must_use]
    pub fn new(client: Client, cluster: AwsClusterContext) -> Self {
        Self { client, cluster }
    }

    /// Fetch the role, `None` when IAM reports no such entity.
    async fn get_role(&self, bucket: &Bucket, role_name: &str) -> Result<Option<Role>> {
        match self.client.get_role().role_name(role_name).send().await {
            Ok(output) => Ok(output.role),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception()) =>
            {
                Ok(None)
            }
            Err(e) => Err(Error::provider(&bucket.spec.name, "get role", e)),
        }
    }

    async fn retag_role(
        &self,
        bucket: &Bucket,
        role: &Role,
        desired: &BTreeMap<String, String>,
    ) -> Result<()> {
        let role_name = role.role_name();
        let existing: Vec<String> = role.tags().iter().map(|t| t.key().to_string()).collect();

        if !existing.is_empty() {
            self.client
                .untag_role()
                .role_name(role_name)
                .set_tag_keys(Some(existing))
                .send()
                .await
                .map_err(|e| Error::provider(&bucket.spec.name, "untag role", e))?;
        }

        if !desired.is_empty() {
            let tags =
                iam_tags(desired).map_err(|e| Error::provider(&bucket.spec.name, "build role tags", e))?;
            self.client
                .tag_role()
                .role_name(role_name)
                .set_tags(Some(tags))
                .send()
                .await
                .map_err(|e| Error::provider(&bucket.spec.name, "tag role", e))?;
        }

        debug!(role = %role_name, "Replaced role tags");
        Ok(())
    }

    async fn detach_policies(&self, bucket: &Bucket, role_name: &str) -> Result<()> {
        let mut attached = Vec::new();
        let mut pages = self
            .client
            .list_attached_role_policies()
            .role_name(role_name)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| Error::provider(&bucket.spec.name, "list attached role policies", e))?;
            attached.extend(
                page.attached_policies()
                    .iter()
                    .filter_map(|policy| policy.policy_arn().map(str::to_string)),
            );
        }

        for policy_arn in attached {
            self.client
                .detach_role_policy()
                .role_name(role_name)
                .policy_arn(&policy_arn)
                .send()
                .await
                .map_err(|e| Error::provider(&bucket.spec.name, "detach role policy", e))?;
            info!(role = %role_name, policy = %policy_arn, "Detached policy from role");
        }

        let mut inline = Vec::new();
        let mut pages = self
            .client
            .list_role_policies()
            .role_name(role_name)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| Error::provider(&bucket.spec.name, "list role policies", e))?;
            inline.extend(page.policy_names().iter().cloned());
        }

        for policy_name in inline {
            self.client
                .delete_role_policy()
                .role_name(role_name)
                .policy_name(&policy_name)
                .send()
                .await
                .map_err(|e| Error::provider(&bucket.spec.name, "delete role policy", e))?;
            info!(role = %role_name, policy = %policy_name, "Deleted inline role policy");
        }

        Ok(())
    }

    /// Instance profiles share the role name; absent ones are skipped.
    async fn remove_instance_profile(&self, bucket: &Bucket, role_name: &str) -> Result<()> {
        match self
            .client
            .remove_role_from_instance_profile()
            .instance_profile_name(role_name)
            .role_name(role_name)
            .send()
            .await
        {
            Ok(_) => {}
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception()) =>
            {
                debug!(role = %role_name, "No instance profile attached to role");
            }
            Err(e) => {
                return Err(Error::provider(
                    &bucket.spec.name,
                    "remove role from instance profile",
                    e,
                ))
            }
        }

        match self
            .client
            .delete_instance_profile()
            .instance_profile_name(role_name)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception()) =>
            {
                debug!(role = %role_name, "No instance profile to delete");
                Ok(())
            }
            Err(e) => Err(Error::provider(&bucket.spec.name, "delete instance profile", e)),
        }
    }

    fn trust_policy_for(&self, access_role: &BucketAccessRole) -> String {
        let irsa_domain = self.cluster.irsa_domain();
        trust_policy(&TrustPolicyParams {
            partition: self.cluster.partition(),
            account_id: &self.cluster.account_id,
            irsa_domain: &irsa_domain,
            service_account_namespace: &access_role.service_account_namespace,
            service_account_name: &access_role.service_account_name,
        })
    }
}

#[async_trait]
impl AccessRoleService for IamAccessRole {
    async fn configure_role(&self, bucket: &Bucket) -> Result<()> {
        let access_role = requested_role(bucket)?;
        let role_name = access_role.role_name.as_str();
        let trust = self.trust_policy_for(access_role);
        let desired_tags = merge_tags(&self.cluster.tags, &bucket.spec);

        match self.get_role(bucket, role_name).await? {
            None => {
                let tags = iam_tags(&desired_tags)
                    .map_err(|e| Error::provider(&bucket.spec.name, "build role tags", e))?;
                self.client
                    .create_role()
                    .role_name(role_name)
                    .assume_role_policy_document(trust)
                    .description(role_description(role_name))
                    .set_tags((!tags.is_empty()).then_some(tags))
                    .send()
                    .await
                    .map_err(|e| Error::provider(&bucket.spec.name, "create role", e))?;
                info!(role = %role_name, bucket = %bucket.spec.name, "Created IAM role");
            }
            Some(role) => {
                self.client
                    .update_assume_role_policy()
                    .role_name(role_name)
                    .policy_document(trust)
                    .send()
                    .await
                    .map_err(|e| Error::provider(&bucket.spec.name, "update assume role policy", e))?;

                if tags_differ(role.tags(), &desired_tags) {
                    self.retag_role(bucket, &role, &desired_tags).await?;
                }
                debug!(role = %role_name, "Updated IAM role");
            }
        }

        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(role_name)
            .policy_document(role_policy(
                self.cluster.partition(),
                &bucket.spec.name,
                &access_role.extra_bucket_names,
            ))
            .send()
            .await
            .map_err(|e| Error::provider(&bucket.spec.name, "put role policy", e))?;

        Ok(())
    }

    async fn delete_role(&self, bucket: &Bucket) -> Result<()> {
        let access_role = requested_role(bucket)?;
        let role_name = access_role.role_name.as_str();

        if self.get_role(bucket, role_name).await?.is_none() {
            info!(role = %role_name, "IAM role does not exist, skipping deletion");
            return Ok(());
        }

        self.detach_policies(bucket, role_name).await?;
        self.remove_instance_profile(bucket, role_name).await?;

        self.client
            .delete_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| Error::provider(&bucket.spec.name, "delete role", e))?;

        info!(role = %role_name, bucket = %bucket.spec.name, "Deleted IAM role");
        Ok(())
    }
}

fn requested_role(bucket: &Bucket) -> Result<&BucketAccessRole> {
    bucket
        .spec
        .requested_access_role()
        .ok_or_else(|| Error::InvalidBucket {
            bucket: bucket.spec.name.clone(),
            reason: "access role requested without a role name".to_string(),
        })
}

pub(crate) fn role_description(role_name: &str) -> String {
    format!("Role for Giant Swarm managed {role_name}")
}

pub(crate) fn iam_tags(tags: &BTreeMap<String, String>) -> std::result::Result<Vec<Tag>, BuildError> {
    tags.iter()
        .map(|(key, value)| Tag::builder().key(key).value(value).build())
        .collect()
}

/// Whether the role's tags differ from `desired`, ignoring order.
pub(crate) fn tags_differ(current: &[Tag], desired: &BTreeMap<String, String>) -> bool {
    let current: BTreeMap<&str, &str> = current.iter().map(|t| (t.key(), t.value())).collect();
    current.len() != desired.len()
        || desired
            .iter()
            .any(|(k, v)| current.get(k.as_str()) != Some(&v.as_str()))
}

#[cfg(test)]
#[path = "iam_tests.rs"]
mod iam_tests;

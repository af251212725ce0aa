// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Access roles on Azure.
//!
//! Workloads authenticate with the generated access-key secret, so no role
//! is provisioned. A role assignment recorded on the bucket status (created
//! by earlier operator versions) is still cleaned up on deletion.

use super::arm::ArmClient;
use super::naming::ResourceIds;
use crate::cluster::azure::AzureClusterContext;
use crate::constants::AUTHORIZATION_API_VERSION;
use crate::crd::Bucket;
use crate::errors::{Error, Result};
use crate::storage::AccessRoleService;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// [`AccessRoleService`] for Azure.
pub struct AzureAccessRole {
    arm: Arc<ArmClient>,
    cluster: AzureClusterContext,
}

impl AzureAccessRole {
    #[must_use]
    pub fn new(arm: Arc<ArmClient>, cluster: AzureClusterContext) -> Self {
        Self { arm, cluster }
    }
}

#[async_trait]
impl AccessRoleService for AzureAccessRole {
    async fn configure_role(&self, bucket: &Bucket) -> Result<()> {
        debug!(
            bucket = %bucket.spec.name,
            "Azure buckets are accessed through the generated secret, no role to configure"
        );
        Ok(())
    }

    async fn delete_role(&self, bucket: &Bucket) -> Result<()> {
        let Some(assignment_id) = bucket
            .status
            .as_ref()
            .and_then(|status| status.bucket_azure_role_assignment_id.as_deref())
            .filter(|id| !id.is_empty())
        else {
            return Ok(());
        };

        let ids = ResourceIds::new(&self.cluster, &bucket.spec.name);
        match self
            .arm
            .delete(&ids.role_assignment(assignment_id), AUTHORIZATION_API_VERSION)
            .await
        {
            Ok(()) => {
                info!(bucket = %bucket.spec.name, assignment = %assignment_id, "Deleted role assignment");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(Error::provider(&bucket.spec.name, "delete role assignment", e)),
        }
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! AWS adapters: S3 for buckets, IAM for access roles.
//!
//! Both clients share one SDK configuration whose credentials come from
//! assuming the cluster role ARN on top of the operator's default chain.

pub mod iam;
pub mod policy;
pub mod s3;

use super::ProviderServices;
use crate::cluster::aws::AwsClusterContext;
use crate::constants::AWS_ASSUME_ROLE_SESSION;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::debug;

/// Load an SDK configuration for the cluster region, assuming the cluster role.
pub async fn sdk_config(cluster: &AwsClusterContext) -> SdkConfig {
    let region = Region::new(cluster.region.clone());
    let base = aws_config::defaults(BehaviorVersion::latest())
        .region(region.clone())
        .load()
        .await;

    debug!(
        cluster = %cluster.name,
        role_arn = %cluster.role_arn,
        region = %cluster.region,
        "Assuming cluster role"
    );

    let provider = AssumeRoleProvider::builder(cluster.role_arn.clone())
        .session_name(AWS_ASSUME_ROLE_SESSION)
        .region(region.clone())
        .configure(&base)
        .build()
        .await;

    aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .credentials_provider(provider)
        .load()
        .await
}

/// Build the S3 and IAM adapters for `cluster`.
pub async fn services(cluster: &AwsClusterContext) -> ProviderServices {
    let config = sdk_config(cluster).await;

    ProviderServices {
        storage: Box::new(s3::S3ObjectStorage::new(
            aws_sdk_s3::Client::new(&config),
            cluster.clone(),
        )),
        access_role: Box::new(iam::IamAccessRole::new(
            aws_sdk_iam::Client::new(&config),
            cluster.clone(),
        )),
    }
}

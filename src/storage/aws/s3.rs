// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! S3 bucket adapter.

use super::policy::bucket_policy;
use crate::cluster::aws::AwsClusterContext;
use crate::constants::{AWS_DEFAULT_REGION, S3_DELETE_BATCH_SIZE, S3_LIFECYCLE_RULE_ID};
use crate::crd::Bucket;
use crate::errors::{Error, Result};
use crate::storage::{merge_tags, ObjectStorageService};
use async_trait::async_trait;
use aws_sdk_s3::error::BuildError;
use aws_sdk_s3::types::{
    BucketLifecycleConfiguration, BucketLocationConstraint, CreateBucketConfiguration, Delete,
    ExpirationStatus, LifecycleExpiration, LifecycleRule, LifecycleRuleFilter, ObjectIdentifier,
    Tag, Tagging,
};
use aws_sdk_s3::Client;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// [`ObjectStorageService`] backed by Amazon S3.
pub struct S3ObjectStorage {
    client: Client,
    cluster: AwsClusterContext,
}

impl S3ObjectStorage {
    #[must_use]
    pub fn new(client: Client, cluster: AwsClusterContext) -> Self {
        Self { client, cluster }
    }

    async fn set_lifecycle_rules(&self, bucket: &Bucket) -> Result<()> {
        let name = bucket.spec.name.as_str();

        match bucket.spec.expiration_days() {
            Some(days) => {
                let configuration = lifecycle_configuration(days)
                    .map_err(|e| Error::provider(name, "build lifecycle configuration", e))?;
                self.client
                    .put_bucket_lifecycle_configuration()
                    .bucket(name)
                    .lifecycle_configuration(configuration)
                    .send()
                    .await
                    .map_err(|e| Error::provider(name, "put bucket lifecycle configuration", e))?;
                debug!(bucket = %name, days, "Applied expiration rule");
            }
            None => {
                self.client
                    .delete_bucket_lifecycle()
                    .bucket(name)
                    .send()
                    .await
                    .map_err(|e| Error::provider(name, "delete bucket lifecycle", e))?;
                debug!(bucket = %name, "Removed lifecycle rules");
            }
        }
        Ok(())
    }

    async fn set_bucket_policy(&self, bucket: &Bucket) -> Result<()> {
        let name = bucket.spec.name.as_str();
        self.client
            .put_bucket_policy()
            .bucket(name)
            .policy(bucket_policy(self.cluster.partition(), name))
            .send()
            .await
            .map_err(|e| Error::provider(name, "put bucket policy", e))?;
        Ok(())
    }

    async fn set_tags(&self, bucket: &Bucket) -> Result<()> {
        let name = bucket.spec.name.as_str();
        let tagging = tagging(&merge_tags(&self.cluster.tags, &bucket.spec))
            .map_err(|e| Error::provider(name, "build bucket tagging", e))?;
        self.client
            .put_bucket_tagging()
            .bucket(name)
            .tagging(tagging)
            .send()
            .await
            .map_err(|e| Error::provider(name, "put bucket tagging", e))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorageService for S3ObjectStorage {
    async fn exists_bucket(&self, bucket: &Bucket) -> Result<bool> {
        let name = bucket.spec.name.as_str();
        match self.client.head_bucket().bucket(name).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(Error::provider(name, "head bucket", e)),
        }
    }

    async fn create_bucket(&self, bucket: &Bucket) -> Result<()> {
        let name = bucket.spec.name.as_str();
        let mut request = self.client.create_bucket().bucket(name);
        if let Some(configuration) = create_bucket_configuration(&self.cluster.region) {
            request = request.create_bucket_configuration(configuration);
        }

        request
            .send()
            .await
            .map_err(|e| Error::provider(name, "create bucket", e))?;

        info!(bucket = %name, region = %self.cluster.region, "Created S3 bucket");
        Ok(())
    }

    /// S3 buckets have no mutable properties outside of configuration.
    async fn update_bucket(&self, _bucket: &Bucket) -> Result<()> {
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &Bucket) -> Result<()> {
        let name = bucket.spec.name.as_str();

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(name)
            .max_keys(S3_DELETE_BATCH_SIZE)
            .into_paginator()
            .send();

        let mut deleted = 0usize;
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| Error::provider(name, "list objects", e))?;
            let objects = page
                .contents()
                .iter()
                .filter_map(|object| object.key())
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<std::result::Result<Vec<_>, BuildError>>()
                .map_err(|e| Error::provider(name, "build object identifiers", e))?;

            if objects.is_empty() {
                continue;
            }

            let count = objects.len();
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| Error::provider(name, "build delete request", e))?;
            self.client
                .delete_objects()
                .bucket(name)
                .delete(delete)
                .send()
                .await
                .map_err(|e| Error::provider(name, "delete objects", e))?;
            deleted += count;
        }

        self.client
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(|e| Error::provider(name, "delete bucket", e))?;

        info!(bucket = %name, objects = deleted, "Deleted S3 bucket");
        Ok(())
    }

    async fn configure_bucket(&self, bucket: &Bucket) -> Result<()> {
        self.set_lifecycle_rules(bucket).await?;
        self.set_bucket_policy(bucket).await?;
        self.set_tags(bucket).await
    }
}

/// Location constraint for `CreateBucket`; `us-east-1` rejects an explicit one.
pub(crate) fn create_bucket_configuration(region: &str) -> Option<CreateBucketConfiguration> {
    if region.is_empty() || region == AWS_DEFAULT_REGION {
        return None;
    }
    Some(
        CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build(),
    )
}

/// Single enabled rule expiring every object after `days`.
pub(crate) fn lifecycle_configuration(
    days: i32,
) -> std::result::Result<BucketLifecycleConfiguration, BuildError> {
    let rule = LifecycleRule::builder()
        .id(S3_LIFECYCLE_RULE_ID)
        .status(ExpirationStatus::Enabled)
        .filter(LifecycleRuleFilter::builder().prefix("").build())
        .expiration(LifecycleExpiration::builder().days(days).build())
        .build()?;

    BucketLifecycleConfiguration::builder()
        .set_rules(Some(vec![rule]))
        .build()
}

pub(crate) fn tagging(tags: &BTreeMap<String, String>) -> std::result::Result<Tagging, BuildError> {
    let tag_set = tags
        .iter()
        .map(|(key, value)| Tag::builder().key(key).value(value).build())
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Tagging::builder().set_tag_set(Some(tag_set)).build()
}

#[cfg(test)]
#[path = "s3_tests.rs"]
mod s3_tests;

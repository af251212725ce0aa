// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the object storage operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `Bucket` CRD
pub const API_GROUP: &str = "objectstorage.giantswarm.io";

/// API version for the `Bucket` CRD
pub const API_VERSION: &str = "v1alpha1";

/// Kind name for the `Bucket` resource
pub const KIND_BUCKET: &str = "Bucket";

/// Finalizer placed on every `Bucket` before any provider-side mutation
pub const BUCKET_FINALIZER: &str = "bucket.objectstorage.giantswarm.io";

/// Finalizer placed on the Azure access-key secret generated for a bucket
pub const AZURE_SECRET_FINALIZER: &str = "giantswarm.io/object-storage-operator";

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "object-storage-operator";

// ============================================================================
// Management Cluster Providers
// ============================================================================

/// Cluster API provider name for AWS management clusters
pub const PROVIDER_CAPA: &str = "capa";

/// Cluster API provider name for Azure management clusters
pub const PROVIDER_CAPZ: &str = "capz";

// ============================================================================
// Cluster API Infrastructure Resources
// ============================================================================

/// API group shared by all Cluster API infrastructure resources
pub const CAPI_INFRASTRUCTURE_GROUP: &str = "infrastructure.cluster.x-k8s.io";

/// API version of `AWSCluster` and `AWSClusterRoleIdentity`
pub const CAPA_API_VERSION: &str = "v1beta2";

/// Kind of the AWS cluster record
pub const KIND_AWS_CLUSTER: &str = "AWSCluster";

/// Kind of the AWS role identity record
pub const KIND_AWS_CLUSTER_ROLE_IDENTITY: &str = "AWSClusterRoleIdentity";

/// API version of `AzureCluster` and `AzureClusterIdentity`
pub const CAPZ_API_VERSION: &str = "v1beta1";

/// Kind of the Azure cluster record
pub const KIND_AZURE_CLUSTER: &str = "AzureCluster";

/// Kind of the Azure identity record
pub const KIND_AZURE_CLUSTER_IDENTITY: &str = "AzureClusterIdentity";

/// Key holding the service principal password in the identity secret
pub const AZURE_CLIENT_SECRET_KEY: &str = "clientSecret";

/// Suffix of the ConfigMap carrying the cluster's rendered values
pub const CLUSTER_VALUES_SUFFIX: &str = "-cluster-values";

/// Key of the rendered values document inside the cluster values ConfigMap
pub const CLUSTER_VALUES_KEY: &str = "values";

/// Network mode marking a cluster as private
pub const NETWORK_MODE_PRIVATE: &str = "private";

// ============================================================================
// AWS Constants
// ============================================================================

/// Region in which S3 rejects an explicit location constraint
pub const AWS_DEFAULT_REGION: &str = "us-east-1";

/// Region prefix of the AWS China partition
pub const AWS_CHINA_REGION_PREFIX: &str = "cn-";

/// ARN partition for standard regions
pub const AWS_PARTITION: &str = "aws";

/// ARN partition for China regions
pub const AWS_CHINA_PARTITION: &str = "aws-cn";

/// Identifier of the single lifecycle rule managed on S3 buckets
pub const S3_LIFECYCLE_RULE_ID: &str = "Expiration";

/// Maximum number of keys returned per `ListObjectsV2` page and deleted per batch
pub const S3_DELETE_BATCH_SIZE: i32 = 1000;

/// Session name used when assuming the management cluster role
pub const AWS_ASSUME_ROLE_SESSION: &str = "object-storage-operator";

// ============================================================================
// Azure Constants
// ============================================================================

/// Azure Resource Manager endpoint
pub const ARM_ENDPOINT: &str = "https://management.azure.com";

/// OAuth scope for Azure Resource Manager tokens
pub const ARM_SCOPE: &str = "https://management.azure.com/.default";

/// Azure AD authority host
pub const AZURE_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Instance metadata endpoint for managed identity tokens
pub const AZURE_IMDS_TOKEN_ENDPOINT: &str =
    "http://169.254.169.254/metadata/identity/oauth2/token";

/// Environment variable pointing at the projected service account token
pub const AZURE_FEDERATED_TOKEN_FILE_ENV: &str = "AZURE_FEDERATED_TOKEN_FILE";

/// `api-version` for `Microsoft.Storage` resources
pub const STORAGE_API_VERSION: &str = "2023-01-01";

/// `api-version` for `Microsoft.Network/privateEndpoints`
pub const NETWORK_API_VERSION: &str = "2023-09-01";

/// `api-version` for `Microsoft.Network/privateDnsZones`
pub const PRIVATE_DNS_API_VERSION: &str = "2020-06-01";

/// `api-version` for `Microsoft.Authorization/roleAssignments`
pub const AUTHORIZATION_API_VERSION: &str = "2022-04-01";

/// Maximum storage account name length
pub const STORAGE_ACCOUNT_NAME_MAX_LEN: usize = 24;

/// Name of the lifecycle rule owned by the operator inside the management policy
pub const AZURE_LIFECYCLE_RULE_NAME: &str = "ExpirationLogging";

/// Storage accounts only accept a management policy with this name
pub const AZURE_MANAGEMENT_POLICY_NAME: &str = "default";

/// Access key copied into the generated secret
pub const AZURE_ACCESS_KEY_NAME: &str = "key1";

/// Secret data key holding the storage account name
pub const SECRET_ACCOUNT_NAME_KEY: &str = "accountName";

/// Secret data key holding the storage account access key
pub const SECRET_ACCOUNT_KEY_KEY: &str = "accountKey";

/// Private DNS zone required for blob private endpoints
pub const AZURE_BLOB_PRIVATE_ZONE: &str = "privatelink.blob.core.windows.net";

/// Name of the virtual network link between the private zone and the cluster VNet
pub const AZURE_VNET_LINK_NAME: &str = "giantswarm-observability";

/// Subnet receiving private endpoints
pub const AZURE_NODE_SUBNET: &str = "node-subnet";

/// Private link sub-resource for blob storage
pub const AZURE_BLOB_GROUP_ID: &str = "blob";

/// TTL of the private endpoint A records (1 hour)
pub const AZURE_A_RECORD_TTL_SECS: i64 = 3600;

// ============================================================================
// Controller Timing Constants
// ============================================================================

/// Requeue interval after a successful reconciliation (5 minutes)
pub const REQUEUE_WHEN_READY_SECS: u64 = 300;

/// Requeue interval after a failed reconciliation (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Number of Tokio worker threads
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Lease duration in seconds
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Grace period in seconds before a lease is considered lost
pub const DEFAULT_LEASE_GRACE_SECS: u64 = 5;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Object Storage Operator
//!
//! A Kubernetes operator that converges cloud object-storage buckets, and the
//! access roles workloads use to reach them, towards `Bucket` records.
//!
//! ## Overview
//!
//! - AWS: S3 buckets with lifecycle, TLS-only bucket policy and tags, plus an
//!   IAM role trusted through the cluster's OIDC provider
//! - Azure: a storage account and blob container per bucket, lifecycle
//!   management policy, an access-key secret and, on private clusters, a
//!   private endpoint with its DNS records
//!
//! ## Modules
//!
//! - [`crd`] - the `Bucket` custom resource
//! - [`cluster`] - resolution of the management cluster's cloud context
//! - [`storage`] - provider adapters behind two small traits
//! - [`reconcilers`] - the finalizer-guarded reconciliation engine
//! - [`context`] - wiring of the engine for the controller
//! - [`metrics`] and [`http_server`] - Prometheus metrics and probes
//!
//! ## Example
//!
//! ```rust,no_run
//! use object_storage_operator::crd::{BucketExpirationPolicy, BucketSpec, ReclaimPolicy};
//!
//! let spec = BucketSpec {
//!     name: "giantswarm-glippy-loki".to_string(),
//!     expiration_policy: Some(BucketExpirationPolicy { days: 100 }),
//!     reclaim_policy: ReclaimPolicy::Delete,
//!     access_role: None,
//!     tags: vec![],
//! };
//! ```

pub mod cluster;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod http_server;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod storage;

#[cfg(test)]
mod crd_tests;

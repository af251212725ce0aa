// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of `Bucket` records.
//!
//! - [`bucket`] - the finalizer-guarded state machine driving the provider adapters
//! - [`store`] - control-plane reads and writes of the record
//! - [`finalizers`] - finalizer helpers shared by the record and generated secrets
//! - [`retry`] - backoff for Kubernetes API calls and provider operation polling
//!
//! # Example
//!
//! ```rust,ignore
//! use object_storage_operator::reconcilers::{BucketReconciler, KubeBucketStore};
//! use std::sync::Arc;
//!
//! let reconciler = BucketReconciler::new(
//!     Arc::new(KubeBucketStore::new(client.clone())),
//!     resolver,
//!     factory,
//! );
//! reconciler.reconcile("loki", "loki").await?;
//! ```

pub mod bucket;
pub mod finalizers;
pub mod retry;
pub mod store;

pub use bucket::{BucketReconciler, ReconcileOutcome};
pub use store::{BucketStore, KubeBucketStore};

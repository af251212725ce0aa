// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for bucket reconciliation.
//!
//! The taxonomy mirrors how failures are handled by the controller:
//! - resolution failures (cluster context or identity cannot be determined)
//! - provider failures (cloud API calls), carrying the bucket and operation
//! - control-plane failures (Kubernetes API)
//! - configuration errors that retrying cannot fix
//!
//! Provider "not found" answers never surface here: adapters classify them
//! by error code and turn them into ordinary branches.

use thiserror::Error;

/// Boxed error used as the source of provider failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the operator library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the reconciliation engine and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// The cluster context could not be determined.
    ///
    /// Covers missing infrastructure records, missing identity references,
    /// missing role ARNs or client IDs and unsupported identity types.
    #[error("failed to resolve cluster context for '{cluster}': {reason}")]
    Resolution {
        /// Management cluster being resolved
        cluster: String,
        /// What was missing or malformed
        reason: String,
    },

    /// A cloud provider call failed.
    #[error("{operation} failed for bucket '{bucket}': {source}")]
    Provider {
        /// Provider bucket name
        bucket: String,
        /// Operation that failed (e.g. `create bucket`, `put role policy`)
        operation: &'static str,
        /// Underlying SDK or HTTP error
        #[source]
        source: BoxError,
    },

    /// A Kubernetes API call failed.
    #[error("Kubernetes API request failed: {0}")]
    ControlPlane(#[from] kube::Error),

    /// The management cluster provider has no adapter.
    #[error("unsupported management cluster provider '{0}' (expected capa or capz)")]
    UnsupportedProvider(String),

    /// The bucket record cannot be acted upon as written.
    #[error("invalid bucket '{bucket}': {reason}")]
    InvalidBucket {
        /// Name of the bucket record
        bucket: String,
        /// Why it is invalid
        reason: String,
    },
}

impl Error {
    /// Build a [`Error::Resolution`].
    pub fn resolution(cluster: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            cluster: cluster.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`Error::Provider`] wrapping `source`.
    pub fn provider(
        bucket: impl Into<String>,
        operation: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Provider {
            bucket: bucket.into(),
            operation,
            source: source.into(),
        }
    }

    /// Returns true if retrying the reconciliation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Resolution { .. } | Self::Provider { .. } | Self::ControlPlane(_) => true,
            Self::UnsupportedProvider(_) | Self::InvalidBucket { .. } => false,
        }
    }

    /// Short category used as the `error_type` metric label.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Resolution { .. } => "resolution_error",
            Self::Provider { .. } => "provider_error",
            Self::ControlPlane(_) => "api_error",
            Self::UnsupportedProvider(_) => "unsupported_provider",
            Self::InvalidBucket { .. } => "validation_error",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;

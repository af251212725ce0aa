// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label constants stamped on resources generated by the operator.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Label Values
// ============================================================================

/// Value identifying this operator in managed-by labels
pub const MANAGED_BY_OPERATOR: &str = "object-storage-operator";

/// Value for `app.kubernetes.io/part-of`
pub const PART_OF_OBJECT_STORAGE: &str = "object-storage";

// ============================================================================
// Platform Labels
// ============================================================================

/// Platform-wide managed-by label consumed by the observability stack
pub const GIANTSWARM_MANAGED_BY: &str = "giantswarm.io/managed-by";

/// Labels stamped on every generated secret.
#[must_use]
pub fn generated_secret_labels() -> std::collections::BTreeMap<String, String> {
    [
        (GIANTSWARM_MANAGED_BY, MANAGED_BY_OPERATOR),
        (K8S_MANAGED_BY, MANAGED_BY_OPERATOR),
        (K8S_PART_OF, PART_OF_OBJECT_STORAGE),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

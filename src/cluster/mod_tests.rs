// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for record field helpers in `cluster/mod.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;

    #[test]
    fn test_nested_str_walks_path() {
        let record = json!({ "spec": { "identityRef": { "name": "default" } } });

        assert_eq!(
            nested_str(&record, &["spec", "identityRef", "name"]),
            Some("default")
        );
        assert_eq!(nested_str(&record, &["spec", "missing"]), None);
    }

    #[test]
    fn test_required_str_rejects_empty_values() {
        let record = json!({ "spec": { "roleARN": "" } });

        let err = required_str("glippy", "AWSClusterRoleIdentity default", &record, &[
            "spec", "roleARN",
        ])
        .unwrap_err();

        assert!(err
            .to_string()
            .contains("missing or incorrect spec.roleARN in AWSClusterRoleIdentity default"));
    }

    #[test]
    fn test_nested_string_map_absent_is_empty() {
        let record = json!({ "spec": {} });

        let tags = nested_string_map("glippy", "AWSCluster", &record, &[
            "spec",
            "additionalTags",
        ])
        .unwrap();

        assert!(tags.is_empty());
    }

    #[test]
    fn test_nested_string_map_rejects_non_string_values() {
        let record = json!({ "spec": { "additionalTags": { "team": 3 } } });

        let result = nested_string_map("glippy", "AWSCluster", &record, &[
            "spec",
            "additionalTags",
        ]);

        assert!(matches!(result, Err(Error::Resolution { .. })));
    }

    #[test]
    fn test_cluster_context_accessors_follow_variant() {
        // Arrange
        let context = ClusterContext::Aws(AwsClusterContext {
            name: "glippy".to_string(),
            namespace: "org-giantswarm".to_string(),
            base_domain: "gigantic.io".to_string(),
            region: "eu-central-1".to_string(),
            role_arn: "arn:aws:iam::123456789012:role/glippy".to_string(),
            account_id: "123456789012".to_string(),
            tags: BTreeMap::new(),
        });

        // Assert
        assert_eq!(context.name(), "glippy");
        assert_eq!(context.region(), "eu-central-1");
        assert_eq!(context.provider(), Provider::Aws);
    }
}

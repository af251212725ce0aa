// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `cluster/aws.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::Provider;
    use serde_json::json;

    fn management_cluster(region: &str) -> ManagementCluster {
        ManagementCluster {
            name: "glippy".into(),
            namespace: "org-giantswarm".into(),
            base_domain: "gaws.gigantic.io".into(),
            provider: Provider::Aws,
            region: region.into(),
        }
    }

    fn aws_cluster() -> Value {
        json!({
            "spec": {
                "identityRef": { "kind": "AWSClusterRoleIdentity", "name": "default" },
                "additionalTags": { "installation": "glippy" }
            }
        })
    }

    fn identity() -> Value {
        json!({ "spec": { "roleARN": "arn:aws:iam::123456789012:role/capa-controller" } })
    }

    #[test]
    fn test_account_id_from_arn() {
        assert_eq!(
            account_id_from_arn("arn:aws:iam::123456789012:role/capa-controller"),
            Some("123456789012")
        );
        assert_eq!(
            account_id_from_arn("arn:aws-cn:iam::210987654321:role/x"),
            Some("210987654321")
        );
        assert_eq!(account_id_from_arn("not-an-arn"), None);
        assert_eq!(account_id_from_arn("arn:aws:iam:::role/x"), None);
    }

    #[test]
    fn test_context_from_records() {
        // Arrange
        let mc = management_cluster("eu-west-1");

        // Act
        let name = identity_ref_name(&mc, &aws_cluster()).unwrap();
        let ctx = context_from_records(&mc, &aws_cluster(), &name, &identity()).unwrap();

        // Assert
        assert_eq!(name, "default");
        assert_eq!(ctx.account_id, "123456789012");
        assert_eq!(ctx.role_arn, "arn:aws:iam::123456789012:role/capa-controller");
        assert_eq!(ctx.tags.get("installation").map(String::as_str), Some("glippy"));
        assert_eq!(ctx.region, "eu-west-1");
    }

    #[test]
    fn test_missing_identity_ref_is_resolution_error() {
        let mc = management_cluster("eu-west-1");
        let record = json!({ "spec": {} });

        let err = identity_ref_name(&mc, &record).unwrap_err();

        assert!(err.to_string().contains("missing identityRef"));
    }

    #[test]
    fn test_missing_role_arn_is_resolution_error() {
        let mc = management_cluster("eu-west-1");

        let result = context_from_records(&mc, &aws_cluster(), "default", &json!({ "spec": {} }));

        assert!(matches!(result, Err(Error::Resolution { .. })));
    }

    #[test]
    fn test_partition_and_irsa_domain() {
        let mc = management_cluster("eu-west-1");
        let ctx = context_from_records(&mc, &aws_cluster(), "default", &identity()).unwrap();
        assert_eq!(ctx.partition(), "aws");
        assert_eq!(ctx.irsa_domain(), "irsa.glippy.gaws.gigantic.io");

        let mc = management_cluster("cn-north-1");
        let ctx = context_from_records(&mc, &aws_cluster(), "default", &identity()).unwrap();
        assert_eq!(ctx.partition(), "aws-cn");
        assert_eq!(
            ctx.irsa_domain(),
            "s3.cn-north-1.amazonaws.com.cn/123456789012-g8s-glippy-oidc-pod-identity-v3"
        );
    }
}

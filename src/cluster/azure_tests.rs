// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `cluster/azure.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::Provider;
    use k8s_openapi::ByteString;
    use serde_json::json;

    fn management_cluster() -> ManagementCluster {
        ManagementCluster {
            name: "glippy".into(),
            namespace: "org-giantswarm".into(),
            base_domain: "azure.gigantic.io".into(),
            provider: Provider::Azure,
            region: "westeurope".into(),
        }
    }

    fn azure_cluster() -> Value {
        json!({
            "spec": {
                "identityRef": { "name": "cluster-identity" },
                "resourceGroup": "glippy",
                "subscriptionID": "1be3b2e6-497b-45b9-915f-eb35cae23c6a",
                "additionalTags": { "installation": "glippy" }
            }
        })
    }

    #[test]
    fn test_identity_ref_namespace_falls_back() {
        let (name, namespace) = identity_ref(&management_cluster(), &azure_cluster()).unwrap();

        assert_eq!(name, "cluster-identity");
        assert_eq!(namespace, "org-giantswarm");
    }

    #[test]
    fn test_identity_ref_explicit_namespace() {
        let record = json!({
            "spec": { "identityRef": { "name": "id", "namespace": "capz-system" } }
        });

        let (_, namespace) = identity_ref(&management_cluster(), &record).unwrap();

        assert_eq!(namespace, "capz-system");
    }

    #[test]
    fn test_parse_user_assigned_msi() {
        let record = json!({ "spec": { "type": "UserAssignedMSI", "clientID": "client" } });

        let identity = parse_identity(&management_cluster(), "id", &record).unwrap();

        assert_eq!(identity, IdentitySpec::UserAssignedMsi {
            client_id: "client".into()
        });
    }

    #[test]
    fn test_parse_manual_service_principal() {
        let record = json!({
            "spec": {
                "type": "ManualServicePrincipal",
                "tenantID": "tenant",
                "clientID": "client",
                "clientSecret": { "name": "sp-secret", "namespace": "capz-system" }
            }
        });

        let identity = parse_identity(&management_cluster(), "id", &record).unwrap();

        assert_eq!(identity, IdentitySpec::ManualServicePrincipal {
            tenant_id: "tenant".into(),
            client_id: "client".into(),
            secret_name: "sp-secret".into(),
            secret_namespace: "capz-system".into(),
        });
    }

    #[test]
    fn test_parse_workload_identity_requires_tenant() {
        let record = json!({ "spec": { "type": "WorkloadIdentity", "clientID": "client" } });

        let err = parse_identity(&management_cluster(), "id", &record).unwrap_err();

        assert!(err.to_string().contains("spec.tenantID"));
    }

    #[test]
    fn test_unsupported_identity_type() {
        let record = json!({ "spec": { "type": "ServicePrincipalCertificate" } });

        let err = parse_identity(&management_cluster(), "id", &record).unwrap_err();

        assert!(err
            .to_string()
            .contains("unsupported identity type 'ServicePrincipalCertificate'"));
    }

    #[test]
    fn test_is_private_network() {
        let private = "global:\n  connectivity:\n    network:\n      mode: private\n";
        let public = "global:\n  connectivity:\n    network:\n      mode: public\n";

        assert!(is_private_network(private).unwrap());
        assert!(!is_private_network(public).unwrap());
        assert!(!is_private_network("global: {}\n").unwrap());
        assert!(is_private_network("global: [unterminated").is_err());
    }

    #[test]
    fn test_missing_values_config_map_is_public() {
        assert!(!private_from_config_map(&management_cluster(), None).unwrap());
        assert!(!private_from_config_map(&management_cluster(), Some(&ConfigMap::default())).unwrap());
    }

    #[test]
    fn test_unreadable_values_fail_resolution() {
        let config_map = ConfigMap {
            data: Some(BTreeMap::from([(
                "values".to_string(),
                "global: [unterminated".to_string(),
            )])),
            ..Default::default()
        };

        let result = private_from_config_map(&management_cluster(), Some(&config_map));

        assert!(matches!(result, Err(Error::Resolution { .. })));
    }

    #[test]
    fn test_client_secret_from_secret() {
        let secret = Secret {
            data: Some(BTreeMap::from([(
                "clientSecret".to_string(),
                ByteString(b"s3cr3t".to_vec()),
            )])),
            ..Default::default()
        };

        assert_eq!(
            client_secret_from(&management_cluster(), "ns/sp", &secret).unwrap(),
            "s3cr3t"
        );
        assert!(client_secret_from(&management_cluster(), "ns/sp", &Secret::default()).is_err());
    }

    #[test]
    fn test_context_from_records() {
        let identity = AzureIdentity::UserAssignedMsi {
            client_id: "client".into(),
        };

        let ctx = context_from_records(&management_cluster(), &azure_cluster(), identity, true)
            .unwrap();

        assert_eq!(ctx.resource_group, "glippy");
        assert_eq!(ctx.subscription_id, "1be3b2e6-497b-45b9-915f-eb35cae23c6a");
        assert_eq!(ctx.vnet_name(), "glippy-vnet");
        assert_eq!(ctx.subnet_name(), "node-subnet");
        assert!(ctx.private);
    }

    #[test]
    fn test_context_requires_resource_group() {
        let record = json!({ "spec": { "subscriptionID": "sub" } });
        let identity = AzureIdentity::UserAssignedMsi {
            client_id: "client".into(),
        };

        let result = context_from_records(&management_cluster(), &record, identity, false);

        assert!(matches!(result, Err(Error::Resolution { .. })));
    }

    #[test]
    fn test_debug_redacts_client_secret() {
        let identity = AzureIdentity::ManualServicePrincipal {
            tenant_id: "tenant".into(),
            client_id: "client".into(),
            client_secret: "s3cr3t".into(),
        };

        let rendered = format!("{identity:?}");

        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("<redacted>"));
    }
}

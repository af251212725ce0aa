// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `s3.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use aws_sdk_s3::types::ExpirationStatus;

    #[test]
    fn test_no_location_constraint_in_us_east_1() {
        assert!(create_bucket_configuration("us-east-1").is_none());
    }

    #[test]
    fn test_location_constraint_outside_us_east_1() {
        // Act
        let configuration =
            create_bucket_configuration("eu-west-1").expect("constraint must be set");

        // Assert
        assert_eq!(
            configuration.location_constraint(),
            Some(&BucketLocationConstraint::EuWest1)
        );
    }

    #[test]
    fn test_lifecycle_configuration_expires_all_objects() {
        // Act
        let configuration = lifecycle_configuration(100).expect("valid configuration");

        // Assert
        let rules = configuration.rules();
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.id(), Some("Expiration"));
        assert_eq!(rule.status(), &ExpirationStatus::Enabled);
        assert_eq!(rule.expiration().and_then(|e| e.days()), Some(100));
        assert_eq!(rule.filter().and_then(|f| f.prefix()), Some(""));
    }

    #[test]
    fn test_tagging_contains_every_tag() {
        // Arrange
        let tags = BTreeMap::from([
            ("app".to_string(), "loki".to_string()),
            ("installation".to_string(), "glippy".to_string()),
        ]);

        // Act
        let tagging = tagging(&tags).expect("valid tagging");

        // Assert
        let pairs: Vec<(&str, &str)> = tagging
            .tag_set()
            .iter()
            .map(|tag| (tag.key(), tag.value()))
            .collect();
        assert_eq!(pairs, vec![("app", "loki"), ("installation", "glippy")]);
    }

    #[test]
    fn test_tagging_empty() {
        let tagging = tagging(&BTreeMap::new()).expect("valid tagging");

        assert!(tagging.tag_set().is_empty());
    }

    // ------------------------------------------------------------------
    // Adapter behaviour against an S3-compatible endpoint
    // ------------------------------------------------------------------

    use crate::crd::{BucketExpirationPolicy, BucketSpec};
    use aws_sdk_s3::config::retry::RetryConfig;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
    use wiremock::matchers::{
        body_string_contains, method, path_regex, query_param, query_param_is_missing,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BUCKET_PATH: &str = r"^/loki-logs/?$";
    const SUBRESOURCES: [&str; 5] = ["lifecycle", "policy", "tagging", "delete", "list-type"];

    fn cluster(region: &str) -> AwsClusterContext {
        AwsClusterContext {
            name: "glippy".to_string(),
            namespace: "org-giantswarm".to_string(),
            base_domain: "gigantic.io".to_string(),
            region: region.to_string(),
            role_arn: "arn:aws:iam::123456789012:role/glippy".to_string(),
            account_id: "123456789012".to_string(),
            tags: BTreeMap::from([("installation".to_string(), "glippy".to_string())]),
        }
    }

    fn adapter(server: &MockServer, region: &str) -> S3ObjectStorage {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .endpoint_url(server.uri())
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .build();
        S3ObjectStorage::new(Client::from_conf(config), cluster(region))
    }

    fn bucket(expiration_days: Option<i32>) -> Bucket {
        Bucket::new(
            "loki",
            BucketSpec {
                name: "loki-logs".to_string(),
                expiration_policy: expiration_days.map(|days| BucketExpirationPolicy { days }),
                ..Default::default()
            },
        )
    }

    /// Requests received so far as `METHOD /path?subresource`.
    async fn calls(server: &MockServer) -> Vec<String> {
        let requests = server.received_requests().await.unwrap_or_default();
        requests
            .iter()
            .map(|request| {
                let subresource = request
                    .url
                    .query_pairs()
                    .map(|(key, _)| key.into_owned())
                    .find(|key| SUBRESOURCES.contains(&key.as_str()));
                let call = format!(
                    "{} {}{}",
                    request.method.as_str(),
                    request.url.path().trim_end_matches('/'),
                    subresource.map(|key| format!("?{key}")).unwrap_or_default()
                );
                call
            })
            .collect()
    }

    async fn respond(server: &MockServer, verb: &str, status: u16) {
        Mock::given(method(verb))
            .and(path_regex(BUCKET_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(server)
            .await;
    }

    fn list_page(keys: &[&str], next: Option<&str>) -> String {
        let contents: String = keys
            .iter()
            .map(|key| format!("<Contents><Key>{key}</Key><Size>1</Size></Contents>"))
            .collect();
        let continuation = next
            .map(|token| format!("<NextContinuationToken>{token}</NextContinuationToken>"))
            .unwrap_or_default();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <Name>loki-logs</Name><Prefix></Prefix><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys>\
             <IsTruncated>{}</IsTruncated>{continuation}{contents}</ListBucketResult>",
            keys.len(),
            next.is_some()
        )
    }

    const DELETE_RESULT: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
        <DeleteResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\"></DeleteResult>";

    #[tokio::test]
    async fn test_exists_bucket_true_on_head_success() {
        let server = MockServer::start().await;
        respond(&server, "HEAD", 200).await;

        let exists = adapter(&server, "eu-west-1")
            .exists_bucket(&bucket(None))
            .await
            .expect("head bucket succeeds");

        assert!(exists);
    }

    #[tokio::test]
    async fn test_exists_bucket_false_on_not_found() {
        // Arrange
        let server = MockServer::start().await;
        respond(&server, "HEAD", 404).await;

        // Act
        let exists = adapter(&server, "eu-west-1")
            .exists_bucket(&bucket(None))
            .await
            .expect("not found is not an error");

        // Assert
        assert!(!exists);
    }

    #[tokio::test]
    async fn test_exists_bucket_errors_on_forbidden() {
        // Arrange
        let server = MockServer::start().await;
        respond(&server, "HEAD", 403).await;

        // Act
        let result = adapter(&server, "eu-west-1").exists_bucket(&bucket(None)).await;

        // Assert
        match result {
            Err(Error::Provider { operation, .. }) => assert_eq!(operation, "head bucket"),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_bucket_sends_location_constraint_outside_us_east_1() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path_regex(BUCKET_PATH))
            .and(body_string_contains("<LocationConstraint>eu-west-1</LocationConstraint>"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        // Act
        let result = adapter(&server, "eu-west-1").create_bucket(&bucket(None)).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_bucket_omits_location_constraint_in_us_east_1() {
        // Arrange
        let server = MockServer::start().await;
        respond(&server, "PUT", 200).await;

        // Act
        adapter(&server, "us-east-1")
            .create_bucket(&bucket(None))
            .await
            .expect("create bucket succeeds");

        // Assert
        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 1);
        let body = String::from_utf8_lossy(&requests[0].body).into_owned();
        assert!(!body.contains("LocationConstraint"));
    }

    #[tokio::test]
    async fn test_delete_bucket_purges_every_page_before_deleting() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(BUCKET_PATH))
            .and(query_param_is_missing("continuation-token"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                list_page(&["a.log", "b.log"], Some("page-2")),
                "application/xml",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(BUCKET_PATH))
            .and(query_param("continuation-token", "page-2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(list_page(&["c.log"], None), "application/xml"),
            )
            .mount(&server)
            .await;
        for key in ["<Key>a.log</Key>", "<Key>c.log</Key>"] {
            Mock::given(method("POST"))
                .and(path_regex(BUCKET_PATH))
                .and(body_string_contains(key))
                .respond_with(ResponseTemplate::new(200).set_body_raw(DELETE_RESULT, "application/xml"))
                .expect(1)
                .mount(&server)
                .await;
        }
        respond(&server, "DELETE", 204).await;

        // Act
        adapter(&server, "eu-west-1")
            .delete_bucket(&bucket(None))
            .await
            .expect("delete bucket succeeds");

        // Assert
        assert_eq!(
            calls(&server).await,
            vec![
                "GET /loki-logs?list-type",
                "POST /loki-logs?delete",
                "GET /loki-logs?list-type",
                "POST /loki-logs?delete",
                "DELETE /loki-logs",
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_bucket_stops_when_purge_fails() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(BUCKET_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(list_page(&["a.log"], None), "application/xml"),
            )
            .mount(&server)
            .await;
        respond(&server, "POST", 403).await;
        Mock::given(method("DELETE"))
            .and(path_regex(BUCKET_PATH))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        // Act
        let result = adapter(&server, "eu-west-1").delete_bucket(&bucket(None)).await;

        // Assert
        assert!(matches!(result, Err(Error::Provider { operation: "delete objects", .. })));
    }

    #[tokio::test]
    async fn test_configure_with_expiration_puts_lifecycle_policy_and_tags() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path_regex(BUCKET_PATH))
            .and(query_param("lifecycle", ""))
            .and(body_string_contains("<Days>30</Days>"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(BUCKET_PATH))
            .and(query_param("tagging", ""))
            .and(body_string_contains("<Key>installation</Key>"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        respond(&server, "PUT", 204).await;

        // Act
        adapter(&server, "eu-west-1")
            .configure_bucket(&bucket(Some(30)))
            .await
            .expect("configure succeeds");

        // Assert
        assert_eq!(
            calls(&server).await,
            vec![
                "PUT /loki-logs?lifecycle",
                "PUT /loki-logs?policy",
                "PUT /loki-logs?tagging",
            ]
        );
    }

    #[tokio::test]
    async fn test_configure_without_expiration_deletes_lifecycle() {
        // Arrange
        let server = MockServer::start().await;
        respond(&server, "DELETE", 204).await;
        respond(&server, "PUT", 204).await;

        // Act
        adapter(&server, "eu-west-1")
            .configure_bucket(&bucket(None))
            .await
            .expect("configure succeeds");

        // Assert
        let calls = calls(&server).await;
        assert_eq!(
            calls,
            vec![
                "DELETE /loki-logs?lifecycle",
                "PUT /loki-logs?policy",
                "PUT /loki-logs?tagging",
            ]
        );
    }
}

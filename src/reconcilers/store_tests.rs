// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `store.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::crd::BucketSpec;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RECORD_PATH: &str =
        "/apis/objectstorage.giantswarm.io/v1alpha1/namespaces/loki/buckets/loki-bucket";

    fn client(server: &MockServer) -> Client {
        rustls::crypto::ring::default_provider()
            .install_default()
            .ok();
        let config = kube::Config::new(server.uri().parse().expect("mock server uri"));
        Client::try_from(config).expect("client for mock server")
    }

    fn bucket(finalizers: &[&str]) -> Bucket {
        let mut bucket = Bucket::new(
            "loki-bucket",
            BucketSpec {
                name: "giantswarm-glippy-loki".to_string(),
                ..Default::default()
            },
        );
        bucket.metadata.namespace = Some("loki".to_string());
        bucket.metadata.finalizers = Some(finalizers.iter().map(ToString::to_string).collect());
        bucket
    }

    fn record_body(bucket: &Bucket) -> serde_json::Value {
        serde_json::to_value(bucket).expect("serialize bucket")
    }

    #[tokio::test]
    async fn test_add_finalizer_patches_record_without_it() {
        // Arrange
        let server = MockServer::start().await;
        let record = bucket(&[]);
        Mock::given(method("PATCH"))
            .and(path(RECORD_PATH))
            .and(body_partial_json(json!({
                "metadata": {"finalizers": [BUCKET_FINALIZER]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_body(&bucket(&[BUCKET_FINALIZER]))))
            .expect(1)
            .mount(&server)
            .await;
        let store = KubeBucketStore::new(client(&server));

        // Act
        let result = store.add_finalizer(&record).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_add_finalizer_skips_record_that_has_it() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        let store = KubeBucketStore::new(client(&server));

        // Act
        let result = store.add_finalizer(&bucket(&[BUCKET_FINALIZER])).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_remove_finalizer_keeps_foreign_finalizers() {
        // Arrange
        let server = MockServer::start().await;
        let record = bucket(&["other.io/keep", BUCKET_FINALIZER]);
        Mock::given(method("PATCH"))
            .and(path(RECORD_PATH))
            .and(body_partial_json(json!({
                "metadata": {"finalizers": ["other.io/keep"]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_body(&bucket(&["other.io/keep"]))))
            .expect(1)
            .mount(&server)
            .await;
        let store = KubeBucketStore::new(client(&server));

        // Act
        let result = store.remove_finalizer(&record).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_remove_finalizer_skips_record_without_it() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        let store = KubeBucketStore::new(client(&server));

        // Act
        let result = store.remove_finalizer(&bucket(&["other.io/keep"])).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_patch_status_writes_status_subresource() {
        // Arrange
        let server = MockServer::start().await;
        let record = bucket(&[BUCKET_FINALIZER]);
        let status = record.ready_status();
        let mut stored = record.clone();
        stored.status = Some(status.clone());
        Mock::given(method("PATCH"))
            .and(path(format!("{RECORD_PATH}/status")))
            .and(body_partial_json(json!({
                "status": {"bucketReady": true, "bucketID": "giantswarm-glippy-loki"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_body(&stored)))
            .expect(1)
            .mount(&server)
            .await;
        let store = KubeBucketStore::new(client(&server));

        // Act
        let result = store.patch_status(&record, &status).await;

        // Assert
        assert!(result.is_ok());
    }
}

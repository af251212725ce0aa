// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `http_server.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    async fn spawn(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        addr
    }

    #[tokio::test]
    async fn test_readyz_follows_readiness_flag() {
        // Arrange
        let readiness = Readiness::default();
        let addr = spawn(probe_routes(readiness.clone())).await;
        let url = format!("http://{addr}/readyz");

        // Act
        let before = reqwest::get(&url).await.expect("request").status();
        readiness.set_ready();
        let after = reqwest::get(&url).await.expect("request").status();

        // Assert
        assert_eq!(before, reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(after, reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_healthz_is_always_ok() {
        let addr = spawn(probe_routes(Readiness::default())).await;

        let response = reqwest::get(format!("http://{addr}/healthz"))
            .await
            .expect("request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.expect("body"), "ok");
    }

    #[tokio::test]
    async fn test_metrics_exposes_operator_metrics() {
        // Arrange
        crate::metrics::record_bucket_delete("http-server-test");
        let addr = spawn(metrics_routes()).await;

        // Act
        let body = reqwest::get(format!("http://{addr}/metrics"))
            .await
            .expect("request")
            .text()
            .await
            .expect("body");

        // Assert
        assert!(body.contains("object_storage_operator_bucket_reconcile_delete_total"));
    }
}

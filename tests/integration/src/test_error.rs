//! Error response integration tests.

#[cfg(test)]
mod tests {
    use crate::{delete_object, edge_url, http_client, object_url, put_object, s3_client, test_key};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_404_for_missing_object() {
        let resp = http_client()
            .get(object_url(&test_key("err", "nothing.png"), "w=10"))
            .send()
            .await
            .expect("GET missing");
        assert_eq!(resp.status(), 404);
        assert_eq!(
            resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("text/plain")
        );
        assert_eq!(resp.text().await.expect("body"), "File not found");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_500_for_corrupt_image() {
        let client = s3_client();
        let key = test_key("err", "corrupt.jpg");
        put_object(&client, &key, b"definitely not a jpeg".to_vec(), "image/jpeg").await;

        let resp = http_client()
            .get(object_url(&key, "w=50"))
            .send()
            .await
            .expect("GET corrupt");
        assert_eq!(resp.status(), 500);
        assert_eq!(resp.text().await.expect("body"), "Internal server error");

        delete_object(&client, &key).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unsupported_methods() {
        let resp = http_client()
            .delete(object_url("some/key.txt", ""))
            .send()
            .await
            .expect("DELETE");
        assert_eq!(resp.status(), 405);
        assert_eq!(
            resp.headers().get("allow").and_then(|v| v.to_str().ok()),
            Some("GET, HEAD, OPTIONS")
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_health() {
        let resp = http_client()
            .get(format!("{}/_edge/health", edge_url()))
            .send()
            .await
            .expect("GET health");
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["status"], "running");
    }
}

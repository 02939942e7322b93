//! CORS integration tests.

#[cfg(test)]
mod tests {
    use crate::{delete_object, http_client, object_url, put_object, s3_client, test_key};

    fn assert_cors(headers: &reqwest::header::HeaderMap) {
        assert_eq!(
            headers.get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert_eq!(
            headers.get("access-control-allow-methods").and_then(|v| v.to_str().ok()),
            Some("GET, HEAD, OPTIONS")
        );
        assert_eq!(
            headers.get("access-control-allow-headers").and_then(|v| v.to_str().ok()),
            Some("Origin, X-Requested-With, Content-Type, Accept")
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_preflight() {
        let resp = http_client()
            .request(reqwest::Method::OPTIONS, object_url("any/thing.png", "w=10"))
            .header("Origin", "https://example.com")
            .header("Access-Control-Request-Method", "GET")
            .send()
            .await
            .expect("OPTIONS");
        assert_eq!(resp.status(), 200);
        assert_cors(resp.headers());
        assert!(resp.bytes().await.expect("body").is_empty());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_send_cors_on_success_and_errors() {
        let client = s3_client();
        let key = test_key("cors", "ok.txt");
        put_object(&client, &key, b"ok".to_vec(), "text/plain").await;
        let http = http_client();

        let ok = http.get(object_url(&key, "")).send().await.expect("GET ok");
        assert_eq!(ok.status(), 200);
        assert_cors(ok.headers());

        let missing = http
            .get(object_url(&test_key("cors", "missing.txt"), ""))
            .send()
            .await
            .expect("GET missing");
        assert_eq!(missing.status(), 404);
        assert_cors(missing.headers());

        delete_object(&client, &key).await;
    }
}

//! Passthrough integration tests.

#[cfg(test)]
mod tests {
    use crate::{delete_object, http_client, object_url, png_fixture, put_object, s3_client, test_key};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_non_image_bytes_unchanged() {
        let client = s3_client();
        let key = test_key("pass", "notes.txt");
        let data = b"plain text, served as stored".to_vec();
        put_object(&client, &key, data.clone(), "text/plain").await;

        let resp = http_client()
            .get(object_url(&key, "w=100&h=100&q=5"))
            .send()
            .await
            .expect("GET object");
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("text/plain")
        );
        assert_eq!(
            resp.headers().get("cache-control").and_then(|v| v.to_str().ok()),
            Some("public, max-age=31536000, immutable")
        );
        assert_eq!(
            resp.headers().get("content-disposition").and_then(|v| v.to_str().ok()),
            Some("inline")
        );
        assert_eq!(resp.bytes().await.expect("body").as_ref(), data.as_slice());

        delete_object(&client, &key).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_image_unchanged_with_quality_only() {
        let client = s3_client();
        let key = test_key("pass", "photo.png");
        let png = png_fixture(64, 48);
        put_object(&client, &key, png.clone(), "image/png").await;

        let resp = http_client()
            .get(object_url(&key, "q=20"))
            .send()
            .await
            .expect("GET object");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.bytes().await.expect("body").as_ref(), png.as_slice());

        delete_object(&client, &key).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_forward_store_validators() {
        let client = s3_client();
        let key = test_key("pass", "data.bin");
        put_object(&client, &key, vec![1, 2, 3, 4], "application/octet-stream").await;

        let head = client
            .head_object()
            .bucket(crate::edge_bucket())
            .key(&key)
            .send()
            .await
            .expect("head_object");

        let resp = http_client()
            .head(object_url(&key, ""))
            .send()
            .await
            .expect("HEAD object");
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("etag").and_then(|v| v.to_str().ok()),
            head.e_tag()
        );
        assert!(resp.headers().contains_key("last-modified"));
        assert_eq!(
            resp.headers().get("content-length").and_then(|v| v.to_str().ok()),
            Some("4")
        );

        delete_object(&client, &key).await;
    }
}

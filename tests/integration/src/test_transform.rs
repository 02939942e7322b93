//! Image transform integration tests.

#[cfg(test)]
mod tests {
    use crate::{delete_object, http_client, object_url, png_fixture, put_object, s3_client, test_key};

    fn dimensions(bytes: &[u8]) -> (u32, u32) {
        let image = image::load_from_memory(bytes).expect("decode response image");
        (image.width(), image.height())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_resize_to_requested_width() {
        let client = s3_client();
        let key = test_key("xform", "wide.png");
        put_object(&client, &key, png_fixture(400, 300), "image/png").await;

        let resp = http_client()
            .get(object_url(&key, "w=100"))
            .send()
            .await
            .expect("GET resized");
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("image/png")
        );
        let bytes = resp.bytes().await.expect("body");
        assert_eq!(dimensions(&bytes), (100, 75));

        delete_object(&client, &key).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fit_inside_requested_box() {
        let client = s3_client();
        let key = test_key("xform", "tall.png");
        put_object(&client, &key, png_fixture(200, 400), "image/png").await;

        let resp = http_client()
            .get(object_url(&key, "w=100&h=100"))
            .send()
            .await
            .expect("GET resized");
        let bytes = resp.bytes().await.expect("body");
        assert_eq!(dimensions(&bytes), (50, 100));

        delete_object(&client, &key).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_keep_validators_of_original() {
        let client = s3_client();
        let key = test_key("xform", "validators.png");
        put_object(&client, &key, png_fixture(120, 80), "image/png").await;
        let http = http_client();

        let original = http.get(object_url(&key, "")).send().await.expect("GET original");
        let resized = http
            .get(object_url(&key, "h=20"))
            .send()
            .await
            .expect("GET resized");

        for name in ["etag", "last-modified"] {
            assert_eq!(
                original.headers().get(name),
                resized.headers().get(name),
                "{name} should survive the transform"
            );
        }

        delete_object(&client, &key).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_identical_bytes_for_repeated_requests() {
        let client = s3_client();
        let key = test_key("xform", "stable.png");
        put_object(&client, &key, png_fixture(90, 60), "image/png").await;
        let http = http_client();

        let first = http.get(object_url(&key, "w=45&q=70")).send().await.expect("first");
        let second = http.get(object_url(&key, "w=45&q=70")).send().await.expect("second");
        assert_eq!(
            first.bytes().await.expect("first body"),
            second.bytes().await.expect("second body")
        );

        delete_object(&client, &key).await;
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};
    use chrono::Utc;

    use crate::policy::assign_owner;
    use crate::tests::support::*;
    use crate::types::NewUploadedFile;

    #[tokio::test]
    async fn test_public_file_returns_exact_bytes() {
        let t = setup_test_app().await;
        let owner = create_user(&t.state, "owner", false).await;
        let data = b"\x00\x01binary\xffpayload";
        let dto = upload(&t, &owner.token, "report.bin", data, true).await;

        let response = send(&t.app, get(&format!("/files/{}/", dto.id), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"report.bin\"; filename*=UTF-8''report.bin"
        );
        assert_eq!(body_bytes(response).await, data.to_vec());
    }

    #[tokio::test]
    async fn test_large_public_file_streams_whole_blob() {
        let t = setup_test_app().await;
        let owner = create_user(&t.state, "owner", false).await;
        let data: Vec<u8> = (0..300 * 1024).map(|i| (i % 251) as u8).collect();
        let dto = upload(&t, &owner.token, "large.bin", &data, true).await;

        let response = send(&t.app, get(&format!("/files/{}/", dto.id), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], data.len().to_string().as_str());
        assert_eq!(body_bytes(response).await, data);
        assert_eq!(t.state.metrics.get_snapshot().bytes_served, data.len() as u64);
    }

    #[tokio::test]
    async fn test_share_link_without_trailing_slash() {
        let t = setup_test_app().await;
        let owner = create_user(&t.state, "owner", false).await;
        let dto = upload(&t, &owner.token, "a.txt", b"hello", true).await;

        assert_eq!(dto.download_url, format!("{}{}", BASE_URL, dto.id));
        let path = dto.download_url.trim_start_matches("http://testserver");
        let response = send(&t.app, get(path, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"hello".to_vec());
    }

    #[tokio::test]
    async fn test_private_file_is_not_found() {
        let t = setup_test_app().await;
        let owner = create_user(&t.state, "owner", false).await;
        let private = upload(&t, &owner.token, "secret.txt", b"secret", false).await;

        let response = send(&t.app, get(&format!("/files/{}/", private.id), None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let private_body = body_json(response).await;

        // Indistinguishable from an id that never existed
        let response = send(&t.app, get(&format!("/files/{}/", uuid::Uuid::new_v4()), None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let unknown_body = body_json(response).await;
        assert_eq!(private_body["error"]["message"], unknown_body["error"]["message"]);
        assert_eq!(private_body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_owner_token_does_not_unlock_private_download() {
        let t = setup_test_app().await;
        let owner = create_user(&t.state, "owner", true).await;
        let private = upload(&t, &owner.token, "secret.txt", b"secret", false).await;

        let response = send(&t.app, get(&format!("/files/{}/", private.id), Some(&owner.token))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let t = setup_test_app().await;
        let response = send(&t.app, get("/files/not-a-uuid/", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_public_file_with_missing_blob_is_not_found() {
        let t = setup_test_app().await;
        let owner = create_user(&t.state, "owner", false).await;
        let dto = upload(&t, &owner.token, "gone.txt", b"gone", true).await;
        std::fs::remove_file(t.media.path().join(&dto.stored_file)).unwrap();

        let response = send(&t.app, get(&format!("/files/{}/", dto.id), None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_ascii_file_name_round_trips() {
        let t = setup_test_app().await;
        let owner = create_user(&t.state, "owner", false).await;

        let now = Utc::now();
        let stored = t.state.blobs.save("zpráva.txt", "ahoj".as_bytes(), now).await.unwrap();
        assert!(stored.ends_with("/zpráva.txt"));
        let mut draft =
            NewUploadedFile { owner_id: None, author: String::new(), stored_file: stored, is_public: true };
        assign_owner(&mut draft, &owner.principal);
        let record = t.state.files.create(draft, now).await.unwrap();

        let response = send(&t.app, get(&format!("/files/{}", record.id), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert_eq!(disposition, "attachment; filename=\"zprva.txt\"; filename*=UTF-8''zpr%C3%A1va.txt");

        let encoded = disposition.rsplit("UTF-8''").next().unwrap();
        assert_eq!(urlencoding::decode(encoded).unwrap(), "zpráva.txt");
        assert_eq!(body_bytes(response).await, "ahoj".as_bytes().to_vec());
    }

    #[tokio::test]
    async fn test_download_updates_metrics() {
        let t = setup_test_app().await;
        let owner = create_user(&t.state, "owner", false).await;
        let dto = upload(&t, &owner.token, "count.txt", b"12345", true).await;

        for _ in 0..2 {
            let response = send(&t.app, get(&format!("/files/{}/", dto.id), None)).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        let snapshot = t.state.metrics.get_snapshot();
        assert_eq!(snapshot.files_uploaded, 1);
        assert_eq!(snapshot.public_downloads, 2);
        assert_eq!(snapshot.bytes_served, 10);
    }

    #[tokio::test]
    async fn test_qr_code_requires_authentication() {
        let t = setup_test_app().await;
        let owner = create_user(&t.state, "owner", false).await;
        let dto = upload(&t, &owner.token, "a.txt", b"a", true).await;
        let uri = format!("/{}/download_qr_code/", dto.id);

        let response = send(&t.app, get(&uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let response = send(&t.app, get(&uri, Some("not-a-real-token"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_qr_code_download() {
        let t = setup_test_app().await;
        let owner = create_user(&t.state, "owner", false).await;
        // Private uploads still get a QR code, the link just won't resolve
        let dto = upload(&t, &owner.token, "a.txt", b"a", false).await;
        let other = create_user(&t.state, "someone", false).await;

        let response = send(&t.app, get(&format!("/{}/download_qr_code/", dto.id), Some(&other.token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap(),
            format!("attachment; filename=\"{}_qr_code.png\"", dto.id)
        );

        let png = body_bytes(response).await;
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (crate::qr::PRINT_SIZE, crate::qr::PRINT_SIZE));
        assert_eq!(png, crate::qr::print_png(&dto.download_url).unwrap());
        assert_eq!(t.state.metrics.get_snapshot().qr_codes_rendered, 1);
    }

    #[tokio::test]
    async fn test_qr_code_for_unknown_file() {
        let t = setup_test_app().await;
        let user = create_user(&t.state, "user", false).await;

        let response =
            send(&t.app, get(&format!("/{}/download_qr_code/", uuid::Uuid::new_v4()), Some(&user.token))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&t.app, get("/nope/download_qr_code/", Some(&user.token))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::tests::support::*;

    async fn create_type(t: &TestApp, token: &str, name: &str) -> i64 {
        let response = send(&t.app, json_request("POST", "/admin/action-types", token, json!({ "name": name }))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_i64().unwrap()
    }

    async fn create_action(t: &TestApp, token: &str, type_id: i64, name: &str) -> Value {
        let req = json_request("POST", "/admin/actions", token, json!({ "type_id": type_id, "name": name }));
        let response = send(&t.app, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    #[tokio::test]
    async fn test_action_display_combines_type_and_name() {
        let t = setup_test_app().await;
        let admin = create_user(&t.state, "admin", true).await;
        let type_id = create_type(&t, &admin.token, "Workshop").await;

        let action = create_action(&t, &admin.token, type_id, "Spring 2024").await;
        assert_eq!(action["type_name"], "Workshop");
        assert_eq!(action["display"], "Workshop: Spring 2024");

        let id = action["id"].as_i64().unwrap();
        let response = send(&t.app, get(&format!("/admin/actions/{}", id), Some(&admin.token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["display"], "Workshop: Spring 2024");
    }

    #[tokio::test]
    async fn test_writes_require_superuser() {
        let t = setup_test_app().await;
        let admin = create_user(&t.state, "admin", true).await;
        let user = create_user(&t.state, "user", false).await;
        let type_id = create_type(&t, &admin.token, "Talk").await;

        let req = json_request("POST", "/admin/action-types", &user.token, json!({ "name": "Other" }));
        assert_eq!(send(&t.app, req).await.status(), StatusCode::FORBIDDEN);

        let req = json_request("POST", "/admin/actions", &user.token, json!({ "type_id": type_id, "name": "x" }));
        assert_eq!(send(&t.app, req).await.status(), StatusCode::FORBIDDEN);

        let response = send(&t.app, delete(&format!("/admin/action-types/{}", type_id), &user.token)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Reading is fine for any signed-in user
        let response = send(&t.app, get("/admin/action-types", Some(&user.token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let response = send(&t.app, get("/admin/action-types", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_duplicate_type_name_conflicts() {
        let t = setup_test_app().await;
        let admin = create_user(&t.state, "admin", true).await;
        create_type(&t, &admin.token, "Course").await;

        let req = json_request("POST", "/admin/action-types", &admin.token, json!({ "name": "Course" }));
        let response = send(&t.app, req).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_name_length_limits() {
        let t = setup_test_app().await;
        let admin = create_user(&t.state, "admin", true).await;

        let req = json_request("POST", "/admin/action-types", &admin.token, json!({ "name": "x".repeat(51) }));
        assert_eq!(send(&t.app, req).await.status(), StatusCode::BAD_REQUEST);

        // 50 characters, not bytes
        let type_id = create_type(&t, &admin.token, &"é".repeat(50)).await;

        let req =
            json_request("POST", "/admin/actions", &admin.token, json!({ "type_id": type_id, "name": "y".repeat(256) }));
        assert_eq!(send(&t.app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = json_request("POST", "/admin/action-types", &admin.token, json!({ "name": "   " }));
        assert_eq!(send(&t.app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_action_with_unknown_type_is_rejected() {
        let t = setup_test_app().await;
        let admin = create_user(&t.state, "admin", true).await;

        let req = json_request("POST", "/admin/actions", &admin.token, json!({ "type_id": 999, "name": "orphan" }));
        let response = send(&t.app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["details"]["field"], "type_id");
    }

    #[tokio::test]
    async fn test_deleting_type_cascades_to_actions() {
        let t = setup_test_app().await;
        let admin = create_user(&t.state, "admin", true).await;
        let doomed = create_type(&t, &admin.token, "Doomed").await;
        let kept = create_type(&t, &admin.token, "Kept").await;
        create_action(&t, &admin.token, doomed, "one").await;
        create_action(&t, &admin.token, doomed, "two").await;
        create_action(&t, &admin.token, kept, "three").await;

        let response = send(&t.app, delete(&format!("/admin/action-types/{}", doomed), &admin.token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["removed_actions"], 2);

        let response = send(&t.app, get("/admin/actions", Some(&admin.token))).await;
        let remaining = body_json(response).await;
        let remaining = remaining.as_array().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["display"], "Kept: three");

        let response = send(&t.app, get(&format!("/admin/action-types/{}", doomed), Some(&admin.token))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_actions_by_type_and_update() {
        let t = setup_test_app().await;
        let admin = create_user(&t.state, "admin", true).await;
        let talk = create_type(&t, &admin.token, "Talk").await;
        let course = create_type(&t, &admin.token, "Course").await;
        let action = create_action(&t, &admin.token, talk, "Intro").await;
        create_action(&t, &admin.token, course, "Advanced").await;

        let response = send(&t.app, get(&format!("/admin/actions?type_id={}", talk), Some(&admin.token))).await;
        let items = body_json(response).await;
        assert_eq!(items.as_array().unwrap().len(), 1);
        assert_eq!(items[0]["name"], "Intro");

        let id = action["id"].as_i64().unwrap();
        let req = json_request(
            "PUT",
            &format!("/admin/actions/{}", id),
            &admin.token,
            json!({ "type_id": course, "name": "Intro" }),
        );
        let response = send(&t.app, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["display"], "Course: Intro");

        let req = json_request("PUT", &format!("/admin/action-types/{}", talk), &admin.token, json!({ "name": "Lecture" }));
        let response = send(&t.app, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "Lecture");

        let response = send(&t.app, delete(&format!("/admin/actions/{}", id), &admin.token)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&t.app, delete(&format!("/admin/actions/{}", id), &admin.token)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{validation, AppError, AppResult, OptionExt};
    use crate::storage::StorageError;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use std::io;

    #[test]
    fn test_app_error_display() {
        let error = AppError::BadRequest("Invalid input".to_string());
        assert_eq!(format!("{}", error), "Bad request: Invalid input");

        let error = AppError::NotFound("Resource not found".to_string());
        assert_eq!(format!("{}", error), "Not found: Resource not found");

        let error = AppError::Forbidden("nope".to_string());
        assert_eq!(format!("{}", error), "Forbidden: nope");
    }

    #[test]
    fn test_app_error_into_response() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::IoError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_unauthorized_challenges_bearer() {
        let response = AppError::Unauthorized("Authentication required".into()).into_response();
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let response = AppError::Forbidden("no".into()).into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = AppError::ValidationError { field: "author".into(), message: "too long".into() }.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["field"], "author");
        assert_eq!(body["error"]["details"]["message"], "too long");
        assert_eq!(body["status"], 400);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = AppError::Internal(anyhow::anyhow!("secret connection string")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("secret connection string"));
        assert!(text.contains("error_id"));
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();

        match app_error {
            AppError::IoError(msg) => {
                assert!(msg.contains("not found") || msg.contains("NotFound"));
                assert!(msg.contains("File not found"));
            }
            _ => panic!("Expected IoError variant"),
        }
    }

    #[test]
    fn test_from_storage_error() {
        assert!(matches!(AppError::from(StorageError::NotFound("a".into())), AppError::NotFound(_)));
        assert!(matches!(AppError::from(StorageError::InvalidPath("..".into())), AppError::BadRequest(_)));
        match AppError::from(StorageError::InvalidName("..".into())) {
            AppError::ValidationError { field, .. } => assert_eq!(field, "file"),
            other => panic!("Expected ValidationError, got {:?}", other),
        }
        let io = StorageError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(AppError::from(io), AppError::IoError(_)));
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        assert!(matches!(AppError::from(sqlx::Error::RowNotFound), AppError::NotFound(_)));
        assert!(matches!(AppError::from(sqlx::Error::PoolTimedOut), AppError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_option_ext() {
        let some: Option<i32> = Some(42);
        assert_eq!(some.ok_or_not_found("item").unwrap(), 42);

        let none: Option<i32> = None;
        let result: AppResult<i32> = none.ok_or_not_found("action type");
        match result {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "action type not found"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_validation_helpers() {
        assert!(validation::validate_not_blank("x", "name").is_ok());
        assert!(validation::validate_not_blank("  ", "name").is_err());

        assert!(validation::validate_max_chars(&"ü".repeat(255), 255, "author").is_ok());
        assert!(validation::validate_max_chars(&"ü".repeat(256), 255, "author").is_err());

        for yes in ["true", "1", "on", "YES"] {
            assert!(validation::parse_bool(yes, "is_public").unwrap());
        }
        for no in ["false", "0", "off", "", "No"] {
            assert!(!validation::parse_bool(no, "is_public").unwrap());
        }
        assert!(validation::parse_bool("perhaps", "is_public").is_err());
    }
}

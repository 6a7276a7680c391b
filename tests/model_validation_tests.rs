use chrono::Utc;
use serde_json::json;
use user_service::models::{ErrorResponse, FieldError, Role, UpdateUserRequest, User};

#[test]
fn test_role_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("admin"));
    assert_eq!(serde_json::to_value(Role::User).unwrap(), json!("user"));
    assert_eq!(serde_json::from_value::<Role>(json!("admin")).unwrap(), Role::Admin);
}

#[test]
fn test_role_parsing_is_closed() {
    assert_eq!("user".parse::<Role>().unwrap(), Role::User);
    assert!("Admin".parse::<Role>().is_err());
    assert!("superuser".parse::<Role>().is_err());
    assert!(Role::try_from("moderator".to_string()).is_err());
}

#[test]
fn test_user_json_has_no_password_field() {
    let user = User {
        id: 1,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        role: Role::User,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let value = serde_json::to_value(&user).unwrap();
    let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();

    assert_eq!(
        keys.len(),
        6,
        "unexpected keys in serialized user: {keys:?}"
    );
    assert!(value.get("password").is_none());
    assert_eq!(value["role"], "user");
}

#[test]
fn test_update_request_skips_absent_fields() {
    let req = UpdateUserRequest {
        email: Some("a@b.io".to_string()),
        ..Default::default()
    };

    assert_eq!(serde_json::to_value(&req).unwrap(), json!({ "email": "a@b.io" }));
    assert!(!req.changes_role());
}

#[test]
fn test_error_response_omits_empty_parts() {
    let not_found = ErrorResponse {
        error: "User not found".to_string(),
        message: None,
        details: None,
    };
    assert_eq!(serde_json::to_value(&not_found).unwrap(), json!({ "error": "User not found" }));

    let invalid = ErrorResponse {
        error: "Validation failed".to_string(),
        message: None,
        details: Some(vec![FieldError {
            field: "id".to_string(),
            message: "Invalid user ID format".to_string(),
        }]),
    };
    assert_eq!(
        serde_json::to_value(&invalid).unwrap(),
        json!({
            "error": "Validation failed",
            "details": [{ "field": "id", "message": "Invalid user ID format" }]
        })
    );
}

//! 把服务端的各种响应形状统一成确定的类型
//!
//! 已知形状：
//! - `{code, msg, resp_data: {...}}` 信封
//! - `{data: {...}}` 信封
//! - 不带信封的裸数据
//!
//! 认证响应在解开信封后是 `{token, user}` 或者令牌与用户字段平铺在一起。
//! 都不匹配时返回 [`ClientError::MalformedResponse`]。

use serde_json::{Map, Value};

use super::error::ClientError;
use crate::common::FieldError;
use crate::user::UserProfile;

/// 登录或注册成功后的结果
#[derive(Debug, Clone, PartialEq)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserProfile,
}

const USER_FIELDS: [&str; 5] = ["id", "username", "email", "role", "display_name"];

/// 解开外层信封
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            for key in ["resp_data", "data"] {
                match map.remove(key) {
                    Some(Value::Null) | None => {}
                    Some(inner) => return inner,
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// 服务端给出的消息文字
pub fn extract_message(value: &Value) -> Option<String> {
    ["msg", "message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}

/// 字段级校验错误列表，条目可以是 `{field, message}` 或纯字符串
pub fn extract_field_errors(value: &Value) -> Vec<FieldError> {
    let Some(items) = value.get("errors").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(message) => Some(FieldError::new("", message.clone())),
            Value::Object(obj) => {
                let field = ["field", "path", "param"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(Value::as_str))
                    .unwrap_or_default();
                let message = ["message", "msg"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(Value::as_str))?;
                Some(FieldError::new(field, message))
            }
            _ => None,
        })
        .collect()
}

fn looks_like_user(map: &Map<String, Value>) -> bool {
    USER_FIELDS.iter().any(|field| map.contains_key(*field))
}

fn parse_user(value: Value) -> Result<UserProfile, ClientError> {
    serde_json::from_value(value)
        .map_err(|e| ClientError::MalformedResponse(format!("invalid user object: {}", e)))
}

/// 登录、注册响应
pub fn normalize_auth_response(value: Value) -> Result<AuthPayload, ClientError> {
    let Value::Object(mut data) = unwrap_envelope(value) else {
        return Err(ClientError::MalformedResponse(
            "auth response is not an object".into(),
        ));
    };

    let token = match data.remove("token") {
        Some(Value::String(token)) if !token.trim().is_empty() => token,
        _ => {
            return Err(ClientError::MalformedResponse(
                "auth response carries no token".into(),
            ));
        }
    };

    let user = match data.remove("user") {
        Some(user @ Value::Object(_)) => parse_user(user)?,
        Some(_) => {
            return Err(ClientError::MalformedResponse(
                "auth response user is not an object".into(),
            ));
        }
        None if looks_like_user(&data) => parse_user(Value::Object(data))?,
        None => {
            return Err(ClientError::MalformedResponse(
                "auth response carries no user".into(),
            ));
        }
    };

    Ok(AuthPayload { token, user })
}

/// `GET /auth/me` 响应
pub fn normalize_user(value: Value) -> Result<UserProfile, ClientError> {
    match unwrap_envelope(value) {
        Value::Object(mut data) => match data.remove("user") {
            Some(user @ Value::Object(_)) => parse_user(user),
            _ if looks_like_user(&data) => parse_user(Value::Object(data)),
            _ => Err(ClientError::MalformedResponse(
                "response carries no user".into(),
            )),
        },
        _ => Err(ClientError::MalformedResponse(
            "user response is not an object".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::user::Role;

    #[test]
    fn reads_every_known_auth_shape() {
        let shapes = [
            json!({"token": "abc123", "user": {"role": "owner"}}),
            json!({"code": 0, "msg": "Success", "resp_data": {"token": "abc123", "expires_at": 1, "user": {"role": "owner"}}}),
            json!({"data": {"token": "abc123", "user": {"role": "owner"}}}),
            json!({"token": "abc123", "username": "u1", "role": "owner"}),
        ];
        for shape in shapes {
            let payload = normalize_auth_response(shape).unwrap();
            assert_eq!(payload.token, "abc123");
            assert_eq!(payload.user.role(), Some(Role::Owner));
        }
    }

    #[test]
    fn rejects_unknown_auth_shapes() {
        for shape in [
            json!({"user": {"role": "owner"}}),
            json!({"token": "abc123"}),
            json!({"token": "", "user": {}}),
            json!({"token": "abc123", "user": "owner"}),
            json!(["abc123"]),
        ] {
            assert!(matches!(
                normalize_auth_response(shape),
                Err(ClientError::MalformedResponse(_))
            ));
        }
    }

    #[test]
    fn reads_wrapped_and_flat_users() {
        let user = normalize_user(json!({"resp_data": {"username": "u1", "role": "shop"}})).unwrap();
        assert_eq!(user.username.as_deref(), Some("u1"));
        assert_eq!(user.role(), Some(Role::Shop));

        let user = normalize_user(json!({"user": {"displayName": "Nimal", "role": "salesman"}})).unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Nimal"));

        assert!(normalize_user(json!({"code": 0, "msg": "Success"})).is_err());
    }

    #[test]
    fn extracts_messages_and_field_errors() {
        let body = json!({
            "code": 1000,
            "msg": "Validation failed",
            "errors": [
                {"field": "email", "message": "Email is required"},
                {"path": "password", "msg": "Too short"},
                "Username taken",
                42
            ]
        });
        assert_eq!(extract_message(&body).as_deref(), Some("Validation failed"));

        let errors = extract_field_errors(&body);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[1], FieldError::new("password", "Too short"));
        assert_eq!(errors[2].field, "");

        assert_eq!(extract_message(&json!({"message": "  "})), None);
        assert!(extract_field_errors(&json!({"msg": "x"})).is_empty());
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    WarehouseManager,
    Salesman,
    Shop,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::WarehouseManager => "warehouse_manager",
            Role::Salesman => "salesman",
            Role::Shop => "shop",
            Role::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "owner" => Role::Owner,
            "warehouse_manager" => Role::WarehouseManager,
            "salesman" => Role::Salesman,
            "shop" => Role::Shop,
            _ => Role::Unknown,
        }
    }

    /// 是否可以维护商品与供应商
    pub fn can_manage_catalog(&self) -> bool {
        matches!(self, Role::Owner | Role::WarehouseManager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已登录用户的公开信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "displayName", alias = "name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UserProfile {
    pub fn role(&self) -> Option<Role> {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_deserialize_to_unknown() {
        let role: Role = serde_json::from_str("\"accountant\"").unwrap();
        assert_eq!(role, Role::Unknown);
        let role: Role = serde_json::from_str("\"warehouse_manager\"").unwrap();
        assert_eq!(role, Role::WarehouseManager);
    }

    #[test]
    fn profile_accepts_partial_identity() {
        let user: UserProfile = serde_json::from_str(r#"{"role":"owner"}"#).unwrap();
        assert_eq!(user.role(), Some(Role::Owner));
        assert!(user.id.is_none());
    }
}

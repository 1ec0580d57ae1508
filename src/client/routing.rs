use crate::user::Role;

/// 登录后按角色进入的首页
pub fn landing_path(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Owner) => "/reports",
        Some(Role::WarehouseManager) => "/inventory",
        Some(Role::Salesman) => "/orders",
        Some(Role::Shop) => "/shop",
        Some(Role::Unknown) | None => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_roles_to_dashboards() {
        assert_eq!(landing_path(Some(Role::Owner)), "/reports");
        assert_eq!(landing_path(Some(Role::WarehouseManager)), "/inventory");
        assert_eq!(landing_path(Some(Role::Salesman)), "/orders");
        assert_eq!(landing_path(Some(Role::Shop)), "/shop");
        assert_eq!(landing_path(Some(Role::Unknown)), "/");
        assert_eq!(landing_path(None), "/");
    }
}

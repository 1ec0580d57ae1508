use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use crate::user::UserProfile;

/// 认证状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Uninitialized,
    Checking,
    Authenticated,
    Anonymous,
}

#[derive(Debug, Default)]
pub(crate) struct SessionInner {
    pub status: AuthStatus,
    pub user: Option<UserProfile>,
}

/// 内存中的会话状态，状态和用户放在同一把锁下
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<SessionInner>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> AuthStatus {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    pub fn set_checking(&self) {
        self.lock().status = AuthStatus::Checking;
    }

    pub fn authenticate(&self, user: UserProfile) {
        let mut inner = self.lock();
        inner.status = AuthStatus::Authenticated;
        inner.user = Some(user);
    }

    pub fn set_anonymous(&self) {
        let mut inner = self.lock();
        inner.status = AuthStatus::Anonymous;
        inner.user = None;
    }

    /// 持有写锁期间，其他读者看不到半清理的状态
    pub(crate) fn lock(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

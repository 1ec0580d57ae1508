use std::sync::{Mutex, PoisonError};

pub const LOGIN_PATH: &str = "/login";
pub const EXPIRED_LOGIN_PATH: &str = "/login?expired=true";

/// 界面导航
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, to: &str);
}

#[derive(Debug)]
struct NavState {
    current: String,
    history: Vec<String>,
}

/// 只记录位置的导航器，用于无界面场景与测试
#[derive(Debug)]
pub struct MemoryNavigator {
    state: Mutex<NavState>,
}

impl MemoryNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(NavState {
                current: initial.into(),
                history: Vec::new(),
            }),
        }
    }

    /// 依次访问过的位置，不含初始位置
    pub fn history(&self) -> Vec<String> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.history.clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.current.clone()
    }

    fn navigate(&self, to: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.current = to.to_string();
        state.history.push(to.to_string());
    }
}

mod handler;
mod model;

pub use handler::{
    forgot_password, login, logout, me, register, reset_password, update_password,
};
pub use model::{AuthResponse, User};

mod types;

pub use types::{Role, UserProfile};

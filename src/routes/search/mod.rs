mod handler;

pub use handler::{search_products, search_suppliers};

mod handler;
mod model;
mod pdf;

pub use handler::{inventory_report, low_stock_report};

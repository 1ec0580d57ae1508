mod handler;
mod model;

pub use handler::{create_supplier, delete_supplier, get_supplier, list_suppliers, update_supplier};
pub use model::{Supplier, SupplierRequest};

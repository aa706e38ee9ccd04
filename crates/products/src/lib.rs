//! `bizgrid-products` — product catalog as tenant-scoped records.

pub mod product;
pub mod service;
pub mod store;

pub use product::{NewProduct, ProductRecord, ProductUpdate};
pub use service::{ProductError, ProductService};
pub use store::{PgProductStore, ProductStore};

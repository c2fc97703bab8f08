// paysync-server/src/models/mod.rs

//! Records held by the Order and Catalog stores, plus the inbound callback shape.

pub mod banner;
pub mod callback;
pub mod category;
pub mod order;
pub mod page;
pub mod product;

pub use banner::Banner;
pub use callback::{NormalizedCallback, RawEnvelope};
pub use category::Category;
pub use order::{Order, OrderKey, OrderStats, OrderStatus, OrderUpdate};
pub use page::{Page, PageRequest};
pub use product::{Product, ProductCounts, ProductFilter};

pub mod types;
pub mod filter;
pub mod filter_order;

pub use types::*;
pub use filter::{validate_sort, Filters};
pub use filter_order::FilterOrder;

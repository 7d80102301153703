//! Aggregates module
pub mod cart;
pub mod category;
pub mod order;
pub mod product;

pub use cart::{Cart, CartLine};
pub use category::Category;
pub use order::{Order, OrderLine, OrderStatus};
pub use product::Product;

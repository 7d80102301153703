//! Application services
pub mod cart;
pub mod checkout;
pub mod lifecycle;

pub use cart::{CartLineView, CartManager, CartView};
pub use checkout::{CheckoutRequest, OrderBuilder};
pub use lifecycle::OrderLifecycle;

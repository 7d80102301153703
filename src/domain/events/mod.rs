//! Domain events
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug)]
pub enum ProductEvent {
    Created { product_id: Uuid, name: String },
    StockReserved { product_id: Uuid, quantity: u32 },
    StockReleased { product_id: Uuid, quantity: u32 },
    StockAdded { product_id: Uuid, quantity: u32 },
    StockReduced { product_id: Uuid, quantity: u32 },
    Deactivated { product_id: Uuid },
}

#[derive(Clone, Debug)]
pub enum OrderEvent {
    Created { order_id: Uuid, user_id: Uuid, total: Decimal },
    Confirmed { order_id: Uuid },
    Processing { order_id: Uuid },
    Shipped { order_id: Uuid },
    Delivered { order_id: Uuid },
    Cancelled { order_id: Uuid },
    Refunded { order_id: Uuid },
    LineDiscounted { order_id: Uuid, product_id: Uuid, savings: Decimal },
}

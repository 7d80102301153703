//! HTTP boundary
//!
//! Thin adapters around the services: request/response DTOs and the single
//! error-to-status translation keyed by error kind. No business rules here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::domain::aggregates::{Category, Order, OrderStatus, Product};
use crate::domain::value_objects::Money;
use crate::service::{CartManager, CartView, CheckoutRequest, OrderBuilder, OrderLifecycle};
use crate::store::{CartStore, Catalog, CategoryStore, OrderStore};
use crate::StorefrontError;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub categories: Arc<CategoryStore>,
    pub cart_manager: CartManager,
    pub order_builder: OrderBuilder,
    pub lifecycle: OrderLifecycle,
}

impl AppState {
    pub fn new() -> Self {
        let catalog = Arc::new(Catalog::new());
        let carts = Arc::new(CartStore::new());
        let orders = Arc::new(OrderStore::new());
        Self {
            catalog: catalog.clone(),
            categories: Arc::new(CategoryStore::new()),
            cart_manager: CartManager::new(catalog.clone(), carts.clone()),
            order_builder: OrderBuilder::new(catalog.clone(), carts, orders.clone()),
            lifecycle: OrderLifecycle::new(catalog, orders),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Error translation
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
}

struct ApiError(StorefrontError);

impl From<StorefrontError> for ApiError {
    fn from(err: StorefrontError) -> Self {
        Self(err)
    }
}

fn error_parts(err: &StorefrontError) -> (StatusCode, &'static str) {
    match err {
        StorefrontError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        StorefrontError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        StorefrontError::InsufficientStock { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_STOCK"),
        StorefrontError::EmptyCart => (StatusCode::BAD_REQUEST, "EMPTY_CART"),
        StorefrontError::InvalidStateTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_STATE_TRANSITION")
        }
        StorefrontError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        StorefrontError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = error_parts(&self.0);
        let body = ErrorResponse { status: status.as_u16(), code, message: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub stock_quantity: u32,
    pub active: bool,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id(),
            name: p.name().to_string(),
            description: p.description().to_string(),
            price: p.price().amount(),
            currency: p.price().currency().to_string(),
            stock_quantity: p.stock(),
            active: p.is_active(),
            category_id: p.category_id(),
            created_at: p.created_at(),
            updated_at: p.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id(),
            name: c.name().to_string(),
            description: c.description().to_string(),
            created_at: c.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderLineResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub savings: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub lines: Vec<OrderLineResponse>,
    pub total_amount: Decimal,
    pub currency: String,
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id(),
            user_id: o.user_id(),
            status: o.status(),
            lines: o
                .lines()
                .iter()
                .map(|l| OrderLineResponse {
                    product_id: l.product_id,
                    product_name: l.product_name.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price.amount(),
                    line_total: l.line_total().amount(),
                    savings: l.savings().amount(),
                })
                .collect(),
            total_amount: o.total().amount(),
            currency: o.total().currency().to_string(),
            shipping_address: o.shipping_address().to_string(),
            payment_method: o.payment_method().to_string(),
            notes: o.notes().map(str::to_string),
            created_at: o.created_at(),
            updated_at: o.updated_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub stock_quantity: u32,
    pub category_id: Uuid,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOp {
    Add,
    Reduce,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub op: StockOp,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub unit_price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

// =============================================================================
// Router
// =============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }),
        )
        .route("/api/v1/categories", get(list_categories).post(create_category))
        .route("/api/v1/categories/:id", get(get_category))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/products/:id/deactivate", post(deactivate_product))
        .route("/api/v1/products/:id/stock", post(adjust_stock))
        .route("/api/v1/users/:user_id/cart", get(get_cart).delete(clear_cart))
        .route("/api/v1/users/:user_id/cart/items", post(add_cart_item))
        .route(
            "/api/v1/users/:user_id/cart/items/:product_id",
            axum::routing::put(update_cart_item).delete(remove_cart_item),
        )
        .route("/api/v1/users/:user_id/orders", get(list_orders).post(checkout))
        .route("/api/v1/users/:user_id/orders/:id", get(get_user_order))
        .route("/api/v1/orders/:id", get(get_order))
        .route("/api/v1/orders/:id/confirm", post(confirm_order))
        .route("/api/v1/orders/:id/cancel", post(cancel_order))
        .route("/api/v1/orders/:id/process", post(process_order))
        .route("/api/v1/orders/:id/ship", post(ship_order))
        .route("/api/v1/orders/:id/deliver", post(deliver_order))
        .route("/api/v1/orders/:id/lines/:product_id/discount", post(discount_order_line))
        .route("/api/v1/orders/:id/refund", post(refund_order))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_categories(State(s): State<AppState>) -> Json<Vec<CategoryResponse>> {
    Json(s.categories.list().into_iter().map(Into::into).collect())
}

async fn create_category(
    State(s): State<AppState>,
    Json(r): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<CategoryResponse>)> {
    let category = s.categories.insert(Category::create(r.name, r.description)?)?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

async fn get_category(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CategoryResponse>> {
    Ok(Json(s.categories.get(id)?.into()))
}

async fn list_products(State(s): State<AppState>) -> Json<Vec<ProductResponse>> {
    Json(s.catalog.list().into_iter().map(Into::into).collect())
}

async fn create_product(
    State(s): State<AppState>,
    Json(r): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    s.categories.get(r.category_id)?;
    let product = s.catalog.insert(Product::create(
        r.name,
        r.description,
        Money::new(r.price, &r.currency),
        r.stock_quantity,
        r.category_id,
    )?);
    Ok((StatusCode::CREATED, Json(product.into())))
}

async fn get_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProductResponse>> {
    Ok(Json(s.catalog.get(id)?.into()))
}

async fn deactivate_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProductResponse>> {
    Ok(Json(s.catalog.deactivate(id)?.into()))
}

async fn adjust_stock(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<AdjustStockRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let product = match r.op {
        StockOp::Add => s.catalog.add_stock(id, r.quantity)?,
        StockOp::Reduce => s.catalog.reduce_stock(id, r.quantity)?,
    };
    Ok(Json(product.into()))
}

async fn get_cart(State(s): State<AppState>, Path(user_id): Path<Uuid>) -> ApiResult<Json<CartView>> {
    Ok(Json(s.cart_manager.view(user_id)?))
}

async fn clear_cart(State(s): State<AppState>, Path(user_id): Path<Uuid>) -> ApiResult<Json<CartView>> {
    Ok(Json(s.cart_manager.clear(user_id)?))
}

async fn add_cart_item(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(r): Json<AddCartItemRequest>,
) -> ApiResult<(StatusCode, Json<CartView>)> {
    let view = s.cart_manager.add_item(user_id, r.product_id, r.quantity)?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_cart_item(
    State(s): State<AppState>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
    Json(r): Json<UpdateCartItemRequest>,
) -> ApiResult<Json<CartView>> {
    Ok(Json(s.cart_manager.update_item_quantity(user_id, product_id, r.quantity)?))
}

async fn remove_cart_item(
    State(s): State<AppState>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<CartView>> {
    Ok(Json(s.cart_manager.remove_item(user_id, product_id)?))
}

async fn checkout(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(r): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let order = s.order_builder.checkout(user_id, r)?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

async fn list_orders(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Json<Vec<OrderResponse>> {
    Json(s.lifecycle.list_for_user(user_id).into_iter().map(Into::into).collect())
}

async fn get_user_order(
    State(s): State<AppState>,
    Path((user_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<OrderResponse>> {
    Ok(Json(s.lifecycle.get_for_user(id, user_id)?.into()))
}

async fn get_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<OrderResponse>> {
    Ok(Json(s.lifecycle.get(id)?.into()))
}

async fn confirm_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<OrderResponse>> {
    Ok(Json(s.lifecycle.confirm(id)?.into()))
}

async fn cancel_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<OrderResponse>> {
    Ok(Json(s.lifecycle.cancel(id)?.into()))
}

async fn process_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<OrderResponse>> {
    Ok(Json(s.lifecycle.process(id)?.into()))
}

async fn ship_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<OrderResponse>> {
    Ok(Json(s.lifecycle.ship(id)?.into()))
}

async fn deliver_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<OrderResponse>> {
    Ok(Json(s.lifecycle.deliver(id)?.into()))
}

async fn refund_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<OrderResponse>> {
    Ok(Json(s.lifecycle.refund(id)?.into()))
}

async fn discount_order_line(
    State(s): State<AppState>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
    Json(r): Json<DiscountRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let order = s.lifecycle.apply_line_discount(id, product_id, Money::new(r.unit_price, &r.currency))?;
    Ok(Json(order.into()))
}

use crate::{
    db::DbPool,
    entities::order::{
        self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel,
        OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress,
    },
    entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel, ProductSnapshot},
    entities::{product, product_image, product_variant},
    errors::ServiceError,
    services::order_number,
    services::pricing::{self, OrderTotals, ShippingPolicy},
};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Attempts at allocating a same-day order number before giving up.
const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 5;
/// Base delay between attempts, multiplied by the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Checkout policy applied to every new order
#[derive(Debug, Clone)]
pub struct OrderSettings {
    pub number_prefix: String,
    pub currency: String,
    pub shipping: ShippingPolicy,
    pub reserve_stock: bool,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            number_prefix: "SJ".to_string(),
            currency: "UAH".to_string(),
            shipping: ShippingPolicy::default(),
            reserve_stock: false,
        }
    }
}

/// Request/Response types for the order service
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub customer_name: String,
    #[validate(regex(path = "EMAIL_RE", message = "Invalid email"))]
    pub customer_email: String,
    #[validate(custom = "validate_not_blank", length(max = 50))]
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    #[validate]
    pub shipping_address: ShippingAddressInput,
    #[validate(length(max = 2000))]
    pub customer_notes: Option<String>,
    #[validate]
    pub items: Vec<OrderItemInput>,
}

impl CreateOrderRequest {
    /// Field validation plus the non-empty cart rule.
    pub fn validate_request(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if self.items.is_empty() {
            let mut err = ValidationError::new("items_required");
            err.message = Some("Order must contain at least one item".into());
            errors.add("items", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressInput {
    #[validate(custom = "validate_not_blank", length(max = 100))]
    pub city: String,
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub address: String,
    #[validate(custom = "validate_not_blank", length(max = 20))]
    pub postal_code: String,
}

impl From<ShippingAddressInput> for ShippingAddress {
    fn from(input: ShippingAddressInput) -> Self {
        Self {
            city: input.city.trim().to_string(),
            address: input.address.trim().to_string(),
            postal_code: input.postal_code.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    #[validate(length(max = 2000))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackingRequest {
    #[validate(custom = "validate_not_blank", length(max = 100))]
    pub tracking_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_snapshot: ProductSnapshot,
    pub line_number: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItemModel> for OrderItemResponse {
    fn from(model: OrderItemModel) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            product_snapshot: model.product_snapshot,
            line_number: model.line_number,
            quantity: model.quantity,
            unit_price: model.unit_price,
            subtotal: model.subtotal,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    pub customer_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    pub fn from_parts(model: OrderModel, items: Vec<OrderItemModel>) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            customer_phone: model.customer_phone,
            status: model.status,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            shipping_address: model.shipping_address,
            customer_notes: model.customer_notes,
            admin_notes: model.admin_notes,
            subtotal: model.subtotal,
            shipping_cost: model.shipping_cost,
            total: model.total,
            currency: model.currency,
            tracking_number: model.tracking_number,
            shipped_at: model.shipped_at,
            delivered_at: model.delivered_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// A validated, priced cart line ready to be written
#[derive(Debug, Clone)]
struct PricedLine {
    product_id: Uuid,
    variant_id: Option<Uuid>,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
    snapshot: ProductSnapshot,
}

/// Assembles checkout carts into persisted orders and runs order administration.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    settings: OrderSettings,
    // Held around checkouts on SQLite, which admits a single writer.
    checkout_lock: Option<Arc<AsyncMutex<()>>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, settings: OrderSettings) -> Self {
        let checkout_lock = (db_pool.get_database_backend() == DbBackend::Sqlite)
            .then(|| Arc::new(AsyncMutex::new(())));
        Self {
            db_pool,
            settings,
            checkout_lock,
        }
    }

    pub fn settings(&self) -> &OrderSettings {
        &self.settings
    }

    /// Validates the cart, prices it, snapshots the products and stores the order with its
    /// items in one transaction. Same-day order number collisions retry the whole attempt.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate_request()?;

        let _guard = match &self.checkout_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let mut attempt = 1;
        loop {
            match self.try_create_order(&request).await {
                Err(err) if err.is_retryable() && attempt < MAX_ORDER_NUMBER_ATTEMPTS => {
                    warn!(
                        attempt,
                        lock_contention = err.is_lock_contention(),
                        "Order write collided, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    error!(attempt, error = %err, "Exhausted order creation attempts");
                    return Err(ServiceError::Conflict(
                        "Could not allocate an order number, please retry".to_string(),
                    ));
                }
                result => return result,
            }
        }
    }

    async fn try_create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin order transaction");
            ServiceError::DatabaseError(e)
        })?;

        let lines = price_lines(&txn, &request.items).await?;
        let totals = OrderTotals::from_line_subtotals(
            lines.iter().map(|line| line.subtotal),
            &self.settings.shipping,
        );

        if self.settings.reserve_stock {
            reserve_stock(&txn, &lines).await?;
        }

        let now = Utc::now();
        let order_number =
            next_order_number(&txn, &self.settings.number_prefix, now.date_naive()).await?;

        let order = OrderActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number.clone()),
            customer_name: Set(request.customer_name.trim().to_string()),
            customer_email: Set(request.customer_email.trim().to_lowercase()),
            customer_phone: Set(request.customer_phone.trim().to_string()),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            payment_method: Set(request.payment_method),
            subtotal: Set(totals.subtotal),
            shipping_cost: Set(totals.shipping_cost),
            total: Set(totals.total),
            currency: Set(self.settings.currency.clone()),
            shipping_address: Set(request.shipping_address.clone().into()),
            customer_notes: Set(request
                .customer_notes
                .as_deref()
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_string)),
            admin_notes: Set(None),
            tracking_number: Set(None),
            shipped_at: Set(None),
            delivered_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (line_number, line) in (1..).zip(lines) {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(line.product_id),
                variant_id: Set(line.variant_id),
                product_snapshot: Set(line.snapshot),
                line_number: Set(line_number),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                subtotal: Set(line.subtotal),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_number = %order_number, "Failed to commit order transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "Order created"
        );

        Ok(OrderResponse::from_parts(order, items))
    }

    /// Lists orders newest first, optionally filtered by status
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: u64,
        limit: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let mut query = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::OrderNumber);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(db, limit);
        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;
        let orders = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page, limit, "Failed to fetch orders");
            ServiceError::DatabaseError(e)
        })?;

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
        if !ids.is_empty() {
            let items = OrderItemEntity::find()
                .filter(order_item::Column::OrderId.is_in(ids))
                .order_by_asc(order_item::Column::LineNumber)
                .all(db)
                .await?;
            for item in items {
                items_by_order.entry(item.order_id).or_default().push(item);
            }
        }

        let orders = orders
            .into_iter()
            .map(|o| {
                let items = items_by_order.remove(&o.id).unwrap_or_default();
                OrderResponse::from_parts(o, items)
            })
            .collect();

        Ok(OrderListResponse {
            orders,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    /// Gets an order with its items
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let order = find_order(db, order_id).await?;
        let items = load_items(db, order_id).await?;
        Ok(OrderResponse::from_parts(order, items))
    }

    /// Moves an order through the status allow-list
    #[instrument(skip(self, request), fields(order_id = %order_id, new_status = %request.status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;
        let order = find_order(&txn, order_id).await?;
        let old_status = order.status;

        let mut active: OrderActiveModel = order.into();
        apply_status(&mut active, old_status, request.status)?;
        if let Some(notes) = request.admin_notes {
            active.admin_notes = Set(Some(notes));
        }

        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;
        let items = load_items(&txn, order_id).await?;
        txn.commit().await?;

        info!(
            order_id = %order_id,
            old_status = %old_status,
            new_status = %updated.status,
            "Order status updated"
        );
        Ok(OrderResponse::from_parts(updated, items))
    }

    /// Records a tracking number and marks the order as shipped. Accepted for confirmed,
    /// processing and already shipped orders.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn add_tracking(
        &self,
        order_id: Uuid,
        request: AddTrackingRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;
        let order = find_order(&txn, order_id).await?;
        let old_status = order.status;

        if !matches!(
            old_status,
            OrderStatus::Confirmed | OrderStatus::Processing | OrderStatus::Shipped
        ) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot add tracking to an order in status {}",
                old_status
            )));
        }

        let mut active: OrderActiveModel = order.into();
        if old_status != OrderStatus::Shipped {
            active.status = Set(OrderStatus::Shipped);
            active.shipped_at = Set(Some(Utc::now()));
        }
        active.tracking_number = Set(Some(request.tracking_number.trim().to_string()));

        let updated = active.update(&txn).await?;
        let items = load_items(&txn, order_id).await?;
        txn.commit().await?;

        info!(
            order_id = %order_id,
            tracking_number = %request.tracking_number.trim(),
            "Tracking number added"
        );
        Ok(OrderResponse::from_parts(updated, items))
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required".into());
        return Err(err);
    }
    Ok(())
}

/// Applies a status change and its timestamps, rejecting moves outside the allow-list.
fn apply_status(
    active: &mut OrderActiveModel,
    current: OrderStatus,
    next: OrderStatus,
) -> Result<(), ServiceError> {
    if !current.can_transition_to(next) {
        return Err(ServiceError::InvalidStatus(format!(
            "Cannot change order status from {} to {}",
            current, next
        )));
    }
    if current == next {
        return Ok(());
    }

    let now = Utc::now();
    active.status = Set(next);
    match next {
        OrderStatus::Shipped => active.shipped_at = Set(Some(now)),
        OrderStatus::Delivered => active.delivered_at = Set(Some(now)),
        _ => {}
    }
    Ok(())
}

async fn find_order<C: ConnectionTrait>(db: &C, order_id: Uuid) -> Result<OrderModel, ServiceError> {
    OrderEntity::find_by_id(order_id)
        .one(db)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to fetch order");
            ServiceError::DatabaseError(e)
        })?
        .ok_or_else(|| {
            warn!(order_id = %order_id, "Order not found");
            ServiceError::NotFound("Order not found".to_string())
        })
}

async fn load_items<C: ConnectionTrait>(
    db: &C,
    order_id: Uuid,
) -> Result<Vec<OrderItemModel>, ServiceError> {
    Ok(OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::LineNumber)
        .all(db)
        .await?)
}

/// Checks availability and stock for every cart line and prices it.
async fn price_lines(
    txn: &DatabaseTransaction,
    items: &[OrderItemInput],
) -> Result<Vec<PricedLine>, ServiceError> {
    let mut products: HashMap<Uuid, (product::Model, String)> = HashMap::new();
    let mut requested_per_variant: HashMap<Uuid, i64> = HashMap::new();
    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        if !products.contains_key(&item.product_id) {
            let product = product::Entity::find_by_id(item.product_id)
                .one(txn)
                .await?
                .filter(|p| p.is_available)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not available", item.product_id))
                })?;
            let image = primary_image_url(txn, product.id).await?;
            products.insert(product.id, (product, image));
        }
        let (product, image) = &products[&item.product_id];

        let variant = match item.variant_id {
            Some(variant_id) => {
                let variant = product_variant::Entity::find_by_id(variant_id)
                    .filter(product_variant::Column::ProductId.eq(product.id))
                    .one(txn)
                    .await?
                    .filter(|v| v.is_available)
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Variant {} not available for {}",
                            variant_id, product.name
                        ))
                    })?;

                let requested = requested_per_variant.entry(variant.id).or_insert(0);
                *requested += i64::from(item.quantity);
                if i64::from(variant.stock_quantity) < *requested {
                    return Err(ServiceError::InsufficientStock(format!(
                        "Not enough stock for {} ({})",
                        product.name, variant.name
                    )));
                }
                Some(variant)
            }
            None => None,
        };

        let unit_price = pricing::unit_price(
            product.price,
            variant.as_ref().map(|v| v.price_adjustment),
        );
        lines.push(PricedLine {
            product_id: product.id,
            variant_id: variant.as_ref().map(|v| v.id),
            quantity: item.quantity,
            unit_price,
            subtotal: pricing::line_subtotal(unit_price, item.quantity),
            snapshot: ProductSnapshot {
                name: product.name.clone(),
                variant_name: variant.as_ref().map(|v| v.name.clone()),
                price: unit_price,
                image: image.clone(),
            },
        });
    }

    Ok(lines)
}

/// Primary image, else the first by display order, else an empty string.
async fn primary_image_url(
    txn: &DatabaseTransaction,
    product_id: Uuid,
) -> Result<String, ServiceError> {
    let image = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product_id))
        .order_by_desc(product_image::Column::IsPrimary)
        .order_by_asc(product_image::Column::DisplayOrder)
        .one(txn)
        .await?;
    Ok(image.map(|i| i.url).unwrap_or_default())
}

/// Conditionally decrements stock so concurrent checkouts cannot oversell a variant.
async fn reserve_stock(txn: &DatabaseTransaction, lines: &[PricedLine]) -> Result<(), ServiceError> {
    let mut per_variant: HashMap<Uuid, (i32, &str)> = HashMap::new();
    for line in lines {
        if let Some(variant_id) = line.variant_id {
            let entry = per_variant
                .entry(variant_id)
                .or_insert((0, line.snapshot.name.as_str()));
            entry.0 += line.quantity;
        }
    }

    for (variant_id, (quantity, product_name)) in per_variant {
        let result = product_variant::Entity::update_many()
            .col_expr(
                product_variant::Column::StockQuantity,
                Expr::col(product_variant::Column::StockQuantity).sub(quantity),
            )
            .col_expr(product_variant::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product_variant::Column::Id.eq(variant_id))
            .filter(product_variant::Column::StockQuantity.gte(quantity))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            warn!(variant_id = %variant_id, quantity, "Stock reservation lost a race");
            return Err(ServiceError::InsufficientStock(format!(
                "Not enough stock for {}",
                product_name
            )));
        }
    }
    Ok(())
}

/// Next number in today's sequence, counted inside the caller's transaction.
async fn next_order_number(
    txn: &DatabaseTransaction,
    prefix: &str,
    date: NaiveDate,
) -> Result<String, ServiceError> {
    let day_prefix = order_number::day_prefix(prefix, date);
    let placed_today = OrderEntity::find()
        .filter(order::Column::OrderNumber.starts_with(day_prefix.as_str()))
        .count(txn)
        .await?;
    Ok(order_number::format_order_number(
        prefix,
        date,
        placed_today + 1,
    ))
}

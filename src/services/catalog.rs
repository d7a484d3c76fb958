use crate::{
    db::DbPool,
    entities::{
        category,
        order_item,
        product::{self, Entity as ProductEntity, Material, Model as ProductModel},
        product_category, product_image, product_variant,
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

const MAX_PAGE_SIZE: u64 = 100;

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Value cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required".into());
        return Err(err);
    }
    Ok(())
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .and_then(|v| if v.is_empty() { None } else { Some(v) })
}

/// URL-safe slug: lowercase alphanumerics separated by single dashes.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Filters for the storefront product listing
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub featured: Option<bool>,
    pub new_arrival: Option<bool>,
    pub include_unavailable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariantResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price_adjustment: Decimal,
    pub stock_quantity: i32,
    pub is_available: bool,
}

impl From<product_variant::Model> for VariantResponse {
    fn from(model: product_variant::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            name: model.name,
            price_adjustment: model.price_adjustment,
            stock_quantity: model.stock_quantity,
            is_available: model.is_available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub is_primary: bool,
}

impl From<product_image::Model> for ImageResponse {
    fn from(model: product_image::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
            alt_text: model.alt_text,
            display_order: model.display_order,
            is_primary: model.is_primary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub weight: Decimal,
    pub material: Material,
    pub is_available: bool,
    pub is_featured: bool,
    pub is_new_arrival: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub categories: Vec<CategorySummary>,
    pub variants: Vec<VariantResponse>,
    pub images: Vec<ImageResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub name: String,
    /// Derived from the name when omitted
    #[validate(length(max = 255))]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "validate_non_negative")]
    pub price: Decimal,
    #[validate(custom = "validate_non_negative")]
    pub compare_at_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    #[serde(default)]
    pub weight: Decimal,
    #[serde(default)]
    pub material: Material,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_new_arrival: Option<bool>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[validate]
    #[serde(default)]
    pub variants: Vec<CreateVariantRequest>,
    #[validate]
    #[serde(default)]
    pub images: Vec<ImageInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub name: Option<String>,
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub compare_at_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub weight: Option<Decimal>,
    pub material: Option<Material>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_new_arrival: Option<bool>,
    /// Replaces the product's categories when present
    pub category_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    #[validate(custom = "validate_not_blank", length(max = 1024))]
    pub url: String,
    #[validate(length(max = 255))]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddImagesRequest {
    #[validate]
    pub images: Vec<ImageInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVariantRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub name: String,
    #[serde(default)]
    pub price_adjustment: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[serde(default)]
    pub stock_quantity: i32,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVariantRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub name: Option<String>,
    pub price_adjustment: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock_quantity: Option<i32>,
    pub is_available: Option<bool>,
}

/// Product catalog: storefront reads and admin maintenance of products, variants and images.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists products newest first with their variants, images and categories
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        page: u64,
        limit: u64,
    ) -> Result<ProductListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        let mut query = ProductEntity::find().order_by_desc(product::Column::CreatedAt);
        if !filter.include_unavailable {
            query = query.filter(product::Column::IsAvailable.eq(true));
        }
        if let Some(featured) = filter.featured {
            query = query.filter(product::Column::IsFeatured.eq(featured));
        }
        if let Some(new_arrival) = filter.new_arrival {
            query = query.filter(product::Column::IsNewArrival.eq(new_arrival));
        }
        if let Some(category_id) = filter.category_id {
            query = query
                .join(JoinType::InnerJoin, product::Relation::ProductCategories.def())
                .filter(product_category::Column::CategoryId.eq(category_id));
        }

        let paginator = query.paginate(db, limit);
        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count products");
            ServiceError::DatabaseError(e)
        })?;
        let models = paginator.fetch_page(page - 1).await?;
        let products = self.hydrate(models).await?;

        Ok(ProductListResponse {
            products,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    /// Storefront lookup by slug; unavailable products are hidden
    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<ProductResponse, ServiceError> {
        let product = ProductEntity::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(product::Column::IsAvailable.eq(true))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        self.hydrate_one(product).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductResponse, ServiceError> {
        let product = find_product(&*self.db_pool, product_id).await?;
        self.hydrate_one(product).await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;

        let name = request.name.trim().to_string();
        let slug = match normalize_optional_string(request.slug) {
            Some(slug) => slugify(&slug),
            None => slugify(&name),
        };
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Product slug cannot be empty".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        ensure_slug_free(&txn, &slug, None).await?;
        ensure_categories_exist(&txn, &request.category_ids).await?;

        let product_id = Uuid::new_v4();
        let product = product::ActiveModel {
            id: Set(product_id),
            name: Set(name),
            slug: Set(slug),
            description: Set(request.description.trim().to_string()),
            price: Set(request.price.round_dp(2)),
            compare_at_price: Set(request.compare_at_price.map(|p| p.round_dp(2))),
            weight: Set(request.weight.round_dp(2)),
            material: Set(request.material),
            is_available: Set(request.is_available.unwrap_or(true)),
            is_featured: Set(request.is_featured.unwrap_or(false)),
            is_new_arrival: Set(request.is_new_arrival.unwrap_or(false)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(map_unique("Product slug already exists"))?;

        replace_categories(&txn, product_id, &request.category_ids).await?;
        for variant in request.variants {
            insert_variant(&txn, product_id, variant).await?;
        }
        insert_images(&txn, product_id, request.images).await?;
        txn.commit().await?;

        info!(product_id = %product.id, slug = %product.slug, "Product created");
        self.hydrate_one(product).await
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;
        let existing = find_product(&txn, product_id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(slug) = request.slug {
            let slug = slugify(&slug);
            if slug.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Product slug cannot be empty".to_string(),
                ));
            }
            ensure_slug_free(&txn, &slug, Some(product_id)).await?;
            active.slug = Set(slug);
        }
        if let Some(description) = request.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(price) = request.price {
            active.price = Set(price.round_dp(2));
        }
        if let Some(compare_at_price) = request.compare_at_price {
            active.compare_at_price = Set(Some(compare_at_price.round_dp(2)));
        }
        if let Some(weight) = request.weight {
            active.weight = Set(weight.round_dp(2));
        }
        if let Some(material) = request.material {
            active.material = Set(material);
        }
        if let Some(is_available) = request.is_available {
            active.is_available = Set(is_available);
        }
        if let Some(is_featured) = request.is_featured {
            active.is_featured = Set(is_featured);
        }
        if let Some(is_new_arrival) = request.is_new_arrival {
            active.is_new_arrival = Set(is_new_arrival);
        }

        let updated = active
            .update(&txn)
            .await
            .map_err(map_unique("Product slug already exists"))?;
        if let Some(category_ids) = request.category_ids {
            ensure_categories_exist(&txn, &category_ids).await?;
            replace_categories(&txn, product_id, &category_ids).await?;
        }
        txn.commit().await?;

        info!(product_id = %product_id, "Product updated");
        self.hydrate_one(updated).await
    }

    /// Deletes a product that has never been ordered. Ordered products should be
    /// marked unavailable instead so order history keeps its reference.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let product = find_product(db, product_id).await?;

        let ordered = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(product_id))
            .count(db)
            .await?;
        if ordered > 0 {
            warn!(product_id = %product_id, ordered, "Refusing to delete ordered product");
            return Err(ServiceError::Conflict(
                "Product has orders; mark it unavailable instead".to_string(),
            ));
        }

        product.delete(db).await?;
        info!(product_id = %product_id, "Product deleted");
        Ok(())
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn add_images(
        &self,
        product_id: Uuid,
        request: AddImagesRequest,
    ) -> Result<Vec<ImageResponse>, ServiceError> {
        request.validate()?;
        if request.images.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one image is required".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        find_product(&txn, product_id).await?;
        let images = insert_images(&txn, product_id, request.images).await?;
        txn.commit().await?;

        info!(product_id = %product_id, count = images.len(), "Product images added");
        Ok(images.into_iter().map(ImageResponse::from).collect())
    }

    /// Deletes an image; when it was primary the next image by display order takes over.
    #[instrument(skip(self), fields(product_id = %product_id, image_id = %image_id))]
    pub async fn delete_image(&self, product_id: Uuid, image_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let image = product_image::Entity::find_by_id(image_id)
            .filter(product_image::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Image not found".to_string()))?;
        let was_primary = image.is_primary;
        image.delete(&txn).await?;

        if was_primary {
            let next = product_image::Entity::find()
                .filter(product_image::Column::ProductId.eq(product_id))
                .order_by_asc(product_image::Column::DisplayOrder)
                .one(&txn)
                .await?;
            if let Some(next) = next {
                let mut active: product_image::ActiveModel = next.into();
                active.is_primary = Set(true);
                active.update(&txn).await?;
            }
        }
        txn.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn add_variant(
        &self,
        product_id: Uuid,
        request: CreateVariantRequest,
    ) -> Result<VariantResponse, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        find_product(db, product_id).await?;
        let variant = insert_variant(db, product_id, request).await?;
        info!(product_id = %product_id, variant_id = %variant.id, "Variant added");
        Ok(variant.into())
    }

    #[instrument(skip(self, request), fields(variant_id = %variant_id))]
    pub async fn update_variant(
        &self,
        variant_id: Uuid,
        request: UpdateVariantRequest,
    ) -> Result<VariantResponse, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let variant = find_variant(db, variant_id).await?;

        let mut active: product_variant::ActiveModel = variant.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(adjustment) = request.price_adjustment {
            active.price_adjustment = Set(adjustment.round_dp(2));
        }
        if let Some(stock) = request.stock_quantity {
            active.stock_quantity = Set(stock);
        }
        if let Some(is_available) = request.is_available {
            active.is_available = Set(is_available);
        }

        let updated = active.update(db).await?;
        info!(variant_id = %variant_id, stock = updated.stock_quantity, "Variant updated");
        Ok(updated.into())
    }

    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn delete_variant(&self, variant_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let variant = find_variant(db, variant_id).await?;
        variant.delete(db).await?;
        info!(variant_id = %variant_id, "Variant deleted");
        Ok(())
    }

    async fn hydrate_one(&self, product: ProductModel) -> Result<ProductResponse, ServiceError> {
        let mut products = self.hydrate(vec![product]).await?;
        products
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Product hydration lost a row".into()))
    }

    /// Batch-loads variants, images and categories for a page of products.
    async fn hydrate(
        &self,
        products: Vec<ProductModel>,
    ) -> Result<Vec<ProductResponse>, ServiceError> {
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let db = &*self.db_pool;
        let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

        let mut variants: HashMap<Uuid, Vec<VariantResponse>> = HashMap::new();
        for variant in product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.is_in(ids.clone()))
            .order_by_asc(product_variant::Column::CreatedAt)
            .all(db)
            .await?
        {
            variants
                .entry(variant.product_id)
                .or_default()
                .push(variant.into());
        }

        let mut images: HashMap<Uuid, Vec<ImageResponse>> = HashMap::new();
        for image in product_image::Entity::find()
            .filter(product_image::Column::ProductId.is_in(ids.clone()))
            .order_by_asc(product_image::Column::DisplayOrder)
            .all(db)
            .await?
        {
            images.entry(image.product_id).or_default().push(image.into());
        }

        let links = product_category::Entity::find()
            .filter(product_category::Column::ProductId.is_in(ids))
            .all(db)
            .await?;
        let category_ids: Vec<Uuid> = links.iter().map(|l| l.category_id).collect();
        let category_by_id: HashMap<Uuid, category::Model> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            category::Entity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };
        let mut categories: HashMap<Uuid, Vec<CategorySummary>> = HashMap::new();
        for link in links {
            if let Some(c) = category_by_id.get(&link.category_id) {
                categories
                    .entry(link.product_id)
                    .or_default()
                    .push(CategorySummary {
                        id: c.id,
                        name: c.name.clone(),
                        slug: c.slug.clone(),
                    });
            }
        }

        Ok(products
            .into_iter()
            .map(|p| ProductResponse {
                categories: categories.remove(&p.id).unwrap_or_default(),
                variants: variants.remove(&p.id).unwrap_or_default(),
                images: images.remove(&p.id).unwrap_or_default(),
                id: p.id,
                name: p.name,
                slug: p.slug,
                description: p.description,
                price: p.price,
                compare_at_price: p.compare_at_price,
                weight: p.weight,
                material: p.material,
                is_available: p.is_available,
                is_featured: p.is_featured,
                is_new_arrival: p.is_new_arrival,
                created_at: p.created_at,
                updated_at: p.updated_at,
            })
            .collect())
    }
}

fn map_unique(message: &'static str) -> impl Fn(sea_orm::DbErr) -> ServiceError {
    move |e| {
        let err = ServiceError::DatabaseError(e);
        if err.is_unique_violation() {
            ServiceError::Conflict(message.to_string())
        } else {
            err
        }
    }
}

async fn find_product<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
) -> Result<ProductModel, ServiceError> {
    ProductEntity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
}

async fn find_variant<C: ConnectionTrait>(
    db: &C,
    variant_id: Uuid,
) -> Result<product_variant::Model, ServiceError> {
    product_variant::Entity::find_by_id(variant_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Variant not found".to_string()))
}

async fn ensure_slug_free<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    except: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = ProductEntity::find().filter(product::Column::Slug.eq(slug));
    if let Some(id) = except {
        query = query.filter(product::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(ServiceError::Conflict(format!(
            "Product with slug '{}' already exists",
            slug
        )));
    }
    Ok(())
}

async fn ensure_categories_exist<C: ConnectionTrait>(
    db: &C,
    category_ids: &[Uuid],
) -> Result<(), ServiceError> {
    for id in category_ids {
        if category::Entity::find_by_id(*id).one(db).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Category {} not found", id)));
        }
    }
    Ok(())
}

async fn replace_categories<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    category_ids: &[Uuid],
) -> Result<(), ServiceError> {
    product_category::Entity::delete_many()
        .filter(product_category::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;

    let mut seen = Vec::with_capacity(category_ids.len());
    for id in category_ids {
        if seen.contains(id) {
            continue;
        }
        seen.push(*id);
        product_category::ActiveModel {
            product_id: Set(product_id),
            category_id: Set(*id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn insert_variant<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    request: CreateVariantRequest,
) -> Result<product_variant::Model, ServiceError> {
    Ok(product_variant::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        name: Set(request.name.trim().to_string()),
        price_adjustment: Set(request.price_adjustment.round_dp(2)),
        stock_quantity: Set(request.stock_quantity),
        is_available: Set(request.is_available.unwrap_or(true)),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Appends images after the existing ones. The first image of a product becomes primary.
async fn insert_images<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    images: Vec<ImageInput>,
) -> Result<Vec<product_image::Model>, ServiceError> {
    let existing = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product_id))
        .all(db)
        .await?;
    let mut next_order = existing
        .iter()
        .map(|i| i.display_order + 1)
        .max()
        .unwrap_or(0);
    let mut has_primary = existing.iter().any(|i| i.is_primary);

    let mut inserted = Vec::with_capacity(images.len());
    for image in images {
        let model = product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            url: Set(image.url.trim().to_string()),
            alt_text: Set(normalize_optional_string(image.alt_text)),
            display_order: Set(next_order),
            is_primary: Set(!has_primary),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;
        has_primary = true;
        next_order += 1;
        inserted.push(model);
    }
    Ok(inserted)
}

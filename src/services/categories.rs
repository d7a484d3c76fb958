use crate::{
    db::DbPool,
    entities::category::{self, Entity as CategoryEntity, Model as CategoryModel},
    entities::product_category,
    errors::ServiceError,
    services::catalog::slugify,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(model: CategoryModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            image_url: model.image_url,
            display_order: model.display_order,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 1024))]
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub name: Option<String>,
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 1024))]
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOrder {
    pub id: Uuid,
    pub display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderCategoriesRequest {
    pub categories: Vec<CategoryOrder>,
}

#[derive(Clone)]
pub struct CategoryService {
    db_pool: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Active categories by display order, then name
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<CategoryResponse>, ServiceError> {
        let categories = CategoryEntity::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::DisplayOrder)
            .order_by_asc(category::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(categories.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<CategoryResponse>, ServiceError> {
        let categories = CategoryEntity::find()
            .order_by_asc(category::Column::DisplayOrder)
            .order_by_asc(category::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(categories.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryResponse, ServiceError> {
        CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .filter(category::Column::IsActive.eq(true))
            .one(&*self.db_pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        let name = request.name.trim().to_string();
        let slug = slugify(request.slug.as_deref().unwrap_or(&name));
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category slug cannot be empty".to_string(),
            ));
        }
        ensure_unique(db, &name, &slug, None).await?;

        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            slug: Set(slug),
            description: Set(request.description),
            image_url: Set(request.image_url),
            display_order: Set(request.display_order.unwrap_or(0)),
            is_active: Set(request.is_active.unwrap_or(true)),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(conflict_on_duplicate)?;

        info!(category_id = %model.id, slug = %model.slug, "Category created");
        Ok(model.into())
    }

    #[instrument(skip(self, request), fields(category_id = %category_id))]
    pub async fn update(
        &self,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let existing = find_category(db, category_id).await?;

        let name = request
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| existing.name.clone());
        let slug = request
            .slug
            .map(|s| slugify(&s))
            .unwrap_or_else(|| existing.slug.clone());
        ensure_unique(db, &name, &slug, Some(category_id)).await?;

        let mut active: category::ActiveModel = existing.into();
        active.name = Set(name);
        active.slug = Set(slug);
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(image_url) = request.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(display_order) = request.display_order {
            active.display_order = Set(display_order);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(db).await.map_err(conflict_on_duplicate)?;
        info!(category_id = %category_id, "Category updated");
        Ok(updated.into())
    }

    /// Deletes an empty category
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn delete(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let category = find_category(db, category_id).await?;

        let attached = product_category::Entity::find()
            .filter(product_category::Column::CategoryId.eq(category_id))
            .count(db)
            .await?;
        if attached > 0 {
            warn!(category_id = %category_id, attached, "Category still has products");
            return Err(ServiceError::Conflict(format!(
                "Category has {} product(s) attached",
                attached
            )));
        }

        category.delete(db).await?;
        info!(category_id = %category_id, "Category deleted");
        Ok(())
    }

    /// Applies a new display order to several categories at once
    #[instrument(skip(self, request), fields(count = request.categories.len()))]
    pub async fn reorder(
        &self,
        request: ReorderCategoriesRequest,
    ) -> Result<Vec<CategoryResponse>, ServiceError> {
        let txn = self.db_pool.begin().await?;
        for entry in &request.categories {
            let existing = find_category(&txn, entry.id).await?;
            let mut active: category::ActiveModel = existing.into();
            active.display_order = Set(entry.display_order);
            active.update(&txn).await?;
        }
        txn.commit().await?;

        info!("Categories reordered");
        self.list_all().await
    }
}

fn conflict_on_duplicate(e: sea_orm::DbErr) -> ServiceError {
    let err = ServiceError::DatabaseError(e);
    if err.is_unique_violation() {
        ServiceError::Conflict("Category name or slug already exists".to_string())
    } else {
        err
    }
}

async fn find_category<C: ConnectionTrait>(
    db: &C,
    category_id: Uuid,
) -> Result<CategoryModel, ServiceError> {
    CategoryEntity::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))
}

async fn ensure_unique<C: ConnectionTrait>(
    db: &C,
    name: &str,
    slug: &str,
    except: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = CategoryEntity::find().filter(
        category::Column::Name
            .eq(name)
            .or(category::Column::Slug.eq(slug)),
    );
    if let Some(id) = except {
        query = query.filter(category::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(ServiceError::Conflict(
            "Category name or slug already exists".to_string(),
        ));
    }
    Ok(())
}

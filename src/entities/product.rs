use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Product entity for the jewelry catalog
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub compare_at_price: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub weight: Decimal,
    pub material: Material,
    pub is_available: bool,
    pub is_featured: bool,
    pub is_new_arrival: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_variant::Entity")]
    ProductVariants,
    #[sea_orm(has_many = "super::product_image::Entity")]
    ProductImages,
    #[sea_orm(has_many = "super::product_category::Entity")]
    ProductCategories,
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariants.def()
    }
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductImages.def()
    }
}

impl Related<super::product_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductCategories.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_category::Relation::Product.def().rev())
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert && matches!(active_model.created_at, ActiveValue::NotSet) {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}

/// Metal or alloy a piece is made of
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum Material {
    #[sea_orm(string_value = "silver_925")]
    #[serde(rename = "silver_925")]
    Silver925,
    #[sea_orm(string_value = "gold_585")]
    #[serde(rename = "gold_585")]
    Gold585,
    #[sea_orm(string_value = "gold_750")]
    #[serde(rename = "gold_750")]
    Gold750,
    #[sea_orm(string_value = "platinum")]
    Platinum,
    #[default]
    #[sea_orm(string_value = "steel")]
    Steel,
}

#[cfg(test)]
mod tests {
    use super::Material;
    use rstest::rstest;
    use sea_orm::ActiveEnum;

    #[rstest]
    #[case(Material::Silver925, "silver_925")]
    #[case(Material::Gold585, "gold_585")]
    #[case(Material::Gold750, "gold_750")]
    #[case(Material::Platinum, "platinum")]
    #[case(Material::Steel, "steel")]
    fn material_wire_name_matches_column_value(#[case] material: Material, #[case] wire: &str) {
        assert_eq!(serde_json::to_value(material).unwrap(), wire);
        assert_eq!(
            serde_json::from_value::<Material>(serde_json::json!(wire)).unwrap(),
            material
        );
        assert_eq!(material.to_value(), wire);
    }
}

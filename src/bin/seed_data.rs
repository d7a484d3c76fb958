//! Seed data script - populates the database with demo catalog data
//!
//! Run with: cargo run --bin seed-data -- --admin-email admin@jewelry.com
//!
//! This creates:
//! - 6 categories (rings, wedding bands, earrings, pendants, bracelets, chains)
//! - 12 products with size variants and images
//! - One admin account
//!
//! Existing orders, catalog rows and admins are removed first.

use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use silver_jewelry_api::{
    auth::password::hash_password,
    config, db,
    entities::{
        admin, category, order, order_item, product, product::Material, product_category,
        product_image, product_variant, refresh_token,
    },
    services::catalog::slugify,
};

#[derive(Parser, Debug)]
#[command(name = "seed-data", about = "Reset the database to demo content")]
struct Args {
    #[arg(long, default_value = "admin@jewelry.com")]
    admin_email: String,

    #[arg(long, default_value = "admin12345")]
    admin_password: String,

    #[arg(long, default_value = "Shop Admin")]
    admin_name: String,

    /// Apply migrations before seeding
    #[arg(long)]
    migrate: bool,
}

struct CategorySeed {
    name: &'static str,
    description: &'static str,
    image_url: &'static str,
}

struct ProductSeed {
    name: &'static str,
    category: usize,
    description: &'static str,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    weight: Decimal,
    material: Material,
    featured: bool,
    new_arrival: bool,
    sizes: &'static [&'static str],
}

const CATEGORIES: &[CategorySeed] = &[
    CategorySeed {
        name: "Rings",
        description: "Everyday and statement rings",
        image_url: "https://images.unsplash.com/photo-1605100804763-247f67b3557e",
    },
    CategorySeed {
        name: "Wedding Bands",
        description: "Wedding and engagement bands",
        image_url: "https://images.unsplash.com/photo-1515562141207-7a88fb7ce338",
    },
    CategorySeed {
        name: "Earrings",
        description: "Studs, hoops and drops",
        image_url: "https://images.unsplash.com/photo-1535632066927-ab7c9ab60908",
    },
    CategorySeed {
        name: "Pendants",
        description: "Pendants and charms",
        image_url: "https://images.unsplash.com/photo-1599643478518-a784e5dc4c8f",
    },
    CategorySeed {
        name: "Bracelets",
        description: "Chain and bangle bracelets",
        image_url: "https://images.unsplash.com/photo-1611591437281-460bfbe1220a",
    },
    CategorySeed {
        name: "Chains",
        description: "Neck chains in several weaves",
        image_url: "https://images.unsplash.com/photo-1599459183200-59c7687a0275",
    },
];

const RING_SIZES: &[&str] = &["16", "17", "18", "19"];
const CHAIN_LENGTHS: &[&str] = &["45 cm", "50 cm", "55 cm"];
const ONE_SIZE: &[&str] = &[];

fn products() -> Vec<ProductSeed> {
    vec![
        ProductSeed {
            name: "Twisted Silver Ring",
            category: 0,
            description: "Sterling silver ring with a hand twisted band.",
            price: dec!(1450.00),
            compare_at_price: Some(dec!(1700.00)),
            weight: dec!(3.20),
            material: Material::Silver925,
            featured: true,
            new_arrival: false,
            sizes: RING_SIZES,
        },
        ProductSeed {
            name: "Signet Ring Onyx",
            category: 0,
            description: "Silver signet ring with a black onyx inlay.",
            price: dec!(2300.00),
            compare_at_price: None,
            weight: dec!(6.80),
            material: Material::Silver925,
            featured: false,
            new_arrival: true,
            sizes: RING_SIZES,
        },
        ProductSeed {
            name: "Classic Wedding Band",
            category: 1,
            description: "Comfort fit band in 585 gold.",
            price: dec!(9800.00),
            compare_at_price: None,
            weight: dec!(4.10),
            material: Material::Gold585,
            featured: true,
            new_arrival: false,
            sizes: RING_SIZES,
        },
        ProductSeed {
            name: "Platinum Band Matte",
            category: 1,
            description: "Brushed platinum band, 4 mm wide.",
            price: dec!(24500.00),
            compare_at_price: None,
            weight: dec!(7.50),
            material: Material::Platinum,
            featured: false,
            new_arrival: false,
            sizes: RING_SIZES,
        },
        ProductSeed {
            name: "Pearl Stud Earrings",
            category: 2,
            description: "Freshwater pearls on silver posts.",
            price: dec!(980.00),
            compare_at_price: None,
            weight: dec!(2.00),
            material: Material::Silver925,
            featured: true,
            new_arrival: true,
            sizes: ONE_SIZE,
        },
        ProductSeed {
            name: "Small Hoop Earrings",
            category: 2,
            description: "Polished silver hoops, 15 mm.",
            price: dec!(760.00),
            compare_at_price: Some(dec!(890.00)),
            weight: dec!(2.60),
            material: Material::Silver925,
            featured: false,
            new_arrival: false,
            sizes: ONE_SIZE,
        },
        ProductSeed {
            name: "Moon Pendant",
            category: 3,
            description: "Crescent pendant with cubic zirconia.",
            price: dec!(640.00),
            compare_at_price: None,
            weight: dec!(1.40),
            material: Material::Silver925,
            featured: false,
            new_arrival: true,
            sizes: ONE_SIZE,
        },
        ProductSeed {
            name: "Cross Pendant Gold",
            category: 3,
            description: "Minimal cross in 750 gold.",
            price: dec!(5200.00),
            compare_at_price: None,
            weight: dec!(1.90),
            material: Material::Gold750,
            featured: true,
            new_arrival: false,
            sizes: ONE_SIZE,
        },
        ProductSeed {
            name: "Tennis Bracelet",
            category: 4,
            description: "Silver tennis bracelet set with zirconia.",
            price: dec!(2100.00),
            compare_at_price: None,
            weight: dec!(9.30),
            material: Material::Silver925,
            featured: false,
            new_arrival: false,
            sizes: ONE_SIZE,
        },
        ProductSeed {
            name: "Steel Cuff",
            category: 4,
            description: "Open cuff in surgical steel.",
            price: dec!(420.00),
            compare_at_price: None,
            weight: dec!(12.00),
            material: Material::Steel,
            featured: false,
            new_arrival: true,
            sizes: ONE_SIZE,
        },
        ProductSeed {
            name: "Anchor Chain",
            category: 5,
            description: "Anchor weave chain, 2 mm.",
            price: dec!(1250.00),
            compare_at_price: None,
            weight: dec!(5.40),
            material: Material::Silver925,
            featured: false,
            new_arrival: false,
            sizes: CHAIN_LENGTHS,
        },
        ProductSeed {
            name: "Bismark Chain",
            category: 5,
            description: "Heavy bismark weave chain, 4 mm.",
            price: dec!(3900.00),
            compare_at_price: Some(dec!(4300.00)),
            weight: dec!(18.70),
            material: Material::Silver925,
            featured: true,
            new_arrival: false,
            sizes: CHAIN_LENGTHS,
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = config::load_config()?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    info!("=== Silver Jewelry Seed Data ===");
    let pool = db::establish_connection_from_app_config(&cfg).await?;
    if args.migrate {
        db::run_migrations(&pool).await?;
    }

    clear_data(&pool).await?;
    info!("Existing data removed");

    let categories = create_categories(&pool).await?;
    info!("Created {} categories", categories.len());

    let product_count = create_products(&pool, &categories).await?;
    info!("Created {} products with variants and images", product_count);

    create_admin(&pool, &args).await?;
    info!(email = %args.admin_email, "Created admin account");

    info!("=== Seed Data Complete ===");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/categories");
    info!("  curl http://localhost:8080/api/products?featured=true");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");
    Ok(())
}

/// Children are removed before parents so foreign keys hold on every backend
async fn clear_data(db: &DatabaseConnection) -> anyhow::Result<()> {
    let txn = db.begin().await?;
    order_item::Entity::delete_many().exec(&txn).await?;
    order::Entity::delete_many().exec(&txn).await?;
    product_variant::Entity::delete_many().exec(&txn).await?;
    product_image::Entity::delete_many().exec(&txn).await?;
    product_category::Entity::delete_many().exec(&txn).await?;
    product::Entity::delete_many().exec(&txn).await?;
    category::Entity::delete_many().exec(&txn).await?;
    refresh_token::Entity::delete_many().exec(&txn).await?;
    admin::Entity::delete_many().exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}

async fn create_categories(db: &DatabaseConnection) -> anyhow::Result<Vec<category::Model>> {
    let mut created = Vec::with_capacity(CATEGORIES.len());
    for (position, seed) in CATEGORIES.iter().enumerate() {
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(seed.name.to_string()),
            slug: Set(slugify(seed.name)),
            description: Set(Some(seed.description.to_string())),
            image_url: Set(Some(seed.image_url.to_string())),
            display_order: Set(position as i32),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created.push(model);
    }
    Ok(created)
}

async fn create_products(
    db: &DatabaseConnection,
    categories: &[category::Model],
) -> anyhow::Result<usize> {
    let seeds = products();
    for (index, seed) in seeds.iter().enumerate() {
        let txn = db.begin().await?;
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(seed.name.to_string()),
            slug: Set(slugify(seed.name)),
            description: Set(seed.description.to_string()),
            price: Set(seed.price),
            compare_at_price: Set(seed.compare_at_price),
            weight: Set(seed.weight),
            material: Set(seed.material),
            is_available: Set(true),
            is_featured: Set(seed.featured),
            is_new_arrival: Set(seed.new_arrival),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(category) = categories.get(seed.category) {
            product_category::ActiveModel {
                product_id: Set(product.id),
                category_id: Set(category.id),
            }
            .insert(&txn)
            .await?;
        }

        for (position, size) in seed.sizes.iter().enumerate() {
            // Larger sizes use more metal
            let adjustment = Decimal::from(position as i64) * dec!(50.00);
            product_variant::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                name: Set(size.to_string()),
                price_adjustment: Set(adjustment),
                stock_quantity: Set(5 + (index as i32 % 4) * 3),
                is_available: Set(true),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        for position in 0..2 {
            product_image::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                url: Set(format!(
                    "https://cdn.example.com/products/{}/{}.jpg",
                    product.slug,
                    position + 1
                )),
                alt_text: Set(Some(seed.name.to_string())),
                display_order: Set(position),
                is_primary: Set(position == 0),
                created_at: Set(chrono::Utc::now()),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
    }
    Ok(seeds.len())
}

async fn create_admin(db: &DatabaseConnection, args: &Args) -> anyhow::Result<()> {
    let password_hash = hash_password(&args.admin_password)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    admin::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(args.admin_email.trim().to_lowercase()),
        password_hash: Set(password_hash),
        name: Set(args.admin_name.clone()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

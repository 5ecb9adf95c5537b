use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use password_hash::rand_core::OsRng;
use faf_apparel_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let staff_id = ensure_staff_user(&pool, "staff@faf.example", "staff123").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Staff ID: {staff_id}");
    Ok(())
}

async fn ensure_staff_user(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, 'staff')
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured staff user {email}");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = vec![
        ("Suits", "Tailored suits for weddings and formal occasions"),
        ("Traditional", "Handwoven traditional dress"),
        ("Ready-made", "Off-the-rack shop items"),
    ];

    for (name, desc) in &categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .execute(pool)
        .await?;
    }

    let suits: (Uuid,) = sqlx::query_as("SELECT id FROM categories WHERE name = 'Suits'")
        .fetch_one(pool)
        .await?;
    let traditional: (Uuid,) =
        sqlx::query_as("SELECT id FROM categories WHERE name = 'Traditional'")
            .fetch_one(pool)
            .await?;

    let products = vec![
        ("Classic Suit", "Two-piece wool suit", 29999_i64, suits.0, "men", true),
        ("Evening Gown", "Floor-length gown", 34999, suits.0, "women", true),
        ("Habesha Kemis", "Hand-embroidered cotton dress", 19999, traditional.0, "women", false),
        ("Netela Set", "Traditional shawl set", 9999, traditional.0, "women", false),
    ];

    for (name, desc, price, category_id, gender, featured) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, images, category_id, gender, sizes, materials, featured)
            VALUES ($1, $2, $3, $4, '[]', $5, $6, '["S","M","L","XL"]', '[]', $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(category_id)
        .bind(gender)
        .bind(featured)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}

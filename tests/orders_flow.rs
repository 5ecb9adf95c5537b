use std::sync::Arc;

use faf_apparel_api::{
    config::NotifyConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        categories::CreateCategoryRequest,
        orders::{CreateOrderRequest, CustomerPayload, OrderItemPayload, UpdateOrderStatusRequest},
        products::CreateProductRequest,
    },
    error::AppError,
    gateway::StubGateway,
    middleware::auth::AuthUser,
    notify::Notifier,
    routes::params::{Pagination, ProductQuery},
    services::{category_service, order_service, product_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Integration flow: staff builds the catalog; a storefront order is created,
// read back by reference, and moved through its status; the category in-use
// guard holds until its product is gone.
#[tokio::test]
async fn catalog_order_and_category_guard_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let staff_id = create_user(&state, "staff", "staff@faf.example").await?;
    let staff = AuthUser {
        user_id: staff_id,
        role: "staff".into(),
    };
    let shopper = AuthUser {
        user_id: Uuid::new_v4(),
        role: "customer".into(),
    };

    // Staff creates a category and a product in it.
    let category = category_service::create_category(
        &state,
        &staff,
        CreateCategoryRequest {
            name: "Suits".into(),
            description: Some("Tailored suits".into()),
        },
    )
    .await?
    .data
    .unwrap();

    let product = product_service::create_product(
        &state,
        &staff,
        CreateProductRequest {
            name: "Classic Suit".into(),
            description: Some("Two-piece wool suit".into()),
            price: 29999,
            images: vec!["suits/classic-front.jpg".into()],
            category_id: category.id,
            gender: "men".into(),
            sizes: vec!["M".into(), "L".into()],
            materials: vec!["wool".into()],
            in_stock: true,
            featured: true,
        },
    )
    .await?
    .data
    .unwrap();

    // Non-staff roles cannot mutate the catalog.
    let err = product_service::delete_product(&state, &shopper, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Filtered listing: gender + featured, AND semantics.
    let listed = product_service::list_products(
        &state,
        ProductQuery {
            pagination: Pagination {
                page: Some(1),
                per_page: Some(20),
            },
            category: Some(category.id),
            gender: Some("men".into()),
            featured: Some(true),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(listed.items.iter().any(|p| p.id == product.id));

    // Storefront order, tax flow: 29999 + 2400 = 32399.
    let reference = "FAF-1719238123456-9C2F".to_string();
    let created = order_service::create_order(
        &state,
        CreateOrderRequest {
            reference: reference.clone(),
            customer: abel_payload(),
            items: vec![OrderItemPayload {
                person_name: "Abel".into(),
                gender: "men".into(),
                age_group: "adult".into(),
                occasion: "wedding".into(),
                design_id: "mt1".into(),
                design_name: product.name.clone(),
                unit_price: 29999,
                sizing: serde_json::json!({ "mode": "standard", "label": "L" }),
            }],
            payment_method: "card".into(),
            pricing_flow: "tax".into(),
            subtotal: 29999,
            tax: Some(2400),
            deposit: None,
            total: 32399,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(created.reference, reference);

    // Confirmation page reads by reference; totals and status round-trip.
    let details = order_service::get_order(&state, &reference)
        .await?
        .data
        .unwrap();
    assert_eq!(details.order.status, "pending");
    assert_eq!(details.order.subtotal, 29999);
    assert_eq!(details.order.tax, Some(2400));
    assert_eq!(details.order.total, 32399);
    assert_eq!(details.customer.email, "abel@example.com");
    assert_eq!(details.items.len(), 1);

    // Same order by uuid.
    let by_id = order_service::get_order(&state, &created.order_id.to_string())
        .await?
        .data
        .unwrap();
    assert_eq!(by_id.order.reference, reference);

    // Staff moves the order along; unknown statuses are rejected.
    let err = order_service::update_order_status(
        &state,
        &staff,
        created.order_id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let updated = order_service::update_order_status(
        &state,
        &staff,
        created.order_id,
        UpdateOrderStatusRequest {
            status: "preparing".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.status, "preparing");

    // Category with a product stays put.
    let err = category_service::delete_category(&state, &staff, category.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let still_there = category_service::list_categories(&state)
        .await?
        .data
        .unwrap();
    assert!(still_there.items.iter().any(|c| c.id == category.id));

    // Once the product is gone, the delete goes through.
    product_service::delete_product(&state, &staff, product.id).await?;
    category_service::delete_category(&state, &staff, category.id).await?;
    let remaining = category_service::list_categories(&state)
        .await?
        .data
        .unwrap();
    assert!(remaining.items.iter().all(|c| c.id != category.id));

    Ok(())
}

fn abel_payload() -> CustomerPayload {
    CustomerPayload {
        first_name: "Abel".into(),
        last_name: "Mengistu".into(),
        email: "abel@example.com".into(),
        phone: "0911234567".into(),
        address: "Bole Road".into(),
        city: "Addis Ababa".into(),
        state: "AA".into(),
        zip: "1000".into(),
        notes: None,
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, customers, audit_logs, products, categories, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        gateway: Arc::new(StubGateway),
        notifier: Arc::new(Notifier::new(NotifyConfig::default())),
    })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    use faf_apparel_api::entity::users::ActiveModel as UserActive;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{
            CreateOrderRequest, CustomerPayload, OrderCreated, OrderItemPayload, OrderList,
            OrderWithDetails, UpdateOrderStatusRequest,
        },
        payment::{PaymentLineItem, PaymentResult, SquarePaymentRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{Category, Customer, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, categories, health, orders, params, payment, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        orders::create_order,
        orders::get_order,
        admin::list_all_orders,
        admin::update_order_status,
        payment::square_payment,
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            Customer,
            Order,
            OrderItem,
            CategoryList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            ProductList,
            CreateProductRequest,
            UpdateProductRequest,
            CreateOrderRequest,
            CustomerPayload,
            OrderItemPayload,
            OrderCreated,
            OrderList,
            OrderWithDetails,
            UpdateOrderStatusRequest,
            SquarePaymentRequest,
            PaymentLineItem,
            PaymentResult,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<OrderCreated>,
            ApiResponse<OrderWithDetails>,
            ApiResponse<OrderList>,
            ApiResponse<PaymentResult>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Staff authentication"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Orders", description = "Order creation and tracking"),
        (name = "Admin", description = "Back-office order management"),
        (name = "Payments", description = "Payment gateway endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

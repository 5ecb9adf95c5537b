use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::log_audit,
    dto::orders::{
        CreateOrderRequest, OrderCreated, OrderList, OrderWithDetails, UpdateOrderStatusRequest,
    },
    entity::{
        customers::{ActiveModel as CustomerActive, Entity as Customers, Model as CustomerModel},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Customer, ORDER_STATUSES, Order, OrderItem},
    notify::{OrderBackupRow, spawn_logged},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

const PRICING_FLOWS: [&str; 2] = ["tax", "deposit"];

/// Creates Customer + Order + OrderItems in one transaction, then fires
/// the spreadsheet backup off the response path.
pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderCreated>> {
    payload
        .customer
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid customer info: {e}")))?;

    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }
    if !PRICING_FLOWS.contains(&payload.pricing_flow.as_str()) {
        return Err(AppError::BadRequest("Unknown pricing flow".into()));
    }
    let items_subtotal: i64 = payload.items.iter().map(|i| i.unit_price).sum();
    if items_subtotal != payload.subtotal {
        return Err(AppError::BadRequest("Subtotal does not match items".into()));
    }

    let item_count = payload.items.len();
    let txn = state.orm.begin().await?;

    let customer = CustomerActive {
        id: Set(Uuid::new_v4()),
        first_name: Set(payload.customer.first_name),
        last_name: Set(payload.customer.last_name),
        email: Set(payload.customer.email),
        phone: Set(payload.customer.phone),
        address: Set(payload.customer.address),
        city: Set(payload.customer.city),
        state: Set(payload.customer.state),
        zip: Set(payload.customer.zip),
        notes: Set(payload.customer.notes),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        reference: Set(payload.reference),
        customer_id: Set(customer.id),
        payment_method: Set(payload.payment_method),
        pricing_flow: Set(payload.pricing_flow),
        subtotal: Set(payload.subtotal),
        tax: Set(payload.tax),
        deposit: Set(payload.deposit),
        total: Set(payload.total),
        status: Set("pending".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for item in payload.items {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            person_name: Set(item.person_name),
            gender: Set(item.gender),
            age_group: Set(item.age_group),
            occasion: Set(item.occasion),
            design_id: Set(item.design_id),
            design_name: Set(item.design_name),
            unit_price: Set(item.unit_price),
            sizing: Set(item.sizing),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    let notifier = state.notifier.clone();
    let row = OrderBackupRow {
        reference: order.reference.clone(),
        customer_name: format!("{} {}", customer.first_name, customer.last_name),
        customer_email: customer.email.clone(),
        customer_phone: customer.phone.clone(),
        item_count,
        pricing_flow: order.pricing_flow.clone(),
        subtotal: order.subtotal,
        total: order.total,
        status: order.status.clone(),
        created_at: order.created_at.with_timezone(&Utc).to_rfc3339(),
    };
    spawn_logged("order_sheet_backup", async move {
        notifier.backup_order(&row).await
    });

    Ok(ApiResponse::success(
        "Order created",
        OrderCreated {
            order_id: order.id,
            reference: order.reference,
        },
        Some(Meta::empty()),
    ))
}

/// Confirmation pages look orders up by FAF reference, the back office by
/// uuid; both resolve here.
pub async fn get_order(state: &AppState, key: &str) -> AppResult<ApiResponse<OrderWithDetails>> {
    let order = match Uuid::parse_str(key) {
        Ok(id) => Orders::find_by_id(id).one(&state.orm).await?,
        Err(_) => {
            Orders::find()
                .filter(OrderCol::Reference.eq(key))
                .one(&state.orm)
                .await?
        }
    };
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let customer = Customers::find_by_id(order.customer_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order has no customer row")))?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithDetails {
            order: order_from_entity(order),
            customer: customer_from_entity(customer),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items: orders }, Some(meta)))
}

/// Status is the only field staff mutate after creation.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;
    if !ORDER_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::BadRequest("Invalid order status".into()));
    }

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        reference: model.reference,
        customer_id: model.customer_id,
        payment_method: model.payment_method,
        pricing_flow: model.pricing_flow,
        subtotal: model.subtotal,
        tax: model.tax,
        deposit: model.deposit,
        total: model.total,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        person_name: model.person_name,
        gender: model.gender,
        age_group: model.age_group,
        occasion: model.occasion,
        design_id: model.design_id,
        design_name: model.design_name,
        unit_price: model.unit_price,
        sizing: model.sizing,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn customer_from_entity(model: CustomerModel) -> Customer {
    Customer {
        id: model.id,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone: model.phone,
        address: model.address,
        city: model.city,
        state: model.state,
        zip: model.zip,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

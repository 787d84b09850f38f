use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch},
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, auth::current_user_id},
    app_error::{AppError, AppResult},
    domain::entities::store::Product,
    use_cases::store::{NewProduct, NewStore, ProductUpdate, StoreUpdate},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/store", get(get_store).post(create_store).patch(update_store))
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", patch(update_product).delete(delete_product))
}

async fn get_store(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;
    let store = app_state
        .store_use_cases
        .get_store(user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(store))
}

async fn create_store(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<NewStore>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;
    let store = app_state.store_use_cases.create_store(user_id, body).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

async fn update_store(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<StoreUpdate>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;
    let store = app_state.store_use_cases.update_store(user_id, body).await?;
    Ok(Json(store))
}

#[derive(Serialize)]
struct ProductsResponse {
    products: Vec<Product>,
}

async fn list_products(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;
    let products = app_state.store_use_cases.list_products(user_id).await?;
    Ok(Json(ProductsResponse { products }))
}

async fn create_product(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<NewProduct>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;
    let product = app_state
        .store_use_cases
        .create_product(user_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(product_id): Path<Uuid>,
    Json(body): Json<ProductUpdate>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;
    let product = app_state
        .store_use_cases
        .update_product(user_id, product_id, body)
        .await?;
    Ok(Json(product))
}

async fn delete_product(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;
    app_state
        .store_use_cases
        .delete_product(user_id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

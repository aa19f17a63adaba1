//! IP asset route handlers
//!
//! The broader intellectual-property register (with commercialization and
//! registration tracking) kept alongside the IPR filing records.

use crate::auth::{auth_middleware, authorize, Claims, Role};
use crate::db::query::{parse_i32, ListQuery, PageQuery};
use crate::error::{ApiResult, AppError};
use crate::models::{DataResponse, ListResponse, SuccessResponse};
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use tracing::info;

const COLUMNS: &str = "id, name, type, owner, inventors, department, filing_year, filing_date, \
                       published_date, granted_date, expiry_date, status, application_number, \
                       registration_number, description, pdf_url, commercialized, faculty_id, \
                       created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct IpAsset {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub owner: Option<String>,
    pub inventors: Option<String>,
    pub department: Option<String>,
    pub filing_year: Option<i32>,
    pub filing_date: Option<NaiveDate>,
    pub published_date: Option<NaiveDate>,
    pub granted_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub application_number: Option<String>,
    pub registration_number: Option<String>,
    pub description: Option<String>,
    pub pdf_url: Option<String>,
    pub commercialized: Option<bool>,
    pub faculty_id: Option<i32>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IpAsset {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            asset_type: row.get("type"),
            owner: row.get("owner"),
            inventors: row.get("inventors"),
            department: row.get("department"),
            filing_year: row.get("filing_year"),
            filing_date: row.get("filing_date"),
            published_date: row.get("published_date"),
            granted_date: row.get("granted_date"),
            expiry_date: row.get("expiry_date"),
            status: row.get("status"),
            application_number: row.get("application_number"),
            registration_number: row.get("registration_number"),
            description: row.get("description"),
            pdf_url: row.get("pdf_url"),
            commercialized: row.get("commercialized"),
            faculty_id: row.get("faculty_id"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IpAssetFilter {
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub department: Option<String>,
    pub commercialized: Option<String>,
    pub year: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct IpAssetPayload {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub owner: Option<String>,
    pub inventors: Option<String>,
    pub department: Option<String>,
    pub filing_year: Option<i32>,
    pub filing_date: Option<NaiveDate>,
    pub published_date: Option<NaiveDate>,
    pub granted_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub application_number: Option<String>,
    pub registration_number: Option<String>,
    pub description: Option<String>,
    pub pdf_url: Option<String>,
    pub commercialized: Option<bool>,
    pub faculty_id: Option<i32>,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_ip_asset))
        .route("/{id}", put(update_ip_asset).delete(delete_ip_asset))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_ip_assets))
        .route("/{id}", get(get_ip_asset))
        .merge(protected)
}

/// GET /api/ip-assets
pub async fn list_ip_assets(
    State(state): State<SharedState>,
    Query(filter): Query<IpAssetFilter>,
) -> ApiResult<Json<ListResponse<IpAsset>>> {
    let page = filter.page.resolve();

    let commercialized = match filter.commercialized.as_deref() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    };

    let mut query = ListQuery::new(
        format!("SELECT {} FROM ip_assets", COLUMNS),
        "SELECT COUNT(*) FROM ip_assets",
    );
    query.eq_text("type", filter.asset_type.as_deref());
    query.eq_text("department", filter.department.as_deref());
    query.eq("commercialized", commercialized);
    query.eq("filing_year", parse_i32(filter.year.as_deref()));

    let built = query.build("ORDER BY filing_year DESC NULLS LAST, created_at DESC", Some(page));

    let client = state.pool.get().await?;
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    Ok(Json(ListResponse::new(
        rows.iter().map(IpAsset::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/ip-assets/{id}
pub async fn get_ip_asset(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<IpAsset>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!("SELECT {} FROM ip_assets WHERE id = $1", COLUMNS).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("IP asset not found".to_string()))?;

    Ok(Json(DataResponse::new(IpAsset::from_row(&row))))
}

/// POST /api/ip-assets (admin)
pub async fn create_ip_asset(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<IpAssetPayload>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<IpAsset>>)> {
    authorize(&claims, &[Role::Admin])?;
    let name = super::require_field(&payload.name, "Name")?;

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO ip_assets \
                 (name, type, owner, inventors, department, filing_year, filing_date, \
                  published_date, granted_date, expiry_date, status, application_number, \
                  registration_number, description, pdf_url, commercialized, faculty_id, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                  $17, $18) RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &name,
                &payload.asset_type,
                &payload.owner,
                &payload.inventors,
                &payload.department,
                &payload.filing_year,
                &payload.filing_date,
                &payload.published_date,
                &payload.granted_date,
                &payload.expiry_date,
                &payload.status,
                &payload.application_number,
                &payload.registration_number,
                &payload.description,
                &payload.pdf_url,
                &payload.commercialized.unwrap_or(false),
                &payload.faculty_id,
                &claims.sub,
            ],
        )
        .await?;

    info!("IP asset created by user {}", claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "IP asset created successfully",
            IpAsset::from_row(&row),
        )),
    ))
}

/// PUT /api/ip-assets/{id} (admin) — omitted fields retain stored values
pub async fn update_ip_asset(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<IpAssetPayload>,
) -> ApiResult<Json<SuccessResponse<IpAsset>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE ip_assets SET \
                 name = COALESCE($1, name), \
                 type = COALESCE($2, type), \
                 owner = COALESCE($3, owner), \
                 inventors = COALESCE($4, inventors), \
                 department = COALESCE($5, department), \
                 filing_year = COALESCE($6, filing_year), \
                 filing_date = COALESCE($7, filing_date), \
                 published_date = COALESCE($8, published_date), \
                 granted_date = COALESCE($9, granted_date), \
                 expiry_date = COALESCE($10, expiry_date), \
                 status = COALESCE($11, status), \
                 application_number = COALESCE($12, application_number), \
                 registration_number = COALESCE($13, registration_number), \
                 description = COALESCE($14, description), \
                 pdf_url = COALESCE($15, pdf_url), \
                 commercialized = COALESCE($16, commercialized), \
                 faculty_id = COALESCE($17, faculty_id), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $18 RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &payload.name,
                &payload.asset_type,
                &payload.owner,
                &payload.inventors,
                &payload.department,
                &payload.filing_year,
                &payload.filing_date,
                &payload.published_date,
                &payload.granted_date,
                &payload.expiry_date,
                &payload.status,
                &payload.application_number,
                &payload.registration_number,
                &payload.description,
                &payload.pdf_url,
                &payload.commercialized,
                &payload.faculty_id,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("IP asset not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "IP asset updated successfully",
        IpAsset::from_row(&row),
    )))
}

/// DELETE /api/ip-assets/{id} (admin)
pub async fn delete_ip_asset(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt("DELETE FROM ip_assets WHERE id = $1 RETURNING id", &[&id])
        .await?
        .ok_or_else(|| AppError::NotFound("IP asset not found".to_string()))?;

    Ok(Json(SuccessResponse::message_only(
        "IP asset deleted successfully",
    )))
}

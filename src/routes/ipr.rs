//! IPR route handlers
//!
//! Filed/granted intellectual-property records (patents, copyrights,
//! trademarks) tracked under one table.

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

const COLUMNS: &str = "id, title, ipr_type, application_number, status, filing_date, \
                       publication_date, grant_date, inventors, faculty_id, department, \
                       description, pdf_url, created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct Ipr {
    pub id: i32,
    pub title: String,
    pub ipr_type: Option<String>,
    pub application_number: Option<String>,
    pub status: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub publication_date: Option<NaiveDate>,
    pub grant_date: Option<NaiveDate>,
    pub inventors: Option<String>,
    pub faculty_id: Option<i32>,
    pub department: Option<String>,
    pub description: Option<String>,
    pub pdf_url: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ipr {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            ipr_type: row.get("ipr_type"),
            application_number: row.get("application_number"),
            status: row.get("status"),
            filing_date: row.get("filing_date"),
            publication_date: row.get("publication_date"),
            grant_date: row.get("grant_date"),
            inventors: row.get("inventors"),
            faculty_id: row.get("faculty_id"),
            department: row.get("department"),
            description: row.get("description"),
            pdf_url: row.get("pdf_url"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IprFilter {
    #[serde(rename = "type")]
    pub ipr_type: Option<String>,
    pub status: Option<String>,
    pub department: Option<String>,
    pub year: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct IprPayload {
    pub title: Option<String>,
    pub ipr_type: Option<String>,
    pub application_number: Option<String>,
    pub status: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub publication_date: Option<NaiveDate>,
    pub grant_date: Option<NaiveDate>,
    pub inventors: Option<String>,
    pub faculty_id: Option<i32>,
    pub department: Option<String>,
    pub description: Option<String>,
    pub pdf_url: Option<String>,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_ipr))
        .route("/{id}", put(update_ipr).delete(delete_ipr))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_ipr))
        .route("/{id}", get(get_ipr))
        .merge(protected)
}

/// GET /api/ipr
pub async fn list_ipr(
    State(state): State<SharedState>,
    Query(filter): Query<IprFilter>,
) -> ApiResult<Json<ListResponse<Ipr>>> {
    let page = filter.page.resolve();

    let mut query = ListQuery::new(
        format!("SELECT {} FROM ipr", COLUMNS),
        "SELECT COUNT(*) FROM ipr",
    );
    query.eq_text("ipr_type", filter.ipr_type.as_deref());
    query.eq_text("status", filter.status.as_deref());
    query.eq_text("department", filter.department.as_deref());
    query.in_year("filing_date", parse_i32(filter.year.as_deref()));

    let built = query.build("ORDER BY filing_date DESC NULLS LAST", Some(page));

    let client = state.pool.get().await?;
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    Ok(Json(ListResponse::new(
        rows.iter().map(Ipr::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/ipr/{id}
pub async fn get_ipr(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<Ipr>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!("SELECT {} FROM ipr WHERE id = $1", COLUMNS).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("IPR record not found".to_string()))?;

    Ok(Json(DataResponse::new(Ipr::from_row(&row))))
}

/// POST /api/ipr (admin)
pub async fn create_ipr(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<IprPayload>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Ipr>>)> {
    authorize(&claims, &[Role::Admin])?;
    let title = super::require_field(&payload.title, "Title")?;

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO ipr \
                 (title, ipr_type, application_number, status, filing_date, publication_date, \
                  grant_date, inventors, faculty_id, department, description, pdf_url, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &title,
                &payload.ipr_type,
                &payload.application_number,
                &payload.status,
                &payload.filing_date,
                &payload.publication_date,
                &payload.grant_date,
                &payload.inventors,
                &payload.faculty_id,
                &payload.department,
                &payload.description,
                &payload.pdf_url,
                &claims.sub,
            ],
        )
        .await?;

    info!("IPR record created by user {}", claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "IPR record created successfully",
            Ipr::from_row(&row),
        )),
    ))
}

/// PUT /api/ipr/{id} (admin) — omitted fields retain stored values
pub async fn update_ipr(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<IprPayload>,
) -> ApiResult<Json<SuccessResponse<Ipr>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE ipr SET \
                 title = COALESCE($1, title), \
                 ipr_type = COALESCE($2, ipr_type), \
                 application_number = COALESCE($3, application_number), \
                 status = COALESCE($4, status), \
                 filing_date = COALESCE($5, filing_date), \
                 publication_date = COALESCE($6, publication_date), \
                 grant_date = COALESCE($7, grant_date), \
                 inventors = COALESCE($8, inventors), \
                 faculty_id = COALESCE($9, faculty_id), \
                 department = COALESCE($10, department), \
                 description = COALESCE($11, description), \
                 pdf_url = COALESCE($12, pdf_url), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $13 RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &payload.title,
                &payload.ipr_type,
                &payload.application_number,
                &payload.status,
                &payload.filing_date,
                &payload.publication_date,
                &payload.grant_date,
                &payload.inventors,
                &payload.faculty_id,
                &payload.department,
                &payload.description,
                &payload.pdf_url,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("IPR record not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "IPR record updated successfully",
        Ipr::from_row(&row),
    )))
}

/// DELETE /api/ipr/{id} (admin)
pub async fn delete_ipr(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt("DELETE FROM ipr WHERE id = $1 RETURNING id", &[&id])
        .await?
        .ok_or_else(|| AppError::NotFound("IPR record not found".to_string()))?;

    Ok(Json(SuccessResponse::message_only(
        "IPR record deleted successfully",
    )))
}

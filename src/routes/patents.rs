//! Patent route handlers

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

const COLUMNS: &str = "p.id, p.title, p.patent_number, p.inventors, p.department, p.status, \
                       p.filing_date, p.grant_date, p.description, p.faculty_id, p.created_by, \
                       p.created_at, p.updated_at";

const RETURNING: &str = "id, title, patent_number, inventors, department, status, filing_date, \
                         grant_date, description, faculty_id, created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct Patent {
    pub id: i32,
    pub title: String,
    pub patent_number: Option<String>,
    pub inventors: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub grant_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub faculty_id: Option<i32>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty_name: Option<String>,
}

impl Patent {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            patent_number: row.get("patent_number"),
            inventors: row.get("inventors"),
            department: row.get("department"),
            status: row.get("status"),
            filing_date: row.get("filing_date"),
            grant_date: row.get("grant_date"),
            description: row.get("description"),
            faculty_id: row.get("faculty_id"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            faculty_name: row.try_get("faculty_name").unwrap_or(None),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PatentFilter {
    pub status: Option<String>,
    pub year: Option<String>,
    pub department: Option<String>,
    pub search: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct PatentPayload {
    pub title: Option<String>,
    pub patent_number: Option<String>,
    pub inventors: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub grant_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub faculty_id: Option<i32>,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_patent))
        .route("/{id}", put(update_patent).delete(delete_patent))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_patents))
        .route("/{id}", get(get_patent))
        .merge(protected)
}

/// GET /api/patents
pub async fn list_patents(
    State(state): State<SharedState>,
    Query(filter): Query<PatentFilter>,
) -> ApiResult<Json<ListResponse<Patent>>> {
    let page = filter.page.resolve();

    let mut query = ListQuery::new(
        format!(
            "SELECT {}, f.name AS faculty_name \
             FROM patents p LEFT JOIN faculty f ON p.faculty_id = f.id",
            COLUMNS
        ),
        "SELECT COUNT(*) FROM patents p LEFT JOIN faculty f ON p.faculty_id = f.id",
    );
    query.eq_text("p.status", filter.status.as_deref());
    query.in_year("p.filing_date", parse_i32(filter.year.as_deref()));
    query.eq_text("p.department", filter.department.as_deref());
    query.contains("p.title", filter.search.as_deref());

    let built = query.build("ORDER BY p.filing_date DESC NULLS LAST", Some(page));

    let client = state.pool.get().await?;
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    Ok(Json(ListResponse::new(
        rows.iter().map(Patent::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/patents/{id}
pub async fn get_patent(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<Patent>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!(
                "SELECT {}, f.name AS faculty_name \
                 FROM patents p LEFT JOIN faculty f ON p.faculty_id = f.id \
                 WHERE p.id = $1",
                COLUMNS
            ).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Patent not found".to_string()))?;

    Ok(Json(DataResponse::new(Patent::from_row(&row))))
}

/// POST /api/patents (admin)
pub async fn create_patent(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatentPayload>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Patent>>)> {
    authorize(&claims, &[Role::Admin])?;
    let title = super::require_field(&payload.title, "Title")?;

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO patents \
                 (title, patent_number, inventors, department, status, filing_date, grant_date, \
                  description, faculty_id, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
                RETURNING
            ).as_str(),
            &[
                &title,
                &payload.patent_number,
                &payload.inventors,
                &payload.department,
                &payload.status,
                &payload.filing_date,
                &payload.grant_date,
                &payload.description,
                &payload.faculty_id,
                &claims.sub,
            ],
        )
        .await?;

    info!("Patent created by user {}", claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Patent created successfully",
            Patent::from_row(&row),
        )),
    ))
}

/// PUT /api/patents/{id} (admin) — omitted fields retain stored values
pub async fn update_patent(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PatentPayload>,
) -> ApiResult<Json<SuccessResponse<Patent>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE patents SET \
                 title = COALESCE($1, title), \
                 patent_number = COALESCE($2, patent_number), \
                 inventors = COALESCE($3, inventors), \
                 department = COALESCE($4, department), \
                 status = COALESCE($5, status), \
                 filing_date = COALESCE($6, filing_date), \
                 grant_date = COALESCE($7, grant_date), \
                 description = COALESCE($8, description), \
                 faculty_id = COALESCE($9, faculty_id), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $10 RETURNING {}",
                RETURNING
            ).as_str(),
            &[
                &payload.title,
                &payload.patent_number,
                &payload.inventors,
                &payload.department,
                &payload.status,
                &payload.filing_date,
                &payload.grant_date,
                &payload.description,
                &payload.faculty_id,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Patent not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Patent updated successfully",
        Patent::from_row(&row),
    )))
}

/// DELETE /api/patents/{id} (admin)
pub async fn delete_patent(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt("DELETE FROM patents WHERE id = $1 RETURNING id", &[&id])
        .await?
        .ok_or_else(|| AppError::NotFound("Patent not found".to_string()))?;

    Ok(Json(SuccessResponse::message_only(
        "Patent deleted successfully",
    )))
}

//! Award route handlers

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

const COLUMNS: &str = "id, title, faculty_id, award_type, awarded_by, year, date_received, \
                       description, certificate_url, created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct Award {
    pub id: i32,
    pub title: String,
    pub faculty_id: Option<i32>,
    pub award_type: Option<String>,
    pub awarded_by: Option<String>,
    pub year: Option<i32>,
    pub date_received: Option<NaiveDate>,
    pub description: Option<String>,
    pub certificate_url: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Award {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            faculty_id: row.get("faculty_id"),
            award_type: row.get("award_type"),
            awarded_by: row.get("awarded_by"),
            year: row.get("year"),
            date_received: row.get("date_received"),
            description: row.get("description"),
            certificate_url: row.get("certificate_url"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AwardFilter {
    pub faculty_id: Option<String>,
    pub year: Option<String>,
    pub award_type: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct AwardPayload {
    pub title: Option<String>,
    pub faculty_id: Option<i32>,
    pub award_type: Option<String>,
    pub awarded_by: Option<String>,
    pub year: Option<i32>,
    pub date_received: Option<NaiveDate>,
    pub description: Option<String>,
    pub certificate_url: Option<String>,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_award))
        .route("/{id}", put(update_award).delete(delete_award))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_awards))
        .route("/{id}", get(get_award))
        .merge(protected)
}

/// GET /api/awards
pub async fn list_awards(
    State(state): State<SharedState>,
    Query(filter): Query<AwardFilter>,
) -> ApiResult<Json<ListResponse<Award>>> {
    let page = filter.page.resolve();

    let mut query = ListQuery::new(
        format!("SELECT {} FROM awards", COLUMNS),
        "SELECT COUNT(*) FROM awards",
    );
    query.eq("faculty_id", parse_i32(filter.faculty_id.as_deref()));
    query.eq("year", parse_i32(filter.year.as_deref()));
    query.contains("award_type", filter.award_type.as_deref());

    let built = query.build("ORDER BY year DESC NULLS LAST, created_at DESC", Some(page));

    let client = state.pool.get().await?;
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    Ok(Json(ListResponse::new(
        rows.iter().map(Award::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/awards/{id}
pub async fn get_award(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<Award>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!("SELECT {} FROM awards WHERE id = $1", COLUMNS).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Award not found".to_string()))?;

    Ok(Json(DataResponse::new(Award::from_row(&row))))
}

/// POST /api/awards (admin, faculty)
pub async fn create_award(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AwardPayload>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Award>>)> {
    authorize(&claims, &[Role::Admin, Role::Faculty])?;
    let title = super::require_field(&payload.title, "Title")?;

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO awards \
                 (title, faculty_id, award_type, awarded_by, year, date_received, description, \
                  certificate_url, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &title,
                &payload.faculty_id,
                &payload.award_type,
                &payload.awarded_by,
                &payload.year,
                &payload.date_received,
                &payload.description,
                &payload.certificate_url,
                &claims.sub,
            ],
        )
        .await?;

    info!("Award created by user {}", claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Award created successfully",
            Award::from_row(&row),
        )),
    ))
}

/// PUT /api/awards/{id} (admin, faculty) — omitted fields retain stored values
pub async fn update_award(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<AwardPayload>,
) -> ApiResult<Json<SuccessResponse<Award>>> {
    authorize(&claims, &[Role::Admin, Role::Faculty])?;

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE awards SET \
                 title = COALESCE($1, title), \
                 faculty_id = COALESCE($2, faculty_id), \
                 award_type = COALESCE($3, award_type), \
                 awarded_by = COALESCE($4, awarded_by), \
                 year = COALESCE($5, year), \
                 date_received = COALESCE($6, date_received), \
                 description = COALESCE($7, description), \
                 certificate_url = COALESCE($8, certificate_url), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $9 RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &payload.title,
                &payload.faculty_id,
                &payload.award_type,
                &payload.awarded_by,
                &payload.year,
                &payload.date_received,
                &payload.description,
                &payload.certificate_url,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Award not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Award updated successfully",
        Award::from_row(&row),
    )))
}

/// DELETE /api/awards/{id} (admin)
pub async fn delete_award(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt("DELETE FROM awards WHERE id = $1 RETURNING id", &[&id])
        .await?
        .ok_or_else(|| AppError::NotFound("Award not found".to_string()))?;

    Ok(Json(SuccessResponse::message_only(
        "Award deleted successfully",
    )))
}

//! Consultancy route handlers
//!
//! Industry engagements. Status here is a stored string supplied by the
//! client, unlike research projects where it is derived from dates.

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

const COLUMNS: &str = "id, title, faculty_id, client_name, department, amount_earned, \
                       start_date, end_date, status, description, created_by, created_at, \
                       updated_at";

#[derive(Debug, Serialize)]
pub struct Consultancy {
    pub id: i32,
    pub title: String,
    pub faculty_id: Option<i32>,
    pub client_name: Option<String>,
    pub department: Option<String>,
    pub amount_earned: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Consultancy {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            faculty_id: row.get("faculty_id"),
            client_name: row.get("client_name"),
            department: row.get("department"),
            amount_earned: row.get("amount_earned"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            status: row.get("status"),
            description: row.get("description"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConsultancyFilter {
    pub department: Option<String>,
    pub status: Option<String>,
    pub faculty_id: Option<String>,
    pub year: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct ConsultancyPayload {
    pub title: Option<String>,
    pub faculty_id: Option<i32>,
    pub client_name: Option<String>,
    pub department: Option<String>,
    pub amount_earned: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub description: Option<String>,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_consultancy))
        .route("/{id}", put(update_consultancy).delete(delete_consultancy))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_consultancy))
        .route("/{id}", get(get_consultancy))
        .merge(protected)
}

/// GET /api/consultancy
pub async fn list_consultancy(
    State(state): State<SharedState>,
    Query(filter): Query<ConsultancyFilter>,
) -> ApiResult<Json<ListResponse<Consultancy>>> {
    let page = filter.page.resolve();

    let mut query = ListQuery::new(
        format!("SELECT {} FROM consultancy", COLUMNS),
        "SELECT COUNT(*) FROM consultancy",
    );
    query.eq_text("department", filter.department.as_deref());
    query.eq_text("status", filter.status.as_deref());
    query.eq("faculty_id", parse_i32(filter.faculty_id.as_deref()));
    query.in_year("start_date", parse_i32(filter.year.as_deref()));

    let built = query.build("ORDER BY start_date DESC NULLS LAST", Some(page));

    let client = state.pool.get().await?;
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    Ok(Json(ListResponse::new(
        rows.iter().map(Consultancy::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/consultancy/{id}
pub async fn get_consultancy(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<Consultancy>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!("SELECT {} FROM consultancy WHERE id = $1", COLUMNS).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Consultancy record not found".to_string()))?;

    Ok(Json(DataResponse::new(Consultancy::from_row(&row))))
}

/// POST /api/consultancy (admin, faculty)
pub async fn create_consultancy(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ConsultancyPayload>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Consultancy>>)> {
    authorize(&claims, &[Role::Admin, Role::Faculty])?;
    let title = super::require_field(&payload.title, "Title")?;

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO consultancy \
                 (title, faculty_id, client_name, department, amount_earned, start_date, \
                  end_date, status, description, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &title,
                &payload.faculty_id,
                &payload.client_name,
                &payload.department,
                &payload.amount_earned,
                &payload.start_date,
                &payload.end_date,
                &payload.status,
                &payload.description,
                &claims.sub,
            ],
        )
        .await?;

    info!("Consultancy record created by user {}", claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Consultancy record created successfully",
            Consultancy::from_row(&row),
        )),
    ))
}

/// PUT /api/consultancy/{id} (admin, faculty) — omitted fields retain stored values
pub async fn update_consultancy(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<ConsultancyPayload>,
) -> ApiResult<Json<SuccessResponse<Consultancy>>> {
    authorize(&claims, &[Role::Admin, Role::Faculty])?;

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE consultancy SET \
                 title = COALESCE($1, title), \
                 faculty_id = COALESCE($2, faculty_id), \
                 client_name = COALESCE($3, client_name), \
                 department = COALESCE($4, department), \
                 amount_earned = COALESCE($5, amount_earned), \
                 start_date = COALESCE($6, start_date), \
                 end_date = COALESCE($7, end_date), \
                 status = COALESCE($8, status), \
                 description = COALESCE($9, description), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $10 RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &payload.title,
                &payload.faculty_id,
                &payload.client_name,
                &payload.department,
                &payload.amount_earned,
                &payload.start_date,
                &payload.end_date,
                &payload.status,
                &payload.description,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Consultancy record not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Consultancy record updated successfully",
        Consultancy::from_row(&row),
    )))
}

/// DELETE /api/consultancy/{id} (admin)
pub async fn delete_consultancy(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt("DELETE FROM consultancy WHERE id = $1 RETURNING id", &[&id])
        .await?
        .ok_or_else(|| AppError::NotFound("Consultancy record not found".to_string()))?;

    Ok(Json(SuccessResponse::message_only(
        "Consultancy record deleted successfully",
    )))
}

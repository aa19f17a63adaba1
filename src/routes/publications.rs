//! Publication route handlers

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
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use tracing::info;

const COLUMNS: &str = "p.id, p.title, p.journal_name, p.publication_type, p.year, p.indexing, \
                       p.national_international, p.department, p.faculty_id, p.pdf_url, \
                       p.created_by, p.created_at, p.updated_at";

const RETURNING: &str = "id, title, journal_name, publication_type, year, indexing, \
                         national_international, department, faculty_id, pdf_url, \
                         created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct Publication {
    pub id: i32,
    pub title: String,
    pub journal_name: Option<String>,
    pub publication_type: Option<String>,
    pub year: Option<i32>,
    pub indexing: Option<String>,
    pub national_international: Option<String>,
    pub department: Option<String>,
    pub faculty_id: Option<i32>,
    pub pdf_url: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present on reads that join the owning faculty row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty_name: Option<String>,
}

impl Publication {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            journal_name: row.get("journal_name"),
            publication_type: row.get("publication_type"),
            year: row.get("year"),
            indexing: row.get("indexing"),
            national_international: row.get("national_international"),
            department: row.get("department"),
            faculty_id: row.get("faculty_id"),
            pdf_url: row.get("pdf_url"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            faculty_name: row.try_get("faculty_name").unwrap_or(None),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PublicationFilter {
    pub year: Option<String>,
    pub publication_type: Option<String>,
    pub department: Option<String>,
    pub indexing: Option<String>,
    pub search: Option<String>,
    pub faculty_id: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct CreatePublication {
    pub title: Option<String>,
    pub journal_name: Option<String>,
    pub publication_type: Option<String>,
    pub year: Option<i32>,
    pub indexing: Option<String>,
    pub national_international: Option<String>,
    pub department: Option<String>,
    pub faculty_id: Option<i32>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePublication {
    pub title: Option<String>,
    pub journal_name: Option<String>,
    pub publication_type: Option<String>,
    pub year: Option<i32>,
    pub indexing: Option<String>,
    pub national_international: Option<String>,
    pub department: Option<String>,
    pub faculty_id: Option<i32>,
    pub pdf_url: Option<String>,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_publication))
        .route("/{id}", put(update_publication).delete(delete_publication))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_publications))
        .route("/{id}", get(get_publication))
        .merge(protected)
}

/// GET /api/publications
pub async fn list_publications(
    State(state): State<SharedState>,
    Query(filter): Query<PublicationFilter>,
) -> ApiResult<Json<ListResponse<Publication>>> {
    let page = filter.page.resolve();

    let mut query = ListQuery::new(
        format!(
            "SELECT {}, f.name AS faculty_name \
             FROM publications p LEFT JOIN faculty f ON p.faculty_id = f.id",
            COLUMNS
        ),
        "SELECT COUNT(*) FROM publications p LEFT JOIN faculty f ON p.faculty_id = f.id",
    );
    query.eq("p.year", parse_i32(filter.year.as_deref()));
    query.eq_text("p.publication_type", filter.publication_type.as_deref());
    query.eq_text("f.department", filter.department.as_deref());
    query.eq_text("p.indexing", filter.indexing.as_deref());
    query.contains("p.title", filter.search.as_deref());
    query.eq("p.faculty_id", parse_i32(filter.faculty_id.as_deref()));

    let built = query.build("ORDER BY p.year DESC, p.created_at DESC", Some(page));

    let client = state.pool.get().await?;
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    Ok(Json(ListResponse::new(
        rows.iter().map(Publication::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/publications/{id}
pub async fn get_publication(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<Publication>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!(
                "SELECT {}, f.name AS faculty_name \
                 FROM publications p LEFT JOIN faculty f ON p.faculty_id = f.id \
                 WHERE p.id = $1",
                COLUMNS
            ).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Publication not found".to_string()))?;

    Ok(Json(DataResponse::new(Publication::from_row(&row))))
}

/// POST /api/publications (admin)
pub async fn create_publication(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePublication>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Publication>>)> {
    authorize(&claims, &[Role::Admin])?;
    let title = super::require_field(&payload.title, "Title")?;

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO publications \
                 (title, journal_name, publication_type, year, indexing, national_international, \
                  department, faculty_id, pdf_url, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
                RETURNING
            ).as_str(),
            &[
                &title,
                &payload.journal_name,
                &payload.publication_type,
                &payload.year,
                &payload.indexing,
                &payload.national_international,
                &payload.department,
                &payload.faculty_id,
                &payload.pdf_url,
                &claims.sub,
            ],
        )
        .await?;

    info!("Publication created by user {}", claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Publication created successfully",
            Publication::from_row(&row),
        )),
    ))
}

/// PUT /api/publications/{id} (admin) — omitted fields retain stored values
pub async fn update_publication(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePublication>,
) -> ApiResult<Json<SuccessResponse<Publication>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE publications SET \
                 title = COALESCE($1, title), \
                 journal_name = COALESCE($2, journal_name), \
                 publication_type = COALESCE($3, publication_type), \
                 year = COALESCE($4, year), \
                 indexing = COALESCE($5, indexing), \
                 national_international = COALESCE($6, national_international), \
                 department = COALESCE($7, department), \
                 faculty_id = COALESCE($8, faculty_id), \
                 pdf_url = COALESCE($9, pdf_url), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $10 RETURNING {}",
                RETURNING
            ).as_str(),
            &[
                &payload.title,
                &payload.journal_name,
                &payload.publication_type,
                &payload.year,
                &payload.indexing,
                &payload.national_international,
                &payload.department,
                &payload.faculty_id,
                &payload.pdf_url,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Publication not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Publication updated successfully",
        Publication::from_row(&row),
    )))
}

/// DELETE /api/publications/{id} (admin)
pub async fn delete_publication(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt("DELETE FROM publications WHERE id = $1 RETURNING id", &[&id])
        .await?
        .ok_or_else(|| AppError::NotFound("Publication not found".to_string()))?;

    info!("Publication {} deleted by user {}", id, claims.sub);

    Ok(Json(SuccessResponse::message_only(
        "Publication deleted successfully",
    )))
}

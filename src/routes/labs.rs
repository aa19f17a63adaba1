//! Research lab route handlers
//!
//! Lab profiles with an image upload; focus areas are stored as a text
//! array and submitted as a comma-separated form field.

use crate::auth::{auth_middleware, authorize, Claims, Role};
use crate::db::query::{ListQuery, PageQuery};
use crate::error::{ApiResult, AppError};
use crate::models::{DataResponse, ListResponse, SuccessResponse};
use crate::state::SharedState;
use crate::upload::{store_file, MultipartForm, UploadKind};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use tracing::info;

const COLUMNS: &str = "id, name, department, head, description, focus_areas, established_year, \
                       image_url, created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct Lab {
    pub id: i32,
    pub name: String,
    pub department: Option<String>,
    pub head: Option<String>,
    pub description: Option<String>,
    pub focus_areas: Option<Vec<String>>,
    pub established_year: Option<i32>,
    pub image_url: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lab {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            department: row.get("department"),
            head: row.get("head"),
            description: row.get("description"),
            focus_areas: row.get("focus_areas"),
            established_year: row.get("established_year"),
            image_url: row.get("image_url"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LabFilter {
    pub department: Option<String>,
    pub research_area: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_lab))
        .route("/{id}", put(update_lab).delete(delete_lab))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        .layer(DefaultBodyLimit::max(8 * 1024 * 1024));

    Router::new()
        .route("/", get(list_labs))
        .route("/{id}", get(get_lab))
        .merge(protected)
}

/// GET /api/labs
pub async fn list_labs(
    State(state): State<SharedState>,
    Query(filter): Query<LabFilter>,
) -> ApiResult<Json<ListResponse<Lab>>> {
    let page = filter.page.resolve();

    let mut query = ListQuery::new(
        format!("SELECT {} FROM research_labs", COLUMNS),
        "SELECT COUNT(*) FROM research_labs",
    );
    query.eq_text("department", filter.department.as_deref());
    query.has_element("focus_areas", filter.research_area.as_deref());

    let built = query.build("ORDER BY created_at DESC", Some(page));

    let client = state.pool.get().await?;
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    Ok(Json(ListResponse::new(
        rows.iter().map(Lab::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/labs/{id}
pub async fn get_lab(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<Lab>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!("SELECT {} FROM research_labs WHERE id = $1", COLUMNS).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Lab not found".to_string()))?;

    Ok(Json(DataResponse::new(Lab::from_row(&row))))
}

/// POST /api/labs (admin) — multipart form with optional lab image
pub async fn create_lab(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Lab>>)> {
    authorize(&claims, &[Role::Admin])?;

    let form = MultipartForm::read(multipart, "image").await?;
    let name = form.required("name")?;

    let image_url = match &form.file {
        Some(file) => Some(store_file(&state.uploads, UploadKind::Image, None, "lab-", file).await?),
        None => form.text("image_url"),
    };

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO research_labs \
                 (name, department, head, description, focus_areas, established_year, image_url, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &name,
                &form.text("department"),
                &form.text("head"),
                &form.text("description"),
                &form.list("focus_areas"),
                &form.int("established_year"),
                &image_url,
                &claims.sub,
            ],
        )
        .await?;

    info!("Lab '{}' created by user {}", name, claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Lab created successfully",
            Lab::from_row(&row),
        )),
    ))
}

/// PUT /api/labs/{id} (admin) — omitted fields retain stored values
pub async fn update_lab(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> ApiResult<Json<SuccessResponse<Lab>>> {
    authorize(&claims, &[Role::Admin])?;

    let form = MultipartForm::read(multipart, "image").await?;

    let image_url = match &form.file {
        Some(file) => Some(store_file(&state.uploads, UploadKind::Image, None, "lab-", file).await?),
        None => form.text("image_url"),
    };

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE research_labs SET \
                 name = COALESCE($1, name), \
                 department = COALESCE($2, department), \
                 head = COALESCE($3, head), \
                 description = COALESCE($4, description), \
                 focus_areas = COALESCE($5, focus_areas), \
                 established_year = COALESCE($6, established_year), \
                 image_url = COALESCE($7, image_url), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $8 RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &form.text("name"),
                &form.text("department"),
                &form.text("head"),
                &form.text("description"),
                &form.list("focus_areas"),
                &form.int("established_year"),
                &image_url,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Lab not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Lab updated successfully",
        Lab::from_row(&row),
    )))
}

/// DELETE /api/labs/{id} (admin)
pub async fn delete_lab(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt("DELETE FROM research_labs WHERE id = $1 RETURNING id", &[&id])
        .await?
        .ok_or_else(|| AppError::NotFound("Lab not found".to_string()))?;

    info!("Lab {} deleted by user {}", id, claims.sub);

    Ok(Json(SuccessResponse::message_only("Lab deleted successfully")))
}

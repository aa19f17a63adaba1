//! Teaching material route handlers
//!
//! One table, two route surfaces: `/api/materials` is the public-read
//! surface with multipart document upload, `/api/teaching-materials` is the
//! token-gated JSON CRUD surface. Deletion is ownership-gated on both: a
//! faculty member may only remove materials they created.

use crate::auth::{auth_middleware, authorize, authorize_owned, Claims, Role};
use crate::db::query::{parse_i32, ListQuery, PageQuery};
use crate::error::{ApiResult, AppError};
use crate::models::{DataResponse, ListResponse, SuccessResponse};
use crate::state::SharedState;
use crate::upload::{store_file, MultipartForm, UploadKind};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use tracing::info;

const COLUMNS: &str = "id, title, description, material_type, file_url, video_link, faculty_id, \
                       course_name, department, created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct Material {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub material_type: Option<String>,
    pub file_url: Option<String>,
    pub video_link: Option<String>,
    pub faculty_id: Option<i32>,
    pub course_name: Option<String>,
    pub department: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            material_type: row.get("material_type"),
            file_url: row.get("file_url"),
            video_link: row.get("video_link"),
            faculty_id: row.get("faculty_id"),
            course_name: row.get("course_name"),
            department: row.get("department"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MaterialFilter {
    pub faculty_id: Option<String>,
    pub department: Option<String>,
    pub course_name: Option<String>,
    pub material_type: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct MaterialPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub material_type: Option<String>,
    pub file_url: Option<String>,
    pub video_link: Option<String>,
    pub faculty_id: Option<i32>,
    pub course_name: Option<String>,
    pub department: Option<String>,
}

/// Router for `/api/materials`: public reads, multipart uploads
pub fn materials_router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(upload_material))
        .route("/{id}", delete(delete_material))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        // document (50 MB) plus form fields
        .layer(DefaultBodyLimit::max(52 * 1024 * 1024));

    Router::new()
        .route("/", get(list_materials))
        .route("/{id}", get(get_material))
        .merge(protected)
}

/// Router for `/api/teaching-materials`: token-gated JSON CRUD
pub fn teaching_materials_router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list_materials).post(create_material))
        .route(
            "/{id}",
            get(get_material)
                .put(update_material)
                .delete(delete_material),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// GET /api/materials, GET /api/teaching-materials
pub async fn list_materials(
    State(state): State<SharedState>,
    Query(filter): Query<MaterialFilter>,
) -> ApiResult<Json<ListResponse<Material>>> {
    let page = filter.page.resolve();

    let mut query = ListQuery::new(
        format!("SELECT {} FROM teaching_materials", COLUMNS),
        "SELECT COUNT(*) FROM teaching_materials",
    );
    query.eq("faculty_id", parse_i32(filter.faculty_id.as_deref()));
    query.eq_text("department", filter.department.as_deref());
    query.contains("course_name", filter.course_name.as_deref());
    query.eq_text("material_type", filter.material_type.as_deref());

    let built = query.build("ORDER BY created_at DESC", Some(page));

    let client = state.pool.get().await?;
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    Ok(Json(ListResponse::new(
        rows.iter().map(Material::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/materials/{id}, GET /api/teaching-materials/{id}
pub async fn get_material(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<Material>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!("SELECT {} FROM teaching_materials WHERE id = $1", COLUMNS).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Teaching material not found".to_string()))?;

    Ok(Json(DataResponse::new(Material::from_row(&row))))
}

/// POST /api/materials (admin, faculty) — multipart form with document upload
pub async fn upload_material(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Material>>)> {
    authorize(&claims, &[Role::Admin, Role::Faculty])?;

    let form = MultipartForm::read(multipart, "file").await?;
    let title = form.required("title")?;

    let file_url = match &form.file {
        Some(file) => {
            Some(store_file(&state.uploads, UploadKind::Document, Some("materials"), "", file).await?)
        }
        None => form.text("file_url"),
    };

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO teaching_materials \
                 (title, faculty_id, department, course_name, material_type, file_url, video_link, \
                  description, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &title,
                &form.int("faculty_id"),
                &form.text("department"),
                &form.text("course_name"),
                &form.text("material_type"),
                &file_url,
                &form.text("video_link"),
                &form.text("description"),
                &claims.sub,
            ],
        )
        .await?;

    info!("Teaching material '{}' uploaded by user {}", title, claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Teaching material created successfully",
            Material::from_row(&row),
        )),
    ))
}

/// POST /api/teaching-materials (admin, faculty) — JSON body
pub async fn create_material(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<MaterialPayload>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Material>>)> {
    authorize(&claims, &[Role::Admin, Role::Faculty])?;
    let title = super::require_field(&payload.title, "Title")?;

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO teaching_materials \
                 (title, description, material_type, file_url, video_link, faculty_id, course_name, \
                  department, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &title,
                &payload.description,
                &payload.material_type,
                &payload.file_url,
                &payload.video_link,
                &payload.faculty_id,
                &payload.course_name,
                &payload.department,
                &claims.sub,
            ],
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Teaching material created successfully",
            Material::from_row(&row),
        )),
    ))
}

/// PUT /api/teaching-materials/{id} (admin, faculty) — omitted fields retain stored values
pub async fn update_material(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<MaterialPayload>,
) -> ApiResult<Json<SuccessResponse<Material>>> {
    authorize(&claims, &[Role::Admin, Role::Faculty])?;

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE teaching_materials SET \
                 title = COALESCE($1, title), \
                 description = COALESCE($2, description), \
                 material_type = COALESCE($3, material_type), \
                 file_url = COALESCE($4, file_url), \
                 video_link = COALESCE($5, video_link), \
                 faculty_id = COALESCE($6, faculty_id), \
                 course_name = COALESCE($7, course_name), \
                 department = COALESCE($8, department), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $9 RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &payload.title,
                &payload.description,
                &payload.material_type,
                &payload.file_url,
                &payload.video_link,
                &payload.faculty_id,
                &payload.course_name,
                &payload.department,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Teaching material not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Teaching material updated successfully",
        Material::from_row(&row),
    )))
}

/// DELETE /api/materials/{id}, DELETE /api/teaching-materials/{id}
///
/// Admin or faculty; a faculty member may only delete materials they created.
pub async fn delete_material(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            "SELECT created_by FROM teaching_materials WHERE id = $1",
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Teaching material not found".to_string()))?;
    let created_by: Option<i32> = row.get("created_by");

    authorize_owned(&claims, &[Role::Admin, Role::Faculty], |c| {
        created_by == Some(c.sub)
    })?;

    client
        .execute("DELETE FROM teaching_materials WHERE id = $1", &[&id])
        .await?;

    info!("Teaching material {} deleted by user {}", id, claims.sub);

    Ok(Json(SuccessResponse::message_only(
        "Teaching material deleted successfully",
    )))
}

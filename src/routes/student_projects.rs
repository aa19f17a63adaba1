//! Student project route handlers

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

const COLUMNS: &str = "id, title, faculty_id, student_names, department, project_type, \
                       academic_year, abstract, pdf_url, created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct StudentProject {
    pub id: i32,
    pub title: String,
    pub faculty_id: Option<i32>,
    pub student_names: Option<String>,
    pub department: Option<String>,
    pub project_type: Option<String>,
    pub academic_year: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub pdf_url: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentProject {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            faculty_id: row.get("faculty_id"),
            student_names: row.get("student_names"),
            department: row.get("department"),
            project_type: row.get("project_type"),
            academic_year: row.get("academic_year"),
            abstract_text: row.get("abstract"),
            pdf_url: row.get("pdf_url"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentProjectFilter {
    pub faculty_id: Option<String>,
    pub department: Option<String>,
    pub project_type: Option<String>,
    pub academic_year: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct StudentProjectPayload {
    pub title: Option<String>,
    pub faculty_id: Option<i32>,
    pub student_names: Option<String>,
    pub department: Option<String>,
    pub project_type: Option<String>,
    pub academic_year: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub pdf_url: Option<String>,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_student_project))
        .route(
            "/{id}",
            put(update_student_project).delete(delete_student_project),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_student_projects))
        .route("/{id}", get(get_student_project))
        .merge(protected)
}

/// GET /api/student-projects
pub async fn list_student_projects(
    State(state): State<SharedState>,
    Query(filter): Query<StudentProjectFilter>,
) -> ApiResult<Json<ListResponse<StudentProject>>> {
    let page = filter.page.resolve();

    let mut query = ListQuery::new(
        format!("SELECT {} FROM student_projects", COLUMNS),
        "SELECT COUNT(*) FROM student_projects",
    );
    query.eq("faculty_id", parse_i32(filter.faculty_id.as_deref()));
    query.eq_text("department", filter.department.as_deref());
    query.eq_text("project_type", filter.project_type.as_deref());
    query.eq_text("academic_year", filter.academic_year.as_deref());

    let built = query.build("ORDER BY created_at DESC", Some(page));

    let client = state.pool.get().await?;
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    Ok(Json(ListResponse::new(
        rows.iter().map(StudentProject::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/student-projects/{id}
pub async fn get_student_project(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<StudentProject>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!("SELECT {} FROM student_projects WHERE id = $1", COLUMNS).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Student project not found".to_string()))?;

    Ok(Json(DataResponse::new(StudentProject::from_row(&row))))
}

/// POST /api/student-projects (admin, faculty)
pub async fn create_student_project(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StudentProjectPayload>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<StudentProject>>)> {
    authorize(&claims, &[Role::Admin, Role::Faculty])?;
    let title = super::require_field(&payload.title, "Title")?;

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO student_projects \
                 (title, faculty_id, student_names, department, project_type, academic_year, \
                  abstract, pdf_url, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &title,
                &payload.faculty_id,
                &payload.student_names,
                &payload.department,
                &payload.project_type,
                &payload.academic_year,
                &payload.abstract_text,
                &payload.pdf_url,
                &claims.sub,
            ],
        )
        .await?;

    info!("Student project created by user {}", claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Student project created successfully",
            StudentProject::from_row(&row),
        )),
    ))
}

/// PUT /api/student-projects/{id} (admin, faculty) — omitted fields retain stored values
pub async fn update_student_project(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<StudentProjectPayload>,
) -> ApiResult<Json<SuccessResponse<StudentProject>>> {
    authorize(&claims, &[Role::Admin, Role::Faculty])?;

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE student_projects SET \
                 title = COALESCE($1, title), \
                 faculty_id = COALESCE($2, faculty_id), \
                 student_names = COALESCE($3, student_names), \
                 department = COALESCE($4, department), \
                 project_type = COALESCE($5, project_type), \
                 academic_year = COALESCE($6, academic_year), \
                 abstract = COALESCE($7, abstract), \
                 pdf_url = COALESCE($8, pdf_url), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $9 RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &payload.title,
                &payload.faculty_id,
                &payload.student_names,
                &payload.department,
                &payload.project_type,
                &payload.academic_year,
                &payload.abstract_text,
                &payload.pdf_url,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Student project not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Student project updated successfully",
        StudentProject::from_row(&row),
    )))
}

/// DELETE /api/student-projects/{id} (admin)
pub async fn delete_student_project(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt(
            "DELETE FROM student_projects WHERE id = $1 RETURNING id",
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Student project not found".to_string()))?;

    Ok(Json(SuccessResponse::message_only(
        "Student project deleted successfully",
    )))
}

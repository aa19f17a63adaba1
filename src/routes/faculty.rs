//! Faculty route handlers
//!
//! Faculty profiles with photo upload, aggregate publication/patent counts
//! on lists, and a detail view that embeds the member's research output.

use crate::auth::{auth_middleware, authorize, Claims, Role};
use crate::db::query::{ListQuery, PageQuery};
use crate::error::{ApiResult, AppError};
use crate::models::{DataResponse, ListResponse, SuccessResponse};
use crate::routes::patents::Patent;
use crate::routes::projects::Project;
use crate::routes::publications::Publication;
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

const COLUMNS: &str = "f.id, f.name, f.designation, f.department, f.specialization, f.bio, \
                       f.email, f.profile_image, f.created_by, f.created_at, f.updated_at";

const RETURNING: &str = "id, name, designation, department, specialization, bio, email, \
                         profile_image, created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct Faculty {
    pub id: i32,
    pub name: String,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Faculty {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            designation: row.get("designation"),
            department: row.get("department"),
            specialization: row.get("specialization"),
            bio: row.get("bio"),
            email: row.get("email"),
            profile_image: row.get("profile_image"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// List row: profile plus aggregate research-output counts
#[derive(Debug, Serialize)]
pub struct FacultyListRow {
    #[serde(flatten)]
    pub faculty: Faculty,
    pub publications_count: i64,
    pub patents_count: i64,
}

/// Detail view embedding the member's research output
#[derive(Debug, Serialize)]
pub struct FacultyDetail {
    #[serde(flatten)]
    pub faculty: Faculty,
    pub publications: Vec<Publication>,
    pub patents: Vec<Patent>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FacultyFilter {
    pub department: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_faculty))
        .route("/{id}", put(update_faculty).delete(delete_faculty))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        // photo (5 MB) plus form fields
        .layer(DefaultBodyLimit::max(8 * 1024 * 1024));

    Router::new()
        .route("/", get(list_faculty))
        .route("/{id}", get(get_faculty))
        .merge(protected)
}

/// GET /api/faculty
pub async fn list_faculty(
    State(state): State<SharedState>,
    Query(filter): Query<FacultyFilter>,
) -> ApiResult<Json<ListResponse<FacultyListRow>>> {
    let page = filter.page.resolve();

    let mut query = ListQuery::new(
        format!(
            "SELECT {}, \
             COUNT(DISTINCT p.id) AS publications_count, \
             COUNT(DISTINCT pa.id) AS patents_count \
             FROM faculty f \
             LEFT JOIN publications p ON f.id = p.faculty_id \
             LEFT JOIN patents pa ON f.id = pa.faculty_id",
            COLUMNS
        ),
        "SELECT COUNT(*) FROM faculty f",
    );
    query.eq_text("f.department", filter.department.as_deref());
    query.contains("f.name", filter.search.as_deref());

    let order = if filter.sort.as_deref() == Some("publications") {
        "GROUP BY f.id ORDER BY publications_count DESC"
    } else {
        "GROUP BY f.id ORDER BY f.created_at DESC"
    };
    let built = query.build(order, Some(page));

    let client = state.pool.get().await?;
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    let data = rows
        .iter()
        .map(|row| FacultyListRow {
            faculty: Faculty::from_row(row),
            publications_count: row.get("publications_count"),
            patents_count: row.get("patents_count"),
        })
        .collect();

    Ok(Json(ListResponse::new(data, page.meta(total))))
}

/// GET /api/faculty/{id}
///
/// Embeds publications, patents, and funded projects. Projects are matched
/// by principal-investigator name, an artifact of the portal's data model.
pub async fn get_faculty(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<FacultyDetail>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!("SELECT {} FROM faculty f WHERE f.id = $1", COLUMNS).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Faculty not found".to_string()))?;
    let faculty = Faculty::from_row(&row);

    let publications = client
        .query(
            "SELECT p.id, p.title, p.journal_name, p.publication_type, p.year, p.indexing, \
             p.national_international, p.department, p.faculty_id, p.pdf_url, p.created_by, \
             p.created_at, p.updated_at \
             FROM publications p WHERE p.faculty_id = $1 ORDER BY p.year DESC",
            &[&id],
        )
        .await?
        .iter()
        .map(Publication::from_row)
        .collect();

    let patents = client
        .query(
            "SELECT p.id, p.title, p.patent_number, p.inventors, p.department, p.status, \
             p.filing_date, p.grant_date, p.description, p.faculty_id, p.created_by, \
             p.created_at, p.updated_at \
             FROM patents p WHERE p.faculty_id = $1 ORDER BY p.filing_date DESC",
            &[&id],
        )
        .await?
        .iter()
        .map(Patent::from_row)
        .collect();

    let projects = client
        .query(
            "SELECT id, title, principal_investigator, co_principal_investigator, department, \
             funding_agency, agency_scientist, file_number, sanctioned_amount, start_date, \
             end_date, objectives, deliverables, outcomes, pdf_url, created_by, created_at, \
             updated_at \
             FROM research_projects \
             WHERE principal_investigator = $1 AND is_deleted = FALSE \
             ORDER BY start_date DESC",
            &[&faculty.name],
        )
        .await?
        .iter()
        .map(Project::from_row)
        .collect();

    Ok(Json(DataResponse::new(FacultyDetail {
        faculty,
        publications,
        patents,
        projects,
    })))
}

/// POST /api/faculty (admin) — multipart form with optional profile photo
pub async fn create_faculty(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Faculty>>)> {
    authorize(&claims, &[Role::Admin])?;

    let form = MultipartForm::read(multipart, "profile_image").await?;
    let name = form.required("name")?;

    let profile_image = match &form.file {
        Some(file) => Some(store_file(&state.uploads, UploadKind::Image, None, "faculty-", file).await?),
        None => form.text("profile_image"),
    };

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO faculty \
                 (name, designation, department, specialization, bio, email, profile_image, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
                RETURNING
            ).as_str(),
            &[
                &name,
                &form.text("designation"),
                &form.text("department"),
                &form.text("specialization"),
                &form.text("bio"),
                &form.text("email"),
                &profile_image,
                &claims.sub,
            ],
        )
        .await?;

    info!("Faculty '{}' created by user {}", name, claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Faculty created successfully",
            Faculty::from_row(&row),
        )),
    ))
}

/// PUT /api/faculty/{id} (admin, faculty) — omitted fields retain stored values
pub async fn update_faculty(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> ApiResult<Json<SuccessResponse<Faculty>>> {
    authorize(&claims, &[Role::Admin, Role::Faculty])?;

    let form = MultipartForm::read(multipart, "profile_image").await?;

    let profile_image = match &form.file {
        Some(file) => Some(store_file(&state.uploads, UploadKind::Image, None, "faculty-", file).await?),
        None => form.text("profile_image"),
    };

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE faculty SET \
                 name = COALESCE($1, name), \
                 designation = COALESCE($2, designation), \
                 department = COALESCE($3, department), \
                 specialization = COALESCE($4, specialization), \
                 bio = COALESCE($5, bio), \
                 email = COALESCE($6, email), \
                 profile_image = COALESCE($7, profile_image), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $8 RETURNING {}",
                RETURNING
            ).as_str(),
            &[
                &form.text("name"),
                &form.text("designation"),
                &form.text("department"),
                &form.text("specialization"),
                &form.text("bio"),
                &form.text("email"),
                &profile_image,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Faculty not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Faculty updated successfully",
        Faculty::from_row(&row),
    )))
}

/// DELETE /api/faculty/{id} (admin)
pub async fn delete_faculty(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt("DELETE FROM faculty WHERE id = $1 RETURNING id", &[&id])
        .await?
        .ok_or_else(|| AppError::NotFound("Faculty not found".to_string()))?;

    info!("Faculty {} deleted by user {}", id, claims.sub);

    Ok(Json(SuccessResponse::message_only(
        "Faculty deleted successfully",
    )))
}

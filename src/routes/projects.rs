//! Research project route handlers
//!
//! The unified funded-project entity: soft deletes, allow-listed sorting,
//! and a lifecycle status derived from the date range on every read path.

use crate::auth::{auth_middleware, authorize, Claims, Role};
use crate::db::query::{parse_i32, sort_column, ListQuery, PageQuery, SortOrder};
use crate::error::{ApiResult, AppError};
use crate::models::{DataResponse, ListResponse, SuccessResponse};
use crate::state::SharedState;
use crate::status::ProjectStatus;
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
use tracing::{debug, info};

const COLUMNS: &str = "id, title, principal_investigator, co_principal_investigator, department, \
                       funding_agency, agency_scientist, file_number, sanctioned_amount, \
                       start_date, end_date, objectives, deliverables, outcomes, pdf_url, \
                       created_by, created_at, updated_at";

/// Sort fields a client may request, mapped to their columns
const SORT_FIELDS: &[(&str, &str)] = &[
    ("created_at", "created_at"),
    ("updated_at", "updated_at"),
    ("title", "title"),
    ("start_date", "start_date"),
    ("sanctioned_amount", "sanctioned_amount"),
];

#[derive(Debug, Serialize)]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub principal_investigator: Option<String>,
    pub co_principal_investigator: Option<String>,
    pub department: Option<String>,
    pub funding_agency: Option<String>,
    pub agency_scientist: Option<String>,
    pub file_number: Option<String>,
    pub sanctioned_amount: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub objectives: Option<String>,
    pub deliverables: Option<String>,
    pub outcomes: Option<String>,
    pub pdf_url: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Derived from the date range, never stored
    pub status: ProjectStatus,
}

impl Project {
    pub fn from_row(row: &Row) -> Self {
        let start_date: Option<NaiveDate> = row.get("start_date");
        let end_date: Option<NaiveDate> = row.get("end_date");
        Self {
            id: row.get("id"),
            title: row.get("title"),
            principal_investigator: row.get("principal_investigator"),
            co_principal_investigator: row.get("co_principal_investigator"),
            department: row.get("department"),
            funding_agency: row.get("funding_agency"),
            agency_scientist: row.get("agency_scientist"),
            file_number: row.get("file_number"),
            sanctioned_amount: row.get("sanctioned_amount"),
            start_date,
            end_date,
            objectives: row.get("objectives"),
            deliverables: row.get("deliverables"),
            outcomes: row.get("outcomes"),
            pdf_url: row.get("pdf_url"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            status: ProjectStatus::derive(start_date, end_date, Utc::now().date_naive()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectFilter {
    pub status: Option<String>,
    pub department: Option<String>,
    pub funding_agency: Option<String>,
    pub year: Option<String>,
    pub search: Option<String>,
    pub funded: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub title: Option<String>,
    pub principal_investigator: Option<String>,
    pub co_principal_investigator: Option<String>,
    pub department: Option<String>,
    pub funding_agency: Option<String>,
    pub agency_scientist: Option<String>,
    pub file_number: Option<String>,
    pub sanctioned_amount: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub objectives: Option<String>,
    pub deliverables: Option<String>,
    pub outcomes: Option<String>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub principal_investigator: Option<String>,
    pub co_principal_investigator: Option<String>,
    pub department: Option<String>,
    pub funding_agency: Option<String>,
    pub agency_scientist: Option<String>,
    pub file_number: Option<String>,
    pub sanctioned_amount: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub objectives: Option<String>,
    pub deliverables: Option<String>,
    pub outcomes: Option<String>,
    pub pdf_url: Option<String>,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_project))
        .route("/{id}", put(update_project).delete(delete_project))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_projects))
        .route("/{id}", get(get_project))
        .merge(protected)
}

/// GET /api/projects
///
/// A `status` filter cannot be pushed into SQL because status is derived,
/// so that path fetches the full candidate set and filters then paginates
/// in memory. Acceptable at portal data volumes; revisit if projects grow
/// past a few thousand rows.
pub async fn list_projects(
    State(state): State<SharedState>,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Json<ListResponse<Project>>> {
    let page = filter.page.resolve();

    let status_filter = match filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<ProjectStatus>().map_err(|_| {
            AppError::Validation("Unknown status filter (upcoming, ongoing, completed)".to_string())
        })?),
        None => None,
    };

    let mut query = ListQuery::new(
        format!("SELECT {} FROM research_projects", COLUMNS),
        "SELECT COUNT(*) FROM research_projects",
    );
    query.filter_raw("is_deleted = FALSE");
    query.eq_text("department", filter.department.as_deref());
    query.eq_text("funding_agency", filter.funding_agency.as_deref());
    query.in_year("start_date", parse_i32(filter.year.as_deref()));
    query.not_null("funding_agency", filter.funded.as_deref() == Some("true"));
    query.contains_any(
        &["title", "principal_investigator", "department", "funding_agency"],
        filter.search.as_deref(),
    );

    let order = format!(
        "ORDER BY {} {}",
        sort_column(filter.sort_by.as_deref(), SORT_FIELDS, "created_at"),
        SortOrder::parse(filter.sort_order.as_deref()).as_sql()
    );

    let client = state.pool.get().await?;

    if let Some(wanted) = status_filter {
        let built = query.build(&order, None);
        let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

        let matching: Vec<Project> = rows
            .iter()
            .map(Project::from_row)
            .filter(|p| p.status == wanted)
            .collect();
        let total = matching.len() as i64;

        debug!("Status-filtered project list: {} of {} candidates", total, rows.len());

        return Ok(Json(ListResponse::new(page.slice(matching), page.meta(total))));
    }

    let built = query.build(&order, Some(page));
    let total: i64 = client
        .query_one(built.count_sql.as_str(), &built.count_params())
        .await?
        .get(0);
    let rows = client.query(built.data_sql.as_str(), &built.data_params()).await?;

    Ok(Json(ListResponse::new(
        rows.iter().map(Project::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<Project>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!(
                "SELECT {} FROM research_projects WHERE id = $1 AND is_deleted = FALSE",
                COLUMNS
            ).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    Ok(Json(DataResponse::new(Project::from_row(&row))))
}

/// POST /api/projects (admin)
pub async fn create_project(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProject>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Project>>)> {
    authorize(&claims, &[Role::Admin])?;
    let title = super::require_field(&payload.title, "Title")?;

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO research_projects \
                 (title, principal_investigator, co_principal_investigator, department, \
                  funding_agency, agency_scientist, file_number, sanctioned_amount, start_date, \
                  end_date, objectives, deliverables, outcomes, pdf_url, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
                 RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &title,
                &payload.principal_investigator,
                &payload.co_principal_investigator,
                &payload.department,
                &payload.funding_agency,
                &payload.agency_scientist,
                &payload.file_number,
                &payload.sanctioned_amount,
                &payload.start_date,
                &payload.end_date,
                &payload.objectives,
                &payload.deliverables,
                &payload.outcomes,
                &payload.pdf_url,
                &claims.sub,
            ],
        )
        .await?;

    info!("Project created by user {}", claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Project created successfully",
            Project::from_row(&row),
        )),
    ))
}

/// PUT /api/projects/{id} (admin) — omitted fields retain stored values
pub async fn update_project(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProject>,
) -> ApiResult<Json<SuccessResponse<Project>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE research_projects SET \
                 title = COALESCE($1, title), \
                 principal_investigator = COALESCE($2, principal_investigator), \
                 co_principal_investigator = COALESCE($3, co_principal_investigator), \
                 department = COALESCE($4, department), \
                 funding_agency = COALESCE($5, funding_agency), \
                 agency_scientist = COALESCE($6, agency_scientist), \
                 file_number = COALESCE($7, file_number), \
                 sanctioned_amount = COALESCE($8, sanctioned_amount), \
                 start_date = COALESCE($9, start_date), \
                 end_date = COALESCE($10, end_date), \
                 objectives = COALESCE($11, objectives), \
                 deliverables = COALESCE($12, deliverables), \
                 outcomes = COALESCE($13, outcomes), \
                 pdf_url = COALESCE($14, pdf_url), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $15 AND is_deleted = FALSE RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &payload.title,
                &payload.principal_investigator,
                &payload.co_principal_investigator,
                &payload.department,
                &payload.funding_agency,
                &payload.agency_scientist,
                &payload.file_number,
                &payload.sanctioned_amount,
                &payload.start_date,
                &payload.end_date,
                &payload.objectives,
                &payload.deliverables,
                &payload.outcomes,
                &payload.pdf_url,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Project updated successfully",
        Project::from_row(&row),
    )))
}

/// DELETE /api/projects/{id} (admin) — soft delete
pub async fn delete_project(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt(
            "UPDATE research_projects SET is_deleted = TRUE, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 AND is_deleted = FALSE RETURNING id",
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    info!("Project {} soft-deleted by user {}", id, claims.sub);

    Ok(Json(SuccessResponse::message_only(
        "Project deleted successfully",
    )))
}

//! Public analytics route handlers
//!
//! Read-only aggregations over the research-project table. Rows with a NULL
//! department or date are excluded from their grouping rather than bucketed.

use crate::error::ApiResult;
use crate::models::DataResponse;
use crate::state::SharedState;
use crate::status::ProjectStatus;
use axum::{extract::State, routing::get, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DepartmentCount {
    pub department: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct FundingYear {
    pub year: i32,
    pub total_funding: f64,
    pub project_count: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: ProjectStatus,
    pub count: i64,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/projects-by-department", get(projects_by_department))
        .route("/funding-trend", get(funding_trend))
        .route("/status-distribution", get(status_distribution))
}

/// GET /api/analytics/projects-by-department
pub async fn projects_by_department(
    State(state): State<SharedState>,
) -> ApiResult<Json<DataResponse<Vec<DepartmentCount>>>> {
    let client = state.pool.get().await?;

    let rows = client
        .query(
            "SELECT department, COUNT(*) AS count \
             FROM research_projects \
             WHERE department IS NOT NULL AND is_deleted = FALSE \
             GROUP BY department \
             ORDER BY count DESC",
            &[],
        )
        .await?;

    let data = rows
        .iter()
        .map(|row| DepartmentCount {
            department: row.get("department"),
            count: row.get("count"),
        })
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// GET /api/analytics/funding-trend
pub async fn funding_trend(
    State(state): State<SharedState>,
) -> ApiResult<Json<DataResponse<Vec<FundingYear>>>> {
    let client = state.pool.get().await?;

    let rows = client
        .query(
            "SELECT EXTRACT(YEAR FROM start_date)::INT AS year, \
                    COALESCE(SUM(sanctioned_amount), 0)::FLOAT8 AS total_funding, \
                    COUNT(*) AS project_count \
             FROM research_projects \
             WHERE start_date IS NOT NULL AND is_deleted = FALSE \
             GROUP BY year \
             ORDER BY year ASC",
            &[],
        )
        .await?;

    let data = rows
        .iter()
        .map(|row| FundingYear {
            year: row.get("year"),
            total_funding: row.get("total_funding"),
            project_count: row.get("project_count"),
        })
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// GET /api/analytics/status-distribution
///
/// Status is derived, so the distribution is computed over the dated rows
/// in application code with the shared derivation.
pub async fn status_distribution(
    State(state): State<SharedState>,
) -> ApiResult<Json<DataResponse<Vec<StatusCount>>>> {
    let client = state.pool.get().await?;

    let rows = client
        .query(
            "SELECT start_date, end_date FROM research_projects \
             WHERE start_date IS NOT NULL AND end_date IS NOT NULL AND is_deleted = FALSE",
            &[],
        )
        .await?;

    let today = Utc::now().date_naive();
    let (mut ongoing, mut completed, mut upcoming) = (0i64, 0i64, 0i64);

    for row in &rows {
        let start: Option<NaiveDate> = row.get("start_date");
        let end: Option<NaiveDate> = row.get("end_date");
        match ProjectStatus::derive(start, end, today) {
            ProjectStatus::Ongoing => ongoing += 1,
            ProjectStatus::Completed => completed += 1,
            ProjectStatus::Upcoming => upcoming += 1,
        }
    }

    Ok(Json(DataResponse::new(vec![
        StatusCount {
            status: ProjectStatus::Ongoing,
            count: ongoing,
        },
        StatusCount {
            status: ProjectStatus::Completed,
            count: completed,
        },
        StatusCount {
            status: ProjectStatus::Upcoming,
            count: upcoming,
        },
    ])))
}

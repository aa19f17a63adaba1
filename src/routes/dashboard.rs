//! Admin dashboard route handlers
//!
//! Cross-entity aggregations for the admin overview. Year windows are
//! computed in application code and bound as parameters, so calendar
//! semantics never depend on SQL interval arithmetic.

use crate::auth::{auth_middleware, authorize, Claims, Role};
use crate::error::ApiResult;
use crate::models::DataResponse;
use crate::state::SharedState;
use axum::{
    extract::{Query, State},
    middleware,
    routing::get,
    Extension, Json, Router,
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_YEARS_WINDOW: i32 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct YearsQuery {
    pub years: Option<String>,
}

impl YearsQuery {
    /// Trailing-window length in years; garbage clamps to the default.
    fn resolve(&self) -> i32 {
        self.years
            .as_deref()
            .and_then(|s| s.trim().parse::<i32>().ok())
            .filter(|y| (1..=50).contains(y))
            .unwrap_or(DEFAULT_YEARS_WINDOW)
    }

    /// Cutoff date `years` back from today, computed application-side.
    fn cutoff_date(&self) -> NaiveDate {
        let today = Utc::now().date_naive();
        today
            .checked_sub_months(Months::new(12 * self.resolve() as u32))
            .unwrap_or(today)
    }

    /// Cutoff year for tables that store a bare year column.
    fn cutoff_year(&self) -> i32 {
        Utc::now().date_naive().year() - self.resolve()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_projects: i64,
    pub total_funding: f64,
    pub total_publications: i64,
    pub total_ipr: i64,
    pub total_consultancy_revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct DepartmentStats {
    pub department: String,
    pub projects: i64,
    pub funding: f64,
    pub publications: i64,
    pub ipr: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub summary: DashboardSummary,
    pub publications_per_year: Vec<YearCount>,
    pub ipr_growth: Vec<YearCount>,
    pub department_stats: Vec<DepartmentStats>,
}

#[derive(Debug, Serialize)]
pub struct PatentGrowthYear {
    pub year: i32,
    pub count: i64,
    pub granted: i64,
}

#[derive(Debug, Serialize)]
pub struct RevenueYear {
    pub year: i32,
    pub revenue: f64,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct DepartmentComparison {
    pub department: String,
    pub projects: i64,
    pub funding: f64,
    pub publications: i64,
    pub ipr: i64,
    pub consultancy_revenue: f64,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/publications-per-year", get(publications_per_year))
        .route("/patent-growth", get(patent_growth))
        .route("/consultancy-revenue", get(consultancy_revenue))
        .route("/department-comparison", get(department_comparison))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// GET /api/dashboard/stats (admin)
pub async fn stats(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<DataResponse<DashboardStats>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let window = YearsQuery::default();

    let total_projects: i64 = client
        .query_one(
            "SELECT COUNT(*) FROM research_projects WHERE is_deleted = FALSE",
            &[],
        )
        .await?
        .get(0);

    let total_funding: f64 = client
        .query_one(
            "SELECT COALESCE(SUM(sanctioned_amount), 0)::FLOAT8 \
             FROM research_projects WHERE is_deleted = FALSE",
            &[],
        )
        .await?
        .get(0);

    let total_publications: i64 = client
        .query_one("SELECT COUNT(*) FROM publications", &[])
        .await?
        .get(0);

    let total_ipr: i64 = client.query_one("SELECT COUNT(*) FROM ipr", &[]).await?.get(0);

    let total_consultancy_revenue: f64 = client
        .query_one(
            "SELECT COALESCE(SUM(amount_earned), 0)::FLOAT8 FROM consultancy",
            &[],
        )
        .await?
        .get(0);

    let publications_per_year = client
        .query(
            "SELECT year, COUNT(*) AS count \
             FROM publications \
             WHERE year IS NOT NULL AND year >= $1 \
             GROUP BY year \
             ORDER BY year DESC",
            &[&window.cutoff_year()],
        )
        .await?
        .iter()
        .map(|row| YearCount {
            year: row.get("year"),
            count: row.get("count"),
        })
        .collect();

    let ipr_growth = client
        .query(
            "SELECT EXTRACT(YEAR FROM filing_date)::INT AS year, COUNT(*) AS count \
             FROM ipr \
             WHERE filing_date >= $1 \
             GROUP BY year \
             ORDER BY year DESC",
            &[&window.cutoff_date()],
        )
        .await?
        .iter()
        .map(|row| YearCount {
            year: row.get("year"),
            count: row.get("count"),
        })
        .collect();

    // Outer union of departments across the three tables, aggregated per
    // table first so the joins cannot multiply counts.
    let department_stats = client
        .query(
            "SELECT d.department, \
                    COALESCE(fp.projects, 0) AS projects, \
                    COALESCE(fp.funding, 0)::FLOAT8 AS funding, \
                    COALESCE(p.publications, 0) AS publications, \
                    COALESCE(i.ipr, 0) AS ipr \
             FROM (SELECT department FROM research_projects \
                   WHERE department IS NOT NULL AND is_deleted = FALSE \
                   UNION SELECT department FROM publications WHERE department IS NOT NULL \
                   UNION SELECT department FROM ipr WHERE department IS NOT NULL) d \
             LEFT JOIN (SELECT department, COUNT(*) AS projects, SUM(sanctioned_amount) AS funding \
                        FROM research_projects \
                        WHERE department IS NOT NULL AND is_deleted = FALSE \
                        GROUP BY department) fp ON fp.department = d.department \
             LEFT JOIN (SELECT department, COUNT(*) AS publications FROM publications \
                        WHERE department IS NOT NULL GROUP BY department) p \
                   ON p.department = d.department \
             LEFT JOIN (SELECT department, COUNT(*) AS ipr FROM ipr \
                        WHERE department IS NOT NULL GROUP BY department) i \
                   ON i.department = d.department \
             ORDER BY funding DESC",
            &[],
        )
        .await?
        .iter()
        .map(|row| DepartmentStats {
            department: row.get("department"),
            projects: row.get("projects"),
            funding: row.get("funding"),
            publications: row.get("publications"),
            ipr: row.get("ipr"),
        })
        .collect();

    Ok(Json(DataResponse::new(DashboardStats {
        summary: DashboardSummary {
            total_projects,
            total_funding,
            total_publications,
            total_ipr,
            total_consultancy_revenue,
        },
        publications_per_year,
        ipr_growth,
        department_stats,
    })))
}

/// GET /api/dashboard/publications-per-year?years= (admin)
pub async fn publications_per_year(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Query(window): Query<YearsQuery>,
) -> ApiResult<Json<DataResponse<Vec<YearCount>>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let rows = client
        .query(
            "SELECT year, COUNT(*) AS count \
             FROM publications \
             WHERE year IS NOT NULL AND year >= $1 \
             GROUP BY year \
             ORDER BY year ASC",
            &[&window.cutoff_year()],
        )
        .await?;

    let data = rows
        .iter()
        .map(|row| YearCount {
            year: row.get("year"),
            count: row.get("count"),
        })
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// GET /api/dashboard/patent-growth?years= (admin)
pub async fn patent_growth(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Query(window): Query<YearsQuery>,
) -> ApiResult<Json<DataResponse<Vec<PatentGrowthYear>>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let rows = client
        .query(
            "SELECT EXTRACT(YEAR FROM filing_date)::INT AS year, \
                    COUNT(*) AS count, \
                    COALESCE(SUM(CASE WHEN status = 'granted' THEN 1 ELSE 0 END), 0)::BIGINT AS granted \
             FROM ipr \
             WHERE filing_date >= $1 AND ipr_type = 'patent' \
             GROUP BY year \
             ORDER BY year ASC",
            &[&window.cutoff_date()],
        )
        .await?;

    let data = rows
        .iter()
        .map(|row| PatentGrowthYear {
            year: row.get("year"),
            count: row.get("count"),
            granted: row.get("granted"),
        })
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// GET /api/dashboard/consultancy-revenue?years= (admin)
pub async fn consultancy_revenue(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Query(window): Query<YearsQuery>,
) -> ApiResult<Json<DataResponse<Vec<RevenueYear>>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let rows = client
        .query(
            "SELECT EXTRACT(YEAR FROM start_date)::INT AS year, \
                    COALESCE(SUM(amount_earned), 0)::FLOAT8 AS revenue, \
                    COUNT(*) AS count \
             FROM consultancy \
             WHERE start_date >= $1 \
             GROUP BY year \
             ORDER BY year ASC",
            &[&window.cutoff_date()],
        )
        .await?;

    let data = rows
        .iter()
        .map(|row| RevenueYear {
            year: row.get("year"),
            revenue: row.get("revenue"),
            count: row.get("count"),
        })
        .collect();

    Ok(Json(DataResponse::new(data)))
}

/// GET /api/dashboard/department-comparison (admin)
///
/// Departments present in any of the four tables appear once, with zeros
/// where a table has no rows for them.
pub async fn department_comparison(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<DataResponse<Vec<DepartmentComparison>>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let rows = client
        .query(
            "SELECT d.department, \
                    COALESCE(fp.projects, 0) AS projects, \
                    COALESCE(fp.funding, 0)::FLOAT8 AS funding, \
                    COALESCE(p.publications, 0) AS publications, \
                    COALESCE(i.ipr, 0) AS ipr, \
                    COALESCE(c.consultancy_revenue, 0)::FLOAT8 AS consultancy_revenue \
             FROM (SELECT department FROM research_projects \
                   WHERE department IS NOT NULL AND is_deleted = FALSE \
                   UNION SELECT department FROM publications WHERE department IS NOT NULL \
                   UNION SELECT department FROM ipr WHERE department IS NOT NULL \
                   UNION SELECT department FROM consultancy WHERE department IS NOT NULL) d \
             LEFT JOIN (SELECT department, COUNT(*) AS projects, SUM(sanctioned_amount) AS funding \
                        FROM research_projects \
                        WHERE department IS NOT NULL AND is_deleted = FALSE \
                        GROUP BY department) fp ON fp.department = d.department \
             LEFT JOIN (SELECT department, COUNT(*) AS publications FROM publications \
                        WHERE department IS NOT NULL GROUP BY department) p \
                   ON p.department = d.department \
             LEFT JOIN (SELECT department, COUNT(*) AS ipr FROM ipr \
                        WHERE department IS NOT NULL GROUP BY department) i \
                   ON i.department = d.department \
             LEFT JOIN (SELECT department, SUM(amount_earned) AS consultancy_revenue \
                        FROM consultancy WHERE department IS NOT NULL GROUP BY department) c \
                   ON c.department = d.department \
             ORDER BY funding DESC",
            &[],
        )
        .await?;

    let data = rows
        .iter()
        .map(|row| DepartmentComparison {
            department: row.get("department"),
            projects: row.get("projects"),
            funding: row.get("funding"),
            publications: row.get("publications"),
            ipr: row.get("ipr"),
            consultancy_revenue: row.get("consultancy_revenue"),
        })
        .collect();

    Ok(Json(DataResponse::new(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_years_window_clamps_garbage() {
        let q = YearsQuery {
            years: Some("abc".to_string()),
        };
        assert_eq!(q.resolve(), DEFAULT_YEARS_WINDOW);

        let q = YearsQuery {
            years: Some("-2".to_string()),
        };
        assert_eq!(q.resolve(), DEFAULT_YEARS_WINDOW);

        let q = YearsQuery {
            years: Some("10".to_string()),
        };
        assert_eq!(q.resolve(), 10);
    }

    #[test]
    fn test_cutoff_date_is_in_the_past() {
        let q = YearsQuery::default();
        assert!(q.cutoff_date() < Utc::now().date_naive());
    }
}

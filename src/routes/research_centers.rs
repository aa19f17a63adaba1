//! Research center route handlers

use crate::auth::{auth_middleware, authorize, Claims, Role};
use crate::db::query::{ListQuery, PageQuery};
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

const COLUMNS: &str = "id, name, description, head, department, established_year, focus_areas, \
                       facilities, image_url, website_url, created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct ResearchCenter {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub head: Option<String>,
    pub department: Option<String>,
    pub established_year: Option<i32>,
    pub focus_areas: Option<Vec<String>>,
    pub facilities: Option<String>,
    pub image_url: Option<String>,
    pub website_url: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResearchCenter {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            head: row.get("head"),
            department: row.get("department"),
            established_year: row.get("established_year"),
            focus_areas: row.get("focus_areas"),
            facilities: row.get("facilities"),
            image_url: row.get("image_url"),
            website_url: row.get("website_url"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResearchCenterFilter {
    pub department: Option<String>,
    pub research_area: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct ResearchCenterPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub head: Option<String>,
    pub department: Option<String>,
    pub established_year: Option<i32>,
    pub focus_areas: Option<Vec<String>>,
    pub facilities: Option<String>,
    pub image_url: Option<String>,
    pub website_url: Option<String>,
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/", post(create_research_center))
        .route(
            "/{id}",
            put(update_research_center).delete(delete_research_center),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_research_centers))
        .route("/{id}", get(get_research_center))
        .merge(protected)
}

/// GET /api/research-centers
pub async fn list_research_centers(
    State(state): State<SharedState>,
    Query(filter): Query<ResearchCenterFilter>,
) -> ApiResult<Json<ListResponse<ResearchCenter>>> {
    let page = filter.page.resolve();

    let mut query = ListQuery::new(
        format!("SELECT {} FROM research_centers", COLUMNS),
        "SELECT COUNT(*) FROM research_centers",
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
        rows.iter().map(ResearchCenter::from_row).collect(),
        page.meta(total),
    )))
}

/// GET /api/research-centers/{id}
pub async fn get_research_center(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DataResponse<ResearchCenter>>> {
    let client = state.pool.get().await?;

    let row = client
        .query_opt(
            format!("SELECT {} FROM research_centers WHERE id = $1", COLUMNS).as_str(),
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Research center not found".to_string()))?;

    Ok(Json(DataResponse::new(ResearchCenter::from_row(&row))))
}

/// POST /api/research-centers (admin)
pub async fn create_research_center(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ResearchCenterPayload>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<ResearchCenter>>)> {
    authorize(&claims, &[Role::Admin])?;
    let name = super::require_field(&payload.name, "Name")?;

    let client = state.pool.get().await?;
    let row = client
        .query_one(
            format!(
                "INSERT INTO research_centers \
                 (name, description, head, department, established_year, focus_areas, facilities, \
                  image_url, website_url, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &name,
                &payload.description,
                &payload.head,
                &payload.department,
                &payload.established_year,
                &payload.focus_areas,
                &payload.facilities,
                &payload.image_url,
                &payload.website_url,
                &claims.sub,
            ],
        )
        .await?;

    info!("Research center '{}' created by user {}", name, claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Research center created successfully",
            ResearchCenter::from_row(&row),
        )),
    ))
}

/// PUT /api/research-centers/{id} (admin) — omitted fields retain stored values
pub async fn update_research_center(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<ResearchCenterPayload>,
) -> ApiResult<Json<SuccessResponse<ResearchCenter>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    let row = client
        .query_opt(
            format!(
                "UPDATE research_centers SET \
                 name = COALESCE($1, name), \
                 description = COALESCE($2, description), \
                 head = COALESCE($3, head), \
                 department = COALESCE($4, department), \
                 established_year = COALESCE($5, established_year), \
                 focus_areas = COALESCE($6, focus_areas), \
                 facilities = COALESCE($7, facilities), \
                 image_url = COALESCE($8, image_url), \
                 website_url = COALESCE($9, website_url), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $10 RETURNING {}",
                COLUMNS
            ).as_str(),
            &[
                &payload.name,
                &payload.description,
                &payload.head,
                &payload.department,
                &payload.established_year,
                &payload.focus_areas,
                &payload.facilities,
                &payload.image_url,
                &payload.website_url,
                &id,
            ],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Research center not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Research center updated successfully",
        ResearchCenter::from_row(&row),
    )))
}

/// DELETE /api/research-centers/{id} (admin)
pub async fn delete_research_center(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    authorize(&claims, &[Role::Admin])?;

    let client = state.pool.get().await?;
    client
        .query_opt(
            "DELETE FROM research_centers WHERE id = $1 RETURNING id",
            &[&id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Research center not found".to_string()))?;

    Ok(Json(SuccessResponse::message_only(
        "Research center deleted successfully",
    )))
}

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{GameType, StatsFilters, UserId};
use crate::stats::{AimReport, ClutchReport, MapReport, OverviewReport};

#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub game_type: Option<String>,
    pub map: Option<String>,
    pub past_match_count: Option<usize>,
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                ApiError::BadRequest(format!("{} must be YYYY-MM-DD, got {:?}", field, s))
            })
        })
        .transpose()
}

impl FilterParams {
    pub fn into_filters(self, default_count: usize) -> Result<StatsFilters, ApiError> {
        let date_from = parse_date("date_from", self.date_from.as_deref())?;
        let date_to = parse_date("date_to", self.date_to.as_deref())?;
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(ApiError::BadRequest(format!(
                    "date_from {} is after date_to {}",
                    from, to
                )));
            }
        }

        let mut filters = StatsFilters::default()
            .with_dates(date_from, date_to)
            .with_past_match_count(
                self.past_match_count
                    .filter(|&count| count > 0)
                    .unwrap_or(default_count),
            );
        if let Some(game_type) = self.game_type {
            let game_type: GameType = game_type.parse().map_err(ApiError::BadRequest)?;
            filters = filters.with_game_type(game_type);
        }
        if let Some(map) = self.map.filter(|m| !m.is_empty()) {
            filters = filters.with_map(map);
        }
        Ok(filters)
    }
}

pub async fn aim(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Json<AimReport>, ApiError> {
    let filters = params.into_filters(state.default_past_match_count)?;
    Ok(Json(state.stats.aim_report(&UserId::from(user_id), &filters).await?))
}

pub async fn overview(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Json<OverviewReport>, ApiError> {
    let filters = params.into_filters(state.default_past_match_count)?;
    Ok(Json(
        state
            .stats
            .overview_report(&UserId::from(user_id), &filters)
            .await?,
    ))
}

pub async fn clutch(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Json<ClutchReport>, ApiError> {
    let filters = params.into_filters(state.default_past_match_count)?;
    Ok(Json(
        state
            .stats
            .clutch_report(&UserId::from(user_id), &filters)
            .await?,
    ))
}

pub async fn maps(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Json<MapReport>, ApiError> {
    let filters = params.into_filters(state.default_past_match_count)?;
    Ok(Json(
        state.stats.map_report(&UserId::from(user_id), &filters).await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub user_id: UserId,
    pub removed: usize,
}

pub async fn invalidate(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<InvalidateResponse> {
    let user_id = UserId::from(user_id);
    let removed = state.stats.invalidate_user(&user_id).await;
    Json(InvalidateResponse { user_id, removed })
}

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::leaderboard::CalculationRun;
use crate::models::{ClanId, LeaderboardEntry, LeaderboardKind, LeaderboardPeriod};

#[derive(Debug, Deserialize)]
pub struct WeekParams {
    /// Any date inside the wanted week; defaults to the last completed week
    pub week_of: Option<String>,
}

impl WeekParams {
    fn period(&self) -> Result<LeaderboardPeriod, ApiError> {
        match self.week_of.as_deref() {
            None => Ok(LeaderboardPeriod::last_completed_week(Utc::now().date_naive())),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(LeaderboardPeriod::week_containing)
                .map_err(|_| {
                    ApiError::BadRequest(format!("week_of must be YYYY-MM-DD, got {:?}", s))
                }),
        }
    }
}

fn parse_kind(kind: &str) -> Result<LeaderboardKind, ApiError> {
    kind.parse().map_err(ApiError::BadRequest)
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub clan_id: ClanId,
    pub kind: LeaderboardKind,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub entries: Vec<LeaderboardEntry>,
}

pub async fn show(
    State(state): State<AppState>,
    Path((clan_id, kind)): Path<(String, String)>,
    Query(params): Query<WeekParams>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let period = params.period()?;
    let clan_id = ClanId::from(clan_id);

    let entries = state.leaderboards.standings(&clan_id, kind, period).await?;
    Ok(Json(LeaderboardResponse {
        clan_id,
        kind,
        period_start: period.start,
        period_end: period.end,
        entries,
    }))
}

pub async fn calculate(
    State(state): State<AppState>,
    Path((clan_id, kind)): Path<(String, String)>,
    Query(params): Query<WeekParams>,
) -> Result<Json<CalculationRun>, ApiError> {
    let kind = parse_kind(&kind)?;
    let period = params.period()?;
    let run = state
        .leaderboards
        .calculate(&ClanId::from(clan_id), kind, period)
        .await?;
    Ok(Json(run))
}

//! Dashboard endpoints

use crate::api::guard::CurrentUser;
use crate::app::AppState;
use crate::database::DailyTaskCompletionSummary;
use crate::error::Result;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppState> {
    Router::new().route("/summary", get(summary))
}

#[derive(Deserialize)]
struct SummaryQuery {
    /// First day, YYYY-MM-DD; defaults to six days ago
    from: Option<String>,
    /// Last day, YYYY-MM-DD; defaults to today
    to: Option<String>,
}

#[derive(Serialize)]
struct SummaryResponse {
    open_tasks: usize,
    daily_completions: Vec<DailyTaskCompletionSummary>,
}

async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>> {
    let today = Utc::now().date_naive();
    let from = query
        .from
        .unwrap_or_else(|| (today - Duration::days(6)).to_string());
    let to = query.to.unwrap_or_else(|| today.to_string());

    let daily_completions = state.tasks.daily_summaries(&user.id, &from, &to).await?;
    let open_tasks = state.tasks.open_task_count(&user.id).await?;

    Ok(Json(SummaryResponse {
        open_tasks,
        daily_completions,
    }))
}

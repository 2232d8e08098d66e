//! Quota and billing endpoints

use crate::api::guard::CurrentUser;
use crate::app::AppState;
use crate::database::{PackageType, PurchasePackageRequest, QuotaPackage};
use crate::error::Result;
use crate::services::quota::QuotaOverview;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(overview))
        .route("/purchase", post(purchase))
        .route("/reset", post(reset))
}

#[derive(Deserialize)]
struct ResetRequest {
    package_type: PackageType,
}

async fn overview(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<QuotaOverview>> {
    let overview = state.quota.overview(&user.id).await?;
    Ok(Json(overview))
}

async fn purchase(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<PurchasePackageRequest>,
) -> Result<Json<QuotaPackage>> {
    let details = format!("{} +{}", req.package_type, req.items_added);
    let package = state.quota.purchase_package(&user.id, req).await?;

    state.activity.log(&user.id, "billing", "purchase", &details).await;

    Ok(Json(package))
}

async fn reset(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<Value>> {
    let deactivated = state.quota.reset_packages(&user.id, req.package_type).await?;

    state
        .activity
        .log(&user.id, "billing", "reset", &req.package_type.to_string())
        .await;

    Ok(Json(json!({
        "message": "Packages reset",
        "deactivated": deactivated,
    })))
}

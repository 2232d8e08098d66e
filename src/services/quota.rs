//! Quota service
//!
//! Computes per-user quota totals from purchased packages and maintains
//! the denormalized counters on the profile row. The quota_packages table
//! is the source of truth; the profile columns are a read cache.

use crate::config::{self, MAX_PACKAGE_DURATION_DAYS, MAX_PACKAGE_ITEMS};
use crate::database::{PackageType, Profile, PurchasePackageRequest, QuotaPackage, Repository};
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use serde::Serialize;

/// Profile counters plus package history, for the billing page
#[derive(Debug, Serialize)]
pub struct QuotaOverview {
    pub profile: Profile,
    pub packages: Vec<QuotaPackage>,
}

/// Service for quota arithmetic and package lifecycle
#[derive(Clone)]
pub struct QuotaService {
    repo: Repository,
}

impl QuotaService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Recompute a user's quota total for one category and write it to the
    /// profile cache.
    ///
    /// `total = base(category) + Σ items_added` over active, unexpired
    /// packages. Not transactional: a concurrent purchase or expiry can leave
    /// a stale cached total, which self-corrects on the next recalculation.
    /// Failures are logged and the free-tier base is returned; this never
    /// propagates an error to the caller.
    pub async fn recalculate(&self, user_id: &str, package_type: PackageType) -> i64 {
        let base = config::base_quota(package_type);

        match self.try_recalculate(user_id, package_type, base).await {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(
                    "Quota recalculation failed for user {} ({}): {}",
                    user_id,
                    package_type,
                    e
                );
                base
            }
        }
    }

    async fn try_recalculate(
        &self,
        user_id: &str,
        package_type: PackageType,
        base: i64,
    ) -> Result<i64> {
        let now = Utc::now();

        let purchased = self.repo.sum_active_items(user_id, package_type, now).await?;
        let total = base + purchased;

        self.repo.update_quota_total(user_id, package_type, total).await?;

        // Refresh the billing flag alongside the counter
        let has_active = self.repo.count_active_packages(user_id, now).await? > 0;
        self.repo.set_billing(user_id, has_active).await?;

        tracing::debug!(
            "Recalculated {} quota for user {}: {} (base {} + purchased {})",
            package_type,
            user_id,
            total,
            base,
            purchased
        );

        Ok(total)
    }

    /// Record a purchased package and refresh the cached total.
    ///
    /// There is no real payment integration; the purchase is confirmed
    /// client-side before this call.
    pub async fn purchase_package(
        &self,
        user_id: &str,
        req: PurchasePackageRequest,
    ) -> Result<QuotaPackage> {
        if req.items_added <= 0 || req.items_added > MAX_PACKAGE_ITEMS {
            return Err(AppError::Validation(format!(
                "items_added must be between 1 and {}",
                MAX_PACKAGE_ITEMS
            )));
        }
        if req.duration_days <= 0 || req.duration_days > MAX_PACKAGE_DURATION_DAYS {
            return Err(AppError::Validation(format!(
                "duration_days must be between 1 and {}",
                MAX_PACKAGE_DURATION_DAYS
            )));
        }

        let expires_at = Utc::now() + Duration::days(req.duration_days);

        let package = self
            .repo
            .create_package(user_id, req.package_type, req.items_added, expires_at)
            .await?;

        tracing::info!(
            "User {} purchased {} package (+{} items, expires {})",
            user_id,
            req.package_type,
            req.items_added,
            expires_at
        );

        self.recalculate(user_id, req.package_type).await;

        Ok(package)
    }

    /// Deactivate all of a user's packages of a type and drop back to the
    /// free-tier base.
    pub async fn reset_packages(&self, user_id: &str, package_type: PackageType) -> Result<u64> {
        let deactivated = self.repo.deactivate_user_packages(user_id, package_type).await?;

        tracing::info!(
            "User {} reset {} {} package(s)",
            user_id,
            deactivated,
            package_type
        );

        self.recalculate(user_id, package_type).await;

        Ok(deactivated)
    }

    /// Profile counters plus full package history
    pub async fn overview(&self, user_id: &str) -> Result<QuotaOverview> {
        let profile = self.repo.get_profile(user_id).await?;
        let packages = self.repo.list_packages(user_id).await?;

        Ok(QuotaOverview { profile, packages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_service() -> (QuotaService, Repository, String) {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        let repo = Repository::new(pool);
        let user = repo.create_user("quota@example.com", "hash").await.unwrap();
        repo.create_profile(&user.id, "quota", 5, 3).await.unwrap();

        (QuotaService::new(repo.clone()), repo, user.id)
    }

    #[tokio::test]
    async fn test_recalculate_excludes_inactive_packages() {
        let (service, repo, user_id) = create_test_service().await;
        let now = Utc::now();

        repo.create_package(&user_id, PackageType::Todos, 10, now + Duration::days(30))
            .await
            .unwrap();
        let inactive = repo
            .create_package(&user_id, PackageType::Todos, 20, now + Duration::days(30))
            .await
            .unwrap();
        repo.deactivate_packages(&[inactive.id]).await.unwrap();

        let total = service.recalculate(&user_id, PackageType::Todos).await;
        assert_eq!(total, 5 + 10);

        let profile = repo.get_profile(&user_id).await.unwrap();
        assert_eq!(profile.todos_current_total_quota, 15);
        assert!(profile.billing);
    }

    #[tokio::test]
    async fn test_recalculate_is_idempotent() {
        let (service, repo, user_id) = create_test_service().await;
        let now = Utc::now();

        repo.create_package(&user_id, PackageType::Notes, 4, now + Duration::days(7))
            .await
            .unwrap();

        let first = service.recalculate(&user_id, PackageType::Notes).await;
        let second = service.recalculate(&user_id, PackageType::Notes).await;

        assert_eq!(first, 7);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_recalculate_zero_packages_yields_base() {
        let (service, _repo, user_id) = create_test_service().await;

        assert_eq!(service.recalculate(&user_id, PackageType::Todos).await, 5);
        assert_eq!(service.recalculate(&user_id, PackageType::Notes).await, 3);
    }

    #[tokio::test]
    async fn test_recalculate_unknown_user_falls_back_to_base() {
        let (service, _repo, _user_id) = create_test_service().await;

        // Profile write fails; the base is returned instead of an error
        let total = service.recalculate("missing-user", PackageType::Todos).await;
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_purchase_updates_cached_total() {
        let (service, repo, user_id) = create_test_service().await;

        service
            .purchase_package(
                &user_id,
                PurchasePackageRequest {
                    package_type: PackageType::Notes,
                    items_added: 12,
                    duration_days: 30,
                },
            )
            .await
            .unwrap();

        let profile = repo.get_profile(&user_id).await.unwrap();
        assert_eq!(profile.notes_current_total_quota, 3 + 12);
        assert!(profile.billing);
    }

    #[tokio::test]
    async fn test_purchase_validation() {
        let (service, _repo, user_id) = create_test_service().await;

        let result = service
            .purchase_package(
                &user_id,
                PurchasePackageRequest {
                    package_type: PackageType::Todos,
                    items_added: 0,
                    duration_days: 30,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service
            .purchase_package(
                &user_id,
                PurchasePackageRequest {
                    package_type: PackageType::Todos,
                    items_added: 10,
                    duration_days: 0,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reset_drops_to_base() {
        let (service, repo, user_id) = create_test_service().await;

        service
            .purchase_package(
                &user_id,
                PurchasePackageRequest {
                    package_type: PackageType::Todos,
                    items_added: 25,
                    duration_days: 30,
                },
            )
            .await
            .unwrap();

        let deactivated = service
            .reset_packages(&user_id, PackageType::Todos)
            .await
            .unwrap();
        assert_eq!(deactivated, 1);

        let profile = repo.get_profile(&user_id).await.unwrap();
        assert_eq!(profile.todos_current_total_quota, 5);
        assert!(!profile.billing);
    }
}

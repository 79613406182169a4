// src/services/asset_service.rs

use crate::{
    common::{error::AppError, serial::normalize_serial_number},
    db::AssetRepository,
    models::asset::{AssetReport, AssetView, RouterListing, SerialLookupResponse},
};

#[derive(Clone)]
pub struct AssetService {
    asset_repo: AssetRepository,
}

impl AssetService {
    pub fn new(asset_repo: AssetRepository) -> Self {
        Self { asset_repo }
    }

    pub async fn list(&self) -> Result<Vec<AssetView>, AppError> {
        self.asset_repo.list_views().await
    }

    pub async fn routers(&self, listing: RouterListing) -> Result<Vec<AssetView>, AppError> {
        self.asset_repo.list_views_by_status(listing.status()).await
    }

    /// `None` when the serial normalizes to nothing.
    pub async fn lookup_serial(&self, raw: &str) -> Result<Option<SerialLookupResponse>, AppError> {
        let serial = normalize_serial_number(raw);
        if serial.is_empty() {
            return Ok(None);
        }
        let row = self.asset_repo.lookup_serial(&serial).await?;
        Ok(Some(SerialLookupResponse::from_row(serial, row)))
    }

    pub async fn report(&self) -> Result<AssetReport, AppError> {
        let (assets_by_type, assets_by_status, total_value) = tokio::try_join!(
            self.asset_repo.count_by_type(),
            self.asset_repo.count_by_status(),
            self.asset_repo.total_value(),
        )?;
        Ok(AssetReport {
            assets_by_type,
            assets_by_status,
            total_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_serial_skips_the_lookup() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let svc = AssetService::new(AssetRepository::new(pool));
        assert!(svc.lookup_serial("  S/N:  ").await.unwrap().is_none());
    }
}

use hubledger_catalog::{Hub, NewHub, NewSku, Sku, SkuPatch};
use hubledger_core::SkuId;

use crate::app::LedgerApi;
use crate::app::errors::ApiError;

// Catalog maintenance is an operator concern; callers are trusted here.
impl LedgerApi {
    pub async fn register_hub(&self, hub: NewHub) -> Result<Hub, ApiError> {
        Ok(self.engine.register_hub(hub).await?)
    }

    pub async fn register_sku(&self, sku: NewSku) -> Result<Sku, ApiError> {
        Ok(self.engine.register_sku(sku).await?)
    }

    pub async fn update_sku(&self, id: SkuId, patch: SkuPatch) -> Result<Sku, ApiError> {
        Ok(self.engine.update_sku(id, patch).await?)
    }

    pub async fn hub_by_code(&self, code: &str) -> Result<Hub, ApiError> {
        Ok(self.engine.hub_by_code(code).await?)
    }

    pub async fn list_hubs(&self) -> Result<Vec<Hub>, ApiError> {
        Ok(self.engine.list_hubs().await?)
    }

    pub async fn list_skus(&self) -> Result<Vec<Sku>, ApiError> {
        Ok(self.engine.list_skus().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::errors::ErrorKind;

    #[tokio::test]
    async fn hub_codes_are_unique_ignoring_case() {
        let api = LedgerApi::in_memory();
        api.register_hub(NewHub::new("BOM", "Mumbai")).await.unwrap();

        let err = api
            .register_hub(NewHub::new("bom", "Mumbai again"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let found = api.hub_by_code(" bom ").await.unwrap();
        assert_eq!(found.name, "Mumbai");

        let err = api.hub_by_code("XYZ").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn sku_patch_updates_listed_metadata() {
        let api = LedgerApi::in_memory();
        let sku = api
            .register_sku(NewSku::new("polo-wht-l", "Polo White L").variant("white", "L"))
            .await
            .unwrap();

        let patch = SkuPatch {
            name: Some("Polo White Large".to_string()),
            ..Default::default()
        };
        let updated = api.update_sku(sku.id, patch).await.unwrap();
        assert_eq!(updated.name, "Polo White Large");

        let skus = api.list_skus().await.unwrap();
        assert_eq!(skus.len(), 1);
        assert_eq!(skus[0].name, "Polo White Large");
        assert_eq!(skus[0].sku_code, "POLO-WHT-L");

        let err = api
            .update_sku(SkuId::new(999), SkuPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}

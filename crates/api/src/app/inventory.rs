use hubledger_core::{HubId, SkuId};
use hubledger_infra::Reconciliation;
use hubledger_inventory::InventoryLine;

use crate::app::dto::{AdjustRequest, AdjustResponse, LogEntryView, LogQuery};
use crate::app::errors::ApiError;
use crate::app::{LedgerApi, principal_of};
use crate::context::CallerContext;

impl LedgerApi {
    /// Apply one IN/OUT movement.
    ///
    /// Not idempotent: a retried call that had already succeeded is applied
    /// again.
    pub async fn adjust(
        &self,
        body: AdjustRequest,
        caller: Option<&CallerContext>,
    ) -> Result<AdjustResponse, ApiError> {
        let request = body.into_domain()?;
        let principal = principal_of(caller);
        let adjusted = self.engine.adjust(request, principal.as_ref()).await?;
        Ok(adjusted.into())
    }

    /// Balances held at one hub, ordered by SKU name.
    pub async fn list_inventory(
        &self,
        hub_id: HubId,
        caller: Option<&CallerContext>,
    ) -> Result<Vec<InventoryLine>, ApiError> {
        let principal = principal_of(caller);
        Ok(self
            .engine
            .list_inventory(hub_id, principal.as_ref())
            .await?)
    }

    /// Audit log, newest first.
    pub async fn list_log(
        &self,
        query: LogQuery,
        caller: Option<&CallerContext>,
    ) -> Result<Vec<LogEntryView>, ApiError> {
        let principal = principal_of(caller);
        let entries = self
            .engine
            .list_log(query.filter(), query.limit(), principal.as_ref())
            .await?;
        Ok(entries.into_iter().map(LogEntryView::from).collect())
    }

    /// Compare a stored balance with the balance replayed from its log.
    pub async fn verify(&self, hub_id: HubId, sku_id: SkuId) -> Result<Reconciliation, ApiError> {
        Ok(self.engine.verify(hub_id, sku_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hubledger_catalog::{NewHub, NewSku};
    use hubledger_core::ActorId;
    use hubledger_inventory::Direction;

    use super::*;
    use crate::app::dto::RawLimit;
    use crate::app::errors::ErrorKind;

    async fn seeded() -> (LedgerApi, HubId, SkuId) {
        let api = LedgerApi::in_memory();
        let hub = api.register_hub(NewHub::new("BLR", "Bengaluru")).await.unwrap();
        let sku = api
            .register_sku(NewSku::new("tee-blk-m", "Tee Black M"))
            .await
            .unwrap();
        (api, hub.id, sku.id)
    }

    fn body(hub_id: HubId, sku_id: SkuId, direction: &str, quantity: i64) -> AdjustRequest {
        AdjustRequest {
            hub_id,
            sku_id,
            direction: direction.to_string(),
            quantity,
            note: None,
        }
    }

    fn manager(hubs: Vec<HubId>) -> CallerContext {
        CallerContext::new(ActorId::new(), vec!["hub_manager".to_string()]).scoped_to(hubs)
    }

    #[tokio::test]
    async fn in_then_oversized_out() {
        let (api, hub, sku) = seeded().await;

        let ok = api.adjust(body(hub, sku, "IN", 10), None).await.unwrap();
        assert!(ok.ok);
        assert_eq!(ok.quantity, 10);
        assert_eq!((ok.hub_id, ok.sku_id), (hub, sku));

        let err = api.adjust(body(hub, sku, "OUT", 15), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientStock);
        assert_eq!((err.before, err.delta), (Some(10), Some(15)));

        let lines = api.list_inventory(hub, None).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 10);
        assert_eq!(lines[0].sku_code, "TEE-BLK-M");
        assert_eq!(lines[0].to_string(), "BLR:TEE-BLK-M = 10");
    }

    #[tokio::test]
    async fn rejects_bad_input_before_touching_the_ledger() {
        let (api, hub, sku) = seeded().await;

        let err = api.adjust(body(hub, sku, "out", 1), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);

        let err = api.adjust(body(hub, sku, "IN", 0), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);

        let mut long = body(hub, sku, "IN", 1);
        long.note = Some("x".repeat(241));
        let err = api.adjust(long, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);

        let err = api
            .adjust(body(HubId::new(404), sku, "IN", 1), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        assert!(api.list_inventory(hub, None).await.unwrap().is_empty());
        let log = api.list_log(LogQuery::default(), None).await.unwrap();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn log_lists_newest_first_with_limit() {
        let (api, hub, sku) = seeded().await;
        for qty in 1..=5 {
            api.adjust(body(hub, sku, "IN", qty), None).await.unwrap();
        }

        let query = LogQuery {
            hub_id: Some(hub),
            sku_id: None,
            limit: Some(RawLimit::Text("2".to_string())),
        };
        let log = api.list_log(query, None).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].delta, 5);
        assert_eq!(log[0].after_qty, 15);
        assert_eq!(log[1].delta, 4);
        assert_eq!(log[0].direction, Direction::In);

        let query = LogQuery {
            limit: Some(RawLimit::Text("lots".to_string())),
            ..Default::default()
        };
        assert_eq!(api.list_log(query, None).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn caller_becomes_the_actor_and_scope_is_enforced() {
        let (api, hub, sku) = seeded().await;
        let other = api.register_hub(NewHub::new("DEL", "Delhi")).await.unwrap();
        let caller = manager(vec![hub]);

        api.adjust(body(hub, sku, "IN", 3), Some(&caller))
            .await
            .unwrap();
        let own = LogQuery {
            hub_id: Some(hub),
            ..Default::default()
        };
        let log = api.list_log(own, Some(&caller)).await;
        assert_eq!(log.unwrap()[0].actor, Some(caller.principal_id()));

        let err = api
            .list_log(LogQuery::default(), Some(&caller))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let err = api
            .adjust(body(other.id, sku, "IN", 3), Some(&caller))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        assert!(!err.retryable);
    }

    #[tokio::test]
    async fn supplier_may_list_stock_but_not_adjust() {
        let (api, hub, sku) = seeded().await;
        let supplier = CallerContext::new(ActorId::new(), vec!["supplier".to_string()]);

        assert!(api.list_inventory(hub, Some(&supplier)).await.is_ok());
        let err = api
            .adjust(body(hub, sku, "IN", 1), Some(&supplier))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_sum_and_verify() {
        let (api, hub, sku) = seeded().await;
        let api = Arc::new(api);

        let mut handles = Vec::new();
        for _ in 0..40 {
            let api = Arc::clone(&api);
            handles.push(tokio::spawn(async move {
                api.adjust(body(hub, sku, "IN", 1), None).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let rec = api.verify(hub, sku).await.unwrap();
        assert_eq!(rec.recorded, 40);
        assert!(rec.is_balanced());
    }
}

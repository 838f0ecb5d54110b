use std::sync::Arc;

use stocktrail_events::EventBus;
use stocktrail_infra::config::AppConfig;
use stocktrail_infra::event_store::JsonFileEventStore;
use stocktrail_infra::handlers::StockCache;
use stocktrail_infra::read_model::JsonFileReadModel;
use stocktrail_infra::InventoryService;
use stocktrail_inventory::InventoryEvent;

/// The production service: file-backed event store and read model.
pub type AppService = InventoryService<JsonFileEventStore, JsonFileReadModel>;

/// Wire the durable stores, bus, and cache into the service.
pub fn build_services(config: &AppConfig) -> anyhow::Result<Arc<AppService>> {
    let event_store = Arc::new(JsonFileEventStore::new(config.events_dir())?);
    let read_model = Arc::new(JsonFileReadModel::new(config.read_models_dir())?);
    let event_bus: Arc<EventBus<InventoryEvent>> = Arc::new(EventBus::new());
    let cache: Arc<StockCache> = Arc::new(StockCache::new(config.cache_ttl, config.cache_max_size));

    tracing::info!(data_dir = %config.data_dir.display(), "service wired");

    Ok(Arc::new(InventoryService::new(
        event_store,
        read_model,
        event_bus,
        cache,
    )))
}

use crate::config::Config;
use crate::storage::ObjectStore;
use crate::warehouse::Warehouse;

/// Shared service dependencies: the config snapshot, the warehouse pool and
/// the object store. Built once at process start and handed to every
/// request handler through an `Extension<Arc<AppState>>` layer.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub warehouse: Warehouse,
    pub store: ObjectStore,
}

impl AppState {
    pub fn new(config: Config, warehouse: Warehouse, store: ObjectStore) -> Self {
        Self {
            config,
            warehouse,
            store,
        }
    }
}

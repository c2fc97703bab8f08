// paysync-server/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::NotificationGateway;
use crate::store::{CatalogStore, OrderStore};
use paysync_flow::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub orders: Arc<dyn OrderStore>,
  pub catalog: Arc<dyn CatalogStore>,
  pub notifier: Arc<dyn NotificationGateway>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the collaborators together and registers every pipeline.
  pub fn new(
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    notifier: Arc<dyn NotificationGateway>,
    config: Arc<AppConfig>,
  ) -> Self {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    pipelines::register_all_pipelines(&flows);
    Self {
      orders,
      catalog,
      notifier,
      flows,
      config,
    }
  }
}

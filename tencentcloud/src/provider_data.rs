//! Provider data structure passed to resources and data sources

use crate::api::CloudApi;
use crate::reconcile::ReconcilerConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct TencentCloudProviderData {
    pub client: Arc<dyn CloudApi>,
    pub reconciler_config: ReconcilerConfig,
}

impl TencentCloudProviderData {
    pub fn new(client: impl CloudApi + 'static) -> Self {
        Self {
            client: Arc::new(client),
            reconciler_config: ReconcilerConfig::default(),
        }
    }

    pub fn with_config(mut self, reconciler_config: ReconcilerConfig) -> Self {
        self.reconciler_config = reconciler_config;
        self
    }
}

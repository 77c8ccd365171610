use crate::hardware::VirtualPanel;
use crate::service::ServiceHandle;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: ServiceHandle,
    /// Button edges posted over HTTP are injected here
    pub panel: Arc<VirtualPanel>,
}

impl AppState {
    pub fn new(service: ServiceHandle, panel: Arc<VirtualPanel>) -> Self {
        Self { service, panel }
    }
}

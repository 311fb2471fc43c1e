//! Application state shared across handlers

use std::sync::Arc;

use clinicdesk_receipts::ReceiptService;
use clinicdesk_sharing::SharePublisher;
use clinicdesk_store::Store;
use clinicdesk_visits::VisitService;

use crate::guard::AccessGuard;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Backing store, exposed for seeding and the public kiosk read
    pub store: Store,
    pub visits: VisitService,
    pub receipts: ReceiptService,
    pub sharing: SharePublisher,
    /// Resolves the caller identity for authenticated routes
    pub guard: Arc<dyn AccessGuard>,
}

impl AppState {
    /// Wire all services over one store
    pub fn new(store: Store, guard: Arc<dyn AccessGuard>) -> Self {
        Self {
            visits: VisitService::new(store.clone()),
            receipts: ReceiptService::new(store.clone()),
            sharing: SharePublisher::new(store.clone()),
            store,
            guard,
        }
    }
}

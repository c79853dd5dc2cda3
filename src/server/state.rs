use crate::location::LocationService;
use std::sync::Arc;

pub struct AppState {
    pub service: Arc<LocationService>,
}

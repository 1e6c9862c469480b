use std::sync::Arc;

use crate::domain::ports::inbound::TimeTrackingService;

#[derive(Clone)]
pub struct AppState {
    pub time_tracking: Arc<dyn TimeTrackingService>,
}

impl AppState {
    pub fn new(time_tracking: Arc<dyn TimeTrackingService>) -> Self {
        Self { time_tracking }
    }
}

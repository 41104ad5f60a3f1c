// Application state for HTTP handlers
use tokio::sync::broadcast;

use crate::application::dashboard_state::SharedDashboard;
use crate::domain::dashboard::DashboardSnapshot;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: SharedDashboard,
    pub updates: broadcast::Sender<DashboardSnapshot>,
}

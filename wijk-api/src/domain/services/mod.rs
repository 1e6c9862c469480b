pub mod aggregation;
mod edit_window;
mod notifier;
mod overlap;
mod session;
mod time_tracking;

pub use edit_window::{EditWindowPolicy, DEFAULT_EDIT_WINDOW_DAYS};
pub use notifier::SessionNotifier;
pub use overlap::OverlapValidator;
pub use session::SessionManager;
pub use time_tracking::{TimeTrackingServiceImpl, TrackingRules};

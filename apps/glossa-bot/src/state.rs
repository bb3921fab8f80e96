use crate::api_client::ApiClient;
use crate::config::Config;
use crate::services::first_touch::FirstTouchTracker;
use crate::services::logging_service::LoggingService;
use crate::services::pay_service::PayService;

/// Process-wide context, constructed once at startup and handed to both
/// the bot dispatcher and the HTTP router. No ambient globals: whatever a
/// handler needs, it gets from here.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub first_touch: FirstTouchTracker,
    pub pay_service: PayService,
    pub channel_log: LoggingService,
}

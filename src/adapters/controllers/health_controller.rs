use tracing::debug;

pub struct HealthController;

impl HealthController {
    /// Liveness check
    /// GET /
    pub async fn liveness() -> &'static str {
        debug!("Liveness check requested");
        "Backend is running"
    }
}

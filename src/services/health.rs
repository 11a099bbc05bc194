use std::fmt;

/// Service health status
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceHealth {
    Healthy,
    /// Running with reduced capacity, e.g. some endpoints down
    Degraded(String),
    Unhealthy(String),
    /// Registered but its tasks are not running yet
    Starting,
}

impl fmt::Display for ServiceHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceHealth::Healthy => write!(f, "healthy"),
            ServiceHealth::Degraded(reason) => write!(f, "degraded ({})", reason),
            ServiceHealth::Unhealthy(reason) => write!(f, "unhealthy ({})", reason),
            ServiceHealth::Starting => write!(f, "starting"),
        }
    }
}

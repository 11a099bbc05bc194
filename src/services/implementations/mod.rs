pub mod health_monitor_service;
pub mod ingestion_service;

pub use health_monitor_service::HealthMonitorService;
pub use ingestion_service::IngestionService;

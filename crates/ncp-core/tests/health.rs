use serde_json::json;

use ncp_core::health::{ComponentStatus, SystemHealth};

#[test]
fn health_report_reads_the_wire_shape() {
    let health: SystemHealth = serde_json::from_value(json!({
        "health": {
            "backend": { "status": "healthy", "message": "Backend API operational" },
            "storage": { "status": "healthy", "message": "Storage connected (s3)" },
            "claude": { "status": "healthy", "message": "Configured (active)" },
            "gemini": { "status": "error", "message": "Not configured" },
            "metrics": { "avgResponseTime": 1850, "successRate": 92.5, "totalRequests": 40 }
        },
        "errorLogs": [{
            "requestId": "1b4e28ba-2fa1-4d3b-a3f5-ef19b5a7633b",
            "timestamp": "2025-03-15T09:30:05Z",
            "step": "select_diagnosis",
            "message": "model timed out"
        }],
        "systemInfo": { "environment": "production", "version": "0.1.0", "uptime": "2d 5h 7m" }
    }))
    .unwrap();

    assert!(health.health.backend.is_healthy());
    assert!(!health.health.gemini.is_healthy());
    assert_eq!(health.health.metrics.total_requests, 40);
    assert_eq!(health.error_logs[0].step, "select_diagnosis");
    assert_eq!(health.system_info.uptime, "2d 5h 7m");
}

#[test]
fn component_status_constructors() {
    let value = serde_json::to_value(ComponentStatus::error("Storage error: timeout")).unwrap();
    assert_eq!(value, json!({ "status": "error", "message": "Storage error: timeout" }));
    assert!(ComponentStatus::healthy("ok").is_healthy());
}

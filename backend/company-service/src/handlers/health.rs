/// Health check endpoints (unauthenticated)
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

use crate::services::CompanyService;

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

pub async fn health_summary() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "company-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

/// Ready when the company store answers a count query.
pub async fn readiness_check(service: web::Data<CompanyService>) -> HttpResponse {
    let start = Instant::now();
    let result = service.count().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (ready, check) = match result {
        Ok(count) => (
            true,
            ComponentCheck {
                status: ComponentStatus::Healthy,
                message: format!("{} companies stored", count),
                latency_ms,
            },
        ),
        Err(e) => {
            tracing::error!("Readiness check failed: {}", e);
            (
                false,
                ComponentCheck {
                    status: ComponentStatus::Unhealthy,
                    message: "Company repository unavailable".to_string(),
                    latency_ms,
                },
            )
        }
    };

    let status = check.status.clone();
    let mut checks = HashMap::new();
    checks.insert("repository".to_string(), check);

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

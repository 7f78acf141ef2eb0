use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, TextEncoder};
use std::rc::Rc;
use std::time::Instant;

/// Prometheus Metrics Middleware
///
/// Requests are labelled by route pattern (`/api/companies/{id}`) rather than
/// raw path so that ids don't blow up label cardinality. Handler errors are
/// counted with the status their `ResponseError` maps to.
pub struct MetricsMiddleware;

lazy_static::lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests",
        &["method", "route", "status", "status_class"]
    ).unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = prometheus::register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latency",
        &["method", "route", "status_class"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = prometheus::register_int_gauge_vec!(
        "http_requests_in_flight",
        "HTTP requests currently being served",
        &["method", "route"]
    ).unwrap();
}

const UNMATCHED_ROUTE: &str = "unmatched";

/// `"2xx"`, `"4xx"`, ...
fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

/// Holds the in-flight gauge up until dropped, including on cancellation.
struct InFlight(IntGauge);

impl InFlight {
    fn start(method: &str, route: &str) -> Self {
        let gauge = HTTP_REQUESTS_IN_FLIGHT.with_label_values(&[method, route]);
        gauge.inc();
        Self(gauge)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.dec();
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let start = Instant::now();
        let method = req.method().to_string();
        let route = req
            .match_pattern()
            .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

        Box::pin(async move {
            let in_flight = InFlight::start(&method, &route);
            let result = service.call(req).await;
            drop(in_flight);

            let status = match &result {
                Ok(res) => res.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            let class = status_class(status);

            HTTP_REQUESTS_TOTAL
                .with_label_values(&[&method, &route, status.as_str(), class])
                .inc();
            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[&method, &route, class])
                .observe(start.elapsed().as_secs_f64());

            result
        })
    }
}

/// Prometheus text exposition of the default registry.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    async fn fails() -> Result<HttpResponse, Error> {
        Err(actix_web::error::ErrorNotFound("gone"))
    }

    #[actix_web::test]
    async fn test_requests_counted_by_route_pattern() {
        let app = test::init_service(
            App::new()
                .wrap(MetricsMiddleware)
                .route("/things/{id}", web::get().to(ok))
                .route("/metrics", web::get().to(serve_metrics)),
        )
        .await;

        let before = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/things/{id}", "200", "2xx"])
            .get();

        for id in ["a", "b"] {
            let req = test::TestRequest::get().uri(&format!("/things/{}", id)).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 200);
        }

        let after = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/things/{id}", "200", "2xx"])
            .get();
        assert_eq!(after - before, 2);
        assert_eq!(
            HTTP_REQUESTS_IN_FLIGHT
                .with_label_values(&["GET", "/things/{id}"])
                .get(),
            0
        );

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("http_requests_total"));
        assert!(text.contains("http_requests_in_flight"));
    }

    #[actix_web::test]
    async fn test_handler_errors_counted_with_their_status() {
        let app = test::init_service(
            App::new()
                .wrap(MetricsMiddleware)
                .route("/broken", web::get().to(fails)),
        )
        .await;

        let labels = ["GET", "/broken", "404", "4xx"];
        let before = HTTP_REQUESTS_TOTAL.with_label_values(&labels).get();

        let req = test::TestRequest::get().uri("/broken").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        assert_eq!(HTTP_REQUESTS_TOTAL.with_label_values(&labels).get() - before, 1);
    }

    #[::core::prelude::v1::test]
    fn test_status_class() {
        assert_eq!(status_class(StatusCode::OK), "2xx");
        assert_eq!(status_class(StatusCode::CREATED), "2xx");
        assert_eq!(status_class(StatusCode::FORBIDDEN), "4xx");
        assert_eq!(status_class(StatusCode::INTERNAL_SERVER_ERROR), "5xx");
    }
}

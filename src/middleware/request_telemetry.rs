use std::rc::Rc;
use std::time::Instant;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue, USER_AGENT};
use actix_web::Error;
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::debug;
use uuid::Uuid;

use crate::telemetry::{LogLevel, Telemetry};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags each response with a fresh request id and reports it to telemetry
pub struct RequestTelemetry {
    telemetry: Telemetry,
}

impl RequestTelemetry {
    pub fn new(telemetry: Telemetry) -> Self {
        Self { telemetry }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestTelemetry
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestTelemetryMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestTelemetryMiddleware {
            service: Rc::new(service),
            telemetry: self.telemetry.clone(),
        })
    }
}

pub struct RequestTelemetryMiddleware<S> {
    service: Rc<S>,
    telemetry: Telemetry,
}

impl<S, B> Service<ServiceRequest> for RequestTelemetryMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let telemetry = self.telemetry.clone();

        let request_id = Uuid::new_v4().to_string();
        let path = req.path().to_owned();
        let method = req.method().clone();
        let user_agent = req
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let started = Instant::now();

        debug!("[{}] Processing request: {} {}", request_id, method, path);

        Box::pin(async move {
            let mut res = service.call(req).await?;
            let status = res.status();

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            let level = if status.is_server_error() {
                LogLevel::Error
            } else if status.is_client_error() {
                LogLevel::Warn
            } else {
                LogLevel::Info
            };
            let elapsed = started.elapsed().as_millis();

            debug!(
                "[{}] Response: {} {} - status: {} in {}ms",
                request_id, method, path, status, elapsed
            );
            telemetry.emit_for(
                level,
                "middleware",
                format!(
                    "{} {} -> {} in {}ms (request {})",
                    method, path, status.as_u16(), elapsed, request_id
                ),
                user_agent,
            );

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn test_sets_request_id_header() {
        let app = test::init_service(
            App::new()
                .wrap(RequestTelemetry::new(Telemetry::disabled()))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let first = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let second = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        let first_id = first.headers().get(REQUEST_ID_HEADER).unwrap();
        let second_id = second.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(first_id.to_str().unwrap()).is_ok());
        assert_ne!(first_id, second_id);
    }
}

mod request_telemetry;

pub use request_telemetry::RequestTelemetry;

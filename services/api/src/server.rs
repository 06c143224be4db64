use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAppointmentRepository, InMemoryHospitalDirectory};
use crate::routes::with_appointment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bloodlink::config::AppConfig;
use bloodlink::error::AppError;
use bloodlink::telemetry;
use bloodlink::workflows::appointments::{AppointmentService, SystemClock};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let hospitals = if config.storage.seed_demo_data {
        InMemoryHospitalDirectory::seeded()
    } else {
        InMemoryHospitalDirectory::default()
    };
    if hospitals.is_empty() {
        warn!("hospital directory is empty; every booking will be rejected");
    }

    let repository = Arc::new(InMemoryAppointmentRepository::default());
    let appointment_service = Arc::new(AppointmentService::new(
        repository,
        Arc::new(hospitals),
        Arc::new(SystemClock),
    ));

    let app = with_appointment_routes(appointment_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "blood donation booking service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

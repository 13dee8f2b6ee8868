use crate::configuration::{ApplicationSettings, Settings};
use crate::flow::{Clock, Collaborators, FlowRegistry, SystemClock, TracingObserver};
use crate::lead_sink::get_lead_sink;
use crate::otp_client::get_otp_services;
use crate::routes::main_route;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let (issuer, verifier) = get_otp_services(&configuration.otp, clock.clone())?;
        let sink = get_lead_sink(&configuration.lead_sink, &configuration.database)?;
        let registry = FlowRegistry::new(
            Collaborators::new(issuer, verifier, sink),
            configuration.otp.policy(),
            clock,
            Arc::new(TracingObserver),
            chrono::Duration::minutes(configuration.application.flow_ttl_minutes),
        );
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on {}:{}", configuration.application.host, port);
        let server = run(listener, registry, configuration.application)?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn run(
    listener: TcpListener,
    registry: FlowRegistry,
    application: ApplicationSettings,
) -> Result<Server, anyhow::Error> {
    let registry = web::Data::new(registry);
    let allowed_origins = Arc::new(application.allowed_origins);
    let server = HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header()
            .max_age(3600);
        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .app_data(registry.clone())
            .configure(main_route)
    })
    .workers(application.workers)
    .listen(listener)?
    .run();

    Ok(server)
}

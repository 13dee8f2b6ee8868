use lead_capture::commands::run_custom_commands;
use lead_capture::configuration::get_configuration;
use lead_capture::startup::Application;
use lead_capture::telemetry::{get_otlp_tracer, get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let configuration = get_configuration()?;
    let tracer = configuration
        .telemetry
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| get_otlp_tracer("lead-capture", endpoint))
        .transpose()?;
    let subscriber = get_subscriber(
        configuration.telemetry.log_level.clone(),
        tracer,
        std::io::stdout,
    );
    init_subscriber(subscriber)?;

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        run_custom_commands(args, &configuration).await?;
    } else {
        let application = Application::build(configuration).await?;
        application.run_until_stopped().await?;
    }
    Ok(())
}

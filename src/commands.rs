use crate::configuration::Settings;
use crate::database::run_migrations;

#[tracing::instrument(name = "Run custom command", skip(configuration))]
pub async fn run_custom_commands(
    args: Vec<String>,
    configuration: &Settings,
) -> Result<(), anyhow::Error> {
    if args.len() < 2 {
        eprintln!("Invalid command. Please provide a valid command.");
        return Ok(());
    }
    let command = args[1].as_str();

    match command {
        "migrate" => {
            run_migrations(&configuration.database).await?;
        }
        _ => {
            eprintln!("Unknown command: {}. Please use a valid command.", command);
        }
    }

    Ok(())
}

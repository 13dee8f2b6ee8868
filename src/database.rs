use crate::configuration::DatabaseSettings;
use sqlx::{postgres::PgPoolOptions, Connection, Executor, PgConnection, PgPool};

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(
            configuration.acquire_timeout,
        ))
        .max_connections(configuration.max_connections)
        .connect_lazy_with(configuration.with_db())
}

#[tracing::instrument(name = "Create Database", skip(config), fields(database = %config.name))]
pub async fn create_database(config: &DatabaseSettings) -> Result<(), sqlx::Error> {
    let mut connection = PgConnection::connect_with(&config.without_db()).await?;
    let db_count: Option<i64> =
        sqlx::query_scalar::<_, i64>("SELECT count(*) FROM pg_database WHERE datname = $1")
            .bind(&config.name)
            .fetch_optional(&mut connection)
            .await?;

    if db_count.unwrap_or(0) > 0 {
        tracing::info!("Database {} already exists.", &config.name);
    } else {
        connection
            .execute(format!(r#"CREATE DATABASE "{}";"#, config.name).as_str())
            .await?;
        tracing::info!("Database {} created.", &config.name);
    }
    Ok(())
}

#[tracing::instrument(name = "Migrate using Sqlx", skip(config))]
pub async fn run_migrations(config: &DatabaseSettings) -> Result<(), anyhow::Error> {
    create_database(config).await?;
    let connection_pool = PgPool::connect_with(config.with_db()).await?;
    sqlx::migrate!("./migrations").run(&connection_pool).await?;
    tracing::info!("Migrations applied");
    Ok(())
}

use crate::configuration::{DatabaseSettings, LeadSinkKind, LeadSinkSettings};
use crate::database::get_connection_pool;
use crate::errors::CommitError;
use crate::flow::LeadRecord;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use reqwest::Client;
use std::fmt::Write;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub reference: Option<String>,
}

#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn commit(&self, record: &LeadRecord) -> Result<Committed, CommitError>;
}

/// Posts leads to a spreadsheet web-app endpoint as a url-encoded form.
#[derive(Debug)]
pub struct SheetLeadSink {
    http_client: Client,
    sheet_url: String,
    timestamp_format: String,
}

impl SheetLeadSink {
    #[tracing::instrument]
    pub fn new(
        sheet_url: String,
        timestamp_format: String,
        timeout: std::time::Duration,
    ) -> Result<Self, anyhow::Error> {
        if StrftimeItems::new(&timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp_format));
        }
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            sheet_url,
            timestamp_format,
        })
    }
}

#[async_trait]
impl LeadSink for SheetLeadSink {
    #[tracing::instrument(name = "Commit lead to sheet", skip(self, record), fields(flow_id = %record.flow_id))]
    async fn commit(&self, record: &LeadRecord) -> Result<Committed, CommitError> {
        let mut timestamp = String::new();
        write!(
            timestamp,
            "{}",
            record.submitted_at.format(&self.timestamp_format)
        )
        .map_err(|_| {
            CommitError::UnexpectedError(anyhow!(
                "Failed to format timestamp with {}",
                self.timestamp_format
            ))
        })?;
        let form = [
            ("Name", record.name.as_str()),
            ("Email", record.email.as_str()),
            ("Phone", record.phone.as_str()),
            ("Concern", record.concern.as_str()),
            ("Timestamp", timestamp.as_str()),
        ];
        let response = self
            .http_client
            .post(&self.sheet_url)
            .form(&form)
            .send()
            .await
            .map_err(|err| CommitError::UnexpectedError(anyhow!("Request error: {}", err)))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Lead saved to sheet");
            Ok(Committed { reference: None })
        } else {
            Err(CommitError::Rejected(format!(
                "Sheet endpoint responded with {}",
                status
            )))
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgLeadSink {
    pool: PgPool,
}

impl PgLeadSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadSink for PgLeadSink {
    #[tracing::instrument(name = "Commit lead to database", skip(self, record), fields(flow_id = %record.flow_id))]
    async fn commit(&self, record: &LeadRecord) -> Result<Committed, CommitError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO lead (id, flow_id, name, email, phone, concern, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(id)
        .bind(record.flow_id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.concern)
        .bind(record.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            CommitError::DatabaseError(
                "A database failure occurred while saving the lead".to_string(),
                anyhow::Error::new(e),
            )
        })?;
        Ok(Committed {
            reference: Some(id.to_string()),
        })
    }
}

pub fn get_lead_sink(
    settings: &LeadSinkSettings,
    database: &DatabaseSettings,
) -> Result<Arc<dyn LeadSink>, anyhow::Error> {
    match settings.kind {
        LeadSinkKind::Sheet => Ok(Arc::new(SheetLeadSink::new(
            settings.sheet_url.clone(),
            settings.timestamp_format.clone(),
            settings.timeout(),
        )?)),
        LeadSinkKind::Postgres => Ok(Arc::new(PgLeadSink::new(get_connection_pool(database)))),
    }
}

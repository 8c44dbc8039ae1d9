//! Configuration validation.

use super::{Config, DatabaseConfig};
use crate::error::{Result, SyncError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_database("source", &config.source)?;
    validate_database("staging", &config.staging)?;

    let jp = &config.jplatform;
    if jp.base_url.is_empty() {
        return Err(SyncError::Config("jplatform.base_url is required".into()));
    }
    if !(jp.base_url.starts_with("http://") || jp.base_url.starts_with("https://")) {
        return Err(SyncError::Config(format!(
            "jplatform.base_url must start with http:// or https://, got '{}'",
            jp.base_url
        )));
    }
    if jp.username.is_empty() {
        return Err(SyncError::Config("jplatform.username is required".into()));
    }
    if !is_numeric(&jp.firm_no) {
        return Err(SyncError::Config(format!(
            "jplatform.firm_no must be numeric, got '{}'",
            jp.firm_no
        )));
    }
    if !is_numeric(&jp.period_no) {
        return Err(SyncError::Config(format!(
            "jplatform.period_no must be numeric, got '{}'",
            jp.period_no
        )));
    }
    if jp.timeout_seconds == 0 {
        return Err(SyncError::Config(
            "jplatform.timeout_seconds must be at least 1".into(),
        ));
    }
    if jp.token_ttl_minutes < 1 {
        return Err(SyncError::Config(
            "jplatform.token_ttl_minutes must be at least 1".into(),
        ));
    }
    if !is_utc_offset(&jp.utc_offset) {
        return Err(SyncError::Config(format!(
            "jplatform.utc_offset must look like +03:00, got '{}'",
            jp.utc_offset
        )));
    }

    if config.sync.interval_seconds == 0 {
        return Err(SyncError::Config(
            "sync.interval_seconds must be at least 1".into(),
        ));
    }
    if config.sync.batch_size == 0 {
        return Err(SyncError::Config("sync.batch_size must be at least 1".into()));
    }
    if config.sync.import_batch_size == 0 {
        return Err(SyncError::Config(
            "sync.import_batch_size must be at least 1".into(),
        ));
    }

    if config.order.payment_plan_procedure.is_empty()
        || !is_identifier(&config.order.payment_plan_procedure)
    {
        return Err(SyncError::Config(format!(
            "order.payment_plan_procedure is not a valid procedure name: '{}'",
            config.order.payment_plan_procedure
        )));
    }

    if let Some(table) = &config.invoice.billing_table {
        if table.is_empty() || !is_identifier(table) {
            return Err(SyncError::Config(format!(
                "invoice.billing_table is not a valid table name: '{}'",
                table
            )));
        }
    }

    Ok(())
}

fn validate_database(section: &str, db: &DatabaseConfig) -> Result<()> {
    if db.host.is_empty() {
        return Err(SyncError::Config(format!("{section}.host is required")));
    }
    if db.database.is_empty() {
        return Err(SyncError::Config(format!("{section}.database is required")));
    }
    if db.user.is_empty() {
        return Err(SyncError::Config(format!("{section}.user is required")));
    }
    if db.max_connections == 0 {
        return Err(SyncError::Config(format!(
            "{section}.max_connections must be at least 1"
        )));
    }
    Ok(())
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_utc_offset(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 6
        && (b[0] == b'+' || b[0] == b'-')
        && b[1].is_ascii_digit()
        && b[2].is_ascii_digit()
        && b[3] == b':'
        && b[4].is_ascii_digit()
        && b[5].is_ascii_digit()
}

/// Plain or bracketed multipart SQL identifier (`dbo.T`, `[PUNTO].[dbo].[T]`).
fn is_identifier(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

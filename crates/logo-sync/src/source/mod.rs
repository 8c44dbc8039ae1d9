//! PUNTO database access.
//!
//! [`MssqlPool`] is a bb8 pool of tiberius clients shared by the PUNTO reader
//! and the staging store. [`SourceReader`] is the seam the pipelines use; the
//! production implementation is [`PuntoReader`].

mod punto;
mod types;

pub use punto::PuntoReader;
pub use types::*;

use crate::config::DatabaseConfig;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use chrono::NaiveDate;
use std::time::Duration;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::info;

/// Read and write-back operations against PUNTO.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Cash and cheque collections not yet transferred, oldest first.
    async fn pending_receipts(&self, limit: usize) -> Result<Vec<PuntoReceipt>>;

    /// Flag a collection as transferred under `batch`.
    async fn mark_receipt_transferred(&self, id: i64, batch: &str) -> Result<()>;

    /// Order headers not yet transferred, dated on or after `min_date`.
    async fn pending_orders(&self, limit: usize, min_date: NaiveDate) -> Result<Vec<PuntoOrder>>;

    /// Detail lines of the order whose `FIS_NO` is `fis_no`.
    async fn order_lines(&self, fis_no: &str) -> Result<Vec<PuntoOrderLine>>;

    /// Flag an order as transferred under `batch`.
    async fn mark_order_transferred(&self, id: i64, batch: &str) -> Result<()>;

    /// Virtual POS collections waiting for transfer.
    async fn pending_pos(&self, limit: usize) -> Result<Vec<PosReceipt>>;

    /// Flag a virtual POS collection as transferred.
    async fn mark_pos_transferred(&self, id: i64) -> Result<()>;

    /// Unbilled dispatch lines, ordered by customer, dispatch and line.
    async fn pending_dispatch_lines(&self) -> Result<Vec<DispatchLine>>;

    /// Point the stock lines `refs` in `table` at the new invoice.
    async fn mark_lines_billed(&self, table: &str, refs: &[i64], invoice_ref: i64) -> Result<()>;

    /// Round trip to the database.
    async fn ping(&self) -> Result<()>;
}

/// Connection manager for bb8 pool with tiberius.
#[derive(Clone)]
pub(crate) struct TiberiusConnectionManager {
    config: DatabaseConfig,
}

impl TiberiusConnectionManager {
    fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn build_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.config.host);
        config.port(self.config.port);
        config.database(&self.config.database);
        config.authentication(AuthMethod::sql_server(
            &self.config.user,
            &self.config.password,
        ));

        if encryption_disabled(&self.config.encrypt) {
            config.encryption(EncryptionLevel::NotSupported);
        } else {
            if self.config.trust_server_cert {
                config.trust_cert();
            }
            config.encryption(EncryptionLevel::Required);
        }

        config
    }
}

fn encryption_disabled(setting: &str) -> bool {
    matches!(
        setting.to_lowercase().as_str(),
        "false" | "no" | "0" | "disable"
    )
}

#[async_trait]
impl bb8::ManageConnection for TiberiusConnectionManager {
    type Connection = Client<Compat<TcpStream>>;
    type Error = tiberius::error::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let config = self.build_config();
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| tiberius::error::Error::Io {
                kind: e.kind(),
                message: e.to_string(),
            })?;

        tcp.set_nodelay(true).ok();

        Client::connect(config, tcp.compat_write()).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Pooled SQL Server connections for one database.
pub struct MssqlPool {
    pool: Pool<TiberiusConnectionManager>,
    label: String,
}

impl MssqlPool {
    /// Open a pool for `config` and probe it once. `label` names the
    /// database in logs and errors ("PUNTO", "staging").
    pub async fn connect(config: &DatabaseConfig, label: &str) -> Result<Self> {
        let manager = TiberiusConnectionManager::new(config.clone());
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(1))
            .connection_timeout(Duration::from_secs(30))
            .build(manager)
            .await
            .map_err(|e| SyncError::pool(e.to_string(), format!("creating {label} pool")))?;

        let this = Self {
            pool,
            label: label.to_string(),
        };
        this.ping().await?;

        info!(
            "Connected to MSSQL ({}): {}:{}/{} (pool_size={})",
            label, config.host, config.port, config.database, config.max_connections
        );

        Ok(this)
    }

    /// Get a pooled connection.
    pub(crate) async fn get_client(
        &self,
    ) -> Result<PooledConnection<'_, TiberiusConnectionManager>> {
        self.pool.get().await.map_err(|e| {
            SyncError::pool(e.to_string(), format!("getting {} connection", self.label))
        })
    }

    /// `SELECT 1` round trip.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.get_client().await?;
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }
}

//! MSSQL-backed staging store (`JPL_SyncQueue`, `JPL_SyncLog`).

use async_trait::async_trait;
use std::sync::Arc;
use tiberius::Row;
use tracing::debug;

use super::{EntityKind, LogLevel, QueueItem, StagingStore, SyncStatus};
use crate::error::{Result, SyncError};
use crate::source::MssqlPool;

const CREATE_QUEUE: &str = "
IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = 'JPL_SyncQueue' AND schema_id = SCHEMA_ID('dbo'))
BEGIN
    CREATE TABLE [dbo].[JPL_SyncQueue] (
        Id BIGINT IDENTITY(1,1) NOT NULL PRIMARY KEY,
        EntityType NVARCHAR(50) NOT NULL,
        EntityId NVARCHAR(100) NOT NULL,
        OperationType NVARCHAR(20) NOT NULL DEFAULT 'CREATE',
        Payload NVARCHAR(MAX),
        Status INT NOT NULL DEFAULT 0 CHECK (Status IN (0, 1, 2, 3)),
        RetryCount INT NOT NULL DEFAULT 0,
        ErrorMessage NVARCHAR(MAX),
        JplatformRef NVARCHAR(100),
        CreatedAt DATETIME2 NOT NULL DEFAULT GETDATE(),
        UpdatedAt DATETIME2,
        SyncedAt DATETIME2,
        CONSTRAINT UQ_JPL_SyncQueue_Entity UNIQUE (EntityType, EntityId)
    )
END";

const CREATE_QUEUE_INDEX: &str = "
IF NOT EXISTS (SELECT * FROM sys.indexes WHERE name = 'IX_JPL_SyncQueue_Type_Status' AND object_id = OBJECT_ID('[dbo].[JPL_SyncQueue]'))
BEGIN
    CREATE INDEX IX_JPL_SyncQueue_Type_Status
    ON [dbo].[JPL_SyncQueue](EntityType, Status)
END";

const CREATE_LOG: &str = "
IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = 'JPL_SyncLog' AND schema_id = SCHEMA_ID('dbo'))
BEGIN
    CREATE TABLE [dbo].[JPL_SyncLog] (
        Id BIGINT IDENTITY(1,1) NOT NULL PRIMARY KEY,
        SyncQueueId BIGINT NULL,
        LogLevel NVARCHAR(10) NOT NULL,
        Message NVARCHAR(MAX) NOT NULL,
        RequestData NVARCHAR(MAX),
        ResponseData NVARCHAR(MAX),
        CreatedAt DATETIME2 NOT NULL DEFAULT GETDATE()
    )
END";

/// Staging store in the JGDB05 database.
pub struct MssqlStagingStore {
    pool: Arc<MssqlPool>,
    payment_plan_procedure: String,
}

impl MssqlStagingStore {
    /// `payment_plan_procedure` is called as `EXEC <name> @CustomerCode = …`.
    pub fn new(pool: Arc<MssqlPool>, payment_plan_procedure: impl Into<String>) -> Self {
        Self {
            pool,
            payment_plan_procedure: payment_plan_procedure.into(),
        }
    }

    fn queue_item_from_row(row: &Row) -> Result<QueueItem> {
        let entity_type: &str = row
            .get(1)
            .ok_or_else(|| SyncError::State("Queue row without EntityType".to_string()))?;
        Ok(QueueItem {
            id: row
                .get::<i64, _>(0)
                .ok_or_else(|| SyncError::State("Queue row without Id".to_string()))?,
            entity_type: entity_type.parse()?,
            entity_id: row.get::<&str, _>(2).unwrap_or_default().to_string(),
            operation_type: row.get::<&str, _>(3).unwrap_or_default().to_string(),
            payload: row.get::<&str, _>(4).map(str::to_string),
            retry_count: row.get::<i32, _>(5).unwrap_or(0),
        })
    }
}

#[async_trait]
impl StagingStore for MssqlStagingStore {
    async fn init_schema(&self) -> Result<()> {
        let mut conn = self.pool.get_client().await?;
        conn.execute(CREATE_QUEUE, &[]).await?;
        conn.execute(CREATE_QUEUE_INDEX, &[]).await?;
        conn.execute(CREATE_LOG, &[]).await?;
        debug!("Staging schema ready");
        Ok(())
    }

    async fn enqueue(&self, kind: EntityKind, entity_id: &str, payload: &str) -> Result<i64> {
        let mut conn = self.pool.get_client().await?;
        let sql = "
            MERGE [dbo].[JPL_SyncQueue] WITH (HOLDLOCK) AS target
            USING (SELECT @P1 AS EntityType, @P2 AS EntityId) AS source
            ON target.EntityType = source.EntityType AND target.EntityId = source.EntityId
            WHEN MATCHED THEN
                UPDATE SET
                    Payload = @P3,
                    Status = 0,
                    RetryCount = target.RetryCount + 1,
                    ErrorMessage = NULL,
                    UpdatedAt = GETDATE()
            WHEN NOT MATCHED THEN
                INSERT (EntityType, EntityId, OperationType, Payload, Status, RetryCount)
                VALUES (@P1, @P2, 'CREATE', @P3, 0, 0)
            OUTPUT inserted.Id;";

        let row = conn
            .query(sql, &[&kind.as_str(), &entity_id, &payload])
            .await?
            .into_row()
            .await?;

        row.and_then(|r| r.get::<i64, _>(0)).ok_or_else(|| {
            SyncError::State(format!("Enqueue of {} {} returned no id", kind, entity_id))
        })
    }

    async fn pending(&self, kind: EntityKind, limit: usize) -> Result<Vec<QueueItem>> {
        let mut conn = self.pool.get_client().await?;
        let sql = "
            SELECT TOP (@P1) Id, EntityType, EntityId, OperationType, Payload, RetryCount
            FROM [dbo].[JPL_SyncQueue]
            WHERE EntityType = @P2 AND Status = 0
            ORDER BY Id";

        let rows = conn
            .query(sql, &[&(limit as i64), &kind.as_str()])
            .await?
            .into_first_result()
            .await?;

        rows.iter().map(Self::queue_item_from_row).collect()
    }

    async fn update_status(
        &self,
        id: i64,
        status: SyncStatus,
        error: Option<&str>,
        reference: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.pool.get_client().await?;
        let sql = "
            UPDATE [dbo].[JPL_SyncQueue]
            SET Status = @P2,
                ErrorMessage = @P3,
                JplatformRef = @P4,
                UpdatedAt = GETDATE(),
                SyncedAt = CASE WHEN @P2 = 2 THEN GETDATE() ELSE SyncedAt END
            WHERE Id = @P1";

        let error = error.map(str::to_string);
        let reference = reference.map(str::to_string);
        conn.execute(sql, &[&id, &status.as_i32(), &error, &reference])
            .await?;
        Ok(())
    }

    async fn log(
        &self,
        queue_id: Option<i64>,
        level: LogLevel,
        message: &str,
        request: Option<&str>,
        response: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.pool.get_client().await?;
        let sql = "
            INSERT INTO [dbo].[JPL_SyncLog] (SyncQueueId, LogLevel, Message, RequestData, ResponseData)
            VALUES (@P1, @P2, @P3, @P4, @P5)";

        let request = request.map(str::to_string);
        let response = response.map(str::to_string);
        conn.execute(
            sql,
            &[&queue_id, &level.as_str(), &message, &request, &response],
        )
        .await?;
        Ok(())
    }

    async fn payment_plan_for_customer(&self, customer_code: &str) -> Result<Option<String>> {
        let mut conn = self.pool.get_client().await?;
        let sql = format!("EXEC {} @CustomerCode = @P1", self.payment_plan_procedure);
        let row = conn.query(sql, &[&customer_code]).await?.into_row().await?;
        Ok(row
            .and_then(|r| r.get::<&str, _>(0).map(str::to_string))
            .filter(|plan| !plan.trim().is_empty()))
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    fn backend_type(&self) -> &'static str {
        "mssql"
    }
}

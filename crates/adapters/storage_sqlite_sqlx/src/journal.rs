//! `SQLite` implementation of [`Journal`].
//!
//! Measurements and device actions are stored column by column; decision
//! records keep their snapshot, action and result as JSON documents.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use mistguard_app::ports::Journal;
use mistguard_domain::decision::{DecisionRecord, DecisionType};
use mistguard_domain::device_action::{DeviceActionRecord, SwitchAction};
use mistguard_domain::error::MistguardError;
use mistguard_domain::id::{DecisionId, DeviceKey, EventId, RoomId};
use mistguard_domain::reading::Measurement;

use crate::codec::{decode_err, decode_time, encode_limit, encode_time};
use crate::error::StorageError;

struct MeasurementRow(Measurement);

impl<'r> FromRow<'r, SqliteRow> for MeasurementRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let room_id: String = row.try_get("room_id")?;
        let event_id: Option<uuid::Uuid> = row.try_get("event_id")?;
        let timestamp: String = row.try_get("timestamp")?;

        Ok(Self(Measurement {
            room_id: RoomId::new(room_id).map_err(decode_err)?,
            event_id: event_id.map(EventId::from_uuid),
            timestamp: decode_time(&timestamp)?,
            temperature: row.try_get("temperature")?,
            humidity: row.try_get("humidity")?,
            dew_point: row.try_get("dew_point")?,
        }))
    }
}

struct ActionRow(DeviceActionRecord);

impl<'r> FromRow<'r, SqliteRow> for ActionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let timestamp: String = row.try_get("timestamp")?;
        let room_id: String = row.try_get("room_id")?;
        let device_id: String = row.try_get("device_id")?;
        let action: String = row.try_get("action")?;
        let result_json: String = row.try_get("result")?;

        Ok(Self(DeviceActionRecord {
            timestamp: decode_time(&timestamp)?,
            room_id: RoomId::new(room_id).map_err(decode_err)?,
            device_id: DeviceKey::new(device_id).map_err(decode_err)?,
            action: action.parse::<SwitchAction>().map_err(decode_err)?,
            reason: row.try_get("reason")?,
            result: serde_json::from_str(&result_json).map_err(decode_err)?,
        }))
    }
}

struct DecisionRow(DecisionRecord);

impl<'r> FromRow<'r, SqliteRow> for DecisionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let timestamp: String = row.try_get("timestamp")?;
        let decision_type: String = row.try_get("decision_type")?;
        let snapshot_json: String = row.try_get("input_snapshot")?;
        let action_json: String = row.try_get("predicted_action")?;
        let result_json: String = row.try_get("result")?;

        Ok(Self(DecisionRecord {
            id: DecisionId::from_uuid(id),
            timestamp: decode_time(&timestamp)?,
            decision_type: decision_type.parse::<DecisionType>().map_err(decode_err)?,
            input_snapshot: serde_json::from_str(&snapshot_json).map_err(decode_err)?,
            predicted_action: serde_json::from_str(&action_json).map_err(decode_err)?,
            confidence: row.try_get("confidence")?,
            executed: row.try_get("executed")?,
            result: serde_json::from_str(&result_json).map_err(decode_err)?,
        }))
    }
}

const INSERT_MEASUREMENT: &str = r"
    INSERT INTO measurements (room_id, event_id, timestamp, temperature, humidity, dew_point)
    VALUES (?, ?, ?, ?, ?, ?)
";

const SELECT_MEASUREMENTS_BY_EVENT: &str = r"
    SELECT * FROM measurements
    WHERE event_id = ?
    ORDER BY timestamp ASC, id ASC
";

const INSERT_ACTION: &str = r"
    INSERT INTO device_actions (timestamp, room_id, device_id, action, reason, result)
    VALUES (?, ?, ?, ?, ?, ?)
";

const SELECT_LAST_ACTION: &str = r"
    SELECT * FROM device_actions
    WHERE device_id = ?
    ORDER BY id DESC
    LIMIT 1
";

const INSERT_DECISION: &str = r"
    INSERT INTO decision_records
        (id, timestamp, decision_type, input_snapshot,
         predicted_action, confidence, executed, result)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_RECENT_DECISIONS: &str = r"
    SELECT * FROM decision_records
    ORDER BY timestamp DESC, rowid DESC
    LIMIT ?
";

/// `SQLite`-backed journal.
pub struct SqliteJournal {
    pool: SqlitePool,
}

impl SqliteJournal {
    /// Create a new journal using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl Journal for SqliteJournal {
    async fn append_measurement(&self, measurement: Measurement) -> Result<(), MistguardError> {
        sqlx::query(INSERT_MEASUREMENT)
            .bind(measurement.room_id.as_str())
            .bind(measurement.event_id.map(EventId::as_uuid))
            .bind(encode_time(measurement.timestamp))
            .bind(measurement.temperature)
            .bind(measurement.humidity)
            .bind(measurement.dew_point)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn measurements_for_event(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Measurement>, MistguardError> {
        let rows: Vec<MeasurementRow> = sqlx::query_as(SELECT_MEASUREMENTS_BY_EVENT)
            .bind(event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn append_device_action(
        &self,
        record: DeviceActionRecord,
    ) -> Result<(), MistguardError> {
        let result_json = serde_json::to_string(&record.result).map_err(StorageError::from)?;

        sqlx::query(INSERT_ACTION)
            .bind(encode_time(record.timestamp))
            .bind(record.room_id.as_str())
            .bind(record.device_id.as_str())
            .bind(record.action.as_str())
            .bind(&record.reason)
            .bind(&result_json)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn last_device_action(
        &self,
        device_id: &DeviceKey,
    ) -> Result<Option<DeviceActionRecord>, MistguardError> {
        let row: Option<ActionRow> = sqlx::query_as(SELECT_LAST_ACTION)
            .bind(device_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|r| r.0))
    }

    async fn append_decision_record(&self, record: DecisionRecord) -> Result<(), MistguardError> {
        let snapshot_json =
            serde_json::to_string(&record.input_snapshot).map_err(StorageError::from)?;
        let action_json =
            serde_json::to_string(&record.predicted_action).map_err(StorageError::from)?;
        let result_json = serde_json::to_string(&record.result).map_err(StorageError::from)?;

        sqlx::query(INSERT_DECISION)
            .bind(record.id.as_uuid())
            .bind(encode_time(record.timestamp))
            .bind(record.decision_type.as_str())
            .bind(&snapshot_json)
            .bind(&action_json)
            .bind(record.confidence)
            .bind(record.executed)
            .bind(&result_json)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn recent_decisions(&self, limit: usize) -> Result<Vec<DecisionRecord>, MistguardError> {
        let rows: Vec<DecisionRow> = sqlx::query_as(SELECT_RECENT_DECISIONS)
            .bind(encode_limit(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

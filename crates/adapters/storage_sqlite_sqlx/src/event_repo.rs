//! `SQLite` implementation of [`BathroomEventRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use mistguard_app::ports::BathroomEventRepository;
use mistguard_domain::error::{MistguardError, NotFoundError};
use mistguard_domain::event::{BathroomEvent, EventTrigger};
use mistguard_domain::id::{EventId, RoomId};
use mistguard_domain::time::Timestamp;

use crate::codec::{decode_err, decode_time, decode_u64, encode_limit, encode_time, encode_u64};
use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(BathroomEvent);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let room_id: String = row.try_get("room_id")?;
        let trigger: String = row.try_get("trigger")?;
        let start_time: String = row.try_get("start_time")?;
        let end_time: Option<String> = row.try_get("end_time")?;
        let duration_secs: Option<i64> = row.try_get("duration_secs")?;

        Ok(Self(BathroomEvent {
            id: EventId::from_uuid(id),
            room_id: RoomId::new(room_id).map_err(decode_err)?,
            trigger: trigger.parse::<EventTrigger>().map_err(decode_err)?,
            start_time: decode_time(&start_time)?,
            end_time: end_time.as_deref().map(decode_time).transpose()?,
            baseline_humidity: row.try_get("baseline_humidity")?,
            peak_humidity: row.try_get("peak_humidity")?,
            peak_dew_point: row.try_get("peak_dew_point")?,
            duration_secs: duration_secs.map(decode_u64).transpose()?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO bathroom_events
        (id, room_id, trigger, start_time, end_time, baseline_humidity,
         peak_humidity, peak_dew_point, duration_secs)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const UPDATE_PEAK: &str = r"
    UPDATE bathroom_events
    SET peak_humidity = MAX(peak_humidity, ?),
        peak_dew_point = MAX(peak_dew_point, ?)
    WHERE id = ?
";

const CLOSE: &str = r"
    UPDATE bathroom_events
    SET end_time = ?,
        duration_secs = ?,
        peak_humidity = MAX(peak_humidity, ?),
        peak_dew_point = MAX(peak_dew_point, ?)
    WHERE id = ?
";

const SELECT_SINCE: &str = r"
    SELECT * FROM bathroom_events
    WHERE room_id = ? AND start_time >= ?
    ORDER BY start_time ASC
";

const SELECT_LATEST_OPEN: &str = r"
    SELECT * FROM bathroom_events
    WHERE room_id = ? AND end_time IS NULL
    ORDER BY start_time DESC
    LIMIT 1
";

const SELECT_RECENT: &str = r"
    SELECT * FROM bathroom_events
    WHERE room_id = ?
    ORDER BY start_time DESC
    LIMIT ?
";

/// `SQLite`-backed bathroom event repository.
pub struct SqliteBathroomEventRepository {
    pool: SqlitePool,
}

impl SqliteBathroomEventRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl BathroomEventRepository for SqliteBathroomEventRepository {
    async fn open_event(&self, event: BathroomEvent) -> Result<(), MistguardError> {
        sqlx::query(INSERT)
            .bind(event.id.as_uuid())
            .bind(event.room_id.as_str())
            .bind(event.trigger.as_str())
            .bind(encode_time(event.start_time))
            .bind(event.end_time.map(encode_time))
            .bind(event.baseline_humidity)
            .bind(event.peak_humidity)
            .bind(event.peak_dew_point)
            .bind(event.duration_secs.map(encode_u64))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn update_event_peak(
        &self,
        id: EventId,
        peak_humidity: f64,
        peak_dew_point: f64,
    ) -> Result<(), MistguardError> {
        sqlx::query(UPDATE_PEAK)
            .bind(peak_humidity)
            .bind(peak_dew_point)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn close_event(&self, event: BathroomEvent) -> Result<(), MistguardError> {
        let result = sqlx::query(CLOSE)
            .bind(event.end_time.map(encode_time))
            .bind(event.duration_secs.map(encode_u64))
            .bind(event.peak_humidity)
            .bind(event.peak_dew_point)
            .bind(event.id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "BathroomEvent",
                id: event.id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn get_events(
        &self,
        room_id: &RoomId,
        since: Timestamp,
    ) -> Result<Vec<BathroomEvent>, MistguardError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_SINCE)
            .bind(room_id.as_str())
            .bind(encode_time(since))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn latest_open_event(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<BathroomEvent>, MistguardError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_LATEST_OPEN)
            .bind(room_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn recent_events(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<BathroomEvent>, MistguardError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(room_id.as_str())
            .bind(encode_limit(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

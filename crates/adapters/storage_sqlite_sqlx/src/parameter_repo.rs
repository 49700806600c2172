//! `SQLite` implementation of [`ParameterRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use mistguard_app::ports::ParameterRepository;
use mistguard_domain::error::MistguardError;
use mistguard_domain::id::RoomId;
use mistguard_domain::learning::LearnedParameters;

use crate::codec::{decode_err, decode_time, decode_u64, encode_time, encode_u64};
use crate::error::StorageError;

struct Wrapper(LearnedParameters);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let room_id: String = row.try_get("room_id")?;
        let delay: i64 = row.try_get("dehumidifier_delay_secs")?;
        let learned_at: String = row.try_get("learned_at")?;
        let sample_count: i64 = row.try_get("sample_count")?;

        Ok(Self(LearnedParameters {
            room_id: RoomId::new(room_id).map_err(decode_err)?,
            humidity_threshold_high: row.try_get("humidity_threshold_high")?,
            humidity_threshold_low: row.try_get("humidity_threshold_low")?,
            dehumidifier_delay_secs: decode_u64(delay)?,
            learned_at: decode_time(&learned_at)?,
            confidence: row.try_get("confidence")?,
            sample_count: usize::try_from(sample_count).map_err(decode_err)?,
        }))
    }
}

const SELECT_BY_ROOM: &str = "SELECT * FROM learned_parameters WHERE room_id = ?";

const UPSERT: &str = r"
    INSERT INTO learned_parameters
        (room_id, humidity_threshold_high, humidity_threshold_low,
         dehumidifier_delay_secs, learned_at, confidence, sample_count)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (room_id) DO UPDATE SET
        humidity_threshold_high = excluded.humidity_threshold_high,
        humidity_threshold_low = excluded.humidity_threshold_low,
        dehumidifier_delay_secs = excluded.dehumidifier_delay_secs,
        learned_at = excluded.learned_at,
        confidence = excluded.confidence,
        sample_count = excluded.sample_count
";

/// `SQLite`-backed learned parameter repository.
pub struct SqliteParameterRepository {
    pool: SqlitePool,
}

impl SqliteParameterRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ParameterRepository for SqliteParameterRepository {
    async fn get_learned_parameters(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<LearnedParameters>, MistguardError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ROOM)
            .bind(room_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn save_learned_parameters(
        &self,
        params: LearnedParameters,
    ) -> Result<(), MistguardError> {
        sqlx::query(UPSERT)
            .bind(params.room_id.as_str())
            .bind(params.humidity_threshold_high)
            .bind(params.humidity_threshold_low)
            .bind(encode_u64(params.dehumidifier_delay_secs))
            .bind(encode_time(params.learned_at))
            .bind(params.confidence)
            .bind(i64::try_from(params.sample_count).unwrap_or(i64::MAX))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use chrono::{TimeZone, Utc};

    async fn setup() -> SqliteParameterRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteParameterRepository::new(db.pool().clone())
    }

    fn params(high: f64, confidence: f64) -> LearnedParameters {
        LearnedParameters {
            room_id: RoomId::new("bathroom").unwrap(),
            humidity_threshold_high: high,
            humidity_threshold_low: 60.0,
            dehumidifier_delay_secs: 1200,
            learned_at: Utc.with_ymd_and_hms(2026, 2, 1, 3, 0, 0).unwrap(),
            confidence,
            sample_count: 4,
        }
    }

    #[tokio::test]
    async fn should_return_none_before_anything_was_learned() {
        let repo = setup().await;
        let room = RoomId::new("bathroom").unwrap();
        assert!(repo.get_learned_parameters(&room).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_replace_parameters_of_room() {
        let repo = setup().await;
        repo.save_learned_parameters(params(75.0, 0.8)).await.unwrap();
        repo.save_learned_parameters(params(73.5, 0.9)).await.unwrap();

        let room = RoomId::new("bathroom").unwrap();
        let stored = repo.get_learned_parameters(&room).await.unwrap();
        assert_eq!(stored, Some(params(73.5, 0.9)));
    }
}

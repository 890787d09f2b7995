use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Statistics recorded for a single broadcast
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StreamStat {
    pub id: Uuid,
    pub streamer_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub peak_viewers: i64,
    pub total_viewers: i64,
    pub avg_watch_seconds: i64,
    pub likes: i64,
    /// Gift revenue in the smallest currency unit
    pub gifts_value: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StreamStat {
    /// Broadcast length in seconds; `None` while the stream is live.
    ///
    /// Fails for a row whose end lies before its start.
    pub fn duration_seconds(&self) -> Result<Option<i64>, InvalidStreamStat> {
        match self.ended_at {
            None => Ok(None),
            Some(ended_at) if ended_at < self.started_at => Err(InvalidStreamStat(format!(
                "stream {} ends before it starts",
                self.id
            ))),
            Some(ended_at) => Ok(Some((ended_at - self.started_at).num_seconds())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidStreamStat(pub String);

/// Values written on create, and the merged result checked on update
#[derive(Debug, Clone)]
pub struct StreamStatValues {
    pub streamer_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub peak_viewers: i64,
    pub total_viewers: i64,
    pub avg_watch_seconds: i64,
    pub likes: i64,
    pub gifts_value: i64,
}

impl StreamStatValues {
    pub fn validate(&self) -> Result<(), InvalidStreamStat> {
        if self.title.trim().is_empty() {
            return Err(InvalidStreamStat("title is required".to_string()));
        }
        if let Some(ended_at) = self.ended_at {
            if ended_at < self.started_at {
                return Err(InvalidStreamStat("ended_at must not be before started_at".to_string()));
            }
        }
        let counters = [
            ("peak_viewers", self.peak_viewers),
            ("total_viewers", self.total_viewers),
            ("avg_watch_seconds", self.avg_watch_seconds),
            ("likes", self.likes),
            ("gifts_value", self.gifts_value),
        ];
        if let Some((name, _)) = counters.iter().find(|(_, value)| *value < 0) {
            return Err(InvalidStreamStat(format!("{} must not be negative", name)));
        }
        if self.peak_viewers > self.total_viewers {
            return Err(InvalidStreamStat("peak_viewers must not exceed total_viewers".to_string()));
        }
        Ok(())
    }
}

impl From<StreamStat> for StreamStatValues {
    fn from(stat: StreamStat) -> Self {
        Self {
            streamer_id: stat.streamer_id,
            category_id: stat.category_id,
            title: stat.title,
            started_at: stat.started_at,
            ended_at: stat.ended_at,
            peak_viewers: stat.peak_viewers,
            total_viewers: stat.total_viewers,
            avg_watch_seconds: stat.avg_watch_seconds,
            likes: stat.likes,
            gifts_value: stat.gifts_value,
        }
    }
}

/// Partial update; `category_id: Some(None)` clears the category
#[derive(Debug, Default)]
pub struct UpdateStreamStat {
    pub category_id: Option<Option<Uuid>>,
    pub title: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<Option<DateTime<Utc>>>,
    pub peak_viewers: Option<i64>,
    pub total_viewers: Option<i64>,
    pub avg_watch_seconds: Option<i64>,
    pub likes: Option<i64>,
    pub gifts_value: Option<i64>,
}

impl UpdateStreamStat {
    pub fn apply_to(self, mut values: StreamStatValues) -> StreamStatValues {
        if let Some(category_id) = self.category_id {
            values.category_id = category_id;
        }
        if let Some(title) = self.title {
            values.title = title;
        }
        if let Some(started_at) = self.started_at {
            values.started_at = started_at;
        }
        if let Some(ended_at) = self.ended_at {
            values.ended_at = ended_at;
        }
        if let Some(v) = self.peak_viewers {
            values.peak_viewers = v;
        }
        if let Some(v) = self.total_viewers {
            values.total_viewers = v;
        }
        if let Some(v) = self.avg_watch_seconds {
            values.avg_watch_seconds = v;
        }
        if let Some(v) = self.likes {
            values.likes = v;
        }
        if let Some(v) = self.gifts_value {
            values.gifts_value = v;
        }
        values
    }
}

/// Aggregate over a group of streams (one streamer or one category)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StreamStatSummary {
    pub group_id: Option<Uuid>,
    pub streams: i64,
    pub total_viewers: i64,
    pub peak_viewers: i64,
    pub watch_seconds: i64,
    pub likes: i64,
    pub gifts_value: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn values() -> StreamStatValues {
        let started_at = Utc::now() - Duration::hours(2);
        StreamStatValues {
            streamer_id: Uuid::new_v4(),
            category_id: None,
            title: "Friday speedruns".to_string(),
            started_at,
            ended_at: Some(started_at + Duration::minutes(90)),
            peak_viewers: 120,
            total_viewers: 900,
            avg_watch_seconds: 600,
            likes: 40,
            gifts_value: 1500,
        }
    }

    #[test]
    fn test_valid_values() {
        assert!(values().validate().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut v = values();
        v.ended_at = Some(v.started_at - Duration::seconds(1));
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_negative_counter_rejected() {
        let mut v = values();
        v.likes = -1;
        assert_eq!(
            v.validate().unwrap_err(),
            InvalidStreamStat("likes must not be negative".to_string())
        );
    }

    #[test]
    fn test_peak_above_total_rejected() {
        let mut v = values();
        v.peak_viewers = v.total_viewers + 1;
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_update_merges_fields() {
        let v = values();
        let category = Uuid::new_v4();
        let merged = UpdateStreamStat {
            category_id: Some(Some(category)),
            ended_at: Some(None),
            likes: Some(99),
            ..Default::default()
        }
        .apply_to(v.clone());

        assert_eq!(merged.category_id, Some(category));
        assert_eq!(merged.ended_at, None);
        assert_eq!(merged.likes, 99);
        assert_eq!(merged.title, v.title);
        assert_eq!(merged.total_viewers, v.total_viewers);
    }
}

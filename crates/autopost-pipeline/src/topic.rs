//! Topic selection: idea bank first, then the series queue.
//!
//! Ideas are ad-hoc, time-sensitive topics the user wants out next, so an
//! unused idea always wins over the series queue. The series queue is the
//! steady-state fallback; its position is captured on the post at selection
//! time and advanced only when the post actually publishes.

use sqlx::PgPool;

use autopost_db::{DbError, IdeaRow, SeriesRow};

/// Where a selected topic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSource {
    Idea,
    Series,
    /// Topic set explicitly on the post at scheduling time.
    Manual,
}

/// A resolved topic and its provenance.
#[derive(Debug, Clone)]
pub struct TopicSelection {
    pub topic: String,
    pub notes: Option<String>,
    pub source: TopicSource,
    pub idea_id: Option<i64>,
    pub series_id: Option<i64>,
    /// The queue position this selection consumed, series topics only.
    pub topic_index: Option<i32>,
    pub series_title: Option<String>,
}

/// Pure precedence decision over the already-fetched candidates.
///
/// Returns `None` when the user has neither an unused idea nor a series
/// topic left — the caller skips the post with a diagnostic.
#[must_use]
pub fn choose_topic(
    idea: Option<&IdeaRow>,
    series: Option<&SeriesRow>,
) -> Option<TopicSelection> {
    if let Some(idea) = idea {
        return Some(TopicSelection {
            topic: idea.text.clone(),
            notes: None,
            source: TopicSource::Idea,
            idea_id: Some(idea.id),
            series_id: idea.series_id,
            topic_index: None,
            series_title: None,
        });
    }

    let series = series?;
    let entry = series.next_topic()?;
    Some(TopicSelection {
        topic: entry.title.clone(),
        notes: entry.notes.clone(),
        source: TopicSource::Series,
        idea_id: None,
        series_id: Some(series.id),
        topic_index: Some(series.current_index),
        series_title: Some(series.title.clone()),
    })
}

/// Select and claim the next topic for a user.
///
/// An idea is consumed (`used = TRUE`) as part of selection; losing the
/// claim race to a concurrent sweep falls back to the series queue. Series
/// selection claims nothing — the queue advances only on publication.
///
/// # Errors
///
/// Returns [`DbError`] if any query fails.
pub async fn select_topic(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<TopicSelection>, DbError> {
    if let Some(idea) = autopost_db::first_unused_idea(pool, user_id).await? {
        if autopost_db::claim_idea(pool, idea.id).await? {
            let series_title = match idea.series_id {
                Some(series_id) => match autopost_db::get_series(pool, series_id).await {
                    Ok(series) => Some(series.title),
                    Err(DbError::NotFound) => None,
                    Err(e) => return Err(e),
                },
                None => None,
            };
            return Ok(Some(TopicSelection {
                topic: idea.text.clone(),
                notes: None,
                source: TopicSource::Idea,
                idea_id: Some(idea.id),
                series_id: idea.series_id,
                topic_index: None,
                series_title,
            }));
        }
        tracing::debug!(user_id, idea_id = idea.id, "lost idea claim race");
    }

    let series = autopost_db::active_series_for_user(pool, user_id).await?;
    Ok(choose_topic(None, series.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopost_db::TopicEntry;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn idea(id: i64, text: &str) -> IdeaRow {
        IdeaRow {
            id,
            user_id: "u1".to_string(),
            series_id: None,
            text: text.to_string(),
            used: false,
            created_at: Utc::now(),
        }
    }

    fn series(current_index: i32, topics: &[&str]) -> SeriesRow {
        SeriesRow {
            id: 7,
            public_id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            title: "Platform diaries".to_string(),
            category: Some("engineering".to_string()),
            template_id: None,
            topic_queue: Json(
                topics
                    .iter()
                    .map(|t| TopicEntry {
                        title: (*t).to_string(),
                        notes: None,
                    })
                    .collect(),
            ),
            current_index,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn idea_always_beats_series_queue() {
        let idea = idea(1, "Ship it");
        let series = series(0, &["queued topic"]);
        let selection = choose_topic(Some(&idea), Some(&series)).expect("selected");
        assert_eq!(selection.source, TopicSource::Idea);
        assert_eq!(selection.topic, "Ship it");
        assert_eq!(selection.idea_id, Some(1));
        assert!(selection.topic_index.is_none());
    }

    #[test]
    fn series_topic_captures_the_queue_position() {
        let series = series(2, &["a", "b", "c"]);
        let selection = choose_topic(None, Some(&series)).expect("selected");
        assert_eq!(selection.source, TopicSource::Series);
        assert_eq!(selection.topic, "c");
        assert_eq!(selection.topic_index, Some(2));
        assert_eq!(selection.series_id, Some(7));
        assert_eq!(selection.series_title.as_deref(), Some("Platform diaries"));
    }

    #[test]
    fn exhausted_series_selects_nothing() {
        let series = series(3, &["a", "b", "c"]);
        assert!(choose_topic(None, Some(&series)).is_none());
    }

    #[test]
    fn no_candidates_selects_nothing() {
        assert!(choose_topic(None, None).is_none());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{ConversationId, UserId};
use crate::store::StoreError;

/// Auto-advance intervals (seconds) a client may pick
pub const AUTO_ADVANCE_INTERVALS: [u32; 5] = [3, 5, 10, 15, 30];

/// Interval used when a start request does not name one
pub const DEFAULT_AUTO_ADVANCE_INTERVAL: u32 = 5;

pub fn is_valid_interval(interval: u32) -> bool {
    AUTO_ADVANCE_INTERVALS.contains(&interval)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideshowType {
    /// The initiator's own media items
    Personal,
    /// Posts from a subreddit, fetched by the client through the proxy
    Reddit,
}

/// A shared viewing session. At most one exists per conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideshowSession {
    pub conversation_id: ConversationId,
    pub slideshow_type: SlideshowType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reddit_sort: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_item_ids: Vec<i64>,
    pub controller_user_id: UserId,
    pub current_index: u32,
    pub total_items: u32,
    pub auto_advance: bool,
    pub auto_advance_interval: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a start request
#[derive(Debug, Clone, Deserialize)]
pub struct StartSlideshowRequest {
    pub slideshow_type: SlideshowType,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub reddit_sort: Option<String>,
    #[serde(default)]
    pub media_item_ids: Vec<i64>,
    /// Item count for reddit slideshows; personal slideshows count their media
    #[serde(default)]
    pub total_items: Option<u32>,
    #[serde(default)]
    pub auto_advance: bool,
    #[serde(default)]
    pub auto_advance_interval: Option<u32>,
}

impl StartSlideshowRequest {
    pub fn personal(media_item_ids: Vec<i64>) -> Self {
        Self {
            slideshow_type: SlideshowType::Personal,
            subreddit: None,
            reddit_sort: None,
            media_item_ids,
            total_items: None,
            auto_advance: false,
            auto_advance_interval: None,
        }
    }

    pub fn reddit(subreddit: impl Into<String>) -> Self {
        Self {
            slideshow_type: SlideshowType::Reddit,
            subreddit: Some(subreddit.into()),
            reddit_sort: None,
            media_item_ids: Vec::new(),
            total_items: None,
            auto_advance: false,
            auto_advance_interval: None,
        }
    }

    /// Check type-specific requirements and build the initial session
    pub(crate) fn into_session(
        self,
        conversation_id: ConversationId,
        controller_user_id: UserId,
    ) -> Result<SlideshowSession, SlideshowError> {
        let auto_advance_interval = self
            .auto_advance_interval
            .unwrap_or(DEFAULT_AUTO_ADVANCE_INTERVAL);
        if !is_valid_interval(auto_advance_interval) {
            return Err(SlideshowError::BadRequest(format!(
                "auto_advance_interval must be one of {:?}",
                AUTO_ADVANCE_INTERVALS
            )));
        }

        let (subreddit, total_items) = match self.slideshow_type {
            SlideshowType::Reddit => {
                let subreddit = self
                    .subreddit
                    .map(|s| s.trim().trim_start_matches("r/").to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        SlideshowError::BadRequest(
                            "subreddit is required for reddit slideshows".to_string(),
                        )
                    })?;
                (Some(subreddit), self.total_items.unwrap_or(0))
            }
            SlideshowType::Personal => {
                if self.media_item_ids.is_empty() {
                    return Err(SlideshowError::BadRequest(
                        "personal slideshows need at least one media item".to_string(),
                    ));
                }
                (None, self.media_item_ids.len() as u32)
            }
        };

        let now = Utc::now();
        Ok(SlideshowSession {
            conversation_id,
            slideshow_type: self.slideshow_type,
            subreddit,
            reddit_sort: self.reddit_sort,
            media_item_ids: self.media_item_ids,
            controller_user_id,
            current_index: 0,
            total_items,
            auto_advance: self.auto_advance,
            auto_advance_interval,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigateRequest {
    pub index: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoAdvanceRequest {
    pub auto_advance: bool,
    #[serde(default)]
    pub auto_advance_interval: Option<u32>,
}

/// Slideshow-specific error type
#[derive(Debug, Error)]
pub enum SlideshowError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Internal(StoreError),
}

impl From<StoreError> for SlideshowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(msg) => SlideshowError::Conflict(msg),
            StoreError::NotFound(msg) => SlideshowError::NotFound(msg),
            other => SlideshowError::Internal(other),
        }
    }
}

/// Result type for slideshow operations
pub type SlideshowResult<T> = Result<T, SlideshowError>;

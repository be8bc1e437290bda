use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type EventId = u64;

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: String, // stored as given, no hashing
    pub created_at: NaiveDateTime,
}

/// Fixed event categories. Serialized as the literal labels shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "学术讲座")]
    AcademicLecture,
    #[serde(rename = "社团招新")]
    ClubRecruitment,
    #[serde(rename = "文体娱乐")]
    ArtsSports,
    #[serde(rename = "其他")]
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::AcademicLecture,
        Category::ClubRecruitment,
        Category::ArtsSports,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::AcademicLecture => "学术讲座",
            Category::ClubRecruitment => "社团招新",
            Category::ArtsSports => "文体娱乐",
            Category::Other => "其他",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.label() == label)
    }

    /// Anything outside the fixed set falls back to `Other` instead of
    /// being rejected.
    pub fn normalize(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(Self::from_label)
            .unwrap_or(Category::Other)
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: String,
    pub category: Category,
    pub description: String,
    pub cover_image_url: String,
    pub capacity: Option<u32>,
    pub creator_id: UserId,
    pub created_at: NaiveDateTime,
}

/// Input for `create_event`. Every field is optional at the wire level so
/// the registry can report which one is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEvent {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    /// JSON integer or integer-valued string; null means unlimited.
    pub capacity: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}

/// Read-only event representation with the derived fields filled in.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: EventId,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub category: Category,
    pub description: String,
    pub cover_image_url: String,
    pub capacity: Option<u32>,
    pub creator_id: UserId,
    pub created_at: String,
    pub interested_count: usize,
    pub is_full: bool,
    pub is_interested: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: EventView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserSummary>,
    pub interested_users: Vec<UserSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterestState {
    pub is_interested: bool,
    pub interested_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyEvents {
    pub created: Vec<EventView>,
    pub interested: Vec<EventView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_users: usize,
    pub total_events: usize,
    pub upcoming_events: usize,
    pub total_interests: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventStatus {
    #[default]
    Upcoming,
    Past,
    All,
}

impl EventStatus {
    /// Unrecognized values apply no time filter.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "upcoming" => EventStatus::Upcoming,
            "past" => EventStatus::Past,
            _ => EventStatus::All,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub category: Option<String>,
    pub status: EventStatus,
}

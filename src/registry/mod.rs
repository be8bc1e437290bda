//! In-memory event registry: users, events and "interested" relations.
//!
//! The registry is a plain synchronous struct. Callers that share it across
//! tasks wrap it in a single lock so every check-then-mutate sequence (the
//! capacity check in `toggle_interest` in particular) runs atomically.

pub mod events;
pub mod models;
pub mod seed;
pub mod sessions;
pub mod users;

pub use models::{
    Category, Event, EventDetail, EventFilter, EventId, EventStatus, EventView, InterestState,
    MyEvents, NewEvent, Stats, User, UserId, UserSummary,
};
pub use sessions::{Session, SessionStore};

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::error::AppError;
use crate::time::{self, SharedClock};

pub struct EventRegistry {
    users: BTreeMap<UserId, User>,
    events: BTreeMap<EventId, Event>,
    // event id -> interested user ids, in insertion order
    interests: BTreeMap<EventId, Vec<UserId>>,
    next_user_id: UserId,
    next_event_id: EventId,
    clock: SharedClock,
}

impl EventRegistry {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            users: BTreeMap::new(),
            events: BTreeMap::new(),
            interests: BTreeMap::new(),
            next_user_id: 1,
            next_event_id: 1,
            clock,
        }
    }

    /// Drop every table and restart id allocation at 1.
    pub fn reset(&mut self) {
        self.users.clear();
        self.events.clear();
        self.interests.clear();
        self.next_user_id = 1;
        self.next_event_id = 1;
    }

    pub fn categories() -> [Category; 4] {
        Category::ALL
    }

    pub fn stats(&self) -> Stats {
        let now = self.now();

        Stats {
            total_users: self.users.len(),
            total_events: self.events.len(),
            upcoming_events: self.events.values().filter(|e| e.end_time >= now).count(),
            total_interests: self.interests.values().map(Vec::len).sum(),
        }
    }

    fn now(&self) -> NaiveDateTime {
        time::local_now(&*self.clock)
    }

    /// Precondition for every operation that acts on behalf of a user.
    fn require_user(&self, caller: Option<UserId>) -> Result<&User, AppError> {
        caller
            .and_then(|id| self.users.get(&id))
            .ok_or_else(|| AppError::Auth("please log in first".to_string()))
    }

    fn interested_in(&self, event_id: EventId) -> &[UserId] {
        self.interests
            .get(&event_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn view(&self, event: &Event, caller: Option<UserId>) -> EventView {
        let interested = self.interested_in(event.id);
        let count = interested.len();

        EventView {
            id: event.id,
            title: event.title.clone(),
            start_time: time::format_minutes(&event.start_time),
            end_time: time::format_minutes(&event.end_time),
            location: event.location.clone(),
            category: event.category,
            description: event.description.clone(),
            cover_image_url: event.cover_image_url.clone(),
            capacity: event.capacity,
            creator_id: event.creator_id,
            created_at: time::format_minutes(&event.created_at),
            interested_count: count,
            is_full: event
                .capacity
                .is_some_and(|capacity| count >= capacity as usize),
            is_interested: caller.is_some_and(|id| interested.contains(&id)),
        }
    }

    fn summary(&self, user_id: UserId) -> Option<UserSummary> {
        self.users.get(&user_id).map(|user| UserSummary {
            id: user.id,
            username: user.username.clone(),
        })
    }
}

use std::cmp::Reverse;

use serde_json::Value;

use crate::error::AppError;
use crate::time;

use super::{
    Category, Event, EventDetail, EventFilter, EventId, EventRegistry, EventStatus, EventView,
    InterestState, MyEvents, NewEvent, UserId,
};

/// How many interested users the detail view resolves.
const DETAIL_INTERESTED_LIMIT: usize = 10;

impl EventRegistry {
    /// Events matching `filter`, by start time (latest first for past events).
    pub fn list_events(&self, filter: &EventFilter, caller: Option<UserId>) -> Vec<EventView> {
        let now = self.now();
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let mut matching: Vec<&Event> = self
            .events
            .values()
            .filter(|event| match filter.status {
                EventStatus::Upcoming => event.end_time >= now,
                EventStatus::Past => event.end_time < now,
                EventStatus::All => true,
            })
            .filter(|event| category.map_or(true, |c| event.category.label() == c))
            .collect();

        // Stable sorts keep id order between equal start times
        if filter.status == EventStatus::Past {
            matching.sort_by_key(|event| Reverse(event.start_time));
        } else {
            matching.sort_by_key(|event| event.start_time);
        }

        matching
            .into_iter()
            .map(|event| self.view(event, caller))
            .collect()
    }

    pub fn get_event(
        &self,
        event_id: EventId,
        caller: Option<UserId>,
    ) -> Result<EventDetail, AppError> {
        let event = self.find_event(event_id)?;

        let interested_users = self
            .interested_in(event_id)
            .iter()
            .take(DETAIL_INTERESTED_LIMIT)
            .filter_map(|&user_id| self.summary(user_id))
            .collect();

        Ok(EventDetail {
            event: self.view(event, caller),
            creator: self.summary(event.creator_id),
            interested_users,
        })
    }

    pub fn create_event(
        &mut self,
        caller: Option<UserId>,
        fields: NewEvent,
    ) -> Result<EventView, AppError> {
        let creator_id = self.require_user(caller)?.id;

        let title = required("title", fields.title.as_deref())?;
        let start_raw = required("start_time", fields.start_time.as_deref())?;
        let end_raw = required("end_time", fields.end_time.as_deref())?;
        let location = required("location", fields.location.as_deref())?;

        let start_time = time::parse_datetime(start_raw)?;
        let end_time = time::parse_datetime(end_raw)?;

        if end_time <= start_time {
            return Err(AppError::Validation(
                "end time must be after start time".to_string(),
            ));
        }

        let now = self.now();
        if start_time < now {
            return Err(AppError::Validation(
                "start time cannot be in the past".to_string(),
            ));
        }

        let category = Category::normalize(fields.category.as_deref());
        let capacity = parse_capacity(fields.capacity.as_ref())?;

        let id = self.next_event_id;
        self.next_event_id += 1;

        let event = Event {
            id,
            title: title.to_string(),
            start_time,
            end_time,
            location: location.to_string(),
            category,
            description: trimmed_or_empty(fields.description.as_deref()),
            cover_image_url: trimmed_or_empty(fields.cover_image_url.as_deref()),
            capacity,
            creator_id,
            created_at: now,
        };

        self.events.insert(id, event);
        self.interests.insert(id, Vec::new());

        tracing::info!(event_id = id, creator_id, "event created");

        self.find_event(id).map(|event| self.view(event, caller))
    }

    /// Flip the caller's "interested" marker. Removal is never blocked by
    /// capacity; adding fails once the event is full.
    pub fn toggle_interest(
        &mut self,
        caller: Option<UserId>,
        event_id: EventId,
    ) -> Result<InterestState, AppError> {
        let user_id = self.require_user(caller)?.id;
        let event = self.find_event(event_id)?;
        let capacity = event.capacity;

        if self.now() >= event.end_time {
            return Err(AppError::State("event already ended".to_string()));
        }

        let interested = self.interests.entry(event_id).or_default();

        if let Some(position) = interested.iter().position(|&id| id == user_id) {
            interested.remove(position);
            return Ok(InterestState {
                is_interested: false,
                interested_count: interested.len(),
            });
        }

        if capacity.is_some_and(|capacity| interested.len() >= capacity as usize) {
            return Err(AppError::Capacity("event is full".to_string()));
        }

        interested.push(user_id);

        Ok(InterestState {
            is_interested: true,
            interested_count: interested.len(),
        })
    }

    pub fn my_events(&self, caller: Option<UserId>) -> Result<MyEvents, AppError> {
        let user_id = self.require_user(caller)?.id;

        let mut created: Vec<&Event> = self
            .events
            .values()
            .filter(|event| event.creator_id == user_id)
            .collect();
        created.sort_by_key(|event| Reverse(event.start_time));

        let mut interested: Vec<&Event> = self
            .interests
            .iter()
            .filter(|(_, users)| users.contains(&user_id))
            .filter_map(|(event_id, _)| self.events.get(event_id))
            .collect();
        interested.sort_by_key(|event| event.start_time);

        Ok(MyEvents {
            created: created.into_iter().map(|e| self.view(e, caller)).collect(),
            interested: interested.into_iter().map(|e| self.view(e, caller)).collect(),
        })
    }

    fn find_event(&self, event_id: EventId) -> Result<&Event, AppError> {
        self.events
            .get(&event_id)
            .ok_or_else(|| AppError::NotFound("event not found".to_string()))
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("missing required field: {}", name)))
}

fn trimmed_or_empty(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn parse_capacity(raw: Option<&Value>) -> Result<Option<u32>, AppError> {
    let value = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };

    let value =
        value.ok_or_else(|| AppError::Validation("capacity must be an integer".to_string()))?;

    if value < 1 {
        return Err(AppError::Validation(
            "capacity must be greater than 0".to_string(),
        ));
    }

    u32::try_from(value)
        .map(Some)
        .map_err(|_| AppError::Validation("capacity is too large".to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDateTime, TimeDelta};
    use serde_json::json;

    use super::*;
    use crate::registry::testing::{fixed_now, registry};
    use crate::test_support::ManualClock;

    fn fmt(dt: NaiveDateTime) -> String {
        time::format_minutes(&dt)
    }

    fn new_event(title: &str, start: NaiveDateTime, hours: i64) -> NewEvent {
        NewEvent {
            title: Some(title.to_string()),
            start_time: Some(fmt(start)),
            end_time: Some(fmt(start + TimeDelta::hours(hours))),
            location: Some("Library 101".to_string()),
            ..NewEvent::default()
        }
    }

    fn tomorrow() -> NaiveDateTime {
        fixed_now() + TimeDelta::days(1)
    }

    fn setup() -> (EventRegistry, std::sync::Arc<ManualClock>, UserId, UserId) {
        let (mut registry, clock) = registry();
        let alice = registry.register("alice", "123456").unwrap().id;
        let bob = registry.register("bob", "123456").unwrap().id;
        (registry, clock, alice, bob)
    }

    #[test]
    fn test_create_event_stores_trimmed_fields() {
        let (mut registry, _, alice, _) = setup();
        let fields = NewEvent {
            title: Some("  AI Talk  ".to_string()),
            start_time: Some("2025-11-20T14:00".to_string()),
            end_time: Some("2025-11-20 16:00:00".to_string()),
            location: Some(" Hall A ".to_string()),
            category: Some("学术讲座".to_string()),
            description: Some(" details ".to_string()),
            cover_image_url: None,
            capacity: Some(json!(50)),
        };

        let view = registry.create_event(Some(alice), fields).unwrap();
        assert_eq!(view.id, 1);
        assert_eq!(view.title, "AI Talk");
        assert_eq!(view.location, "Hall A");
        assert_eq!(view.description, "details");
        assert_eq!(view.cover_image_url, "");
        assert_eq!(view.start_time, "2025-11-20 14:00");
        assert_eq!(view.end_time, "2025-11-20 16:00");
        assert_eq!(view.category, Category::AcademicLecture);
        assert_eq!(view.capacity, Some(50));
        assert_eq!(view.creator_id, alice);
        assert_eq!(view.created_at, "2025-11-10 09:00");
        assert_eq!(view.interested_count, 0);
        assert!(!view.is_full);
        assert!(!view.is_interested);
    }

    #[test]
    fn test_create_then_get_round_trips_times() {
        let (mut registry, _, alice, _) = setup();
        let fields = NewEvent {
            start_time: Some("2025-12-01T08:15:42".to_string()),
            end_time: Some("2025-12-01 10:45".to_string()),
            ..new_event("Run", tomorrow(), 1)
        };
        let created = registry.create_event(Some(alice), fields).unwrap();

        let detail = registry.get_event(created.id, None).unwrap();
        assert_eq!(detail.event.start_time, "2025-12-01 08:15");
        assert_eq!(detail.event.end_time, "2025-12-01 10:45");
        assert_eq!(detail.event.start_time, created.start_time);
    }

    #[test]
    fn test_create_event_requires_login() {
        let (mut registry, _, _, _) = setup();
        let fields = new_event("Talk", tomorrow(), 2);

        assert!(matches!(
            registry.create_event(None, fields.clone()),
            Err(AppError::Auth(_))
        ));
        assert!(matches!(
            registry.create_event(Some(42), fields),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn test_create_event_missing_fields() {
        let (mut registry, _, alice, _) = setup();
        let full = new_event("Talk", tomorrow(), 2);

        let cases = [
            ("title", NewEvent { title: None, ..full.clone() }),
            ("start_time", NewEvent { start_time: Some(String::new()), ..full.clone() }),
            ("end_time", NewEvent { end_time: None, ..full.clone() }),
            ("location", NewEvent { location: Some("   ".to_string()), ..full.clone() }),
        ];

        for (name, fields) in cases {
            let err = registry.create_event(Some(alice), fields).unwrap_err();
            assert_eq!(err.message(), format!("missing required field: {}", name));
        }
        assert_eq!(registry.stats().total_events, 0);
    }

    #[test]
    fn test_create_event_bad_time_format() {
        let (mut registry, _, alice, _) = setup();
        let fields = NewEvent {
            start_time: Some("next friday".to_string()),
            ..new_event("Talk", tomorrow(), 2)
        };

        let err = registry.create_event(Some(alice), fields).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.message().starts_with("invalid time format"));
    }

    #[test]
    fn test_create_event_end_not_after_start() {
        let (mut registry, _, alice, _) = setup();

        let equal = new_event("Talk", tomorrow(), 0);
        let err = registry.create_event(Some(alice), equal).unwrap_err();
        assert_eq!(err.message(), "end time must be after start time");

        let reversed = new_event("Talk", tomorrow(), -1);
        let err = registry.create_event(Some(alice), reversed).unwrap_err();
        assert_eq!(err.message(), "end time must be after start time");
    }

    #[test]
    fn test_create_event_start_in_past() {
        let (mut registry, _, alice, _) = setup();
        let fields = new_event("Talk", fixed_now() - TimeDelta::hours(1), 3);

        let err = registry.create_event(Some(alice), fields).unwrap_err();
        assert_eq!(err.message(), "start time cannot be in the past");
    }

    #[test]
    fn test_create_event_capacity_validation() {
        let (mut registry, _, alice, _) = setup();
        let base = new_event("Talk", tomorrow(), 2);

        let with = |capacity| NewEvent {
            capacity: Some(capacity),
            ..base.clone()
        };

        let err = registry.create_event(Some(alice), with(json!(0))).unwrap_err();
        assert_eq!(err.message(), "capacity must be greater than 0");
        let err = registry.create_event(Some(alice), with(json!(-3))).unwrap_err();
        assert_eq!(err.message(), "capacity must be greater than 0");
        let err = registry.create_event(Some(alice), with(json!("lots"))).unwrap_err();
        assert_eq!(err.message(), "capacity must be an integer");
        let err = registry.create_event(Some(alice), with(json!(2.5))).unwrap_err();
        assert_eq!(err.message(), "capacity must be an integer");

        let view = registry.create_event(Some(alice), with(json!(" 12 "))).unwrap();
        assert_eq!(view.capacity, Some(12));
        let view = registry.create_event(Some(alice), with(Value::Null)).unwrap();
        assert_eq!(view.capacity, None);
    }

    #[test]
    fn test_create_event_unknown_category_coerced() {
        let (mut registry, _, alice, _) = setup();
        let fields = NewEvent {
            category: Some("party".to_string()),
            ..new_event("Talk", tomorrow(), 2)
        };

        let view = registry.create_event(Some(alice), fields).unwrap();
        assert_eq!(view.category, Category::Other);
    }

    #[test]
    fn test_get_event_not_found() {
        let (registry, _, _, _) = setup();
        let err = registry.get_event(999, None).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_get_event_includes_creator_and_first_ten_interested() {
        let (mut registry, _, alice, bob) = setup();
        let event = registry
            .create_event(Some(alice), new_event("Fair", tomorrow(), 4))
            .unwrap();

        registry.toggle_interest(Some(bob), event.id).unwrap();
        for n in 0..11 {
            let user = registry.register(&format!("user{n}"), "123456").unwrap();
            registry.toggle_interest(Some(user.id), event.id).unwrap();
        }

        let detail = registry.get_event(event.id, Some(bob)).unwrap();
        let creator = detail.creator.unwrap();
        assert_eq!(creator.id, alice);
        assert_eq!(creator.username, "alice");
        assert_eq!(detail.event.interested_count, 12);
        assert!(detail.event.is_interested);
        assert_eq!(detail.interested_users.len(), 10);
        assert_eq!(detail.interested_users[0].username, "bob");
        assert_eq!(detail.interested_users[9].username, "user8");
    }

    #[test]
    fn test_get_event_skips_stale_references() {
        let (mut registry, _, alice, bob) = setup();
        let event = registry
            .create_event(Some(alice), new_event("Fair", tomorrow(), 4))
            .unwrap();
        registry.interests.get_mut(&event.id).unwrap().extend([77, bob]);

        let detail = registry.get_event(event.id, None).unwrap();
        assert_eq!(detail.interested_users.len(), 1);
        assert_eq!(detail.interested_users[0].id, bob);
        assert_eq!(detail.event.interested_count, 2);
    }

    #[test]
    fn test_toggle_interest_flips() {
        let (mut registry, _, alice, bob) = setup();
        let event = registry
            .create_event(Some(alice), new_event("Talk", tomorrow(), 2))
            .unwrap();

        let on = registry.toggle_interest(Some(bob), event.id).unwrap();
        assert_eq!(
            on,
            InterestState {
                is_interested: true,
                interested_count: 1
            }
        );

        let off = registry.toggle_interest(Some(bob), event.id).unwrap();
        assert_eq!(
            off,
            InterestState {
                is_interested: false,
                interested_count: 0
            }
        );
    }

    #[test]
    fn test_toggle_interest_errors() {
        let (mut registry, _, alice, bob) = setup();
        let event = registry
            .create_event(Some(alice), new_event("Talk", tomorrow(), 2))
            .unwrap();

        assert!(matches!(
            registry.toggle_interest(None, event.id),
            Err(AppError::Auth(_))
        ));
        assert!(matches!(
            registry.toggle_interest(Some(bob), 999),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_toggle_interest_capacity() {
        let (mut registry, _, alice, bob) = setup();
        let fields = NewEvent {
            capacity: Some(json!(1)),
            ..new_event("Small", tomorrow(), 2)
        };
        let event = registry.create_event(Some(alice), fields).unwrap();

        let first = registry.toggle_interest(Some(alice), event.id).unwrap();
        assert!(first.is_interested);
        assert_eq!(first.interested_count, 1);

        let err = registry.toggle_interest(Some(bob), event.id).unwrap_err();
        assert!(matches!(err, AppError::Capacity(_)));
        assert_eq!(err.message(), "event is full");

        let view = &registry.list_events(&EventFilter::default(), Some(alice))[0];
        assert!(view.is_full);
        assert!(view.is_interested);

        // Leaving a full event always works and frees the seat
        let off = registry.toggle_interest(Some(alice), event.id).unwrap();
        assert!(!off.is_interested);
        let on = registry.toggle_interest(Some(bob), event.id).unwrap();
        assert_eq!(on.interested_count, 1);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let (mut registry, _, alice, _) = setup();
        let fields = NewEvent {
            capacity: Some(json!(3)),
            ..new_event("Workshop", tomorrow(), 2)
        };
        let event = registry.create_event(Some(alice), fields).unwrap();

        let users: Vec<UserId> = (0..6)
            .map(|n| registry.register(&format!("u{n}"), "123456").unwrap().id)
            .collect();

        // Interleave joins and leaves
        for round in 0..4 {
            for (i, &user) in users.iter().enumerate() {
                if (i + round) % 2 == 0 {
                    let _ = registry.toggle_interest(Some(user), event.id);
                }
                let count = registry.get_event(event.id, None).unwrap().event.interested_count;
                assert!(count <= 3, "count {count} exceeds capacity");
            }
        }
    }

    #[test]
    fn test_toggle_interest_on_ended_event() {
        let (mut registry, clock, alice, bob) = setup();
        let event = registry
            .create_event(Some(alice), new_event("Talk", tomorrow(), 2))
            .unwrap();
        registry.toggle_interest(Some(bob), event.id).unwrap();

        clock.advance_days(2);

        for caller in [alice, bob] {
            let err = registry.toggle_interest(Some(caller), event.id).unwrap_err();
            assert!(matches!(err, AppError::State(_)));
            assert_eq!(err.message(), "event already ended");
        }
    }

    #[test]
    fn test_toggle_interest_at_exact_end_time() {
        let (mut registry, clock, alice, _) = setup();
        let start = fixed_now() + TimeDelta::hours(1);
        let event = registry
            .create_event(Some(alice), new_event("Talk", start, 1))
            .unwrap();

        clock.advance_hours(2);
        assert!(matches!(
            registry.toggle_interest(Some(alice), event.id),
            Err(AppError::State(_))
        ));
    }

    #[test]
    fn test_list_events_status_filters() {
        let (mut registry, clock, alice, _) = setup();
        let early = registry
            .create_event(Some(alice), new_event("Early", tomorrow(), 2))
            .unwrap();
        let late = registry
            .create_event(Some(alice), new_event("Late", tomorrow() + TimeDelta::days(5), 2))
            .unwrap();
        let middle = registry
            .create_event(Some(alice), new_event("Middle", tomorrow() + TimeDelta::days(2), 2))
            .unwrap();

        // Early and Middle have ended, Late has not
        clock.advance_days(4);
        let now = fixed_now() + TimeDelta::days(4);

        let upcoming = registry.list_events(&EventFilter::default(), None);
        assert_eq!(upcoming.iter().map(|e| e.id).collect::<Vec<_>>(), [late.id]);
        for view in &upcoming {
            assert!(time::parse_datetime(&view.end_time).unwrap() >= now);
        }

        let past = registry.list_events(
            &EventFilter {
                status: EventStatus::Past,
                ..EventFilter::default()
            },
            None,
        );
        assert_eq!(past.iter().map(|e| e.id).collect::<Vec<_>>(), [middle.id, early.id]);
        for view in &past {
            assert!(time::parse_datetime(&view.end_time).unwrap() < now);
        }

        let all = registry.list_events(
            &EventFilter {
                status: EventStatus::All,
                ..EventFilter::default()
            },
            None,
        );
        assert_eq!(
            all.iter().map(|e| e.id).collect::<Vec<_>>(),
            [early.id, middle.id, late.id]
        );
    }

    #[test]
    fn test_list_events_category_filter() {
        let (mut registry, _, alice, _) = setup();
        let lecture = NewEvent {
            category: Some("学术讲座".to_string()),
            ..new_event("Lecture", tomorrow(), 2)
        };
        let other = NewEvent {
            category: Some("whatever".to_string()),
            ..new_event("Misc", tomorrow(), 2)
        };
        registry.create_event(Some(alice), lecture).unwrap();
        registry.create_event(Some(alice), other).unwrap();

        let filter = |category: &str| EventFilter {
            category: Some(category.to_string()),
            status: EventStatus::Upcoming,
        };

        let lectures = registry.list_events(&filter("学术讲座"), None);
        assert_eq!(lectures.len(), 1);
        assert_eq!(lectures[0].title, "Lecture");

        let others = registry.list_events(&filter("其他"), None);
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].title, "Misc");

        assert!(registry.list_events(&filter("社团招新"), None).is_empty());
        assert_eq!(registry.list_events(&filter(""), None).len(), 2);
    }

    #[test]
    fn test_is_interested_depends_on_caller() {
        let (mut registry, _, alice, bob) = setup();
        let event = registry
            .create_event(Some(alice), new_event("Talk", tomorrow(), 2))
            .unwrap();
        registry.toggle_interest(Some(bob), event.id).unwrap();

        let filter = EventFilter::default();
        assert!(registry.list_events(&filter, Some(bob))[0].is_interested);
        assert!(!registry.list_events(&filter, Some(alice))[0].is_interested);
        assert!(!registry.list_events(&filter, None)[0].is_interested);
    }

    #[test]
    fn test_my_events() {
        let (mut registry, _, alice, bob) = setup();
        let first = registry
            .create_event(Some(alice), new_event("First", tomorrow(), 2))
            .unwrap();
        let second = registry
            .create_event(Some(alice), new_event("Second", tomorrow() + TimeDelta::days(1), 2))
            .unwrap();
        let bobs = registry
            .create_event(Some(bob), new_event("Bob's", tomorrow() + TimeDelta::hours(3), 2))
            .unwrap();

        registry.toggle_interest(Some(alice), second.id).unwrap();
        registry.toggle_interest(Some(alice), bobs.id).unwrap();

        let mine = registry.my_events(Some(alice)).unwrap();
        assert_eq!(
            mine.created.iter().map(|e| e.id).collect::<Vec<_>>(),
            [second.id, first.id]
        );
        assert_eq!(
            mine.interested.iter().map(|e| e.id).collect::<Vec<_>>(),
            [bobs.id, second.id]
        );
        assert!(mine.interested.iter().all(|e| e.is_interested));

        assert!(matches!(registry.my_events(None), Err(AppError::Auth(_))));
    }
}

use chrono::TimeDelta;

use super::{Category, Event, EventRegistry, User};

const SAMPLE_PASSWORD: &str = "123456";

impl EventRegistry {
    /// Replace all state with two demo users and three upcoming events
    /// scheduled relative to the current time.
    pub fn seed_sample_data(&mut self) {
        self.reset();
        let now = self.now();

        for (id, username) in [(1, "alice"), (2, "bob")] {
            self.users.insert(
                id,
                User {
                    id,
                    username: username.to_string(),
                    password: SAMPLE_PASSWORD.to_string(),
                    created_at: now,
                },
            );
        }
        self.next_user_id = 3;

        let samples = [
            (
                "人工智能前沿讲座",
                TimeDelta::days(1) + TimeDelta::hours(2),
                "教学楼A201",
                Category::AcademicLecture,
                "邀请知名校友分享AI趋势与职业发展机会",
                "https://picsum.photos/seed/ai/600/300",
                Some(50),
                1,
            ),
            (
                "话剧社秋季招新说明会",
                TimeDelta::days(2),
                "活动中心103",
                Category::ClubRecruitment,
                "欢迎热爱表演与舞台的同学加入话剧社！",
                "https://picsum.photos/seed/drama/600/300",
                Some(30),
                2,
            ),
            (
                "校园篮球友谊赛",
                TimeDelta::days(3) + TimeDelta::hours(1),
                "西区篮球场",
                Category::ArtsSports,
                "以球会友，切磋技艺，重在参与！",
                "https://picsum.photos/seed/basketball/600/300",
                None,
                1,
            ),
        ];

        for (index, (title, offset, location, category, description, cover, capacity, creator)) in
            samples.into_iter().enumerate()
        {
            let id = index as u64 + 1;
            let start_time = now + offset;
            self.events.insert(
                id,
                Event {
                    id,
                    title: title.to_string(),
                    start_time,
                    end_time: start_time + TimeDelta::hours(2),
                    location: location.to_string(),
                    category,
                    description: description.to_string(),
                    cover_image_url: cover.to_string(),
                    capacity,
                    creator_id: creator,
                    created_at: now,
                },
            );
        }
        self.next_event_id = 4;

        // bob wants event 1; alice and bob both want event 3
        self.interests.insert(1, vec![2]);
        self.interests.insert(2, Vec::new());
        self.interests.insert(3, vec![1, 2]);

        tracing::info!(
            users = self.users.len(),
            events = self.events.len(),
            "✅ Sample data initialized"
        );
    }
}

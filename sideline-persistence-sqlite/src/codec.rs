use chrono::{DateTime, Utc};
use sideline_app::domain::access::Role;
use sideline_core::{ClockDirection, GameSeconds, GameStatus};

pub fn game_status_to_str(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Available => "available",
        GameStatus::Starter => "starter",
        GameStatus::Goalkeeper => "goalkeeper",
        GameStatus::Bench => "bench",
        GameStatus::Unavailable => "unavailable",
        GameStatus::Injured => "injured",
        GameStatus::NotDressed => "not_dressed",
        GameStatus::Dressed => "dressed",
    }
}

pub fn game_status_from_str(s: &str) -> Option<GameStatus> {
    GameStatus::ALL
        .into_iter()
        .find(|status| game_status_to_str(*status) == s)
}

pub fn clock_direction_from_str(s: &str) -> Option<ClockDirection> {
    match s {
        "up" => Some(ClockDirection::Up),
        "down" => Some(ClockDirection::Down),
        _ => None,
    }
}

pub fn role_from_str(s: &str) -> Option<Role> {
    Some(match s {
        "system_admin" => Role::SystemAdmin,
        "club_admin" => Role::ClubAdmin,
        "coach" => Role::Coach,
        "stats_keeper" => Role::StatsKeeper,
        "player" => Role::Player,
        "parent" => Role::Parent,
        "fan" => Role::Fan,
        _ => return None,
    })
}

pub fn marks_from_json(s: &str) -> Result<Vec<GameSeconds>, serde_json::Error> {
    serde_json::from_str(s)
}

pub fn marks_to_json(marks: &[GameSeconds]) -> String {
    serde_json::Value::from(marks.to_vec()).to_string()
}

pub fn millis_to_datetime(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(DateTime::from_timestamp_millis)
}

use chrono::{DateTime, Utc};
use sideline_app::{
    ports::notification::ListenerMessage,
    workflow::{ClockView, LineupView, LiveGameView, PlayerView, SubstitutionView},
};
use sideline_core::{
    CardKind, ClockDirection, FieldStatus, GameEvent, GameEventKind, GameSettings, GameStage,
    GameStatus, LineupAction, Score, StageAction, StageTransition, TeamSide,
};

#[derive(serde::Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum JsonStageAction {
    StartGame,
    StartStoppage,
    EndStoppage,
    EndPeriod,
    StartNextPeriod,
}

impl From<JsonStageAction> for StageAction {
    fn from(action: JsonStageAction) -> Self {
        match action {
            JsonStageAction::StartGame => StageAction::StartGame,
            JsonStageAction::StartStoppage => StageAction::StartStoppage,
            JsonStageAction::EndStoppage => StageAction::EndStoppage,
            JsonStageAction::EndPeriod => StageAction::EndPeriod,
            JsonStageAction::StartNextPeriod => StageAction::StartNextPeriod,
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum JsonLineupAction {
    Starter,
    Goalkeeper,
    Bench,
    Available,
    Unavailable,
    Toggle,
}

impl From<JsonLineupAction> for LineupAction {
    fn from(action: JsonLineupAction) -> Self {
        match action {
            JsonLineupAction::Starter => LineupAction::Starter,
            JsonLineupAction::Goalkeeper => LineupAction::Goalkeeper,
            JsonLineupAction::Bench => LineupAction::Bench,
            JsonLineupAction::Available => LineupAction::Available,
            JsonLineupAction::Unavailable => LineupAction::Unavailable,
            JsonLineupAction::Toggle => LineupAction::Toggle,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum JsonTeamSide {
    Team,
    Opponent,
}

impl From<JsonTeamSide> for TeamSide {
    fn from(side: JsonTeamSide) -> Self {
        match side {
            JsonTeamSide::Team => TeamSide::Team,
            JsonTeamSide::Opponent => TeamSide::Opponent,
        }
    }
}

impl From<TeamSide> for JsonTeamSide {
    fn from(side: TeamSide) -> Self {
        match side {
            TeamSide::Team => JsonTeamSide::Team,
            TeamSide::Opponent => JsonTeamSide::Opponent,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum JsonCardKind {
    Yellow,
    Red,
}

impl From<JsonCardKind> for CardKind {
    fn from(card: JsonCardKind) -> Self {
        match card {
            JsonCardKind::Yellow => CardKind::Yellow,
            JsonCardKind::Red => CardKind::Red,
        }
    }
}

impl From<CardKind> for JsonCardKind {
    fn from(card: CardKind) -> Self {
        match card {
            CardKind::Yellow => JsonCardKind::Yellow,
            CardKind::Red => JsonCardKind::Red,
        }
    }
}

#[derive(serde::Deserialize, Debug)]
pub struct StageRequest {
    pub action: JsonStageAction,
}

#[derive(serde::Deserialize, Debug)]
pub struct LineupRequest {
    pub action: JsonLineupAction,
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InitiateSubstitutionRequest {
    pub outgoing: i64,
    pub incoming: i64,
}

#[derive(serde::Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSubstitutionRequest {
    #[serde(default)]
    pub game_time: Option<u32>,
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GoalRequest {
    pub side: JsonTeamSide,
    #[serde(default)]
    pub scorer: Option<i64>,
    #[serde(default)]
    pub assist: Option<i64>,
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CardRequest {
    pub player_id: i64,
    pub card: JsonCardKind,
}

#[derive(serde::Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum JsonGameStage {
    BeforeStart,
    DuringPeriod,
    InStoppage,
    BetweenPeriods,
    EndGame,
}

impl From<GameStage> for JsonGameStage {
    fn from(stage: GameStage) -> Self {
        match stage {
            GameStage::BeforeStart => JsonGameStage::BeforeStart,
            GameStage::DuringPeriod => JsonGameStage::DuringPeriod,
            GameStage::InStoppage => JsonGameStage::InStoppage,
            GameStage::BetweenPeriods => JsonGameStage::BetweenPeriods,
            GameStage::EndGame => JsonGameStage::EndGame,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum JsonGameStatus {
    Available,
    Starter,
    Goalkeeper,
    Bench,
    Unavailable,
    Injured,
    NotDressed,
    Dressed,
}

impl From<GameStatus> for JsonGameStatus {
    fn from(status: GameStatus) -> Self {
        match status {
            GameStatus::Available => JsonGameStatus::Available,
            GameStatus::Starter => JsonGameStatus::Starter,
            GameStatus::Goalkeeper => JsonGameStatus::Goalkeeper,
            GameStatus::Bench => JsonGameStatus::Bench,
            GameStatus::Unavailable => JsonGameStatus::Unavailable,
            GameStatus::Injured => JsonGameStatus::Injured,
            GameStatus::NotDressed => JsonGameStatus::NotDressed,
            GameStatus::Dressed => JsonGameStatus::Dressed,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum JsonFieldStatus {
    OnField,
    OnBench,
    SubbingOut,
    SubbingIn,
    OnFieldGk,
    SubbingOutGk,
}

impl From<FieldStatus> for JsonFieldStatus {
    fn from(status: FieldStatus) -> Self {
        match status {
            FieldStatus::OnField => JsonFieldStatus::OnField,
            FieldStatus::OnBench => JsonFieldStatus::OnBench,
            FieldStatus::SubbingOut => JsonFieldStatus::SubbingOut,
            FieldStatus::SubbingIn => JsonFieldStatus::SubbingIn,
            FieldStatus::OnFieldGk => JsonFieldStatus::OnFieldGk,
            FieldStatus::SubbingOutGk => JsonFieldStatus::SubbingOutGk,
        }
    }
}

fn clock_direction(direction: ClockDirection) -> &'static str {
    match direction {
        ClockDirection::Up => "up",
        ClockDirection::Down => "down",
    }
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct JsonScore {
    pub team: u32,
    pub opponent: u32,
}

impl From<Score> for JsonScore {
    fn from(score: Score) -> Self {
        JsonScore {
            team: score.team,
            opponent: score.opponent,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JsonClock {
    pub stage: JsonGameStage,
    pub period: u32,
    pub total_periods: u32,
    pub clock_direction: &'static str,
    pub game_time: u32,
    pub period_time: u32,
    pub display_time: u32,
    pub score: JsonScore,
}

impl From<&ClockView> for JsonClock {
    fn from(clock: &ClockView) -> Self {
        JsonClock {
            stage: clock.stage.into(),
            period: clock.period,
            total_periods: clock.total_periods,
            clock_direction: clock_direction(clock.clock_direction),
            game_time: clock.game_time,
            period_time: clock.period_time,
            display_time: clock.display_time,
            score: clock.score.into(),
        }
    }
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JsonPlayer {
    pub player_id: i64,
    pub jersey_number: Option<u32>,
    pub display_name: String,
    pub game_status: JsonGameStatus,
    pub field_status: JsonFieldStatus,
    pub on_field: bool,
    pub total_on_field: u32,
    pub current_on_field: u32,
    pub current_off_field: u32,
    pub pending_substitution: Option<u32>,
}

impl From<&PlayerView> for JsonPlayer {
    fn from(player: &PlayerView) -> Self {
        JsonPlayer {
            player_id: player.player_id.0,
            jersey_number: player.jersey_number,
            display_name: player.display_name.clone(),
            game_status: player.game_status.into(),
            field_status: player.field_status.into(),
            on_field: player.on_field,
            total_on_field: player.total_on_field,
            current_on_field: player.current_on_field,
            current_off_field: player.current_off_field,
            pending_substitution: player.pending_substitution.map(|id| id.0),
        }
    }
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JsonSubstitution {
    pub id: u32,
    pub outgoing: i64,
    pub incoming: i64,
    pub game_time: Option<u32>,
    pub period: u32,
    pub goalkeeper: bool,
}

impl From<&SubstitutionView> for JsonSubstitution {
    fn from(substitution: &SubstitutionView) -> Self {
        JsonSubstitution {
            id: substitution.id.0,
            outgoing: substitution.outgoing.0,
            incoming: substitution.incoming.0,
            game_time: substitution.game_time,
            period: substitution.period,
            goalkeeper: substitution.goalkeeper,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JsonOvertime {
    pub periods: u32,
    pub period_duration: u32,
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JsonGameSettings {
    pub period_count: u32,
    pub period_duration: u32,
    pub clock_direction: &'static str,
    pub overtime: Option<JsonOvertime>,
    pub players_on_field: u32,
    pub max_substitutions: Option<u32>,
    pub allow_reentry: bool,
}

impl From<&GameSettings> for JsonGameSettings {
    fn from(settings: &GameSettings) -> Self {
        JsonGameSettings {
            period_count: settings.period_count,
            period_duration: settings.period_duration,
            clock_direction: clock_direction(settings.clock_direction),
            overtime: settings.overtime.as_ref().map(|ot| JsonOvertime {
                periods: ot.periods,
                period_duration: ot.period_duration,
            }),
            players_on_field: settings.players_on_field,
            max_substitutions: settings.max_substitutions,
            allow_reentry: settings.allow_reentry,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum JsonEventKind {
    PeriodStarted,
    PeriodEnded,
    StoppageStarted,
    StoppageEnded {
        duration_ms: u64,
    },
    Substitution {
        substitution_id: u32,
        outgoing: i64,
        incoming: i64,
        goalkeeper: bool,
    },
    Goal {
        side: JsonTeamSide,
        scorer: Option<i64>,
        assist: Option<i64>,
        score: JsonScore,
    },
    Card {
        player_id: i64,
        card: JsonCardKind,
    },
    GameEnded {
        score: JsonScore,
    },
}

impl From<&GameEventKind> for JsonEventKind {
    fn from(kind: &GameEventKind) -> Self {
        match kind {
            GameEventKind::PeriodStarted => JsonEventKind::PeriodStarted,
            GameEventKind::PeriodEnded => JsonEventKind::PeriodEnded,
            GameEventKind::StoppageStarted => JsonEventKind::StoppageStarted,
            GameEventKind::StoppageEnded { duration } => JsonEventKind::StoppageEnded {
                duration_ms: duration.as_millis() as u64,
            },
            GameEventKind::SubstitutionConfirmed {
                substitution,
                outgoing,
                incoming,
                goalkeeper,
            } => JsonEventKind::Substitution {
                substitution_id: substitution.0,
                outgoing: outgoing.0,
                incoming: incoming.0,
                goalkeeper: *goalkeeper,
            },
            GameEventKind::Goal {
                side,
                scorer,
                assist,
                score,
            } => JsonEventKind::Goal {
                side: (*side).into(),
                scorer: scorer.map(|p| p.0),
                assist: assist.map(|p| p.0),
                score: (*score).into(),
            },
            GameEventKind::Card { player, card } => JsonEventKind::Card {
                player_id: player.0,
                card: (*card).into(),
            },
            GameEventKind::GameEnded { score } => JsonEventKind::GameEnded {
                score: (*score).into(),
            },
        }
    }
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JsonGameEvent {
    /// Wall-clock time in milliseconds since the epoch.
    pub at: i64,
    pub period: u32,
    pub game_time: u32,
    #[serde(flatten)]
    pub kind: JsonEventKind,
}

impl From<&GameEvent> for JsonGameEvent {
    fn from(event: &GameEvent) -> Self {
        JsonGameEvent {
            at: event.at.timestamp_millis(),
            period: event.period,
            game_time: event.game_time,
            kind: (&event.kind).into(),
        }
    }
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JsonLiveGame {
    pub game_id: i64,
    pub club_id: i64,
    pub team_id: i64,
    pub opponent: String,
    pub scheduled_at: Option<i64>,
    pub settings: JsonGameSettings,
    pub clock: JsonClock,
    pub players: Vec<JsonPlayer>,
    pub pending_substitutions: Vec<JsonSubstitution>,
    pub events: Vec<JsonGameEvent>,
}

impl From<&LiveGameView> for JsonLiveGame {
    fn from(view: &LiveGameView) -> Self {
        JsonLiveGame {
            game_id: view.metadata.game_id.0,
            club_id: view.metadata.club_id.0,
            team_id: view.metadata.team_id.0,
            opponent: view.metadata.opponent.clone(),
            scheduled_at: view.metadata.scheduled_at.as_ref().map(DateTime::<Utc>::timestamp_millis),
            settings: (&view.settings).into(),
            clock: (&view.clock).into(),
            players: view.players.iter().map(JsonPlayer::from).collect(),
            pending_substitutions: view
                .pending_substitutions
                .iter()
                .map(JsonSubstitution::from)
                .collect(),
            events: view.events.iter().map(JsonGameEvent::from).collect(),
        }
    }
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct JsonLineupCounts {
    pub starters: u32,
    pub goalkeepers: u32,
    pub bench: u32,
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JsonLineup {
    pub players: Vec<JsonPlayer>,
    pub counts: JsonLineupCounts,
    pub players_on_field: u32,
    pub can_confirm: bool,
}

impl From<&LineupView> for JsonLineup {
    fn from(view: &LineupView) -> Self {
        JsonLineup {
            players: view.players.iter().map(JsonPlayer::from).collect(),
            counts: JsonLineupCounts {
                starters: view.counts.starters,
                goalkeepers: view.counts.goalkeepers,
                bench: view.counts.bench,
            },
            players_on_field: view.players_on_field,
            can_confirm: view.can_confirm,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JsonLineupStatus {
    pub player_id: i64,
    pub game_status: JsonGameStatus,
}

#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JsonStageTransition {
    pub from: JsonGameStage,
    pub to: JsonGameStage,
    pub period: u32,
    pub events: Vec<JsonGameEvent>,
}

impl From<&StageTransition> for JsonStageTransition {
    fn from(transition: &StageTransition) -> Self {
        JsonStageTransition {
            from: transition.from.into(),
            to: transition.to.into(),
            period: transition.period,
            events: transition.events.iter().map(JsonGameEvent::from).collect(),
        }
    }
}

/// Messages pushed over the live game WebSocket.
#[derive(serde::Serialize, Debug, Clone)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Snapshot {
        game: Box<JsonLiveGame>,
    },
    Clock {
        game_id: i64,
        clock: JsonClock,
    },
    Event {
        game_id: i64,
        event: JsonGameEvent,
    },
    LineupChanged {
        game_id: i64,
        player_id: i64,
        game_status: JsonGameStatus,
    },
    SubstitutionInitiated {
        game_id: i64,
        substitution: JsonSubstitution,
    },
    SubstitutionCancelled {
        game_id: i64,
        substitution_id: u32,
    },
    SessionClosed {
        game_id: i64,
    },
}

impl From<&ListenerMessage> for ServerMessage {
    fn from(message: &ListenerMessage) -> Self {
        match message {
            ListenerMessage::ClockUpdate { game_id, clock } => ServerMessage::Clock {
                game_id: game_id.0,
                clock: clock.into(),
            },
            ListenerMessage::GameEvent { game_id, event } => ServerMessage::Event {
                game_id: game_id.0,
                event: event.into(),
            },
            ListenerMessage::LineupChanged {
                game_id,
                player_id,
                game_status,
            } => ServerMessage::LineupChanged {
                game_id: game_id.0,
                player_id: player_id.0,
                game_status: (*game_status).into(),
            },
            ListenerMessage::SubstitutionInitiated {
                game_id,
                substitution,
            } => ServerMessage::SubstitutionInitiated {
                game_id: game_id.0,
                substitution: substitution.into(),
            },
            ListenerMessage::SubstitutionCancelled {
                game_id,
                substitution_id,
            } => ServerMessage::SubstitutionCancelled {
                game_id: game_id.0,
                substitution_id: substitution_id.0,
            },
            ListenerMessage::SessionClosed { game_id } => ServerMessage::SessionClosed {
                game_id: game_id.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sideline_core::{PlayerId, SubstitutionId};

    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = GameEvent {
            at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            period: 2,
            game_time: 1500,
            kind: GameEventKind::SubstitutionConfirmed {
                substitution: SubstitutionId(3),
                outgoing: PlayerId(4),
                incoming: PlayerId(9),
                goalkeeper: false,
            },
        };
        let json = serde_json::to_value(JsonGameEvent::from(&event)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "at": 1_700_000_000_000i64,
                "period": 2,
                "gameTime": 1500,
                "type": "substitution",
                "substitutionId": 3,
                "outgoing": 4,
                "incoming": 9,
                "goalkeeper": false,
            })
        );
    }

    #[test]
    fn test_stoppage_duration_in_millis() {
        let kind = JsonEventKind::from(&GameEventKind::StoppageEnded {
            duration: Duration::from_secs(12),
        });
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json["type"], "stoppageEnded");
        assert_eq!(json["durationMs"], 12_000);
    }

    #[test]
    fn test_requests_parse() {
        let stage: StageRequest = serde_json::from_str(r#"{"action":"startNextPeriod"}"#).unwrap();
        assert_eq!(StageAction::from(stage.action), StageAction::StartNextPeriod);

        let confirm: ConfirmSubstitutionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(confirm.game_time, None);

        let goal: GoalRequest = serde_json::from_str(r#"{"side":"opponent"}"#).unwrap();
        assert_eq!(goal.side, JsonTeamSide::Opponent);
        assert_eq!(goal.scorer, None);
    }
}

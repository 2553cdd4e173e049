use chrono::{DateTime, Utc};
use sideline_core::{
    ClockDirection, FieldStatus, Game, GameError, GameEvent, GameSeconds, GameSettings, GameStage,
    GameStatus, LineupCounts, PlayerId, Score, Substitution, SubstitutionId,
};
use thiserror::Error;

use crate::domain::{GameId, access::Permission, live_game::GameMetadata, live_game::LiveGame};

pub mod clock;
pub mod lineup;
pub mod publish;
pub mod session;
pub mod stage;
pub mod stats;
pub mod substitution;
pub mod view;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiveGameError {
    #[error("game {0} does not exist")]
    GameNotFound(GameId),

    #[error("game {0} has no live session")]
    GameNotOpen(GameId),

    #[error("game {0} already has a live session")]
    AlreadyOpen(GameId),

    #[error("not allowed to {0}")]
    Forbidden(Permission),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("storage error: {0}")]
    Storage(String),
}

pub(crate) fn mutation_result<R>(
    game_id: GameId,
    result: Option<Result<R, GameError>>,
) -> Result<R, LiveGameError> {
    match result {
        Some(result) => Ok(result?),
        None => Err(LiveGameError::GameNotOpen(game_id)),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClockView {
    pub stage: GameStage,
    pub period: u32,
    pub total_periods: u32,
    pub clock_direction: ClockDirection,
    pub game_time: GameSeconds,
    pub period_time: GameSeconds,
    pub display_time: GameSeconds,
    pub score: Score,
}

impl ClockView {
    pub fn from_game(game: &Game, now: DateTime<Utc>) -> Self {
        ClockView {
            stage: game.stage(),
            period: game.current_period_number(),
            total_periods: game.settings().total_periods(),
            clock_direction: game.settings().clock_direction,
            game_time: game.current_game_time(now),
            period_time: game.current_period_time(now),
            display_time: game.display_period_time(now),
            score: game.score(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub jersey_number: Option<u32>,
    pub display_name: String,
    pub game_status: GameStatus,
    pub field_status: FieldStatus,
    pub on_field: bool,
    pub total_on_field: GameSeconds,
    pub current_on_field: GameSeconds,
    pub current_off_field: GameSeconds,
    pub pending_substitution: Option<SubstitutionId>,
}

impl PlayerView {
    fn from_game(game: &Game, now: DateTime<Utc>) -> Vec<Self> {
        game.roster()
            .iter()
            .zip(game.player_times(now))
            .map(|(entry, times)| PlayerView {
                player_id: entry.player_id,
                jersey_number: entry.jersey_number,
                display_name: entry.display_name.clone(),
                game_status: entry.game_status,
                field_status: entry.field_status,
                on_field: times.on_field,
                total_on_field: times.total_on_field,
                current_on_field: times.current_on_field,
                current_off_field: times.current_off_field,
                pending_substitution: entry.pending_sub(),
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubstitutionView {
    pub id: SubstitutionId,
    pub outgoing: PlayerId,
    pub incoming: PlayerId,
    pub game_time: Option<GameSeconds>,
    pub period: u32,
    pub goalkeeper: bool,
}

impl From<&Substitution> for SubstitutionView {
    fn from(substitution: &Substitution) -> Self {
        SubstitutionView {
            id: substitution.id,
            outgoing: substitution.outgoing,
            incoming: substitution.incoming,
            game_time: substitution.game_time,
            period: substitution.period,
            goalkeeper: substitution.goalkeeper,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LiveGameView {
    pub metadata: GameMetadata,
    pub settings: GameSettings,
    pub clock: ClockView,
    pub players: Vec<PlayerView>,
    pub pending_substitutions: Vec<SubstitutionView>,
    pub events: Vec<GameEvent>,
}

impl LiveGameView {
    pub fn from(live_game: &LiveGame, now: DateTime<Utc>) -> Self {
        let game = &live_game.game;
        LiveGameView {
            metadata: live_game.metadata.clone(),
            settings: game.settings().clone(),
            clock: ClockView::from_game(game, now),
            players: PlayerView::from_game(game, now),
            pending_substitutions: game
                .pending_substitutions()
                .map(SubstitutionView::from)
                .collect(),
            events: game.events().to_vec(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LineupView {
    pub players: Vec<PlayerView>,
    pub counts: LineupCounts,
    pub players_on_field: u32,
    pub can_confirm: bool,
}

impl LineupView {
    pub fn from(game: &Game, now: DateTime<Utc>) -> Self {
        LineupView {
            players: PlayerView::from_game(game, now),
            counts: game.lineup_counts(),
            players_on_field: game.settings().players_on_field,
            can_confirm: game.can_confirm_lineup(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use sideline_core::{
        ClockDirection, Game, GameSettings, GameStatus, Period, PlayerGameEntry, PlayerId, Score,
    };

    use crate::{
        domain::{
            AccountId, ClubId, GameId, RepoError, RepoRetrieveError, TeamId,
            access::{Role, RoleAssignment, RoleScope, ScopedRolePolicy},
            live_game::{GameMetadata, LiveGameService, LiveGameServiceImpl},
        },
        services::access_guard::AccessGuardServiceImpl,
        ports::{
            authorization::RoleLookupPort,
            game_repository::{GameRepository, StoredGame},
            notification::{ListenerMessage, ListenerNotificationPort},
        },
        processes::event_writer::{EventQueue, PendingWrite},
    };

    pub const COACH: AccountId = AccountId(uuid::Uuid::from_u128(1));
    pub const FAN: AccountId = AccountId(uuid::Uuid::from_u128(2));
    pub const KEEPER: AccountId = AccountId(uuid::Uuid::from_u128(3));
    pub const GAME: GameId = GameId(10);

    pub fn metadata() -> GameMetadata {
        GameMetadata {
            game_id: GAME,
            club_id: ClubId(1),
            team_id: TeamId(7),
            opponent: "Rovers".to_string(),
            scheduled_at: None,
        }
    }

    pub fn stored_game() -> StoredGame {
        StoredGame {
            metadata: metadata(),
            settings: GameSettings {
                period_count: 2,
                period_duration: 1200,
                clock_direction: ClockDirection::Up,
                overtime: None,
                players_on_field: 3,
                max_substitutions: None,
                allow_reentry: true,
            },
            periods: Vec::<Period>::new(),
            score: Score::default(),
            keeper: None,
        }
    }

    /// Player 1 keeps goal, 2-3 start, 4-5 are on the bench.
    pub fn roster() -> Vec<PlayerGameEntry> {
        let status = |i: i64| match i {
            1 => GameStatus::Goalkeeper,
            2 | 3 => GameStatus::Starter,
            _ => GameStatus::Bench,
        };
        (1..=5)
            .map(|i| PlayerGameEntry::new(PlayerId(i), Some(i as u32), format!("P{}", i), status(i)))
            .collect()
    }

    pub type TestAccessGuard = AccessGuardServiceImpl<MockRoleLookup, ScopedRolePolicy>;

    pub fn access_guard() -> Arc<TestAccessGuard> {
        Arc::new(AccessGuardServiceImpl::new(
            Arc::new(MockRoleLookup),
            Arc::new(ScopedRolePolicy),
        ))
    }

    /// A live game service with the test game opened before kick-off.
    pub fn live_game_service() -> Arc<LiveGameServiceImpl> {
        let service = Arc::new(LiveGameServiceImpl::new());
        let game = Game::new(stored_game().settings, roster()).unwrap();
        service.open_game(metadata(), game);
        service
    }

    #[derive(Clone, Default)]
    pub struct MockGameRepository;

    #[async_trait::async_trait]
    impl GameRepository for MockGameRepository {
        async fn load_game(&self, game_id: GameId) -> Result<StoredGame, RepoRetrieveError> {
            if game_id == GAME {
                Ok(stored_game())
            } else {
                Err(RepoRetrieveError::NotFound)
            }
        }

        async fn load_roster(
            &self,
            _game_id: GameId,
        ) -> Result<Vec<PlayerGameEntry>, RepoRetrieveError> {
            Ok(roster())
        }
    }

    #[derive(Clone, Default)]
    pub struct MockRoleLookup;

    #[async_trait::async_trait]
    impl RoleLookupPort for MockRoleLookup {
        async fn get_role_assignments(
            &self,
            account_id: AccountId,
        ) -> Result<Vec<RoleAssignment>, RepoError> {
            let role = if account_id == COACH {
                Role::Coach
            } else if account_id == KEEPER {
                Role::StatsKeeper
            } else if account_id == FAN {
                Role::Fan
            } else {
                return Ok(Vec::new());
            };
            Ok(vec![RoleAssignment {
                role,
                scope: RoleScope::Team(TeamId(7)),
            }])
        }
    }

    #[derive(Clone, Default)]
    pub struct MockNotificationPort {
        pub sent_messages: Arc<Mutex<Vec<(GameId, ListenerMessage)>>>,
    }

    impl MockNotificationPort {
        pub fn get_messages(&self) -> Vec<(GameId, ListenerMessage)> {
            self.sent_messages.lock().unwrap().clone()
        }
    }

    impl ListenerNotificationPort for MockNotificationPort {
        fn notify_game_listeners(&self, game_id: GameId, message: ListenerMessage) {
            self.sent_messages.lock().unwrap().push((game_id, message));
        }
    }

    #[derive(Clone, Default)]
    pub struct MockEventQueue {
        pub queued: Arc<Mutex<Vec<(GameId, PendingWrite)>>>,
    }

    impl MockEventQueue {
        pub fn get_queued(&self) -> Vec<(GameId, PendingWrite)> {
            self.queued.lock().unwrap().clone()
        }
    }

    impl EventQueue for MockEventQueue {
        fn enqueue(&self, game_id: GameId, write: PendingWrite) {
            self.queued.lock().unwrap().push((game_id, write));
        }
    }
}

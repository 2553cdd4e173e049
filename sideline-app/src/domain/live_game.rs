use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};
use sideline_core::{Game, GameError};

use crate::domain::{ClubId, GameId, TeamId};

#[derive(Clone, Debug, PartialEq)]
pub struct GameMetadata {
    pub game_id: GameId,
    pub club_id: ClubId,
    pub team_id: TeamId,
    pub opponent: String,
    pub scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Distinguishes successive live sessions of the same game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

#[derive(Clone, Debug)]
pub struct LiveGame {
    pub session: SessionId,
    pub metadata: GameMetadata,
    pub game: Game,
}

pub trait LiveGameService {
    /// Registers a game for live operation. Returns `None` if it is already open.
    fn open_game(&self, metadata: GameMetadata, game: Game) -> Option<LiveGame>;
    fn close_game(&self, game_id: GameId) -> Option<LiveGame>;
    fn get_game_by_id(&self, game_id: GameId) -> Option<LiveGame>;
    fn get_games(&self) -> Vec<LiveGame>;
    fn is_open(&self, game_id: GameId) -> bool;

    /// Runs `f` against the game while holding its entry exclusively. The
    /// change is committed only if `f` succeeds; `None` means the game is
    /// not open.
    fn mutate_game<F, R>(&self, game_id: GameId, f: F) -> Option<Result<R, GameError>>
    where
        F: FnOnce(&mut Game) -> Result<R, GameError>,
    {
        self.mutate_game_then(game_id, f, |_| {})
    }

    /// Like `mutate_game`, but runs `on_commit` on a successful result before
    /// the entry is released, so the effects of mutations on one game happen
    /// in commit order.
    fn mutate_game_then<F, C, R>(
        &self,
        game_id: GameId,
        f: F,
        on_commit: C,
    ) -> Option<Result<R, GameError>>
    where
        F: FnOnce(&mut Game) -> Result<R, GameError>,
        C: FnOnce(&R);
}

pub struct LiveGameServiceImpl {
    games: Arc<DashMap<GameId, LiveGame>>,
    next_session: AtomicU64,
}

impl LiveGameServiceImpl {
    pub fn new() -> Self {
        Self {
            games: Arc::new(DashMap::new()),
            next_session: AtomicU64::new(1),
        }
    }
}

impl LiveGameService for LiveGameServiceImpl {
    fn open_game(&self, metadata: GameMetadata, game: Game) -> Option<LiveGame> {
        match self.games.entry(metadata.game_id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                let session = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
                let live_game = LiveGame {
                    session,
                    metadata,
                    game,
                };
                vacant.insert(live_game.clone());
                Some(live_game)
            }
        }
    }

    fn close_game(&self, game_id: GameId) -> Option<LiveGame> {
        self.games.remove(&game_id).map(|(_, game)| game)
    }

    fn get_game_by_id(&self, game_id: GameId) -> Option<LiveGame> {
        self.games.get(&game_id).map(|entry| entry.clone())
    }

    fn get_games(&self) -> Vec<LiveGame> {
        self.games.iter().map(|entry| entry.clone()).collect()
    }

    fn is_open(&self, game_id: GameId) -> bool {
        self.games.contains_key(&game_id)
    }

    fn mutate_game_then<F, C, R>(
        &self,
        game_id: GameId,
        f: F,
        on_commit: C,
    ) -> Option<Result<R, GameError>>
    where
        F: FnOnce(&mut Game) -> Result<R, GameError>,
        C: FnOnce(&R),
    {
        let mut entry = self.games.get_mut(&game_id)?;
        let mut game = entry.game.clone();
        let result = f(&mut game);
        if let Ok(value) = &result {
            entry.game = game;
            on_commit(value);
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use sideline_core::{
        CardKind, ClockDirection, GameEvent, GameSettings, GameStatus, LineupAction,
        PlayerGameEntry, PlayerId,
    };

    use super::*;

    fn metadata(id: i64) -> GameMetadata {
        GameMetadata {
            game_id: GameId(id),
            club_id: ClubId(1),
            team_id: TeamId(1),
            opponent: "Rovers".to_string(),
            scheduled_at: None,
        }
    }

    fn game() -> Game {
        let settings = GameSettings {
            period_count: 2,
            period_duration: 1200,
            clock_direction: ClockDirection::Up,
            overtime: None,
            players_on_field: 2,
            max_substitutions: None,
            allow_reentry: true,
        };
        let roster = vec![
            PlayerGameEntry::new(PlayerId(1), Some(1), "Keeper", GameStatus::Goalkeeper),
            PlayerGameEntry::new(PlayerId(2), Some(2), "Starter", GameStatus::Starter),
        ];
        Game::new(settings, roster).unwrap()
    }

    #[test]
    fn test_open_game_only_once() {
        let service = LiveGameServiceImpl::new();
        assert!(service.open_game(metadata(1), game()).is_some());
        assert!(service.open_game(metadata(1), game()).is_none());
        assert!(service.is_open(GameId(1)));
        assert_eq!(service.get_games().len(), 1);

        assert!(service.close_game(GameId(1)).is_some());
        assert!(!service.is_open(GameId(1)));
    }

    #[test]
    fn test_failed_mutation_is_not_committed() {
        let service = LiveGameServiceImpl::new();
        service.open_game(metadata(1), game());

        let result = service.mutate_game(GameId(1), |game| {
            game.set_status(PlayerId(2), LineupAction::Bench)?;
            game.set_status(PlayerId(99), LineupAction::Bench)
        });
        assert!(matches!(result, Some(Err(GameError::NotFound(_)))));

        let snapshot = service.get_game_by_id(GameId(1)).unwrap();
        assert_eq!(
            snapshot.game.entry(PlayerId(2)).unwrap().game_status,
            GameStatus::Starter
        );
    }

    #[test]
    fn test_sessions_get_fresh_ids() {
        let service = LiveGameServiceImpl::new();
        let first = service.open_game(metadata(1), game()).unwrap().session;
        service.close_game(GameId(1));
        let second = service.open_game(metadata(1), game()).unwrap().session;
        assert_ne!(first, second);
        assert_eq!(service.get_game_by_id(GameId(1)).unwrap().session, second);
    }

    #[test]
    fn test_on_commit_runs_while_the_game_is_held() {
        let service = LiveGameServiceImpl::new();
        service.open_game(metadata(1), game());

        let mut observed = None;
        service
            .mutate_game_then(
                GameId(1),
                |game| game.set_status(PlayerId(2), LineupAction::Bench),
                |status| {
                    observed = Some((*status, service.games.try_get(&GameId(1)).is_locked()));
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(observed, Some((GameStatus::Bench, true)));

        let mut called = false;
        let result = service.mutate_game_then(
            GameId(1),
            |game| game.set_status(PlayerId(99), LineupAction::Bench),
            |_| called = true,
        );
        assert!(matches!(result, Some(Err(GameError::NotFound(_)))));
        assert!(!called);
    }

    #[test]
    fn test_concurrent_effects_follow_commit_order() {
        let service = LiveGameServiceImpl::new();
        service.open_game(metadata(1), game());
        service
            .mutate_game(GameId(1), |game| game.start_game(Utc::now()))
            .unwrap()
            .unwrap();
        let published: Mutex<Vec<GameEvent>> = Mutex::new(Vec::new());

        std::thread::scope(|scope| {
            for thread in 0..8 {
                let (service, published) = (&service, &published);
                scope.spawn(move || {
                    for _ in 0..25 {
                        let player = PlayerId(1 + thread % 2);
                        service
                            .mutate_game_then(
                                GameId(1),
                                |game| game.record_card(player, CardKind::Yellow, Utc::now()),
                                |event| published.lock().unwrap().push(event.clone()),
                            )
                            .unwrap()
                            .unwrap();
                    }
                });
            }
        });

        let snapshot = service.get_game_by_id(GameId(1)).unwrap();
        let published = published.into_inner().unwrap();
        assert_eq!(published.len(), 200);
        assert_eq!(&snapshot.game.events()[1..], published.as_slice());
    }

    #[test]
    fn test_mutation_of_unknown_game() {
        let service = LiveGameServiceImpl::new();
        let result = service.mutate_game(GameId(5), |game| Ok(game.stage()));
        assert!(result.is_none());
    }

    #[test]
    fn test_snapshots_are_detached() {
        let service = LiveGameServiceImpl::new();
        service.open_game(metadata(1), game());
        let before = service.get_game_by_id(GameId(1)).unwrap();

        service
            .mutate_game(GameId(1), |game| {
                game.set_status(PlayerId(2), LineupAction::Bench)
            })
            .unwrap()
            .unwrap();

        assert_eq!(
            before.game.entry(PlayerId(2)).unwrap().game_status,
            GameStatus::Starter
        );
    }
}

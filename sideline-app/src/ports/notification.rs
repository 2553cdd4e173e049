use sideline_core::{GameEvent, GameStatus, PlayerId, SubstitutionId};

use crate::{
    domain::GameId,
    workflow::{ClockView, SubstitutionView},
};

pub trait ListenerNotificationPort {
    fn notify_game_listeners(&self, game_id: GameId, message: ListenerMessage);
}

#[derive(Clone, Debug)]
pub enum ListenerMessage {
    ClockUpdate {
        game_id: GameId,
        clock: ClockView,
    },
    GameEvent {
        game_id: GameId,
        event: GameEvent,
    },
    LineupChanged {
        game_id: GameId,
        player_id: PlayerId,
        game_status: GameStatus,
    },
    SubstitutionInitiated {
        game_id: GameId,
        substitution: SubstitutionView,
    },
    SubstitutionCancelled {
        game_id: GameId,
        substitution_id: SubstitutionId,
    },
    SessionClosed {
        game_id: GameId,
    },
}

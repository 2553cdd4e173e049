use crate::{
    GameStatus, LineupAction, PlayerGameEntry, PlayerId,
    error::{ConstraintViolation, GameError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LineupCounts {
    pub starters: u32,
    pub goalkeepers: u32,
    pub bench: u32,
}

pub fn lineup_counts(entries: &[PlayerGameEntry]) -> LineupCounts {
    entries
        .iter()
        .fold(LineupCounts::default(), |mut counts, entry| {
            match entry.game_status {
                GameStatus::Starter => counts.starters += 1,
                GameStatus::Goalkeeper => counts.goalkeepers += 1,
                GameStatus::Bench => counts.bench += 1,
                _ => {}
            }
            counts
        })
}

/// The on-field roster is complete when it holds exactly one goalkeeper and
/// `required_field_players - 1` starters.
pub fn can_confirm_lineup(entries: &[PlayerGameEntry], required_field_players: u32) -> bool {
    let counts = lineup_counts(entries);
    counts.goalkeepers == 1 && counts.starters + 1 == required_field_players
}

fn toggled(status: GameStatus) -> Option<GameStatus> {
    match status {
        GameStatus::Unavailable => Some(GameStatus::Available),
        GameStatus::Available => Some(GameStatus::Injured),
        GameStatus::Injured => Some(GameStatus::Unavailable),
        GameStatus::NotDressed => Some(GameStatus::Dressed),
        GameStatus::Dressed => Some(GameStatus::NotDressed),
        GameStatus::Starter | GameStatus::Goalkeeper | GameStatus::Bench => None,
    }
}

/// Resolves the status `action` would give `current` without applying it.
pub(crate) fn target_status(
    current: GameStatus,
    action: LineupAction,
) -> Result<GameStatus, GameError> {
    match action {
        LineupAction::Starter => Ok(GameStatus::Starter),
        LineupAction::Bench => Ok(GameStatus::Bench),
        LineupAction::Available => Ok(GameStatus::Available),
        LineupAction::Unavailable => Ok(GameStatus::Unavailable),
        LineupAction::Goalkeeper if current == GameStatus::Goalkeeper => Ok(GameStatus::Starter),
        LineupAction::Goalkeeper => Ok(GameStatus::Goalkeeper),
        LineupAction::Toggle => match toggled(current) {
            Some(next) => Ok(next),
            None => GameError::violation(ConstraintViolation::NotToggleable(current)),
        },
    }
}

/// Applies `action` to the entry of `player` and returns the new status.
/// Promoting a goalkeeper demotes any other goalkeeper to starter.
pub fn set_status(
    entries: &mut [PlayerGameEntry],
    player: PlayerId,
    action: LineupAction,
) -> Result<GameStatus, GameError> {
    let Some(index) = entries.iter().position(|e| e.player_id == player) else {
        return GameError::player_not_found(player);
    };
    let next = target_status(entries[index].game_status, action)?;

    let other_goalkeepers = entries
        .iter()
        .enumerate()
        .filter(|(i, e)| *i != index && e.game_status == GameStatus::Goalkeeper)
        .count();
    if next != GameStatus::Goalkeeper && other_goalkeepers > 1 {
        return GameError::violation(ConstraintViolation::MultipleGoalkeepers);
    }

    if next == GameStatus::Goalkeeper {
        for (i, other) in entries.iter_mut().enumerate() {
            if i != index && other.game_status == GameStatus::Goalkeeper {
                other.game_status = GameStatus::Starter;
            }
        }
    }
    entries[index].game_status = next;
    Ok(next)
}

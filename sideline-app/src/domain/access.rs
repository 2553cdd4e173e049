use crate::domain::{ClubId, TeamId, live_game::GameMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    SystemAdmin,
    ClubAdmin,
    Coach,
    StatsKeeper,
    Player,
    Parent,
    Fan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleScope {
    System,
    Club(ClubId),
    Team(TeamId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleAssignment {
    pub role: Role,
    pub scope: RoleScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewGame,
    ManageLineup,
    RunClock,
    ManageSubstitutions,
    RecordStats,
    ManageSession,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Permission::ViewGame => "view the game",
            Permission::ManageLineup => "manage the lineup",
            Permission::RunClock => "run the clock",
            Permission::ManageSubstitutions => "manage substitutions",
            Permission::RecordStats => "record stats",
            Permission::ManageSession => "manage the live session",
        };
        write!(f, "{}", s)
    }
}

impl Role {
    pub fn grants(&self, permission: Permission) -> bool {
        match self {
            Role::SystemAdmin | Role::ClubAdmin | Role::Coach => true,
            Role::StatsKeeper => matches!(
                permission,
                Permission::ViewGame
                    | Permission::RunClock
                    | Permission::ManageSubstitutions
                    | Permission::RecordStats
            ),
            Role::Player | Role::Parent | Role::Fan => permission == Permission::ViewGame,
        }
    }
}

impl RoleScope {
    pub fn covers(&self, game: &GameMetadata) -> bool {
        match self {
            RoleScope::System => true,
            RoleScope::Club(club_id) => *club_id == game.club_id,
            RoleScope::Team(team_id) => *team_id == game.team_id,
        }
    }
}

pub trait PermissionPolicy {
    fn has_permission(
        &self,
        assignments: &[RoleAssignment],
        game: &GameMetadata,
        permission: Permission,
    ) -> bool;
}

/// Grants a permission if any assignment whose scope covers the game
/// carries a role that grants it. System admins are honoured only with
/// system scope.
pub struct ScopedRolePolicy;

impl PermissionPolicy for ScopedRolePolicy {
    fn has_permission(
        &self,
        assignments: &[RoleAssignment],
        game: &GameMetadata,
        permission: Permission,
    ) -> bool {
        assignments.iter().any(|assignment| {
            let scope_ok = match assignment.role {
                Role::SystemAdmin => assignment.scope == RoleScope::System,
                _ => assignment.scope.covers(game),
            };
            scope_ok && assignment.role.grants(permission)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::GameId;

    use super::*;

    fn game() -> GameMetadata {
        GameMetadata {
            game_id: GameId(10),
            club_id: ClubId(1),
            team_id: TeamId(7),
            opponent: "Rovers".to_string(),
            scheduled_at: None,
        }
    }

    fn assigned(role: Role, scope: RoleScope) -> Vec<RoleAssignment> {
        vec![RoleAssignment { role, scope }]
    }

    #[test]
    fn test_coach_of_team_runs_game() {
        let policy = ScopedRolePolicy;
        let coach = assigned(Role::Coach, RoleScope::Team(TeamId(7)));
        assert!(policy.has_permission(&coach, &game(), Permission::ManageSession));
        assert!(policy.has_permission(&coach, &game(), Permission::ManageLineup));

        let other_coach = assigned(Role::Coach, RoleScope::Team(TeamId(8)));
        assert!(!policy.has_permission(&other_coach, &game(), Permission::ViewGame));
    }

    #[test]
    fn test_club_admin_scope() {
        let policy = ScopedRolePolicy;
        let admin = assigned(Role::ClubAdmin, RoleScope::Club(ClubId(1)));
        assert!(policy.has_permission(&admin, &game(), Permission::RunClock));
        let foreign = assigned(Role::ClubAdmin, RoleScope::Club(ClubId(2)));
        assert!(!policy.has_permission(&foreign, &game(), Permission::RunClock));
    }

    #[test]
    fn test_stats_keeper_cannot_touch_lineup_or_session() {
        let policy = ScopedRolePolicy;
        let keeper = assigned(Role::StatsKeeper, RoleScope::Team(TeamId(7)));
        assert!(policy.has_permission(&keeper, &game(), Permission::RecordStats));
        assert!(policy.has_permission(&keeper, &game(), Permission::ManageSubstitutions));
        assert!(!policy.has_permission(&keeper, &game(), Permission::ManageLineup));
        assert!(!policy.has_permission(&keeper, &game(), Permission::ManageSession));
    }

    #[test]
    fn test_spectator_roles_only_view() {
        let policy = ScopedRolePolicy;
        for role in [Role::Player, Role::Parent, Role::Fan] {
            let assignments = assigned(role, RoleScope::Club(ClubId(1)));
            assert!(policy.has_permission(&assignments, &game(), Permission::ViewGame));
            assert!(!policy.has_permission(&assignments, &game(), Permission::RunClock));
        }
    }

    #[test]
    fn test_system_admin_needs_system_scope() {
        let policy = ScopedRolePolicy;
        let admin = assigned(Role::SystemAdmin, RoleScope::System);
        assert!(policy.has_permission(&admin, &game(), Permission::ManageSession));
        let scoped = assigned(Role::SystemAdmin, RoleScope::Team(TeamId(7)));
        assert!(!policy.has_permission(&scoped, &game(), Permission::ManageSession));
        assert!(!policy.has_permission(&[], &game(), Permission::ViewGame));
    }
}

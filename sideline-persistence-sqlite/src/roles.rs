use sideline_app::{
    domain::{
        AccountId, ClubId, RepoError, TeamId,
        access::{RoleAssignment, RoleScope},
    },
    ports::authorization::RoleLookupPort,
};
use sqlx::{Pool, Row, Sqlite};

use crate::codec::role_from_str;

pub struct SqliteRoleRepository {
    pool: Pool<Sqlite>,
}

impl SqliteRoleRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn scope_from_row(kind: &str, id: Option<i64>) -> Option<RoleScope> {
    match (kind, id) {
        ("system", _) => Some(RoleScope::System),
        ("club", Some(id)) => Some(RoleScope::Club(ClubId(id))),
        ("team", Some(id)) => Some(RoleScope::Team(TeamId(id))),
        _ => None,
    }
}

#[async_trait::async_trait]
impl RoleLookupPort for SqliteRoleRepository {
    async fn get_role_assignments(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<RoleAssignment>, RepoError> {
        let rows = sqlx::query(
            "SELECT role, scope_kind, scope_id FROM role_assignments WHERE account_id = ?",
        )
        .bind(account_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::StorageError(e.to_string()))?;

        let mut assignments = Vec::with_capacity(rows.len());
        for row in rows {
            let role: String = row
                .try_get("role")
                .map_err(|e| RepoError::StorageError(e.to_string()))?;
            let scope_kind: String = row
                .try_get("scope_kind")
                .map_err(|e| RepoError::StorageError(e.to_string()))?;
            let scope_id: Option<i64> = row
                .try_get("scope_id")
                .map_err(|e| RepoError::StorageError(e.to_string()))?;

            match (role_from_str(&role), scope_from_row(&scope_kind, scope_id)) {
                (Some(role), Some(scope)) => assignments.push(RoleAssignment { role, scope }),
                _ => log::warn!(
                    "Skipping unreadable role assignment '{}' ({} {:?}) for account {}",
                    role,
                    scope_kind,
                    scope_id,
                    account_id
                ),
            }
        }
        Ok(assignments)
    }
}

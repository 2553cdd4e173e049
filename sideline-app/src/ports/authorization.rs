use crate::domain::{AccountId, RepoError, access::RoleAssignment};

#[async_trait::async_trait]
pub trait RoleLookupPort {
    async fn get_role_assignments(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<RoleAssignment>, RepoError>;
}

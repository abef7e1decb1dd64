//! Member reconciliation. The primary owner is never touched.

use std::collections::HashSet;

use tracing::debug;

use super::ApiReconciler;
use crate::apis::desired::DesiredMember;
use crate::apis::entity::Api;
use crate::membership::{MemberType, Membership};
use crate::shared::error::Result;
use crate::usecase::ExecutionContext;

impl ApiReconciler {
    pub(super) async fn reconcile_members(
        &self,
        ctx: &ExecutionContext,
        api: &Api,
        desired: &[DesiredMember],
    ) -> Result<()> {
        let existing = self.memberships.find_by_api(&api.id).await?;
        let mut wanted = HashSet::new();

        for member in desired {
            let Some(user_id) = member.user_id.as_deref() else {
                continue;
            };
            wanted.insert(user_id.to_string());
            match existing.iter().find(|m| m.member_id == user_id) {
                Some(current) if current.is_primary_owner() => {
                    debug!(api_id = %api.id, member_id = %user_id, "Primary owner kept as is");
                }
                Some(current) => {
                    self.memberships.update_role(ctx, current, &member.role).await?;
                }
                None => {
                    let membership = Membership::for_api(&api.id, user_id, MemberType::User, &member.role);
                    self.memberships.create(ctx, membership).await?;
                }
            }
        }

        for orphan in existing
            .iter()
            .filter(|m| !m.is_primary_owner() && !wanted.contains(&m.member_id))
        {
            self.memberships.delete(ctx, orphan).await?;
        }
        Ok(())
    }
}

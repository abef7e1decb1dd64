//! Member checks. Unknown users are dropped with a warning; the primary
//! owner cannot be declared.

use std::sync::Arc;

use super::Validated;
use crate::apis::desired::DesiredMember;
use crate::directory::UserRepository;
use crate::membership::PRIMARY_OWNER;
use crate::shared::error::Result;

pub async fn sanitize_members(
    users: &Arc<dyn UserRepository>,
    organization_id: &str,
    members: Vec<DesiredMember>,
) -> Result<Validated<Vec<DesiredMember>>> {
    let mut validated = Validated::of(Vec::with_capacity(members.len()));

    for mut member in members {
        if member.role == PRIMARY_OWNER {
            validated.severe(format!(
                "Member [{}/{}] cannot be declared with the {} role",
                member.source, member.source_id, PRIMARY_OWNER
            ));
            continue;
        }
        match users
            .find_by_source(organization_id, &member.source, &member.source_id)
            .await?
        {
            Some(user) => {
                if validated.value.iter().any(|m: &DesiredMember| m.user_id.as_deref() == Some(user.id.as_str())) {
                    validated.warn(format!(
                        "Member [{}/{}] is declared more than once, keeping the first role",
                        member.source, member.source_id
                    ));
                    continue;
                }
                member.user_id = Some(user.id);
                validated.value.push(member);
            }
            None => validated.warn(format!(
                "Member [{}/{}] not found, it has been removed",
                member.source, member.source_id
            )),
        }
    }
    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{InMemoryUserRepository, User};

    fn member(source_id: &str, role: &str) -> DesiredMember {
        DesiredMember {
            source: "memory".into(),
            source_id: source_id.into(),
            role: role.into(),
            user_id: None,
        }
    }

    #[tokio::test]
    async fn test_unknown_users_are_removed() {
        let repo = Arc::new(InMemoryUserRepository::new());
        repo.create(&User::new("u-1", "org", "memory", "jane")).await.unwrap();
        let users: Arc<dyn UserRepository> = repo;

        let validated = sanitize_members(
            &users,
            "org",
            vec![member("jane", "OWNER"), member("ghost", "USER"), member("jane", "USER")],
        )
        .await
        .unwrap();

        assert_eq!(validated.value.len(), 1);
        assert_eq!(validated.value[0].user_id.as_deref(), Some("u-1"));
        assert_eq!(validated.warnings().len(), 2);
        assert!(!validated.has_severe());
    }

    #[tokio::test]
    async fn test_primary_owner_role_is_severe() {
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let validated = sanitize_members(&users, "org", vec![member("jane", PRIMARY_OWNER)])
            .await
            .unwrap();
        assert!(validated.has_severe());
    }
}

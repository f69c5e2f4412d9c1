//! Conversation access rules.
//!
//! One predicate backs every boundary check in the use-case layer: the
//! requester is either the conversation owner, or a mentor with an active
//! (non-revoked) assignment to the owner. A revoked assignment grants no
//! rights.

use mentorloop_types::conversation::{Conversation, MentorAssignment};
use mentorloop_types::user::{User, UserRole};

/// Whether `requester` may read or act on `conversation`.
pub fn can_access_conversation(
    requester: &User,
    conversation: &Conversation,
    mentor_assignments: &[MentorAssignment],
) -> bool {
    if requester.id == conversation.owner_id {
        return true;
    }
    if requester.role != UserRole::Mentor {
        return false;
    }
    mentor_assignments.iter().any(|a| {
        a.is_active() && a.mentor_id == requester.id && a.newhire_id == conversation.owner_id
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        User::new(Uuid::now_v7(), role, "someone")
    }

    fn conversation_owned_by(owner_id: Uuid) -> Conversation {
        Conversation {
            id: Uuid::now_v7(),
            owner_id,
            title: "Onboarding questions".into(),
            state: Default::default(),
            created_at: Utc::now(),
            last_active_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_always_has_access() {
        let owner = user(UserRole::NewHire);
        let conv = conversation_owned_by(owner.id);
        assert!(can_access_conversation(&owner, &conv, &[]));
    }

    #[test]
    fn test_without_assignments_only_owner_has_access() {
        let owner = user(UserRole::NewHire);
        let conv = conversation_owned_by(owner.id);
        for role in [UserRole::NewHire, UserRole::Mentor, UserRole::Admin] {
            let other = user(role);
            assert!(!can_access_conversation(&other, &conv, &[]));
        }
    }

    #[test]
    fn test_actively_assigned_mentor_has_access() {
        let owner = user(UserRole::NewHire);
        let mentor = user(UserRole::Mentor);
        let conv = conversation_owned_by(owner.id);
        let assignments = [MentorAssignment {
            mentor_id: mentor.id,
            newhire_id: owner.id,
            revoked_at: None,
        }];
        assert!(can_access_conversation(&mentor, &conv, &assignments));
    }

    #[test]
    fn test_revoked_assignment_grants_nothing() {
        let owner = user(UserRole::NewHire);
        let mentor = user(UserRole::Mentor);
        let conv = conversation_owned_by(owner.id);
        let assignments = [MentorAssignment {
            mentor_id: mentor.id,
            newhire_id: owner.id,
            revoked_at: Some(Utc::now()),
        }];
        assert!(!can_access_conversation(&mentor, &conv, &assignments));
    }

    #[test]
    fn test_assignment_to_someone_else_grants_nothing() {
        let owner = user(UserRole::NewHire);
        let mentor = user(UserRole::Mentor);
        let conv = conversation_owned_by(owner.id);
        let assignments = [MentorAssignment {
            mentor_id: mentor.id,
            newhire_id: Uuid::now_v7(),
            revoked_at: None,
        }];
        assert!(!can_access_conversation(&mentor, &conv, &assignments));
    }

    #[test]
    fn test_non_mentor_role_with_matching_assignment_is_rejected() {
        let owner = user(UserRole::NewHire);
        let admin = user(UserRole::Admin);
        let conv = conversation_owned_by(owner.id);
        let assignments = [MentorAssignment {
            mentor_id: admin.id,
            newhire_id: owner.id,
            revoked_at: None,
        }];
        assert!(!can_access_conversation(&admin, &conv, &assignments));
    }
}

use uuid::Uuid;

use gedenk_types::models::{CollaboratorRole, Invitation, InvitationStatus, Memorial, PrivacyLevel};

/// Outcome of resolving whether an actor may view a memorial, and with which
/// role. Callers must re-resolve on every access attempt — a grant is never
/// valid across requests, since privacy level or invitation status may have
/// changed in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted { role: Option<CollaboratorRole> },
    Denied { reason: DenyReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The memorial does not exist. Responses must not distinguish this from
    /// `Denied` — both surface as not-found to avoid leaking existence.
    NotFound,
    Denied,
}

impl AccessDecision {
    pub fn granted(&self) -> bool {
        matches!(self, AccessDecision::Granted { .. })
    }

    pub fn role(&self) -> Option<CollaboratorRole> {
        match self {
            AccessDecision::Granted { role } => *role,
            AccessDecision::Denied { .. } => None,
        }
    }
}

/// Resolve access for `actor` (None = anonymous visitor) against a memorial.
///
/// `invitation` is the caller-fetched invitation row for (memorial, actor),
/// if one exists; rows for a different memorial or actor are ignored rather
/// than trusted.
///
/// Pure and side-effect free, so it is safe to call speculatively when
/// deciding what to render.
pub fn resolve_access(
    memorial: Option<&Memorial>,
    actor: Option<Uuid>,
    invitation: Option<&Invitation>,
) -> AccessDecision {
    let Some(memorial) = memorial else {
        return AccessDecision::Denied {
            reason: DenyReason::NotFound,
        };
    };

    if memorial.privacy == PrivacyLevel::Public {
        // Public pages are visible to everyone; the role only controls which
        // administrative affordances the owner sees.
        let role = match actor {
            Some(id) if id == memorial.creator_id => Some(CollaboratorRole::Administrator),
            _ => None,
        };
        return AccessDecision::Granted { role };
    }

    let Some(actor) = actor else {
        return AccessDecision::Denied {
            reason: DenyReason::Denied,
        };
    };

    if actor == memorial.creator_id {
        return AccessDecision::Granted {
            role: Some(CollaboratorRole::Administrator),
        };
    }

    if let Some(inv) = invitation
        && inv.memorial_id == memorial.id
        && inv.invited_user_id == actor
        && inv.status == InvitationStatus::Accepted
    {
        return AccessDecision::Granted {
            role: Some(inv.role),
        };
    }

    AccessDecision::Denied {
        reason: DenyReason::Denied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gedenk_types::models::MemorialKind;

    fn memorial(privacy: PrivacyLevel, creator: Uuid) -> Memorial {
        Memorial {
            id: Uuid::new_v4(),
            subject_name: "Anna Beispiel".into(),
            kind: MemorialKind::Person,
            privacy,
            creator_id: creator,
            created_at: chrono::Utc::now(),
        }
    }

    fn invitation(m: &Memorial, user: Uuid, status: InvitationStatus) -> Invitation {
        Invitation {
            memorial_id: m.id,
            invited_user_id: user,
            role: CollaboratorRole::Member,
            status,
        }
    }

    #[test]
    fn missing_memorial_is_not_found() {
        let decision = resolve_access(None, Some(Uuid::new_v4()), None);
        assert_eq!(
            decision,
            AccessDecision::Denied {
                reason: DenyReason::NotFound
            }
        );
    }

    #[test]
    fn public_grants_everyone() {
        let creator = Uuid::new_v4();
        let m = memorial(PrivacyLevel::Public, creator);

        let anon = resolve_access(Some(&m), None, None);
        assert!(anon.granted());
        assert_eq!(anon.role(), None);

        let stranger = resolve_access(Some(&m), Some(Uuid::new_v4()), None);
        assert!(stranger.granted());
        assert_eq!(stranger.role(), None);

        let owner = resolve_access(Some(&m), Some(creator), None);
        assert!(owner.granted());
        assert_eq!(owner.role(), Some(CollaboratorRole::Administrator));
    }

    #[test]
    fn private_denies_anonymous() {
        let m = memorial(PrivacyLevel::Private, Uuid::new_v4());
        let decision = resolve_access(Some(&m), None, None);
        assert_eq!(
            decision,
            AccessDecision::Denied {
                reason: DenyReason::Denied
            }
        );
    }

    #[test]
    fn private_creator_is_administrator() {
        let creator = Uuid::new_v4();
        let m = memorial(PrivacyLevel::Private, creator);
        let decision = resolve_access(Some(&m), Some(creator), None);
        assert_eq!(
            decision,
            AccessDecision::Granted {
                role: Some(CollaboratorRole::Administrator)
            }
        );
    }

    #[test]
    fn private_denies_without_accepted_invitation() {
        let m = memorial(PrivacyLevel::Private, Uuid::new_v4());
        let visitor = Uuid::new_v4();

        // No invitation row at all.
        assert!(!resolve_access(Some(&m), Some(visitor), None).granted());

        // Pending invitation grants nothing.
        let pending = invitation(&m, visitor, InvitationStatus::Pending);
        assert!(!resolve_access(Some(&m), Some(visitor), Some(&pending)).granted());
    }

    #[test]
    fn private_accepted_invitation_grants_its_role() {
        let m = memorial(PrivacyLevel::Private, Uuid::new_v4());
        let visitor = Uuid::new_v4();

        let mut inv = invitation(&m, visitor, InvitationStatus::Accepted);
        let decision = resolve_access(Some(&m), Some(visitor), Some(&inv));
        assert_eq!(
            decision,
            AccessDecision::Granted {
                role: Some(CollaboratorRole::Member)
            }
        );

        inv.role = CollaboratorRole::Administrator;
        let decision = resolve_access(Some(&m), Some(visitor), Some(&inv));
        assert_eq!(decision.role(), Some(CollaboratorRole::Administrator));
    }

    #[test]
    fn invitation_for_other_memorial_is_ignored() {
        let m = memorial(PrivacyLevel::Private, Uuid::new_v4());
        let visitor = Uuid::new_v4();

        let mut inv = invitation(&m, visitor, InvitationStatus::Accepted);
        inv.memorial_id = Uuid::new_v4();
        assert!(!resolve_access(Some(&m), Some(visitor), Some(&inv)).granted());
    }
}

//! Password-change authorization.

use crate::types::*;

/// Decides who may change whose password
///
/// Stateless. Rules, first match wins:
/// 1. Requester is a global admin
/// 2. Requester is the target
/// 3. Requester is a tenant admin in the target's tenant
///
/// Anything else is denied.
pub struct PasswordChangeAuthorizer;

impl PasswordChangeAuthorizer {
    /// Evaluate a password change and return the decision with its reason
    pub fn evaluate(requester: &Principal<'_>, target: &Principal<'_>) -> AuthorizationDecision {
        let mut audit_tags = vec![
            "operation:ChangePassword".to_string(),
            format!("requester_tenant:{}", requester.owner),
            format!("target_tenant:{}", target.owner),
        ];

        if requester.is_global_admin {
            audit_tags.push("rule:global_admin".to_string());
            return Self::allow("Requester is a global admin", audit_tags);
        }

        if requester.same_identity(target) {
            audit_tags.push("rule:self".to_string());
            return Self::allow("Requester is the target", audit_tags);
        }

        if requester.is_admin && requester.owner == target.owner {
            audit_tags.push("rule:tenant_admin".to_string());
            return Self::allow("Requester administers the target's tenant", audit_tags);
        }

        audit_tags.push("no_matching_rule".to_string());
        AuthorizationDecision {
            verdict: Verdict::Deny,
            audit_tags,
            reason: "No rule grants this password change".to_string(),
        }
    }

    /// True iff the requester may change the target's password
    pub fn can_change_password(requester: &Principal<'_>, target: &Principal<'_>) -> bool {
        Self::evaluate(requester, target).is_allowed()
    }

    fn allow(reason: &str, audit_tags: Vec<String>) -> AuthorizationDecision {
        AuthorizationDecision {
            verdict: Verdict::Allow,
            audit_tags,
            reason: reason.to_string(),
        }
    }
}

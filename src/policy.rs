//! Authorization Policy
//!
//! Pure decision functions for the user-mutation endpoints. Each gate looks at an
//! [`AccessRequest`] and either allows it or denies it with a reason; [`authorize`]
//! runs an ordered list of gates and stops at the first denial.

use crate::{
    auth::Requester,
    models::{Role, UpdateUserRequest, UserId},
};

/// Which mutation is being attempted. Selects the wording of ownership denials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Update,
    Delete,
}

/// Why a gate refused. Missing credentials and insufficient privilege stay separate kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    Unauthorized,
    Forbidden(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

/// Everything a gate may inspect. Built by the handler after validation succeeded.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub requester: Option<&'a Requester>,
    pub target: UserId,
    pub action: Action,
    pub changes: Option<&'a UpdateUserRequest>,
}

pub type Gate = fn(&AccessRequest<'_>) -> Decision;

/// Gate order for PUT /users/{id}.
pub const UPDATE_GATES: &[Gate] = &[
    require_identity,
    require_self_or_admin,
    require_admin_for_role_change,
];

/// Gate order for DELETE /users/{id}.
pub const DELETE_GATES: &[Gate] = &[require_identity, require_self_or_admin];

pub const UPDATE_OTHERS_DENIED: &str = "You can only update your own information";
pub const DELETE_OTHERS_DENIED: &str = "You can only delete your own account";
pub const ROLE_CHANGE_DENIED: &str = "Only admins can change user roles";

/// Evaluates `gates` left to right. The first `Deny` is returned and later gates never run.
pub fn authorize(gates: &[Gate], request: &AccessRequest<'_>) -> Decision {
    gates
        .iter()
        .map(|gate| gate(request))
        .find(|decision| matches!(decision, Decision::Deny(_)))
        .unwrap_or(Decision::Allow)
}

// --- Predicates ---

pub fn authentication_presence(requester: Option<&Requester>) -> Decision {
    match requester {
        Some(_) => Decision::Allow,
        None => Decision::Deny(Denial::Unauthorized),
    }
}

pub fn ownership_or_admin(requester: &Requester, target: UserId, action: Action) -> Decision {
    let privileged = match requester.role {
        Role::Admin => true,
        Role::User => false,
    };

    if privileged || requester.id == target {
        return Decision::Allow;
    }

    Decision::Deny(Denial::Forbidden(match action {
        Action::Update => UPDATE_OTHERS_DENIED,
        Action::Delete => DELETE_OTHERS_DENIED,
    }))
}

pub fn role_change(changes: &UpdateUserRequest, requester_role: Role) -> Decision {
    if changes.changes_role() && !requester_role.is_admin() {
        return Decision::Deny(Denial::Forbidden(ROLE_CHANGE_DENIED));
    }
    Decision::Allow
}

// --- Gates ---

fn require_identity(request: &AccessRequest<'_>) -> Decision {
    authentication_presence(request.requester)
}

fn require_self_or_admin(request: &AccessRequest<'_>) -> Decision {
    match request.requester {
        Some(requester) => ownership_or_admin(requester, request.target, request.action),
        None => Decision::Deny(Denial::Unauthorized),
    }
}

fn require_admin_for_role_change(request: &AccessRequest<'_>) -> Decision {
    match (request.requester, request.changes) {
        (Some(requester), Some(changes)) => role_change(changes, requester.role),
        (None, _) => Decision::Deny(Denial::Unauthorized),
        (Some(_), None) => Decision::Allow,
    }
}

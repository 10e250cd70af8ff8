use serde::Serialize;

use crate::auth::Session;
use crate::types::Role;

/// Views of the admin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Landing,
    Login,
    Dashboard,
    Students,
    Staff,
}

/// Where unauthenticated navigation ends up
pub const LANDING_ROUTE: Route = Route::Landing;

/// Where authenticated but unauthorized navigation ends up
pub const DEFAULT_AUTHENTICATED_ROUTE: Route = Route::Dashboard;

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Landing,
        Route::Login,
        Route::Dashboard,
        Route::Students,
        Route::Staff,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Students => "/dashboard/student",
            Route::Staff => "/dashboard/staff",
        }
    }

    /// Exact path match; a trailing slash is ignored
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.trim();
        let normalized = if path.len() > 1 { path.trim_end_matches('/') } else { path };
        Route::ALL.into_iter().find(|route| route.path() == normalized)
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Landing | Route::Login => Access::Public,
            Route::Dashboard | Route::Students => Access::Protected(RouteGuardPolicy::any_authenticated()),
            Route::Staff => Access::Protected(RouteGuardPolicy::only(&[Role::Admin])),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected(RouteGuardPolicy),
}

/// Roles allowed to reach a protected route; `None` admits any identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteGuardPolicy {
    pub allowed_roles: Option<Vec<Role>>,
}

impl RouteGuardPolicy {
    pub fn any_authenticated() -> Self {
        Self { allowed_roles: None }
    }

    pub fn only(roles: &[Role]) -> Self {
        Self {
            allowed_roles: Some(roles.to_vec()),
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        match &self.allowed_roles {
            None => true,
            Some(roles) => roles.contains(&role),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GuardOutcome {
    Unauthenticated { redirect: Route },
    RoleRejected { redirect: Route },
    Admitted,
}

impl GuardOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GuardOutcome::Admitted)
    }

    pub fn redirect(&self) -> Option<Route> {
        match self {
            GuardOutcome::Unauthenticated { redirect } | GuardOutcome::RoleRejected { redirect } => {
                Some(*redirect)
            }
            GuardOutcome::Admitted => None,
        }
    }
}

/// Decide a single navigation attempt. Evaluated fresh every time.
pub fn evaluate(session: &Session, policy: &RouteGuardPolicy) -> GuardOutcome {
    let Some(identity) = session.identity() else {
        return GuardOutcome::Unauthenticated {
            redirect: LANDING_ROUTE,
        };
    };

    if !policy.permits(identity.role) {
        return GuardOutcome::RoleRejected {
            redirect: DEFAULT_AUTHENTICATED_ROUTE,
        };
    }

    GuardOutcome::Admitted
}

/// Result of navigating to a route, after following the guard's redirect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub requested: Route,
    pub destination: Route,
    /// `None` for public routes, which are never guarded
    pub outcome: Option<GuardOutcome>,
}

impl Navigation {
    pub fn admitted(&self) -> bool {
        self.requested == self.destination
    }
}

pub fn navigate(session: &Session, requested: Route) -> Navigation {
    match requested.access() {
        Access::Public => Navigation {
            requested,
            destination: requested,
            outcome: None,
        },
        Access::Protected(policy) => {
            let outcome = evaluate(session, &policy);
            let destination = outcome.redirect().unwrap_or(requested);
            if !outcome.is_admitted() {
                tracing::debug!("Navigation to {} redirected to {}", requested, destination);
            }
            Navigation {
                requested,
                destination,
                outcome: Some(outcome),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: &'static str,
    pub label: &'static str,
    pub route: Route,
}

/// Sidebar entries for a role
pub fn menu(role: Role) -> Vec<MenuItem> {
    let mut items = vec![
        MenuItem { id: "dashboard", label: "Dashboard", route: Route::Dashboard },
        MenuItem { id: "students", label: "Students", route: Route::Students },
    ];

    match role {
        Role::Admin => items.push(MenuItem { id: "staff", label: "Staff", route: Route::Staff }),
        Role::Staff => {}
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStorage, SessionStore};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::sync::Arc;

    fn session(role: Option<&str>) -> Session {
        let store = SessionStore::with_storage(Arc::new(MemoryTokenStorage::new()));
        if let Some(role) = role {
            let token = encode(
                &Header::default(),
                &json!({"id": "x1", "role": role}),
                &EncodingKey::from_secret(b"secret"),
            )
            .unwrap();
            store.commit(token).unwrap();
        }
        store.current()
    }

    #[test]
    fn no_session_goes_to_landing_regardless_of_policy() {
        let empty = session(None);
        for policy in [RouteGuardPolicy::any_authenticated(), RouteGuardPolicy::only(&[Role::Admin])] {
            assert_eq!(
                evaluate(&empty, &policy),
                GuardOutcome::Unauthenticated { redirect: Route::Landing }
            );
        }
    }

    #[test]
    fn staff_rejected_from_admin_route_goes_to_dashboard() {
        let outcome = evaluate(&session(Some("staff")), &RouteGuardPolicy::only(&[Role::Admin]));
        assert_eq!(outcome, GuardOutcome::RoleRejected { redirect: Route::Dashboard });
    }

    #[test]
    fn admitted_cases() {
        let admin = session(Some("admin"));
        let staff = session(Some("staff"));
        assert!(evaluate(&admin, &RouteGuardPolicy::only(&[Role::Admin])).is_admitted());
        assert!(evaluate(&staff, &RouteGuardPolicy::any_authenticated()).is_admitted());
        assert!(evaluate(&staff, &RouteGuardPolicy::only(&[Role::Admin, Role::Staff])).is_admitted());
    }

    #[test]
    fn parses_known_paths() {
        assert_eq!(Route::parse("/"), Some(Route::Landing));
        assert_eq!(Route::parse("/dashboard/staff/"), Some(Route::Staff));
        assert_eq!(Route::parse("/dashboard/student"), Some(Route::Students));
        assert_eq!(Route::parse("/dashboard/teachers"), None);
    }

    #[test]
    fn navigate_follows_redirects() {
        let staff = session(Some("staff"));
        let nav = navigate(&staff, Route::Staff);
        assert_eq!(nav.destination, Route::Dashboard);
        assert!(!nav.admitted());

        let nav = navigate(&session(None), Route::Students);
        assert_eq!(nav.destination, Route::Landing);

        let nav = navigate(&session(None), Route::Login);
        assert!(nav.admitted());
        assert_eq!(nav.outcome, None);
    }

    #[test]
    fn staff_menu_hides_staff_management() {
        let ids: Vec<_> = menu(Role::Staff).iter().map(|item| item.id).collect();
        assert_eq!(ids, vec!["dashboard", "students"]);
        assert!(menu(Role::Admin).iter().any(|item| item.route == Route::Staff));
    }
}

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::api::models::{Staff, StaffInput, StudentInput};
use crate::api::ApiClient;
use crate::auth::{Claims, Session, SessionError, SessionStore, StorageError};
use crate::error::ClientError;
use crate::guard::action::{self, Denial, Gated, StudentListView};
use crate::guard::route::{self, GuardOutcome, Navigation, Route};
use crate::permissions::{PermissionError, PermissionResolver, PermissionSet};
use crate::types::StudentAction;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Not logged in")]
    NotAuthenticated,

    /// The current identity may not open the view backing this operation
    #[error("Access to {requested} is not allowed for this account (redirected to {redirect})")]
    RouteRejected { requested: Route, redirect: Route },

    #[error("{0}")]
    Denied(Denial),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl PanelError {
    /// Get error code for output handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PanelError::NotAuthenticated => "NOT_AUTHENTICATED",
            PanelError::RouteRejected { .. } => "ROUTE_REJECTED",
            PanelError::Denied(_) => "ACTION_DENIED",
            PanelError::Session(SessionError::Decode(_)) => "INVALID_CREDENTIAL",
            PanelError::Session(SessionError::Storage(_)) | PanelError::Storage(_) => "STORAGE_ERROR",
            PanelError::Permission(PermissionError::Store { .. }) => "PERMISSION_SAVE_FAILED",
            PanelError::Permission(_) => "PERMISSION_FETCH_FAILED",
            PanelError::Client(e) => e.error_code(),
        }
    }
}

/// Everything the student management view needs to render
#[derive(Debug, Clone, Serialize)]
pub struct StudentsPage {
    pub view: StudentListView,
    pub permissions: PermissionSet,
    pub can_create: bool,
    pub row_actions: Vec<StudentAction>,
    /// Set when permissions could not be fetched; flags are fail-closed then
    pub permission_error: Option<String>,
}

/// Application context: one session, one resolver, one backend client.
///
/// Every view and action goes through the route guard and, for student
/// mutations, the action gate before any backend call is issued.
pub struct AdminPanel {
    session: SessionStore,
    api: ApiClient,
    permissions: PermissionResolver,
}

impl AdminPanel {
    pub fn new(session: SessionStore, api: ApiClient) -> Self {
        let api = api.with_session(session.clone());
        let permissions = PermissionResolver::new(Arc::new(api.clone()), session.clone());
        Self {
            session,
            api,
            permissions,
        }
    }

    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    pub fn current(&self) -> Session {
        self.session.current()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Claims, PanelError> {
        let response = self.api.login(email, password).await?;
        self.permissions.clear();
        let identity = self.session.commit(response.token)?;
        Ok(identity)
    }

    pub fn logout(&self) -> Result<(), PanelError> {
        self.permissions.clear();
        self.session.clear()?;
        Ok(())
    }

    pub fn navigate(&self, route: Route) -> Navigation {
        route::navigate(&self.session.current(), route)
    }

    /// Guard the view backing an operation and return the identity admitted to it
    fn enter(&self, requested: Route) -> Result<Claims, PanelError> {
        let session = self.session.current();
        match route::navigate(&session, requested).outcome {
            Some(GuardOutcome::Unauthenticated { .. }) => Err(PanelError::NotAuthenticated),
            Some(GuardOutcome::RoleRejected { redirect }) => {
                Err(PanelError::RouteRejected { requested, redirect })
            }
            Some(GuardOutcome::Admitted) | None => {
                session.identity().cloned().ok_or(PanelError::NotAuthenticated)
            }
        }
    }

    /// Resolved flags, or the fail-closed effective set plus the reason it could not be resolved
    async fn permissions_for(&self, identity: &Claims) -> (PermissionSet, Option<PermissionError>) {
        match self.permissions.resolve(identity).await {
            Ok(set) => (set, None),
            Err(e) => (self.permissions.effective(identity), Some(e)),
        }
    }

    /// Flags for the logged-in identity
    pub async fn my_permissions(&self) -> Result<PermissionSet, PanelError> {
        let identity = self.enter(Route::Dashboard)?;
        Ok(self.permissions.refresh(&identity).await?)
    }

    // Students

    pub async fn students(&self) -> Result<StudentsPage, PanelError> {
        let identity = self.enter(Route::Students)?;
        let (permissions, permission_error) = self.permissions_for(&identity).await;

        let view = action::student_list(&identity, &permissions, || self.api.list_students()).await?;

        Ok(StudentsPage {
            view,
            permissions,
            can_create: action::check(StudentAction::Create, &identity, &permissions).is_allowed(),
            row_actions: action::row_actions(&identity, &permissions),
            permission_error: permission_error.map(|e| e.to_string()),
        })
    }

    pub async fn create_student(&self, input: &StudentInput) -> Result<Value, PanelError> {
        self.gated(StudentAction::Create, || self.api.create_student(input)).await
    }

    pub async fn update_student(&self, id: &str, input: &StudentInput) -> Result<Value, PanelError> {
        self.gated(StudentAction::Update, || self.api.update_student(id, input)).await
    }

    pub async fn delete_student(&self, id: &str) -> Result<Value, PanelError> {
        self.gated(StudentAction::Delete, || self.api.delete_student(id)).await
    }

    async fn gated<T, F, Fut>(&self, action: StudentAction, op: F) -> Result<T, PanelError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let identity = self.enter(Route::Students)?;
        let (permissions, permission_error) = self.permissions_for(&identity).await;

        match action::guard(action, &identity, &permissions, op).await {
            Gated::Done(value) => Ok(value),
            // Fail-closed flags are not a real denial when the fetch itself failed
            Gated::Denied(denial) => match permission_error {
                Some(e) => Err(PanelError::Permission(e)),
                None => Err(PanelError::Denied(denial)),
            },
            Gated::Failed(e) => Err(e.into()),
        }
    }

    // Staff management (admin only)

    pub async fn staff(&self) -> Result<Vec<Staff>, PanelError> {
        self.enter(Route::Staff)?;
        Ok(self.api.list_staff().await?)
    }

    pub async fn create_staff(&self, input: &StaffInput) -> Result<Value, PanelError> {
        self.enter(Route::Staff)?;
        Ok(self.api.create_staff(input).await?)
    }

    pub async fn update_staff(&self, id: &str, input: &StaffInput) -> Result<Value, PanelError> {
        self.enter(Route::Staff)?;
        Ok(self.api.update_staff(id, input).await?)
    }

    pub async fn delete_staff(&self, id: &str) -> Result<Value, PanelError> {
        self.enter(Route::Staff)?;
        self.permissions.invalidate(id);
        Ok(self.api.delete_staff(id).await?)
    }

    pub async fn staff_permissions(&self, staff_id: &str) -> Result<PermissionSet, PanelError> {
        self.enter(Route::Staff)?;
        Ok(self.permissions.lookup(staff_id).await?)
    }

    pub async fn set_staff_permissions(
        &self,
        staff_id: &str,
        permissions: PermissionSet,
    ) -> Result<(), PanelError> {
        self.enter(Route::Staff)?;
        Ok(self.permissions.update(staff_id, permissions).await?)
    }
}

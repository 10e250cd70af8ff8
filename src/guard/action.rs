use std::future::Future;

use serde::Serialize;

use crate::api::models::Student;
use crate::auth::Claims;
use crate::permissions::PermissionSet;
use crate::types::StudentAction;

/// Why an action was withheld; shown to the user as a blocking explanation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Denial {
    pub action: StudentAction,
    pub reason: &'static str,
}

impl Denial {
    pub fn new(action: StudentAction) -> Self {
        Self {
            action,
            reason: action.denial_message(),
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    Allowed,
    Denied(Denial),
}

impl GateOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateOutcome::Allowed)
    }
}

/// Decide whether `identity` may perform `action` on students
pub fn check(action: StudentAction, identity: &Claims, permissions: &PermissionSet) -> GateOutcome {
    if identity.is_admin() || permissions.allows(action) {
        return GateOutcome::Allowed;
    }

    tracing::debug!("Denied {} on students for {}", action, identity.id);
    GateOutcome::Denied(Denial::new(action))
}

/// Per-row actions to offer in the student table; empty means none available
pub fn row_actions(identity: &Claims, permissions: &PermissionSet) -> Vec<StudentAction> {
    [StudentAction::Update, StudentAction::Delete]
        .into_iter()
        .filter(|action| check(*action, identity, permissions).is_allowed())
        .collect()
}

/// Outcome of a gated operation
#[derive(Debug)]
pub enum Gated<T, E> {
    Done(T),
    Denied(Denial),
    Failed(E),
}

impl<T, E> Gated<T, E> {
    pub fn into_result(self) -> Result<Result<T, E>, Denial> {
        match self {
            Gated::Done(value) => Ok(Ok(value)),
            Gated::Failed(err) => Ok(Err(err)),
            Gated::Denied(denial) => Err(denial),
        }
    }
}

/// Run `op` only when the gate allows `action`; a denial never reaches the backend
pub async fn guard<F, Fut, T, E>(
    action: StudentAction,
    identity: &Claims,
    permissions: &PermissionSet,
    op: F,
) -> Gated<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match check(action, identity, permissions) {
        GateOutcome::Denied(denial) => Gated::Denied(denial),
        GateOutcome::Allowed => match op().await {
            Ok(value) => Gated::Done(value),
            Err(err) => Gated::Failed(err),
        },
    }
}

/// What the student list view renders.
///
/// A read denial replaces the whole table so it cannot be mistaken for an
/// empty roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum StudentListView {
    AccessDenied { denial: Denial },
    Empty,
    Students { students: Vec<Student> },
}

impl StudentListView {
    pub fn from_students(students: Vec<Student>) -> Self {
        if students.is_empty() {
            StudentListView::Empty
        } else {
            StudentListView::Students { students }
        }
    }
}

/// Gate the read action, fetching the list only when allowed
pub async fn student_list<F, Fut, E>(
    identity: &Claims,
    permissions: &PermissionSet,
    fetch: F,
) -> Result<StudentListView, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Student>, E>>,
{
    match guard(StudentAction::Read, identity, permissions, fetch).await {
        Gated::Done(students) => Ok(StudentListView::from_students(students)),
        Gated::Denied(denial) => Ok(StudentListView::AccessDenied { denial }),
        Gated::Failed(err) => Err(err),
    }
}

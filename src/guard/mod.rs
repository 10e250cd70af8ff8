pub mod action;
pub mod route;

pub use action::{Denial, GateOutcome, Gated, StudentListView};
pub use route::{GuardOutcome, Navigation, Route, RouteGuardPolicy};

pub mod auth;
pub mod nav;
pub mod staff;
pub mod student;

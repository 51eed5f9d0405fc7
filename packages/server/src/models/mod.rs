pub mod admin;
pub mod auth;
pub mod engagement;
pub mod evaluation;
pub mod event;
pub mod profile;
pub mod registration;
pub mod shared;
pub mod submission;

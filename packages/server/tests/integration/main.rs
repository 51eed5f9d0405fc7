mod admin;
mod auth;
mod common;
mod engagement;
mod event;

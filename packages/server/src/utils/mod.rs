pub mod event;
pub mod hash;
pub mod jwt;
pub mod role_gate;

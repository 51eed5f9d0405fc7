pub mod event;
pub mod organizer;
pub mod profile;
pub mod recently_viewed;
pub mod registration;
pub mod role;
pub mod submission;
pub mod team_member;
pub mod user;
pub mod user_role;
pub mod wishlist;

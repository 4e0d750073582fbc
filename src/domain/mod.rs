pub mod contact;
pub mod error;
pub mod notification;
pub mod patch;
pub mod user;

pub mod contacts;
pub mod merge;
pub mod projection;
pub mod users;
pub mod validation;

pub mod accounting;
pub mod auth;
pub mod leads;
pub mod requests;
pub mod users;

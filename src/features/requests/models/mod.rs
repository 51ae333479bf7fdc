mod assignment_request;

pub use assignment_request::*;

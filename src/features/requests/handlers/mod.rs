mod request_handler;

pub use request_handler::*;

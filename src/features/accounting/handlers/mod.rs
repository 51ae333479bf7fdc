mod accounting_handler;

pub use accounting_handler::*;

mod accounting_dto;

pub use accounting_dto::*;

mod accounting_service;

pub use accounting_service::AccountingService;

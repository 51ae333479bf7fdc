mod lead_dto;
mod lead_log_dto;

pub use lead_dto::*;
pub use lead_log_dto::*;

mod lead;
mod lead_log;

pub use lead::*;
pub use lead_log::*;

mod expense;
mod invoice;

pub use expense::*;
pub use invoice::*;

pub mod constants;
pub mod money;
pub mod password;
pub mod test_helpers;
pub mod types;
pub mod validation;

pub mod first_touch;
pub mod logging_service;
pub mod pay_service;

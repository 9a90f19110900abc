pub mod polling_service;
pub mod telegram_service;
pub mod update_service;

pub mod telegram_dto;
pub mod webapp_dto;

pub mod booking;
pub mod database;
pub mod lifecycle;
pub mod reviews;
pub mod time_slots;

pub mod datetime;
pub mod reservation;

pub mod id;
pub mod reservation;

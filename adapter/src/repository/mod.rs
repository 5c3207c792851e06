pub mod health;
pub mod in_memory;
pub mod reservation;

pub mod contracts;
pub mod workers;

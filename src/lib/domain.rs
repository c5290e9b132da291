//! Domain layer

pub mod communication;

pub mod controller;
pub mod safety;

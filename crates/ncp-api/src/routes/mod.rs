pub mod admin;
pub mod explanations;
pub mod generate;
pub mod health;
pub mod ncps;

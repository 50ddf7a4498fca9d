pub mod course;
pub mod health;

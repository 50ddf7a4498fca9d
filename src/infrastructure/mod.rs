pub mod config;
pub mod db;
pub mod http;
pub mod jobs;
pub mod media;
pub mod repositories;

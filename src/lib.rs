pub mod db;
pub mod intake;
pub mod server;
pub mod version;
pub mod web;

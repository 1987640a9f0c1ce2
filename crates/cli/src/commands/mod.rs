pub mod config_cmd;
pub mod extract;
pub mod gateway;

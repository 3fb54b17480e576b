pub mod byte_sink;
pub mod command_logger;
pub mod command_runner;

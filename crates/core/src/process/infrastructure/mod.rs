pub mod child_process_sink;
pub mod shell_command_runner;

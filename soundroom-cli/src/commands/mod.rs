pub mod build_cmd;
pub mod check_cmd;
pub mod init_cmd;
pub mod simulate_cmd;

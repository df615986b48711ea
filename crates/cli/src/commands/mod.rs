pub mod account;

pub use account::handle_account_command;

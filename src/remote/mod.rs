// Remote text protocol over UDP

pub mod command;
pub mod server;

pub use command::RemoteCommand;
pub use server::{CommandHandler, RemoteServer};

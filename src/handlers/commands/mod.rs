//! Built-in chat commands.

mod exit;
mod nick;

pub use exit::ExitHandler;
pub use nick::NickHandler;

//! `/exit`: leave the chat.

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{CommandHandler, Context};
use async_trait::async_trait;
use tracing::info;

pub struct ExitHandler;

#[async_trait]
impl CommandHandler for ExitHandler {
    async fn handle(&self, ctx: &Context<'_>, _arg: Option<&str>) -> HandlerResult {
        info!(conn = %ctx.conn, nick = %ctx.nick, "Client requested exit");
        // The session's cleanup path announces the departure.
        Err(HandlerError::ClientExit)
    }
}

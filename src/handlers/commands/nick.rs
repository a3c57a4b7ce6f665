//! `/nick <new_nickname>`: change the caller's display name.

use crate::error::HandlerResult;
use crate::handlers::helpers::{NICK_USAGE, renamed};
use crate::handlers::{CommandHandler, Context};
use async_trait::async_trait;
use tracing::info;

pub struct NickHandler;

#[async_trait]
impl CommandHandler for NickHandler {
    async fn handle(&self, ctx: &Context<'_>, arg: Option<&str>) -> HandlerResult {
        let Some(new_nick) = arg else {
            ctx.reply(NICK_USAGE).await?;
            return Ok(());
        };

        ctx.hub.sessions.register(ctx.conn, new_nick);
        info!(conn = %ctx.conn, old = %ctx.nick, new = %new_nick, "Nickname changed");

        ctx.hub
            .delivery
            .broadcast(&renamed(ctx.nick, new_nick), Some(ctx.conn))
            .await;
        Ok(())
    }
}

//! Text of every notice the relay sends.
//!
//! Lines are built without a terminator; the delivery task appends `\n`.

/// Sent once, directly, right after a client connects.
pub const NICKNAME_PROMPT: &str = "Enter your nickname: ";

pub const NICK_USAGE: &str = "Usage: /nick <new_nickname>";

pub const UNKNOWN_COMMAND: &str = "Unknown command";

pub const LINE_TOO_LONG: &str = "Line too long";

/// A relayed chat line. This exact text is also what goes to history.
pub fn chat_line(nick: &str, body: &str) -> String {
    format!("({nick}): {body}")
}

pub fn joined(nick: &str) -> String {
    format!("User {nick} joined the chat")
}

pub fn left(nick: &str) -> String {
    format!("User {nick} has left the chat")
}

pub fn renamed(old: &str, new: &str) -> String {
    format!("User changed nickname from {old} to {new}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_texts() {
        assert_eq!(chat_line("alice", "hi there"), "(alice): hi there");
        assert_eq!(joined("bob"), "User bob joined the chat");
        assert_eq!(left("bob"), "User bob has left the chat");
        assert_eq!(
            renamed("bob", "robert"),
            "User changed nickname from bob to robert"
        );
    }

    #[test]
    fn chat_line_keeps_body_verbatim() {
        assert_eq!(chat_line("a", "  spaced  /nick x"), "(a):   spaced  /nick x");
    }
}

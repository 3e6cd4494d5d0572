//! Line protocol spoken between `parley-chat` and `parley-server`.
//!
//! Every message is one `\n`-terminated line. After connecting, the server
//! prompts for an identifier until one is accepted, greets the client,
//! then reads commands. A command keyword sits on its own line; its
//! operands follow on the next lines.

use std::fmt;

use parley_hub::ClientId;

/// Sent before every identifier attempt.
pub const ID_PROMPT: &str = "Enter the Client's ID:";

/// Sent when the requested identifier is taken; the prompt follows.
pub const DUPLICATE_ID: &str =
    "The client ID is already in use. Kindly provide a distinct client ID.";

/// Greeting for a client that becomes coordinator on admission.
pub const COORDINATOR_GREETING: &str = "You are assigned as the coordinator.";

/// Prefix of the greeting naming the current coordinator.
pub const PRESENT_COORDINATOR: &str = "Present coordinator:";

/// Command menu shown by the console client.
pub const MENU: &str = "Enter 'b' to broadcast message, 'p' to message privately, \
'list' for info of all the active members, 'q' to quit:";

/// Greeting sent right after a successful admission.
pub fn greeting(me: &ClientId, coordinator: &ClientId) -> String {
    if coordinator == me {
        COORDINATOR_GREETING.to_string()
    } else {
        format!("{PRESENT_COORDINATOR} {coordinator}")
    }
}

/// True for either greeting form, i.e. registration is complete.
pub fn is_greeting(line: &str) -> bool {
    line.starts_with(COORDINATOR_GREETING) || line.starts_with(PRESENT_COORDINATOR)
}

/// Command keyword read from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `b`, followed by one content line.
    Broadcast,
    /// `p`, followed by a recipient line and a content line.
    Direct,
    /// `list`.
    List,
    /// `q`.
    Quit,
    Unknown(String),
}

impl Command {
    /// Keywords are case-insensitive; surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Self {
        let word = line.trim();
        if word.eq_ignore_ascii_case("b") {
            Command::Broadcast
        } else if word.eq_ignore_ascii_case("p") {
            Command::Direct
        } else if word.eq_ignore_ascii_case("list") {
            Command::List
        } else if word.eq_ignore_ascii_case("q") {
            Command::Quit
        } else {
            Command::Unknown(word.to_string())
        }
    }

    pub fn keyword(&self) -> &str {
        match self {
            Command::Broadcast => "b",
            Command::Direct => "p",
            Command::List => "list",
            Command::Quit => "q",
            Command::Unknown(word) => word,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ClientId {
        ClientId::new(s).unwrap()
    }

    #[test]
    fn parse_keywords_case_insensitive() {
        assert_eq!(Command::parse("b"), Command::Broadcast);
        assert_eq!(Command::parse("B"), Command::Broadcast);
        assert_eq!(Command::parse(" p "), Command::Direct);
        assert_eq!(Command::parse("LIST"), Command::List);
        assert_eq!(Command::parse("Q"), Command::Quit);
        assert_eq!(Command::parse("hello"), Command::Unknown("hello".into()));
    }

    #[test]
    fn keyword_roundtrip() {
        for cmd in [Command::Broadcast, Command::Direct, Command::List, Command::Quit] {
            assert_eq!(Command::parse(&cmd.to_string()), cmd);
        }
    }

    #[test]
    fn greeting_forms() {
        assert_eq!(
            greeting(&id("alice"), &id("alice")),
            "You are assigned as the coordinator."
        );
        assert_eq!(
            greeting(&id("bob"), &id("alice")),
            "Present coordinator: alice"
        );
        assert!(is_greeting(&greeting(&id("bob"), &id("alice"))));
        assert!(!is_greeting(ID_PROMPT));
        assert!(!is_greeting(DUPLICATE_ID));
    }
}

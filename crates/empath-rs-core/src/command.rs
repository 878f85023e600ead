//! Inbound message classification.

/// What an inbound text asks the relay to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`: reset the log and send the welcome text.
    Start,
    /// `/reset`: clear the log and confirm.
    Reset,
    /// Plain text that starts a completion turn.
    Text(String),
    /// A slash command the relay does not handle.
    Unknown(String),
    /// A command addressed to another bot with `/name@other_bot`.
    Foreign(String),
}

impl Command {
    /// Classify `text`.
    ///
    /// Command names are matched case-insensitively. A `/name@bot` suffix
    /// must name `bot_username` (compared case-insensitively); without a
    /// known username any suffix is accepted.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Self {
        let Some(rest) = text.strip_prefix('/') else {
            return Self::Text(text.to_string());
        };
        let token = rest.split_whitespace().next().unwrap_or_default();
        let (name, target) = match token.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (token, None),
        };
        if let (Some(target), Some(username)) = (target, bot_username)
            && !target.eq_ignore_ascii_case(username.trim_start_matches('@'))
        {
            return Self::Foreign(target.to_string());
        }
        match name.to_lowercase().as_str() {
            "start" => Self::Start,
            "reset" => Self::Reset,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Command;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/start", None), Command::Start);
        assert_eq!(Command::parse("/reset please", None), Command::Reset);
        assert_eq!(Command::parse("/help", None), Command::Unknown("help".to_string()));
    }

    #[test]
    fn command_names_ignore_case() {
        assert_eq!(Command::parse("/Start", None), Command::Start);
        assert_eq!(Command::parse("/RESET", Some("EmpathBot")), Command::Reset);
    }

    #[test]
    fn addressed_commands_must_name_this_bot() {
        assert_eq!(
            Command::parse("/start@EmpathBot", Some("EmpathBot")),
            Command::Start
        );
        assert_eq!(
            Command::parse("/reset@empathbot", Some("EmpathBot")),
            Command::Reset
        );
        assert_eq!(
            Command::parse("/reset@SomeOtherBot", Some("EmpathBot")),
            Command::Foreign("SomeOtherBot".to_string())
        );
    }

    #[test]
    fn unknown_username_accepts_any_suffix() {
        assert_eq!(Command::parse("/start@EmpathBot", None), Command::Start);
    }

    #[test]
    fn plain_text_is_kept_verbatim() {
        assert_eq!(
            Command::parse("I feel anxious /start", Some("EmpathBot")),
            Command::Text("I feel anxious /start".to_string())
        );
    }
}

//! Line protocol definitions
//!
//! Client lines are parsed into a [`Command`]; everything the relay writes
//! back is a [`Notice`] whose `Display` impl is the exact wire text.
//! [`read_line`] and [`write_line`] do the framing.

use std::fmt;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Longest accepted input line in bytes, terminator excluded
pub const MAX_LINE_LEN: usize = 4096;

/// Client → Relay command
///
/// One command per input line. Anything that is not a known command is
/// chat text and is broadcast verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/block <user>`: stop receiving chat lines from `user`
    Block(String),
    /// `/unblock <user>`: lift a previous block
    Unblock(String),
    /// `/online`: broadcast the roster to everyone
    Online,
    /// `/private <user> <text...>`: direct message
    Private { to: String, text: String },
    /// Any other line, kept whole
    Broadcast(String),
}

impl Command {
    /// Parse one input line
    ///
    /// The first whitespace-delimited token is the command, the next token
    /// the argument, and the remainder (embedded whitespace included) the
    /// message. Missing pieces are empty strings.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.splitn(3, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let argument = parts.next().unwrap_or_default().to_string();
        let message = parts.next().unwrap_or_default().to_string();

        match command {
            "/block" => Command::Block(argument),
            "/unblock" => Command::Unblock(argument),
            "/online" => Command::Online,
            "/private" => Command::Private {
                to: argument,
                text: message,
            },
            _ => Command::Broadcast(line.to_string()),
        }
    }
}

/// Relay → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// First prompt on connect
    UsernamePrompt,
    /// The proposed name is held by a live session
    UsernameTaken,
    /// A session claimed its name
    Joined { name: String },
    /// Ordinary chat line
    Chat { from: String, text: String },
    /// Direct message
    Private { from: String, text: String },
    /// Names of every active session, in join order
    Roster { names: Vec<String> },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UsernamePrompt => write!(f, "Enter your username: "),
            Notice::UsernameTaken => {
                write!(f, "Username is already taken. Enter a different username: ")
            }
            Notice::Joined { name } => write!(f, "{} has joined the chat.", name),
            Notice::Chat { from, text } => write!(f, "{}: {}", from, text),
            Notice::Private { from, text } => {
                write!(f, "Private message from {}: {}", from, text)
            }
            Notice::Roster { names } => write!(f, "Users Online: {}", names.join(", ")),
        }
    }
}

/// Read one client line
///
/// Strips the `\n` or `\r\n` terminator and replaces bytes that are not
/// valid UTF-8 with U+FFFD. `Ok(None)` means end of stream. A line longer
/// than [`MAX_LINE_LEN`] fails with `InvalidData`.
pub async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    // Room for the longest line plus "\r\n"
    let limit = MAX_LINE_LEN as u64 + 2;
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(limit)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if read as u64 == limit {
        return Err(line_too_long());
    }

    if buf.len() > MAX_LINE_LEN {
        return Err(line_too_long());
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Write `line` followed by `\n` and flush
pub async fn write_line<W>(writer: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

fn line_too_long() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("line exceeds {} bytes", MAX_LINE_LEN),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_and_unblock() {
        assert_eq!(Command::parse("/block alice"), Command::Block("alice".into()));
        assert_eq!(
            Command::parse("/unblock alice"),
            Command::Unblock("alice".into())
        );
    }

    #[test]
    fn test_parse_online_ignores_trailing_tokens() {
        assert_eq!(Command::parse("/online"), Command::Online);
        assert_eq!(Command::parse("/online please"), Command::Online);
    }

    #[test]
    fn test_parse_private_keeps_embedded_whitespace() {
        assert_eq!(
            Command::parse("/private bob see  you at 5"),
            Command::Private {
                to: "bob".into(),
                text: "see  you at 5".into(),
            }
        );
    }

    #[test]
    fn test_parse_missing_argument_is_empty() {
        assert_eq!(Command::parse("/block"), Command::Block(String::new()));
        assert_eq!(
            Command::parse("/private bob"),
            Command::Private {
                to: "bob".into(),
                text: String::new(),
            }
        );
    }

    #[test]
    fn test_parse_unknown_is_whole_line_broadcast() {
        assert_eq!(
            Command::parse("hello there world"),
            Command::Broadcast("hello there world".into())
        );
        assert_eq!(
            Command::parse("/shrug whatever"),
            Command::Broadcast("/shrug whatever".into())
        );
        assert_eq!(Command::parse(""), Command::Broadcast(String::new()));
    }

    #[test]
    fn test_notice_wire_text() {
        assert_eq!(Notice::UsernamePrompt.to_string(), "Enter your username: ");
        assert_eq!(
            Notice::UsernameTaken.to_string(),
            "Username is already taken. Enter a different username: "
        );
        assert_eq!(
            Notice::Joined { name: "alice".into() }.to_string(),
            "alice has joined the chat."
        );
        assert_eq!(
            Notice::Chat {
                from: "alice".into(),
                text: "hello".into()
            }
            .to_string(),
            "alice: hello"
        );
        assert_eq!(
            Notice::Private {
                from: "alice".into(),
                text: "hi".into()
            }
            .to_string(),
            "Private message from alice: hi"
        );
    }

    #[tokio::test]
    async fn test_read_line_strips_terminators() {
        let mut input: &[u8] = b"first\r\nsecond\nlast";

        assert_eq!(read_line(&mut input).await.unwrap().as_deref(), Some("first"));
        assert_eq!(read_line(&mut input).await.unwrap().as_deref(), Some("second"));
        assert_eq!(read_line(&mut input).await.unwrap().as_deref(), Some("last"));
        assert_eq!(read_line(&mut input).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_line_decodes_invalid_utf8_lossily() {
        let mut input: &[u8] = b"caf\xe9 au lait\n";

        assert_eq!(
            read_line(&mut input).await.unwrap().as_deref(),
            Some("caf\u{FFFD} au lait")
        );
    }

    #[tokio::test]
    async fn test_read_line_accepts_longest_line() {
        let mut bytes = vec![b'x'; MAX_LINE_LEN];
        bytes.extend_from_slice(b"\r\nnext\n");
        let mut input: &[u8] = &bytes;

        assert_eq!(read_line(&mut input).await.unwrap().unwrap().len(), MAX_LINE_LEN);
        assert_eq!(read_line(&mut input).await.unwrap().as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn test_read_line_rejects_overlong_line() {
        let mut bytes = vec![b'x'; MAX_LINE_LEN + 1];
        bytes.push(b'\n');
        let mut input: &[u8] = &bytes;
        let err = read_line(&mut input).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let unterminated = vec![b'x'; MAX_LINE_LEN * 4];
        let mut input: &[u8] = &unterminated;
        let err = read_line(&mut input).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_write_line_appends_newline() {
        let mut out = Vec::new();
        write_line(&mut out, "alice: hello").await.unwrap();
        assert_eq!(out, b"alice: hello\n");
    }

    #[test]
    fn test_roster_is_single_line() {
        let roster = Notice::Roster {
            names: vec!["alice".into(), "bob".into()],
        };
        assert_eq!(roster.to_string(), "Users Online: alice, bob");
        assert!(!roster.to_string().contains('\n'));
    }
}

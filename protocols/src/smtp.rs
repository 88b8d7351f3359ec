//! Minimal SMTP client side: banner sniffing and a single plain-text submission.
//!
//! The session is generic over the transport so it runs the same on a
//! `TcpStream` and on an in-memory duplex pipe.

use chrono::Local;
use thiserror::Error;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::trace;

/// Greeting substrings that mark a listener as SMTP.
pub const BANNER_MARKERS: [&str; 3] = ["220", "SMTP", "MailHog"];

/// How much of a greeting is read when sniffing.
pub const BANNER_BUFFER_SIZE: usize = 1024;

const MAX_REPLY_LINE: usize = 4096;
const MAX_REPLY_LINES: usize = 64;

#[derive(Debug, Error)]
pub enum SmtpError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server closed the connection")]
    Closed,
    #[error("malformed reply: {0}")]
    Malformed(String),
    #[error("'{command}' rejected with {code}: {message}")]
    Rejected {
        command: String,
        code: u16,
        message: String,
    },
}

/// Single-shot heuristic: any of the markers anywhere in the greeting.
pub fn looks_like_smtp_banner(greeting: &str) -> bool {
    BANNER_MARKERS.iter().any(|marker| greeting.contains(marker))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    pub fn is_positive(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    pub fn message(&self) -> String {
        self.lines.join(" ")
    }
}

/// Splits `"250-PIPELINING"` into `(250, true, "PIPELINING")`.
///
/// The flag is `true` while more lines of the same reply follow.
pub fn parse_reply_line(line: &str) -> Result<(u16, bool, &str), SmtpError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let code = line
        .get(..3)
        .and_then(|digits| digits.parse::<u16>().ok())
        .filter(|code| (200..600).contains(code))
        .ok_or_else(|| SmtpError::Malformed(line.to_string()))?;

    match line.as_bytes().get(3) {
        None => Ok((code, false, "")),
        Some(b' ') => Ok((code, false, &line[4..])),
        Some(b'-') => Ok((code, true, &line[4..])),
        Some(_) => Err(SmtpError::Malformed(line.to_string())),
    }
}

/// A plain-text message with a fixed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Message {
    /// The round-trip probe message. The subject carries a random token so that
    /// repeated runs can be told apart in the catcher's listing.
    pub fn probe(from: &str, to: &str) -> Self {
        let token: u32 = rand::random();
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: format!("Mail Catcher Scanner Test [{token:08x}]"),
            body: format!("Mail catcher test email sent at {}", Local::now().to_rfc3339()),
        }
    }

    /// Headers and dot-stuffed body, terminated by the end-of-data marker.
    pub fn to_data(&self) -> String {
        let mut data = String::new();
        data.push_str(&format!("From: {}\r\n", self.from));
        data.push_str(&format!("To: {}\r\n", self.to));
        data.push_str(&format!("Subject: {}\r\n", self.subject));
        data.push_str(&format!("Date: {}\r\n", Local::now().to_rfc2822()));
        data.push_str("MIME-Version: 1.0\r\n");
        data.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        data.push_str("\r\n");

        for line in self.body.lines() {
            if line.starts_with('.') {
                data.push('.');
            }
            data.push_str(line);
            data.push_str("\r\n");
        }

        data.push_str(".\r\n");
        data
    }
}

pub struct SmtpSession<S> {
    stream: BufReader<S>,
}

impl<S> SmtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Waits for the `220` greeting and introduces the client.
    ///
    /// Falls back from `EHLO` to `HELO` when the server does not speak ESMTP.
    pub async fn open(stream: S, client_name: &str) -> Result<Self, SmtpError> {
        let mut session = Self {
            stream: BufReader::new(stream),
        };

        let greeting = session.read_reply().await?;
        if greeting.code != 220 {
            return Err(SmtpError::Rejected {
                command: String::from("<greeting>"),
                code: greeting.code,
                message: greeting.message(),
            });
        }

        let ehlo = session.command(&format!("EHLO {client_name}")).await?;
        if !ehlo.is_positive() {
            session
                .expect_positive(&format!("HELO {client_name}"))
                .await?;
        }

        Ok(session)
    }

    /// Runs one `MAIL` / `RCPT` / `DATA` transaction.
    pub async fn send(&mut self, message: &Message) -> Result<(), SmtpError> {
        self.expect_positive(&format!("MAIL FROM:<{}>", message.from))
            .await?;
        self.expect_positive(&format!("RCPT TO:<{}>", message.to))
            .await?;

        let data = self.command("DATA").await?;
        if !data.is_intermediate() {
            return Err(SmtpError::Rejected {
                command: String::from("DATA"),
                code: data.code,
                message: data.message(),
            });
        }

        self.stream
            .get_mut()
            .write_all(message.to_data().as_bytes())
            .await?;
        self.stream.get_mut().flush().await?;

        let accepted = self.read_reply().await?;
        if !accepted.is_positive() {
            return Err(SmtpError::Rejected {
                command: String::from("<message data>"),
                code: accepted.code,
                message: accepted.message(),
            });
        }
        Ok(())
    }

    /// Says goodbye. The reply is not checked, the transaction is already done.
    pub async fn quit(mut self) {
        if let Err(e) = self.command("QUIT").await {
            trace!("QUIT not acknowledged: {e}");
        }
    }

    async fn expect_positive(&mut self, line: &str) -> Result<Reply, SmtpError> {
        let reply = self.command(line).await?;
        if reply.is_positive() {
            Ok(reply)
        } else {
            Err(SmtpError::Rejected {
                command: line.to_string(),
                code: reply.code,
                message: reply.message(),
            })
        }
    }

    async fn command(&mut self, line: &str) -> Result<Reply, SmtpError> {
        trace!("C: {line}");
        let writer = self.stream.get_mut();
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
        writer.flush().await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply, SmtpError> {
        let mut lines = Vec::new();
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let n = (&mut self.stream)
                .take(MAX_REPLY_LINE as u64)
                .read_until(b'\n', &mut raw)
                .await?;
            if n == 0 {
                return Err(SmtpError::Closed);
            }
            let truncated = n == MAX_REPLY_LINE && !raw.ends_with(b"\n");
            if truncated || lines.len() >= MAX_REPLY_LINES {
                return Err(SmtpError::Malformed(String::from("reply too long")));
            }

            let line = String::from_utf8_lossy(&raw);
            trace!("S: {}", line.trim_end());

            let (code, more, text) = parse_reply_line(&line)?;
            lines.push(text.to_string());
            if !more {
                return Ok(Reply { code, lines });
            }
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, duplex};

    /// Plays the server side of a session from a fixed script.
    ///
    /// Each entry is the reply sent after reading one client line; the first entry
    /// is the greeting. Once `DATA` got a 3xx the server swallows input until the
    /// end-of-data marker before replying again.
    async fn scripted_server(mut server: DuplexStream, script: Vec<&'static str>) -> String {
        let mut transcript = String::new();
        let mut replies = script.into_iter();

        if let Some(greeting) = replies.next() {
            server.write_all(greeting.as_bytes()).await.unwrap();
        }

        let mut in_data = false;
        let mut pending = String::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = server.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            pending.push_str(&String::from_utf8_lossy(&chunk[..n]));
            transcript.push_str(&String::from_utf8_lossy(&chunk[..n]));

            loop {
                let complete = if in_data {
                    pending.find("\r\n.\r\n").map(|idx| idx + 5)
                } else {
                    pending.find("\r\n").map(|idx| idx + 2)
                };
                let Some(end) = complete else { break };
                let line: String = pending.drain(..end).collect();

                if in_data {
                    in_data = false;
                } else if line.starts_with("DATA") {
                    in_data = true;
                }

                match replies.next() {
                    Some(reply) => server.write_all(reply.as_bytes()).await.unwrap(),
                    None => return transcript,
                }
            }
        }
        transcript
    }

    #[test]
    fn banner_markers_match_expected_greetings() {
        assert!(looks_like_smtp_banner("220 ready SMTP"));
        assert!(looks_like_smtp_banner("220 mailhog.example ESMTP MailHog"));
        assert!(looks_like_smtp_banner("some SMTP thing"));
        assert!(!looks_like_smtp_banner("hello"));
        assert!(!looks_like_smtp_banner(""));
    }

    #[test]
    fn reply_lines_are_split_into_code_and_continuation() {
        assert_eq!(parse_reply_line("250-PIPELINING\r\n").unwrap(), (250, true, "PIPELINING"));
        assert_eq!(parse_reply_line("250 OK\r\n").unwrap(), (250, false, "OK"));
        assert_eq!(parse_reply_line("354\r\n").unwrap(), (354, false, ""));
        assert!(parse_reply_line("hello\r\n").is_err());
        assert!(parse_reply_line("999 nope").is_err());
        assert!(parse_reply_line("250_bad").is_err());
    }

    #[test]
    fn message_data_is_dot_stuffed_and_terminated() {
        let message = Message {
            from: String::from("test@example.com"),
            to: String::from("recipient@example.com"),
            subject: String::from("hi"),
            body: String::from("first\n.hidden\nlast"),
        };
        let data = message.to_data();

        assert!(data.contains("To: recipient@example.com\r\n"));
        assert!(data.contains("\r\n\r\nfirst\r\n..hidden\r\nlast\r\n"));
        assert!(data.ends_with("\r\n.\r\n"));
    }

    #[test]
    fn probe_messages_carry_distinct_tokens() {
        let a = Message::probe("a@example.com", "b@example.com");
        assert_eq!(a.from, "a@example.com");
        assert_eq!(a.to, "b@example.com");
        assert!(a.subject.starts_with("Mail Catcher Scanner Test ["));
        assert!(a.body.starts_with("Mail catcher test email sent at "));
    }

    #[tokio::test]
    async fn full_transaction_against_esmtp_server() {
        let (client, server) = duplex(8192);
        let script = vec![
            "220 localhost ESMTP MailHog\r\n",
            "250-Hello scanner\r\n250-PIPELINING\r\n250 AUTH PLAIN\r\n",
            "250 Sender OK\r\n",
            "250 Recipient OK\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "250 Ok: queued as 1\r\n",
            "221 Bye\r\n",
        ];
        let server_task = tokio::spawn(scripted_server(server, script));

        let message = Message::probe("test@example.com", "recipient@example.com");
        let mut session = SmtpSession::open(client, "mailscout.local").await.unwrap();
        session.send(&message).await.unwrap();
        session.quit().await;

        let transcript = server_task.await.unwrap();
        assert!(transcript.starts_with("EHLO mailscout.local\r\n"));
        assert!(transcript.contains("MAIL FROM:<test@example.com>\r\n"));
        assert!(transcript.contains("RCPT TO:<recipient@example.com>\r\n"));
        assert!(transcript.contains(&message.subject));
    }

    #[tokio::test]
    async fn helo_fallback_when_ehlo_is_refused() {
        let (client, server) = duplex(8192);
        let script = vec![
            "220 old school\r\n",
            "502 Command not implemented\r\n",
            "250 hello\r\n",
        ];
        let server_task = tokio::spawn(scripted_server(server, script));

        let session = SmtpSession::open(client, "mailscout.local").await;
        assert!(session.is_ok());
        drop(session);

        let transcript = server_task.await.unwrap();
        assert!(transcript.contains("HELO mailscout.local\r\n"));
    }

    #[tokio::test]
    async fn rejected_recipient_is_reported() {
        let (client, server) = duplex(8192);
        let script = vec![
            "220 ready\r\n",
            "250 hi\r\n",
            "250 ok\r\n",
            "550 no such user\r\n",
        ];
        let _server_task = tokio::spawn(scripted_server(server, script));

        let message = Message::probe("test@example.com", "nobody@example.com");
        let mut session = SmtpSession::open(client, "mailscout.local").await.unwrap();
        let err = session.send(&message).await.unwrap_err();

        assert!(matches!(err, SmtpError::Rejected { code: 550, .. }));
    }

    #[tokio::test]
    async fn non_smtp_greeting_is_rejected() {
        let (client, mut server) = duplex(1024);
        server.write_all(b"554 go away\r\n").await.unwrap();

        let err = SmtpSession::open(client, "mailscout.local").await.err().unwrap();
        assert!(matches!(err, SmtpError::Rejected { code: 554, .. }));
    }

    #[tokio::test]
    async fn closed_connection_before_greeting() {
        let (client, server) = duplex(1024);
        drop(server);

        let err = SmtpSession::open(client, "mailscout.local").await.err().unwrap();
        assert!(matches!(err, SmtpError::Closed));
    }

    #[tokio::test]
    async fn oversized_greeting_line_is_cut_off() {
        let (client, mut server) = duplex(16 * 1024);
        let mut greeting = b"220 ".to_vec();
        greeting.extend(std::iter::repeat_n(b'x', MAX_REPLY_LINE * 2));
        server.write_all(&greeting).await.unwrap();

        let err = SmtpSession::open(client, "mailscout.local").await.err().unwrap();
        assert!(matches!(err, SmtpError::Malformed(_)));
    }

    #[tokio::test]
    async fn greeting_with_invalid_utf8_is_read_leniently() {
        let (client, server) = duplex(8192);
        let server = tokio::spawn(async move {
            let (mut read, mut write) = tokio::io::split(server);
            write.write_all(b"220 caf\xe9 ESMTP\r\n").await.unwrap();
            let mut buf = [0u8; 256];
            let _ = read.read(&mut buf).await;
            write.write_all(b"250 ok\r\n").await.unwrap();
        });

        let session = SmtpSession::open(client, "mailscout.local").await;
        assert!(session.is_ok());
        server.await.unwrap();
    }
}

// Servobench
// Copyright (C) 2026 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use crate::token::{Channel, Token};
use crate::WireError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// First word of the greeting every rig sends when a session opens.
pub const GREETING_PREFIX: &str = "servobench-rig";

/// Greeting line for this build of the rig.
pub fn greeting() -> String {
    format!("{GREETING_PREFIX} {}", env!("CARGO_PKG_VERSION"))
}

/// Read one line, trimmed of line endings and surrounding whitespace.
/// Returns `None` at end of stream.
pub async fn read_line<R>(reader: &mut R) -> Result<Option<String>, WireError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Write one `\r\n` terminated line and flush it.
pub async fn write_line<W>(writer: &mut W, line: &str) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Open a session by announcing this rig to the host.
pub async fn send_greeting<W>(writer: &mut W) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    write_line(writer, &greeting()).await
}

/// Prompt the peer with `token` until it answers with a finite `f32`.
pub async fn prompt_f32<R, W>(reader: &mut R, writer: &mut W, token: Token) -> Result<f32, WireError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        write_line(writer, token.as_str()).await?;
        let line = read_line(reader).await?.ok_or_else(|| WireError::eof(format!("answer to {token}")))?;
        match line.parse::<f32>() {
            Ok(value) if value.is_finite() => return Ok(value),
            _ => warn!(prompt = %token, answer = %line, "not a finite number, asking again"),
        }
    }
}

/// Prompt the peer with `token` until it answers with an `i32`.
pub async fn prompt_i32<R, W>(reader: &mut R, writer: &mut W, token: Token) -> Result<i32, WireError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        write_line(writer, token.as_str()).await?;
        let line = read_line(reader).await?.ok_or_else(|| WireError::eof(format!("answer to {token}")))?;
        match line.parse::<i32>() {
            Ok(value) => return Ok(value),
            Err(_) => warn!(prompt = %token, answer = %line, "not an integer, asking again"),
        }
    }
}

/// Prompt the peer with `token` until it answers with a `u32` of at least
/// `min`.
pub async fn prompt_u32<R, W>(reader: &mut R, writer: &mut W, token: Token, min: u32) -> Result<u32, WireError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        write_line(writer, token.as_str()).await?;
        let line = read_line(reader).await?.ok_or_else(|| WireError::eof(format!("answer to {token}")))?;
        match line.parse::<u32>() {
            Ok(value) if value >= min => return Ok(value),
            _ => warn!(prompt = %token, answer = %line, "need an integer >= {min}, asking again"),
        }
    }
}

/// Ship one channel's samples: begin token, one count per line, end token.
///
/// The whole block is buffered and flushed once.
pub async fn stream_samples<W>(writer: &mut W, channel: Channel, counts: &[i32]) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let mut block = String::with_capacity(8 + counts.len() * 10);
    block.push_str(Token::DataBegin(channel).as_str());
    block.push_str("\r\n");
    for count in counts {
        block.push_str(&count.to_string());
        block.push_str("\r\n");
    }
    block.push_str(Token::DataEnd(channel).as_str());
    block.push_str("\r\n");
    writer.write_all(block.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, split, BufReader};

    #[tokio::test]
    async fn lines_round_trip_with_crlf() {
        let (client, server) = duplex(1024);
        let (client_read, mut client_write) = split(client);
        let client_read = BufReader::new(client_read);
        let (server_read, _server_write) = split(server);
        let mut server_read = BufReader::new(server_read);

        write_line(&mut client_write, "$a").await.unwrap();
        assert_eq!(read_line(&mut server_read).await.unwrap(), Some("$a".to_string()));

        // Peer using bare newlines is accepted too
        use tokio::io::AsyncWriteExt;
        client_write.write_all(b"  16000 \n").await.unwrap();
        client_write.flush().await.unwrap();
        assert_eq!(read_line(&mut server_read).await.unwrap(), Some("16000".to_string()));

        drop(client_write);
        drop(client_read);
        assert_eq!(read_line(&mut server_read).await.unwrap(), None);
    }

    #[tokio::test]
    async fn prompt_f32_asks_again_on_garbage() {
        let (host, rig) = duplex(1024);
        let (host_read, mut host_write) = split(host);
        let mut host_read = BufReader::new(host_read);
        let (rig_read, mut rig_write) = split(rig);
        let mut rig_read = BufReader::new(rig_read);

        // Host answers wrongly twice before getting it right
        write_line(&mut host_write, "pony").await.unwrap();
        write_line(&mut host_write, "NaN").await.unwrap();
        write_line(&mut host_write, "0.05").await.unwrap();

        let value = prompt_f32(&mut rig_read, &mut rig_write, Token::KpPrompt(Channel::M0)).await.unwrap();
        assert!((value - 0.05).abs() < f32::EPSILON);

        // One prompt per attempt went out
        for _ in 0..3 {
            assert_eq!(read_line(&mut host_read).await.unwrap(), Some("$a".to_string()));
        }
    }

    #[tokio::test]
    async fn prompt_u32_enforces_the_minimum() {
        let (host, rig) = duplex(1024);
        let (_host_read, mut host_write) = split(host);
        let (rig_read, mut rig_write) = split(rig);
        let mut rig_read = BufReader::new(rig_read);

        write_line(&mut host_write, "0").await.unwrap();
        write_line(&mut host_write, "-5").await.unwrap();
        write_line(&mut host_write, "10").await.unwrap();

        let value = prompt_u32(&mut rig_read, &mut rig_write, Token::PeriodPrompt, 1).await.unwrap();
        assert_eq!(value, 10);
    }

    #[tokio::test]
    async fn prompt_reports_eof_mid_conversation() {
        let (host, rig) = duplex(1024);
        drop(host);
        let (rig_read, mut rig_write) = split(rig);
        let mut rig_read = BufReader::new(rig_read);

        let err = prompt_i32(&mut rig_read, &mut rig_write, Token::SetpointPrompt(Channel::M1)).await.unwrap_err();
        assert!(matches!(err, WireError::UnexpectedEof { .. } | WireError::Io(_)));
    }

    #[tokio::test]
    async fn stream_samples_frames_the_block() {
        let (host, rig) = duplex(4096);
        let (host_read, _host_write) = split(host);
        let mut host_read = BufReader::new(host_read);
        let (_rig_read, mut rig_write) = split(rig);

        stream_samples(&mut rig_write, Channel::M1, &[0, 150, -3]).await.unwrap();

        let mut lines = Vec::new();
        for _ in 0..5 {
            lines.push(read_line(&mut host_read).await.unwrap().unwrap());
        }
        assert_eq!(lines, vec!["$h", "0", "150", "-3", "$i"]);
    }

    #[test]
    fn greeting_carries_the_version() {
        let g = greeting();
        assert!(g.starts_with(GREETING_PREFIX));
        assert!(g.len() > GREETING_PREFIX.len() + 1);
    }
}

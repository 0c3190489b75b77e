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

use crate::line::{read_line, write_line, GREETING_PREFIX};
use crate::token::{Channel, Token};
use crate::WireError;
use servobench_core::control::ResponseLog;
use std::fmt;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

/// Parameters for one commanded step response, both channels at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunRequest {
    pub kp0: f32,
    pub kp1: f32,
    pub setpoint0: i32,
    pub setpoint1: i32,
    pub period_ms: u32,
}

impl Default for RunRequest {
    /// The classic bench tuning run: gain 0.05 toward 16000 counts,
    /// sampled every 10 ms.
    fn default() -> Self {
        Self {
            kp0: 0.05,
            kp1: 0.05,
            setpoint0: 16_000,
            setpoint1: 16_000,
            period_ms: 10,
        }
    }
}

/// Both channels' trajectories from one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub m0: ResponseLog,
    pub m1: ResponseLog,
}

impl RunResult {
    pub fn channel(&self, channel: Channel) -> &ResponseLog {
        match channel {
            Channel::M0 => &self.m0,
            Channel::M1 => &self.m1,
        }
    }
}

/// Host side of the rig conversation.
///
/// Generic over its transport so tests can run it against an in-memory
/// pipe; [`connect`](BenchClient::connect) wires it to a TCP rig and
/// performs the greeting handshake.
pub struct BenchClient<R, W> {
    reader: R,
    writer: W,
    greeting: Option<String>,
}

impl BenchClient<BufReader<OwnedReadHalf>, OwnedWriteHalf> {
    /// Connect to a rig and verify its greeting.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, WireError> {
        let stream = TcpStream::connect(addr).await?;
        let (read, write) = stream.into_split();
        let mut client = BenchClient::new(BufReader::new(read), write);
        client.handshake().await?;
        Ok(client)
    }
}

impl<R, W> BenchClient<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            greeting: None,
        }
    }

    /// Read the rig's greeting line and check it is one of ours.
    pub async fn handshake(&mut self) -> Result<(), WireError> {
        let line = read_line(&mut self.reader).await?.ok_or_else(|| WireError::eof("greeting"))?;
        if !line.starts_with(GREETING_PREFIX) {
            return Err(WireError::BadGreeting(line));
        }
        info!(greeting = %line, "connected to rig");
        self.greeting = Some(line);
        Ok(())
    }

    /// Greeting received during the handshake, if one happened.
    pub fn rig_greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }

    /// Read until the expected token arrives, discarding anything else.
    ///
    /// Rigs are free to interleave human-readable chatter with the
    /// protocol; only token lines are significant.
    pub async fn await_token(&mut self, expected: Token) -> Result<(), WireError> {
        loop {
            let line = read_line(&mut self.reader).await?.ok_or_else(|| WireError::eof(expected.as_str()))?;
            if Token::from_line(&line) == Some(expected) {
                return Ok(());
            }
            debug!(expected = %expected, got = %line, "discarding line");
        }
    }

    /// Answer the most recent prompt.
    pub async fn send_value(&mut self, value: impl fmt::Display) -> Result<(), WireError> {
        write_line(&mut self.writer, &value.to_string()).await
    }

    /// Collect sample lines until the end token.
    ///
    /// Unparseable lines are skipped with a warning; inventing a value for
    /// them would silently corrupt the trajectory.
    pub async fn read_samples_until(&mut self, end: Token) -> Result<Vec<i32>, WireError> {
        let mut counts = Vec::new();
        loop {
            let line = read_line(&mut self.reader).await?.ok_or_else(|| WireError::eof(end.as_str()))?;
            if Token::from_line(&line) == Some(end) {
                return Ok(counts);
            }
            if line.is_empty() {
                continue;
            }
            match line.parse::<i32>() {
                Ok(count) => counts.push(count),
                Err(_) => warn!(line = %line, "skipping unparseable sample line"),
            }
        }
    }

    /// Drive one full step-response exchange.
    ///
    /// # Workflow
    ///
    /// 1. Answer the five parameter prompts in protocol order.
    /// 2. Collect the m0 sample block, then the m1 block.
    /// 3. Rebuild both trajectories on a `index * period` time axis.
    pub async fn run_step_response(&mut self, request: &RunRequest) -> Result<RunResult, WireError> {
        self.await_token(Token::KpPrompt(Channel::M0)).await?;
        self.send_value(request.kp0).await?;
        self.await_token(Token::KpPrompt(Channel::M1)).await?;
        self.send_value(request.kp1).await?;
        self.await_token(Token::SetpointPrompt(Channel::M0)).await?;
        self.send_value(request.setpoint0).await?;
        self.await_token(Token::SetpointPrompt(Channel::M1)).await?;
        self.send_value(request.setpoint1).await?;
        self.await_token(Token::PeriodPrompt).await?;
        self.send_value(request.period_ms).await?;

        self.await_token(Token::DataBegin(Channel::M0)).await?;
        let m0 = self.read_samples_until(Token::DataEnd(Channel::M0)).await?;
        self.await_token(Token::DataBegin(Channel::M1)).await?;
        let m1 = self.read_samples_until(Token::DataEnd(Channel::M1)).await?;

        info!(m0_samples = m0.len(), m1_samples = m1.len(), "step response collected");
        Ok(RunResult {
            m0: ResponseLog::from_counts(request.period_ms, &m0),
            m1: ResponseLog::from_counts(request.period_ms, &m1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{prompt_f32, prompt_i32, prompt_u32, send_greeting, stream_samples};
    use tokio::io::{duplex, split};

    #[tokio::test]
    async fn full_conversation_with_a_scripted_rig() {
        let (host, rig) = duplex(8192);
        let (host_read, host_write) = split(host);
        let mut client = BenchClient::new(BufReader::new(host_read), host_write);

        let rig_side = tokio::spawn(async move {
            let (rig_read, mut rig_write) = split(rig);
            let mut rig_read = BufReader::new(rig_read);
            send_greeting(&mut rig_write).await.unwrap();
            let kp0 = prompt_f32(&mut rig_read, &mut rig_write, Token::KpPrompt(Channel::M0)).await.unwrap();
            let kp1 = prompt_f32(&mut rig_read, &mut rig_write, Token::KpPrompt(Channel::M1)).await.unwrap();
            let sp0 = prompt_i32(&mut rig_read, &mut rig_write, Token::SetpointPrompt(Channel::M0)).await.unwrap();
            let sp1 = prompt_i32(&mut rig_read, &mut rig_write, Token::SetpointPrompt(Channel::M1)).await.unwrap();
            let period = prompt_u32(&mut rig_read, &mut rig_write, Token::PeriodPrompt, 1).await.unwrap();
            stream_samples(&mut rig_write, Channel::M0, &[0, 4000, 12000, 15500, 16000]).await.unwrap();
            stream_samples(&mut rig_write, Channel::M1, &[0, -2000, -7800, -8000]).await.unwrap();
            (kp0, kp1, sp0, sp1, period)
        });

        client.handshake().await.unwrap();
        assert!(client.rig_greeting().unwrap().starts_with(GREETING_PREFIX));

        let request = RunRequest {
            kp0: 0.05,
            kp1: 0.07,
            setpoint0: 16_000,
            setpoint1: -8_000,
            period_ms: 10,
        };
        let result = client.run_step_response(&request).await.unwrap();
        let (kp0, kp1, sp0, sp1, period) = rig_side.await.unwrap();

        assert_eq!((kp0, kp1), (0.05, 0.07));
        assert_eq!((sp0, sp1), (16_000, -8_000));
        assert_eq!(period, 10);
        assert_eq!(result.m0.len(), 5);
        assert_eq!(result.m0.samples()[4].t_ms, 40);
        assert_eq!(result.m0.samples()[4].count, 16_000);
        assert_eq!(result.channel(Channel::M1).samples()[3].count, -8_000);
    }

    #[tokio::test]
    async fn sample_reader_skips_garbage_lines() {
        let (host, rig) = duplex(1024);
        let (host_read, host_write) = split(host);
        let mut client = BenchClient::new(BufReader::new(host_read), host_write);

        let (_rig_read, mut rig_write) = split(rig);
        for line in ["$f", "100", "beef", "200", "$g"] {
            write_line(&mut rig_write, line).await.unwrap();
        }

        client.await_token(Token::DataBegin(Channel::M0)).await.unwrap();
        let counts = client.read_samples_until(Token::DataEnd(Channel::M0)).await.unwrap();
        assert_eq!(counts, vec![100, 200]);
    }

    #[tokio::test]
    async fn await_token_discards_chatter() {
        let (host, rig) = duplex(1024);
        let (host_read, host_write) = split(host);
        let mut client = BenchClient::new(BufReader::new(host_read), host_write);

        let (_rig_read, mut rig_write) = split(rig);
        write_line(&mut rig_write, "motor warmup done").await.unwrap();
        write_line(&mut rig_write, "$e").await.unwrap();

        client.await_token(Token::PeriodPrompt).await.unwrap();
    }

    #[tokio::test]
    async fn handshake_rejects_strangers() {
        let (host, rig) = duplex(1024);
        let (host_read, host_write) = split(host);
        let mut client = BenchClient::new(BufReader::new(host_read), host_write);

        let (_rig_read, mut rig_write) = split(rig);
        write_line(&mut rig_write, "mystery-box 9.9").await.unwrap();

        let err = client.handshake().await.unwrap_err();
        assert!(matches!(err, WireError::BadGreeting(line) if line == "mystery-box 9.9"));
        assert_eq!(client.rig_greeting(), None);
    }
}

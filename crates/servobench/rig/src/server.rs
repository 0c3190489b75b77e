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

//! TCP rig server.
//!
//! Each accepted connection is one session: greet, prompt for run
//! parameters, execute the bench, stream both channels back, and repeat
//! until the peer disconnects.

use crate::config::RigConfig;
use crate::error::RigError;
use crate::runner::run_step_response;
use dashmap::DashMap;
use metrics::{counter, gauge, histogram};
use servobench_wire::{prompt_f32, prompt_i32, prompt_u32, send_greeting, stream_samples, Channel, RunRequest, Token, WireError};
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// A live session, keyed by its UUID in the server registry.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub peer: String,
    pub started_at: Instant,
}

/// The rig's accept loop plus its session registry.
pub struct RigServer {
    config: RigConfig,
    sessions: Arc<DashMap<String, SessionInfo>>,
}

impl RigServer {
    pub fn new(config: RigConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Bind the listen address and serve sessions until the task is dropped.
    pub async fn run(&self) -> Result<(), RigError> {
        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        info!(addr = %self.config.listen_addr, pace = %self.config.pace, "rig listening");

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            let session_id = uuid::Uuid::new_v4().to_string();
            let span = info_span!("session", id = %&session_id[..8], peer = %peer);
            self.sessions.insert(
                session_id.clone(),
                SessionInfo {
                    peer: peer.to_string(),
                    started_at: Instant::now(),
                },
            );
            counter!("servobench_sessions_total", 1);
            gauge!("servobench_sessions_active", self.sessions.len() as f64);

            let config = self.config.clone();
            let sessions = self.sessions.clone();
            tokio::spawn(
                async move {
                    let (read, write) = stream.into_split();
                    match handle_session(BufReader::new(read), write, &config).await {
                        Ok(runs) => info!(runs, "session closed"),
                        Err(e) => warn!(error = %e, "session ended with error"),
                    }
                    sessions.remove(&session_id);
                    gauge!("servobench_sessions_active", sessions.len() as f64);
                }
                .instrument(span),
            );
        }
    }
}

/// Serve one session over any line-oriented byte stream.
///
/// Returns the number of completed runs. A peer that disconnects between
/// runs is a normal end of session; a disconnect mid-exchange is an error.
pub async fn handle_session<R, W>(mut reader: R, mut writer: W, config: &RigConfig) -> Result<u32, RigError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    send_greeting(&mut writer).await?;
    let mut runs = 0u32;

    loop {
        // The first prompt of a cycle doubles as the between-runs idle
        // point, so a disconnect here is a clean goodbye.
        let kp0 = match prompt_f32(&mut reader, &mut writer, Token::KpPrompt(Channel::M0)).await {
            Ok(value) => value,
            Err(WireError::UnexpectedEof { .. }) => return Ok(runs),
            Err(WireError::Io(e)) if e.kind() == ErrorKind::BrokenPipe => return Ok(runs),
            Err(e) => return Err(e.into()),
        };
        let kp1 = prompt_f32(&mut reader, &mut writer, Token::KpPrompt(Channel::M1)).await?;
        let setpoint0 = prompt_i32(&mut reader, &mut writer, Token::SetpointPrompt(Channel::M0)).await?;
        let setpoint1 = prompt_i32(&mut reader, &mut writer, Token::SetpointPrompt(Channel::M1)).await?;
        let period_ms = prompt_u32(&mut reader, &mut writer, Token::PeriodPrompt, 1).await?;

        let request = RunRequest {
            kp0,
            kp1,
            setpoint0,
            setpoint1,
            period_ms,
        };
        info!(kp0, kp1, setpoint0, setpoint1, period_ms, "starting step response");
        counter!("servobench_runs_total", 1);

        let started = Instant::now();
        let run_config = config.clone();
        let outcome = tokio::task::spawn_blocking(move || run_step_response(&run_config, &request))
            .await
            .map_err(|e| RigError::Run(format!("bench worker failed: {e}")))??;
        histogram!("servobench_run_duration_seconds", started.elapsed().as_secs_f64());
        debug!("share table:\n{}", outcome.shares);
        debug!("task table:\n{}", outcome.summary);

        for channel in Channel::ALL {
            let counts: Vec<i32> = outcome.log(channel).samples().iter().map(|s| s.count).collect();
            stream_samples(&mut writer, channel, &counts).await?;
        }
        runs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servobench_wire::{read_line, write_line, GREETING_PREFIX};
    use tokio::io::{duplex, split};

    #[tokio::test]
    async fn greets_then_ends_cleanly_when_the_peer_leaves() {
        let (host, rig) = duplex(1024);
        let config = RigConfig::default();

        let session = tokio::spawn(async move {
            let (read, write) = split(rig);
            handle_session(BufReader::new(read), write, &config).await
        });

        let (host_read, host_write) = split(host);
        let mut host_read = BufReader::new(host_read);
        let greeting = read_line(&mut host_read).await.unwrap().unwrap();
        assert!(greeting.starts_with(GREETING_PREFIX));
        assert_eq!(read_line(&mut host_read).await.unwrap().unwrap(), "$a");

        drop(host_read);
        drop(host_write);
        let runs = session.await.unwrap().unwrap();
        assert_eq!(runs, 0);
    }

    #[tokio::test]
    async fn garbage_before_disconnect_still_ends_cleanly() {
        let (host, rig) = duplex(1024);
        let config = RigConfig::default();

        let session = tokio::spawn(async move {
            let (read, write) = split(rig);
            handle_session(BufReader::new(read), write, &config).await
        });

        let (host_read, mut host_write) = split(host);
        let mut host_read = BufReader::new(host_read);
        read_line(&mut host_read).await.unwrap();
        read_line(&mut host_read).await.unwrap();
        write_line(&mut host_write, "not a number").await.unwrap();
        // Re-prompt arrives before we hang up.
        assert_eq!(read_line(&mut host_read).await.unwrap().unwrap(), "$a");

        drop(host_read);
        drop(host_write);
        assert_eq!(session.await.unwrap().unwrap(), 0);
    }

    #[test]
    fn server_starts_with_no_sessions() {
        let server = RigServer::new(RigConfig::default());
        assert_eq!(server.active_sessions(), 0);
        assert_eq!(server.config().default_period_ms, 10);
    }
}

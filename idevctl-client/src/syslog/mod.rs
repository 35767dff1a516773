//! `syslog`: relay a device's live system log to stdout.
//!
//! A session moves through three states. While *opening*, the deadline is
//! fixed and the log stream is requested. While *streaming*, the deadline,
//! the interrupt token and the relay itself race; the first to finish wins
//! and the others are dropped, which abandons any read in flight. On
//! *termination* the session is closed exactly once, whatever the trigger.

use anyhow::Result;
use idevctl_shared::device::DeviceRef;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clients::LogStreamClient;
use crate::clients::tools::{ToolDeviceEnumerator, ToolLogStreamClient};
use crate::config::Config;
use crate::devices::{self, SelectionPolicy, chooser::TerminalChooser};
use crate::error::{ClientError, DeviceError};
use crate::util::shutdown;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const RELAY_BUF_SIZE: usize = 4096;

/// Why a stream ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The device closed the stream.
    EndOfStream,
    /// The timeout given at session start elapsed.
    DeadlineElapsed,
    /// The operator pressed Ctrl+C.
    Interrupted,
}

/// Copy until end of stream. Each chunk is written and flushed before the
/// next read, so a slow sink stalls the reader instead of buffering.
async fn relay<R, W>(reader: &mut R, sink: &mut W, relayed: &mut u64) -> std::io::Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = [0u8; RELAY_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return sink.flush().await;
        }
        sink.write_all(&buf[..n]).await?;
        sink.flush().await?;
        *relayed += n as u64;
    }
}

/// Stream the device log into `sink` until the device closes the stream,
/// `timeout` elapses or `interrupt` is cancelled.
///
/// Only a failed open or a relay I/O error is an error; the three ways a
/// stream normally ends are reported through [`StreamOutcome`].
pub async fn stream<W>(
    client: &dyn LogStreamClient,
    device: &DeviceRef,
    timeout: Duration,
    interrupt: CancellationToken,
    sink: &mut W,
) -> Result<StreamOutcome, DeviceError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let deadline = Instant::now() + timeout;

    let opened = select! {
        biased;
        _ = interrupt.cancelled() => return Ok(StreamOutcome::Interrupted),
        _ = sleep_until(deadline) => return Ok(StreamOutcome::DeadlineElapsed),
        res = client.open(&device.udid) => res,
    };
    let mut session = match opened {
        Ok(session) => session,
        // the tool saw the operator's Ctrl+C before our listener did
        Err(ClientError::Interrupted { program }) => {
            debug!("{program} interrupted while opening syslog on {}", device.udid);
            info!("Interrupted, stopping syslog");
            return Ok(StreamOutcome::Interrupted);
        }
        Err(source) => {
            return Err(DeviceError::SessionOpen {
                service: "syslog",
                udid: device.udid.clone(),
                source,
            });
        }
    };
    debug!(
        "syslog session open on {}, {} left",
        device.udid,
        humantime::format_duration(deadline.saturating_duration_since(Instant::now()))
    );

    let mut relayed = 0u64;
    let result = select! {
        biased;
        _ = interrupt.cancelled() => Ok(StreamOutcome::Interrupted),
        _ = sleep_until(deadline) => Ok(StreamOutcome::DeadlineElapsed),
        res = relay(&mut *session, sink, &mut relayed) => res
            .map(|()| StreamOutcome::EndOfStream)
            .map_err(|source| DeviceError::Copy {
                udid: device.udid.clone(),
                source,
            }),
    };

    // every trigger ends here, the session is released exactly once
    if let Err(e) = session.close().await {
        warn!("failed to release syslog session on {}: {e}", device.udid);
    }
    drop(session);

    debug!("relayed {relayed} bytes from {}", device.udid);
    match &result {
        Ok(StreamOutcome::EndOfStream) => info!("Device closed the syslog stream"),
        Ok(StreamOutcome::DeadlineElapsed) => {
            info!("Timeout of {} reached", humantime::format_duration(timeout))
        }
        Ok(StreamOutcome::Interrupted) => info!("Interrupted, stopping syslog"),
        Err(_) => {}
    }
    result
}

/// Entry point for `idevctl syslog`.
pub async fn run(
    uuid: Option<String>,
    timeout: Duration,
    color: bool,
    config: &Config,
) -> Result<()> {
    let interrupt = shutdown::interrupt_token();

    let enumerator = ToolDeviceEnumerator::new(config.tools.clone());
    let mut chooser = TerminalChooser::new(color, interrupt.clone());
    let device = devices::resolve(
        uuid.as_deref(),
        &enumerator,
        &mut chooser,
        SelectionPolicy::from_config(config.auto_select_single),
    )
    .await?;

    let client = ToolLogStreamClient::new(config.tools.clone(), color);
    let mut stdout = tokio::io::stdout();
    stream(&client, &device, timeout, interrupt, &mut stdout).await?;
    Ok(())
}

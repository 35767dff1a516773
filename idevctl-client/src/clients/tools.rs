//! Collaborators backed by libimobiledevice style command line tools.

use async_trait::async_trait;
use idevctl_shared::config::{ToolConfig, render_template};
use idevctl_shared::device::{DeviceRef, parse_device_list};
use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::process::ExitStatus;
use std::task::{Context, Poll, ready};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::process::{Child, ChildStdout};
use tracing::{debug, warn};

use super::{DeviceEnumerator, LogStream, LogStreamClient, ProfileInstallClient, ProfileSession};
use crate::error::ClientError;
use crate::util::subprocess::{ToolCommand, stopped_by_ctrl_c};

fn render(
    what: &'static str,
    template: &[String],
    vars: &[(&str, &str)],
) -> Result<ToolCommand, ClientError> {
    ToolCommand::from_parts(what, render_template(template, vars))
}

/// Check that the device answers before handing out a session.
async fn probe(tools: &ToolConfig, udid: &str) -> Result<(), ClientError> {
    render("probe", &tools.probe, &[("udid", udid)])?
        .output()
        .await
        .map(|_| ())
}

pub struct ToolDeviceEnumerator {
    tools: ToolConfig,
}

impl ToolDeviceEnumerator {
    pub fn new(tools: ToolConfig) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl DeviceEnumerator for ToolDeviceEnumerator {
    async fn list_devices(&self) -> Result<Vec<DeviceRef>, ClientError> {
        let output = render("list_devices", &self.tools.list_devices, &[])?
            .output()
            .await?;
        let mut devices = parse_device_list(&output);

        let Some(template) = &self.tools.device_name else {
            return Ok(devices);
        };

        // names are cosmetic, a device that does not answer keeps its UDID only
        for device in devices.iter_mut() {
            let name = match render("device_name", template, &[("udid", &device.udid)]) {
                Ok(cmd) => cmd.output().await,
                Err(e) => Err(e),
            };
            match name {
                Ok(name) if !name.trim().is_empty() => {
                    let name = name.trim().to_string();
                    device.label = Some(match device.label.take() {
                        Some(connection) => format!("{name}, {connection}"),
                        None => name,
                    });
                }
                Ok(_) => {}
                Err(e) => debug!("name lookup for {} failed: {e}", device.udid),
            }
        }

        Ok(devices)
    }
}

pub struct ToolProfileInstaller {
    tools: ToolConfig,
}

impl ToolProfileInstaller {
    pub fn new(tools: ToolConfig) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl ProfileInstallClient for ToolProfileInstaller {
    async fn open(&self, udid: &str) -> Result<Box<dyn ProfileSession>, ClientError> {
        probe(&self.tools, udid).await?;
        Ok(Box::new(ToolProfileSession {
            template: self.tools.profile_install.clone(),
            udid: udid.to_string(),
        }))
    }
}

struct ToolProfileSession {
    template: Vec<String>,
    udid: String,
}

#[async_trait]
impl ProfileSession for ToolProfileSession {
    async fn upload(&mut self, path: &Path) -> Result<(), ClientError> {
        let file = path.to_string_lossy();
        render(
            "profile_install",
            &self.template,
            &[("udid", &self.udid), ("file", &file)],
        )?
        .output()
        .await
        .map(|_| ())
    }
}

pub struct ToolLogStreamClient {
    tools: ToolConfig,
    color: bool,
}

impl ToolLogStreamClient {
    pub fn new(tools: ToolConfig, color: bool) -> Self {
        Self { tools, color }
    }

    fn command(&self, udid: &str) -> Result<ToolCommand, ClientError> {
        let cmd = render("syslog", &self.tools.syslog, &[("udid", udid)])?;
        if self.color {
            Ok(cmd)
        } else {
            Ok(cmd.args(self.tools.syslog_no_color_args.iter().cloned()))
        }
    }
}

#[async_trait]
impl LogStreamClient for ToolLogStreamClient {
    async fn open(&self, udid: &str) -> Result<Box<dyn LogStream>, ClientError> {
        probe(&self.tools, udid).await?;
        let cmd = self.command(udid)?;
        let (child, stdout) = cmd.spawn_piped()?;
        Ok(Box::new(ToolLogStream {
            program: cmd.program().to_string(),
            relay: Relay::Running(child),
            stdout,
        }))
    }
}

type ExitFuture = Pin<Box<dyn Future<Output = io::Result<ExitStatus>> + Send>>;

enum Relay {
    Running(Child),
    /// stdout hit EOF, waiting for the exit status
    Reaping(ExitFuture),
    Exited,
}

/// Syslog relay process. Dropping it kills the process.
///
/// End of stream is only reported once the process has exited cleanly; a
/// failing exit status surfaces as a read error.
pub struct ToolLogStream {
    program: String,
    relay: Relay,
    stdout: ChildStdout,
}

fn exit_result(program: &str, status: ExitStatus) -> io::Result<()> {
    if status.success() || stopped_by_ctrl_c(&status) {
        Ok(())
    } else {
        Err(io::Error::other(format!("{program} exited with {status}")))
    }
}

impl AsyncRead for ToolLogStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if let Relay::Running(_) = this.relay {
            if buf.remaining() == 0 {
                return Poll::Ready(Ok(()));
            }
            let before = buf.filled().len();
            ready!(Pin::new(&mut this.stdout).poll_read(cx, buf))?;
            if buf.filled().len() > before {
                return Poll::Ready(Ok(()));
            }
            if let Relay::Running(mut child) = std::mem::replace(&mut this.relay, Relay::Exited) {
                this.relay = Relay::Reaping(Box::pin(async move { child.wait().await }));
            }
        }

        if let Relay::Reaping(exit) = &mut this.relay {
            let status = ready!(exit.as_mut().poll(cx));
            this.relay = Relay::Exited;
            let status = status?;
            debug!("{} exited with {}", this.program, status);
            return Poll::Ready(exit_result(&this.program, status));
        }

        Poll::Ready(Ok(()))
    }
}

#[async_trait]
impl LogStream for ToolLogStream {
    async fn close(&mut self) -> Result<(), ClientError> {
        match std::mem::replace(&mut self.relay, Relay::Exited) {
            Relay::Running(mut child) => match child.try_wait()? {
                Some(status) => {
                    if let Err(e) = exit_result(&self.program, status) {
                        warn!("{e}");
                    }
                }
                None => {
                    child.kill().await?;
                    debug!("stopped {}", self.program);
                }
            },
            // dropping the pending wait kills the process if it is still up
            Relay::Reaping(exit) => drop(exit),
            Relay::Exited => {}
        }
        Ok(())
    }
}

//! Capability interfaces for the device services idevctl talks to.
//!
//! The wire protocols live behind these traits. [`tools`] implements them by
//! driving the libimobiledevice command line tools.

pub mod tools;

use async_trait::async_trait;
use idevctl_shared::device::DeviceRef;
use std::path::Path;
use tokio::io::AsyncRead;

use crate::error::ClientError;

/// Lists devices currently attached to the USB multiplexer.
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<DeviceRef>, ClientError>;
}

/// Opens profile-install sessions.
#[async_trait]
pub trait ProfileInstallClient: Send + Sync {
    async fn open(&self, udid: &str) -> Result<Box<dyn ProfileSession>, ClientError>;
}

/// An open profile-install session on one device.
#[async_trait]
pub trait ProfileSession: Send {
    async fn upload(&mut self, path: &Path) -> Result<(), ClientError>;
}

/// Opens live syslog streams.
#[async_trait]
pub trait LogStreamClient: Send + Sync {
    async fn open(&self, udid: &str) -> Result<Box<dyn LogStream>, ClientError>;
}

/// A readable syslog byte stream bound to one device.
///
/// `close` releases the underlying session; implementations must also
/// release it when dropped without being closed.
#[async_trait]
pub trait LogStream: AsyncRead + Send + Unpin {
    async fn close(&mut self) -> Result<(), ClientError>;
}

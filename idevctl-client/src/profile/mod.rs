//! `profile upload`: install a configuration profile on a device.

use anyhow::Result;
use idevctl_shared::device::DeviceRef;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::clients::ProfileInstallClient;
use crate::clients::tools::{ToolDeviceEnumerator, ToolProfileInstaller};
use crate::config::Config;
use crate::devices::{self, SelectionPolicy, chooser::TerminalChooser};
use crate::error::DeviceError;
use crate::util::shutdown;

/// One profile upload to one device. Consumed by [`upload`], never retried.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub device: DeviceRef,
    pub path: PathBuf,
}

/// Open a profile-install session and upload the file once.
///
/// Installs are not assumed to be idempotent, so a failed upload is
/// reported to the operator rather than retried.
pub async fn upload(
    client: &dyn ProfileInstallClient,
    request: UploadRequest,
) -> Result<(), DeviceError> {
    let UploadRequest { device, path } = request;

    let mut session = client
        .open(&device.udid)
        .await
        .map_err(|source| DeviceError::SessionOpen {
            service: "profile-install",
            udid: device.udid.clone(),
            source,
        })?;
    debug!("profile-install session open on {}", device.udid);

    info!("Uploading profile to device...");
    session
        .upload(&path)
        .await
        .map_err(|source| DeviceError::Upload {
            path: path.clone(),
            source,
        })?;

    info!("Uploaded {} to {}", path.display(), device.udid);
    Ok(())
}

/// Entry point for `idevctl profile upload`.
pub async fn run(udid: Option<String>, file: PathBuf, config: &Config) -> Result<()> {
    let enumerator = ToolDeviceEnumerator::new(config.tools.clone());
    let mut chooser = TerminalChooser::new(false, shutdown::interrupt_token());
    let device = devices::resolve(
        udid.as_deref(),
        &enumerator,
        &mut chooser,
        SelectionPolicy::from_config(config.auto_select_single),
    )
    .await?;

    let client = ToolProfileInstaller::new(config.tools.clone());
    upload(&client, UploadRequest { device, path: file }).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ProfileSession;
    use crate::error::ClientError;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        opened: Vec<String>,
        uploaded: Vec<PathBuf>,
    }

    struct MockInstaller {
        calls: Arc<Mutex<Calls>>,
        fail_open: bool,
        fail_upload: bool,
    }

    impl MockInstaller {
        fn new(fail_open: bool, fail_upload: bool) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Calls::default())),
                fail_open,
                fail_upload,
            }
        }
    }

    struct MockSession {
        calls: Arc<Mutex<Calls>>,
        fail: bool,
    }

    #[async_trait]
    impl ProfileInstallClient for MockInstaller {
        async fn open(&self, udid: &str) -> Result<Box<dyn ProfileSession>, ClientError> {
            self.calls.lock().unwrap().opened.push(udid.to_string());
            if self.fail_open {
                return Err(ClientError::ToolFailed {
                    program: "ideviceinfo".into(),
                    status: "exit status: 1".into(),
                    stderr: "ERROR: Could not connect to lockdownd".into(),
                });
            }
            Ok(Box::new(MockSession {
                calls: self.calls.clone(),
                fail: self.fail_upload,
            }))
        }
    }

    #[async_trait]
    impl ProfileSession for MockSession {
        async fn upload(&mut self, path: &Path) -> Result<(), ClientError> {
            self.calls.lock().unwrap().uploaded.push(path.to_path_buf());
            if self.fail {
                return Err(ClientError::ToolFailed {
                    program: "pymobiledevice3".into(),
                    status: "exit status: 1".into(),
                    stderr: "The profile is malformed".into(),
                });
            }
            Ok(())
        }
    }

    fn request(udid: &str, path: &str) -> UploadRequest {
        UploadRequest {
            device: DeviceRef::new(udid),
            path: PathBuf::from(path),
        }
    }

    #[tokio::test]
    async fn test_upload_opens_session_for_device_and_uploads_once() {
        let client = MockInstaller::new(false, false);
        upload(&client, request("ABCD-1234", "wifi.mobileconfig"))
            .await
            .unwrap();

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.opened, vec!["ABCD-1234"]);
        assert_eq!(calls.uploaded, vec![PathBuf::from("wifi.mobileconfig")]);
    }

    #[tokio::test]
    async fn test_upload_failure_mentions_file_path() {
        let client = MockInstaller::new(false, true);
        let err = upload(&client, request("ABCD-1234", "/tmp/vpn.mobileconfig"))
            .await
            .unwrap_err();

        assert!(matches!(err, DeviceError::Upload { .. }));
        assert!(err.to_string().contains("/tmp/vpn.mobileconfig"));
        // no retry
        assert_eq!(client.calls.lock().unwrap().uploaded.len(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_stops_before_upload() {
        let client = MockInstaller::new(true, false);
        let err = upload(&client, request("ABCD-1234", "wifi.mobileconfig"))
            .await
            .unwrap_err();

        match &err {
            DeviceError::SessionOpen { udid, service, .. } => {
                assert_eq!(udid, "ABCD-1234");
                assert_eq!(*service, "profile-install");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("ABCD-1234"));
        assert!(client.calls.lock().unwrap().uploaded.is_empty());
    }
}

//! Error types and exit codes for idevctl.

use std::path::PathBuf;

/// Exit codes for idevctl.
pub mod codes {
    pub const SUCCESS: u8 = 0;
    pub const FAILURE: u8 = 1;
    pub const NO_DEVICE: u8 = 3;
    pub const SELECTION_CANCELLED: u8 = 4;
    pub const SESSION_OPEN_FAILED: u8 = 5;
    pub const UPLOAD_FAILED: u8 = 6;
    pub const COPY_FAILED: u8 = 7;
}

/// Failures reported by a collaborator (device tooling) call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("command template for {0} is empty")]
    EmptyCommand(&'static str),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} was interrupted")]
    Interrupted { program: String },

    #[error("{program} did not expose a stdout pipe")]
    MissingStdout { program: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced at the command boundary.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("no USB connected devices found")]
    NoDevice,

    #[error("device selection cancelled")]
    SelectionCancelled,

    #[error("failed to list USB connected devices: {0}")]
    Enumerate(#[source] ClientError),

    #[error("failed to open {service} session with device {udid}: {source}")]
    SessionOpen {
        service: &'static str,
        udid: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to upload profile {}: {source}", path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: ClientError,
    },

    #[error("failed to relay syslog from device {udid}: {source}")]
    Copy {
        udid: String,
        #[source]
        source: std::io::Error,
    },
}

/// Map an error to its exit code.
pub fn exit_code(err: &DeviceError) -> u8 {
    match err {
        DeviceError::NoDevice => codes::NO_DEVICE,
        DeviceError::SelectionCancelled => codes::SELECTION_CANCELLED,
        DeviceError::Enumerate(_) => codes::NO_DEVICE,
        DeviceError::SessionOpen { .. } => codes::SESSION_OPEN_FAILED,
        DeviceError::Upload { .. } => codes::UPLOAD_FAILED,
        DeviceError::Copy { .. } => codes::COPY_FAILED,
    }
}

/// Exit code for an arbitrary command failure, looking through anyhow context.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<DeviceError>())
        .map(exit_code)
        .unwrap_or(codes::FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&DeviceError::NoDevice), codes::NO_DEVICE);
        assert_eq!(
            exit_code(&DeviceError::SelectionCancelled),
            codes::SELECTION_CANCELLED
        );
        assert_eq!(
            exit_code(&DeviceError::Copy {
                udid: "AAAA".into(),
                source: std::io::Error::other("broken pipe"),
            }),
            codes::COPY_FAILED
        );
    }

    #[test]
    fn test_exit_code_through_context() {
        let err = anyhow::Error::new(DeviceError::NoDevice).context("syslog failed");
        assert_eq!(exit_code_for(&err), codes::NO_DEVICE);

        let plain: anyhow::Result<()> = Err(anyhow::anyhow!("boom")).context("outer");
        assert_eq!(exit_code_for(&plain.unwrap_err()), codes::FAILURE);
    }

    #[test]
    fn test_upload_message_contains_path() {
        let err = DeviceError::Upload {
            path: PathBuf::from("/tmp/corp.mobileconfig"),
            source: ClientError::ToolFailed {
                program: "pymobiledevice3".into(),
                status: "exit status: 1".into(),
                stderr: "device locked".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/corp.mobileconfig"));
        assert!(msg.contains("device locked"));
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments or scenario file
    InvalidArgs(String),
    /// No camera stream could be acquired
    CameraUnavailable(String),
    /// The scanner container never appeared
    MountTargetMissing(String),
    /// Insecure context or no camera API
    EnvironmentUnsupported(String),
    /// No code was scanned in time
    Timeout(String),
    /// Anything else
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::CameraUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            CliError::MountTargetMissing(msg) => write!(f, "Mount target missing: {}", msg),
            CliError::EnvironmentUnsupported(msg) => {
                write!(f, "Environment unsupported: {}", msg)
            }
            CliError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InvalidArgs(_) => ExitCode::from(2),
            CliError::CameraUnavailable(_) => ExitCode::from(3),
            CliError::MountTargetMissing(_) => ExitCode::from(4),
            CliError::EnvironmentUnsupported(_) => ExitCode::from(5),
            CliError::Timeout(_) => ExitCode::from(6),
            CliError::General(_) => ExitCode::from(1),
        }
    }
}

/// Map codescan::Error to CliError with appropriate exit codes
impl From<codescan::Error> for CliError {
    fn from(err: codescan::Error) -> Self {
        use codescan::Error;

        match err {
            Error::EnvironmentUnsupported(reason) => {
                CliError::EnvironmentUnsupported(reason.to_string())
            }
            Error::MountTargetMissing(_) => CliError::MountTargetMissing(err.to_string()),
            Error::CameraUnavailable(media) => CliError::CameraUnavailable(media.to_string()),

            // recovered inside sessions, only reach here if a caller surfaces them
            Error::TransientDecode(_) | Error::TuningUnsupported(_) => {
                CliError::General(err.to_string())
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => CliError::InvalidArgs(format!("File not found: {}", err)),
            _ => CliError::General(format!("I/O error: {}", err)),
        }
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codescan::MediaError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::InvalidArgs("test".into()).exit_code(),
            ExitCode::from(2)
        );
        assert_eq!(
            CliError::CameraUnavailable("test".into()).exit_code(),
            ExitCode::from(3)
        );
        assert_eq!(
            CliError::MountTargetMissing("test".into()).exit_code(),
            ExitCode::from(4)
        );
        assert_eq!(
            CliError::EnvironmentUnsupported("test".into()).exit_code(),
            ExitCode::from(5)
        );
        assert_eq!(
            CliError::Timeout("test".into()).exit_code(),
            ExitCode::from(6)
        );
        assert_eq!(
            CliError::General("test".into()).exit_code(),
            ExitCode::from(1)
        );
    }

    #[test]
    fn test_from_library_error() {
        let err: CliError =
            codescan::Error::CameraUnavailable(MediaError::not_allowed("Permission denied")).into();
        assert_eq!(
            err.to_string(),
            "Camera unavailable: NotAllowedError: Permission denied"
        );

        let err: CliError = codescan::Error::MountTargetMissing("scanner".into()).into();
        assert!(matches!(err, CliError::MountTargetMissing(_)));
        assert_eq!(
            err.to_string(),
            "Mount target missing: Scanner container 'scanner' not found"
        );

        let err: CliError = codescan::Error::EnvironmentUnsupported(codescan::INSECURE_CONTEXT).into();
        assert_eq!(err.exit_code(), ExitCode::from(5));
    }
}

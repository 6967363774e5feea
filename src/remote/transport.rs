use crate::remote::error::TransportError;
use crate::settings::Settings;
use log::{debug, warn};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Mutex;
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpResult, FtpStream, Mode, Status};

/// The two commands the rest of the crate needs from a file server.
pub trait Transport: Send {
    /// Raw `LIST` lines of the directory at `path`.
    fn list(&self, path: &str) -> Result<Vec<String>, TransportError>;

    /// Full content of the file at `path`.
    fn retrieve(&self, path: &str) -> Result<Vec<u8>, TransportError>;
}

/// [`Transport`] over a single, lazily opened FTP control connection.
///
/// The connection is reused across calls. After any failure other than a
/// missing file it is discarded and the next call reconnects.
pub struct FtpTransport {
    host: String,
    port: u16,
    username: String,
    password: String,
    timeout: Duration,
    connection: Mutex<Option<FtpStream>>,
}

impl FtpTransport {
    pub fn new(settings: &Settings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            username: settings.username.clone(),
            password: settings.password.clone(),
            timeout: settings.timeout,
            connection: Mutex::new(None),
        }
    }

    fn resolve(&self) -> Result<SocketAddr, TransportError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| TransportError::Failed(format!("resolving {}: {e}", self.host)))?
            .next()
            .ok_or_else(|| TransportError::Failed(format!("no address for {}", self.host)))
    }

    fn connect(&self) -> Result<FtpStream, TransportError> {
        let address = self.resolve()?;
        debug!("Connecting to FTP server {}:{}", self.host, self.port);
        let setup = || -> FtpResult<FtpStream> {
            let mut stream = FtpStream::connect_timeout(address, self.timeout)?;
            stream
                .get_ref()
                .set_read_timeout(Some(self.timeout))
                .map_err(FtpError::ConnectionError)?;
            stream.set_mode(Mode::Passive);
            stream.login(&self.username, &self.password)?;
            stream.transfer_type(FileType::Binary)?;
            Ok(stream)
        };
        setup().map_err(|e| TransportError::Failed(format!("connecting to {}: {e}", self.host)))
    }

    fn with_connection<T>(
        &self,
        path: &str,
        command: impl FnOnce(&mut FtpStream) -> FtpResult<T>,
    ) -> Result<T, TransportError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| TransportError::Failed("FTP connection lock poisoned".to_string()))?;
        if guard.is_none() {
            *guard = Some(self.connect()?);
        }
        let stream = guard
            .as_mut()
            .ok_or_else(|| TransportError::Failed("FTP connection unavailable".to_string()))?;

        match command(stream) {
            Ok(value) => Ok(value),
            Err(e) => {
                let error = classify(path, e);
                if !matches!(error, TransportError::NotFound(_)) {
                    *guard = None;
                }
                Err(error)
            }
        }
    }
}

/// 550 is the reply for a missing file or directory.
fn classify(path: &str, error: FtpError) -> TransportError {
    match error {
        FtpError::UnexpectedResponse(response) if response.status == Status::FileUnavailable => {
            TransportError::NotFound(path.to_string())
        }
        other => TransportError::Failed(format!("{path}: {other}")),
    }
}

impl Transport for FtpTransport {
    fn list(&self, path: &str) -> Result<Vec<String>, TransportError> {
        self.with_connection(path, |stream| stream.list(Some(path)))
    }

    fn retrieve(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        self.with_connection(path, |stream| {
            stream.retr_as_buffer(path).map(|cursor| cursor.into_inner())
        })
    }
}

impl Drop for FtpTransport {
    fn drop(&mut self) {
        if let Ok(connection) = self.connection.get_mut() {
            if let Some(mut stream) = connection.take() {
                if let Err(e) = stream.quit() {
                    warn!("Failed to quit FTP session gracefully: {e}");
                }
            }
        }
    }
}

//! Configuration of the channel pair.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
    time::Duration,
};

/// Endpoints and timing of a [`TcpTransport`](super::TcpTransport).
///
/// Each side binds the endpoint its peer sends to and connects to the
/// endpoint its peer listens on. The defaults are the controller's view.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ChannelConfig {
    /// Address bound for incoming frames.
    pub recv_addr: String,

    /// Address of the peer receiving outgoing frames.
    pub send_addr: String,

    /// Pause between attempts to connect to the peer, in milliseconds.
    pub connect_retry_millis: u64,

    /// Receive timeout in milliseconds. `None` blocks forever.
    pub recv_timeout_millis: Option<u64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            recv_addr: "0.0.0.0:5557".to_string(),
            send_addr: "localhost:5555".to_string(),
            connect_retry_millis: 50,
            recv_timeout_millis: None,
        }
    }
}

impl ChannelConfig {
    /// Configuration of the simulator side matching the default controller side.
    pub fn simulator() -> Self {
        Self {
            recv_addr: "0.0.0.0:5555".to_string(),
            send_addr: "localhost:5557".to_string(),
            ..Self::default()
        }
    }

    /// Sets the address bound for incoming frames.
    pub fn recv_addr(mut self, addr: impl Into<String>) -> Self {
        self.recv_addr = addr.into();
        self
    }

    /// Sets the address of the peer.
    pub fn send_addr(mut self, addr: impl Into<String>) -> Self {
        self.send_addr = addr.into();
        self
    }

    /// Sets the pause between connection attempts.
    pub fn connect_retry_millis(mut self, v: u64) -> Self {
        self.connect_retry_millis = v;
        self
    }

    /// Sets the receive timeout.
    pub fn recv_timeout_millis(mut self, v: Option<u64>) -> Self {
        self.recv_timeout_millis = v;
        self
    }

    /// Receive timeout as a [`Duration`].
    pub fn recv_timeout(&self) -> Option<Duration> {
        self.recv_timeout_millis.map(Duration::from_millis)
    }

    /// Pause between connection attempts as a [`Duration`].
    pub fn connect_retry(&self) -> Duration {
        Duration::from_millis(self.connect_retry_millis)
    }

    /// Constructs [`ChannelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ChannelConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_channel_config() -> Result<()> {
        let config = ChannelConfig::default()
            .recv_addr("127.0.0.1:6001")
            .recv_timeout_millis(Some(1500));

        let dir = TempDir::new("channel_config")?;
        let path = dir.path().join("channel.yaml");
        config.save(&path)?;
        let config_ = ChannelConfig::load(&path)?;
        assert_eq!(config, config_);
        assert_eq!(config_.recv_timeout(), Some(Duration::from_millis(1500)));
        Ok(())
    }
}

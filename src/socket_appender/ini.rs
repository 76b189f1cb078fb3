//! Loading [`SocketAppenderConfig`] from INI files.
//!
//! Options live in an `[appender]` section using the conventional camel-case
//! option names:
//!
//! ```ini
//! [appender]
//! remoteHost = logs.example.com
//! port = 4560
//! reconnectionDelay = 30000
//! queueSize = 128
//! acceptConnectionTimeout = 5000
//! ```

use std::{fs, io::ErrorKind, path::Path};

use ini::Ini;

use super::config::{ConfigError, SocketAppenderConfig};

/// Section holding the appender options.
pub const APPENDER_SECTION: &str = "appender";

impl SocketAppenderConfig {
    /// Parse configuration from INI text. Options not present keep their
    /// defaults.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Ini(err.to_string()))?;
        let mut config = Self::default();
        let Some(section) = ini.section(Some(APPENDER_SECTION)) else {
            return Err(ConfigError::Ini(format!(
                "missing [{APPENDER_SECTION}] section"
            )));
        };
        for (key, value) in section.iter() {
            config.apply_option(key, value)?;
        }
        Ok(config)
    }

    /// Read and parse an INI file.
    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ConfigError::Ini(format!("{} doesn't exist", path.display())),
            _ => ConfigError::Io(err),
        })?;
        Self::from_ini_str(&text)
    }

    fn apply_option(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "remoteHost" => self.remote_host = Some(value.trim().to_owned()),
            "port" => self.port = parse_int(key, value)?,
            "reconnectionDelay" => self.reconnection_delay_ms = parse_int(key, value)?,
            "queueSize" => self.queue_size = parse_int(key, value)?,
            "acceptConnectionTimeout" => {
                self.accept_connection_timeout_ms = parse_int(key, value)?;
            }
            other => return Err(ConfigError::UnknownKey(other.to_owned())),
        }
        Ok(())
    }
}

fn parse_int(key: &str, value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    #[rstest]
    fn parses_every_option() {
        let config = SocketAppenderConfig::from_ini_str(
            "[appender]\nremoteHost = logs.internal\nport = 5000\nreconnectionDelay = 0\nqueueSize = 16\nacceptConnectionTimeout = 250\n",
        )
        .expect("valid ini");
        assert_eq!(
            config,
            SocketAppenderConfig {
                remote_host: Some("logs.internal".into()),
                port: 5000,
                reconnection_delay_ms: 0,
                queue_size: 16,
                accept_connection_timeout_ms: 250,
            }
        );
    }

    #[rstest]
    fn missing_options_keep_defaults() {
        let config = SocketAppenderConfig::from_ini_str("[appender]\nremoteHost = a\n")
            .expect("valid ini");
        assert_eq!(config.port, 4560);
        assert_eq!(config.queue_size, 0);
    }

    #[rstest]
    fn negative_queue_size_parses_but_fails_validation() {
        let config =
            SocketAppenderConfig::from_ini_str("[appender]\nremoteHost = a\nqueueSize = -3\n")
                .expect("negative numbers are syntactically valid");
        let errors = config.validate(true);
        assert!(matches!(errors.as_slice(), [ConfigError::NegativeQueueSize(-3)]));
    }

    #[rstest]
    #[case("[appender]\nport = lots\n", "port")]
    #[case("[appender]\nqueueSize = 1.5\n", "queueSize")]
    fn rejects_malformed_numbers(#[case] text: &str, #[case] bad_key: &str) {
        let err = SocketAppenderConfig::from_ini_str(text).expect_err("malformed number");
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == bad_key));
    }

    #[rstest]
    fn rejects_unknown_keys() {
        let err = SocketAppenderConfig::from_ini_str("[appender]\nhostname = a\n")
            .expect_err("unknown key");
        assert!(matches!(err, ConfigError::UnknownKey(ref key) if key == "hostname"));
    }

    #[rstest]
    fn requires_appender_section() {
        let err = SocketAppenderConfig::from_ini_str("[other]\nport = 1\n")
            .expect_err("section missing");
        assert!(matches!(err, ConfigError::Ini(_)));
    }

    #[rstest]
    fn reads_from_disk() {
        let mut file = NamedTempFile::new().expect("create temp ini file");
        writeln!(file, "[appender]\nremoteHost = 127.0.0.1\nport = 9100").expect("write ini");
        let config = SocketAppenderConfig::from_ini_file(file.path()).expect("should parse");
        assert_eq!(config.remote_host.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.port, 9100);
    }

    #[rstest]
    fn missing_file_is_reported() {
        let err = SocketAppenderConfig::from_ini_file("/definitely/not/here.ini")
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::Ini(ref msg) if msg.contains("doesn't exist")));
    }
}

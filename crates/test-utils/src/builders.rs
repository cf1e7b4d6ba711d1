#![allow(dead_code)]

use reflex::config::{CommandConfig, ConfigFile, RawConfigFile};
use reflex::types::{SupervisorMode, WatchBackendKind};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.config.watch.path = path.to_string();
        self
    }

    pub fn with_backend(mut self, backend: WatchBackendKind) -> Self {
        self.config.watch.backend = backend;
        self
    }

    pub fn with_poll_interval(mut self, interval: &str) -> Self {
        self.config.watch.poll_interval = interval.to_string();
        self
    }

    pub fn with_command(mut self, command: CommandConfig) -> Self {
        self.config.command.push(command);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `CommandConfig`.
pub struct CommandConfigBuilder {
    command: CommandConfig,
}

impl CommandConfigBuilder {
    /// `cmd` is split on whitespace into argv.
    pub fn new(cmd: &str) -> Self {
        Self {
            command: CommandConfig::new(cmd.split_whitespace().map(str::to_string).collect()),
        }
    }

    pub fn regex(mut self, pattern: &str) -> Self {
        self.command.regex = pattern.to_string();
        self
    }

    pub fn inverse(mut self) -> Self {
        self.command.inverse = true;
        self
    }

    pub fn mode(mut self, mode: SupervisorMode) -> Self {
        self.command.mode = mode;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: &str) -> Self {
        self.command.shutdown_timeout = timeout.to_string();
        self
    }

    pub fn quiet_interval(mut self, interval: &str) -> Self {
        self.command.quiet_interval = interval.to_string();
        self
    }

    pub fn source(mut self, source: &str) -> Self {
        self.command.source = Some(source.to_string());
        self
    }

    pub fn build(self) -> CommandConfig {
        self.command
    }
}

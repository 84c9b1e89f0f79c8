pub mod capacity;
pub mod decode;
pub mod encode;

use stegage_core::{Pipeline, StegageConfig};

use crate::errors::CliError;

/// Resolved settings shared by every command.
pub struct CommandContext {
    pub config: StegageConfig,
    pub quiet: bool,
}

impl CommandContext {
    pub fn pipeline(&self) -> anyhow::Result<Pipeline> {
        Ok(Pipeline::new(self.config.clone()).map_err(CliError::from)?)
    }
}

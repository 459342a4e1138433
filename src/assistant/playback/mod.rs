#[cfg(test)]
mod tests;

use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::{RagError, Result};

/// An external audio player invoked with the file to play as its last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    program: String,
    args: Vec<String>,
}

impl Player {
    /// Split a command line such as `mpv --no-video` on whitespace.
    ///
    /// `None` for a blank command line.
    #[inline]
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    #[inline]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[inline]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Play `audio` and wait for the player to exit.
    #[inline]
    pub fn play(&self, audio: &Path) -> Result<()> {
        debug!("Playing {} with {}", audio.display(), self.program);

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(audio)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| RagError::Playback(format!("Failed to start {}: {}", self.program, e)))?;

        if !status.success() {
            return Err(RagError::Playback(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        Ok(())
    }
}

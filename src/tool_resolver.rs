//! # Tool Path Resolver
//!
//! Finds the external encoder and prober binaries:
//! - an explicit tools directory (`--tools-dir` / `AUDX_TOOLS_DIR`)
//! - the executable search path (`PATH`)

use crate::error::ConvertError;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

/// Resolved locations of the external tools used by a run
#[derive(Debug, Clone)]
pub struct ResolvedTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// Tool path resolver
pub struct ToolPathResolver {
    /// Directory searched before `PATH`
    tools_dir: Option<PathBuf>,
    /// Replaces the `PATH` environment variable when set
    search_path: Option<OsString>,
}

impl ToolPathResolver {
    /// Create a new path resolver
    pub fn new(tools_dir: Option<PathBuf>) -> Self {
        Self {
            tools_dir,
            search_path: None,
        }
    }

    /// Search these directories (in `PATH` syntax) instead of `PATH`
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        debug!("Resolving tool: {}", tool_name);

        if let Some(ref tools_dir) = self.tools_dir {
            let bundled_path = tools_dir.join(Self::executable_name(tool_name));
            if bundled_path.is_file() {
                debug!("Using tool from tools dir: {} -> {:?}", tool_name, bundled_path);
                return Some(bundled_path);
            }
            debug!("Tool not in tools dir: {:?}", bundled_path);
        }

        if let Some(system_path) = self.find_in_system_path(tool_name) {
            debug!("Using system tool: {} -> {:?}", tool_name, system_path);
            return Some(system_path);
        }

        warn!("Tool not found: {}", tool_name);
        None
    }

    fn executable_name(tool_name: &str) -> String {
        let extension = if cfg!(windows) { ".exe" } else { "" };
        format!("{}{}", tool_name, extension)
    }

    /// Find tool in system PATH
    fn find_in_system_path(&self, tool_name: &str) -> Option<PathBuf> {
        let tool_with_ext = Self::executable_name(tool_name);
        let search_path = match self.search_path {
            Some(ref path) => path.clone(),
            None => env::var_os("PATH")?,
        };
        env::split_paths(&search_path)
            .map(|dir| dir.join(&tool_with_ext))
            .find(|path| path.is_file())
    }

    /// Check that both ffmpeg and ffprobe are available
    pub fn verify_tools(&self) -> Result<ResolvedTools, ConvertError> {
        let ffmpeg = self.resolve_tool(FFMPEG).ok_or_else(|| {
            ConvertError::MissingDependency(format!(
                "ffmpeg not found {}. Install it and try again.{}",
                self.searched_locations(),
                Self::install_hint(FFMPEG)
            ))
        })?;

        let ffprobe = self.resolve_tool(FFPROBE).ok_or_else(|| {
            ConvertError::MissingDependency(format!(
                "ffprobe not found {}. It comes with ffmpeg by default; install a full ffmpeg build.{}",
                self.searched_locations(),
                Self::install_hint(FFPROBE)
            ))
        })?;

        Ok(ResolvedTools { ffmpeg, ffprobe })
    }

    /// Where `resolve_tool` looked, for error messages
    fn searched_locations(&self) -> String {
        match self.tools_dir() {
            Some(dir) => format!("in {} or on PATH", dir.display()),
            None => "on PATH".to_string(),
        }
    }

    fn install_hint(tool_name: &str) -> String {
        if cfg!(target_os = "linux") {
            format!("\nTo install {} on Linux, run:\n  sudo apt-get install ffmpeg", tool_name)
        } else if cfg!(target_os = "macos") {
            format!("\nTo install {} on macOS, run:\n  brew install ffmpeg", tool_name)
        } else {
            String::new()
        }
    }

    pub fn tools_dir(&self) -> Option<&Path> {
        self.tools_dir.as_deref()
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new(None)
    }
}

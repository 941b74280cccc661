//! ffmpeg argument builder
//!
//! Arguments are kept as `OsString` so paths reach the process untouched,
//! with no shell in between.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tokio::process::Command;

/// An ffmpeg invocation, minus the program path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FfmpegCommand {
    args: Vec<OsString>,
}

impl FfmpegCommand {
    /// Quiet, overwriting invocation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// `-i <path>`
    #[must_use]
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.arg("-i").arg(path.as_ref())
    }

    /// Output file; goes last
    #[must_use]
    pub fn output(self, path: impl AsRef<Path>) -> Self {
        self.arg(path.as_ref())
    }

    #[must_use]
    pub fn as_args(&self) -> &[OsString] {
        &self.args
    }

    /// Whether `flag` is immediately followed by `value`
    #[must_use]
    pub fn has_pair(&self, flag: &str, value: impl AsRef<OsStr>) -> bool {
        self.args
            .windows(2)
            .any(|w| w[0] == flag && w[1] == value.as_ref())
    }

    /// Value following `flag`, if present
    #[must_use]
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .windows(2)
            .find(|w| w[0] == flag)
            .map(|w| w[1].as_os_str())
    }

    /// The last argument (output path for finished commands)
    #[must_use]
    pub fn target(&self) -> Option<&OsStr> {
        self.args.last().map(OsString::as_os_str)
    }

    /// Shell-like rendering for logs only
    #[must_use]
    pub fn display(&self) -> String {
        self.args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Bind to a concrete ffmpeg binary
    #[must_use]
    pub fn into_command(self, program: &Path) -> Command {
        let mut command = Command::new(program);
        command.args(self.args);
        command
    }
}

/// Concat-demuxer manifest: one `file '<path>'` line per track.
///
/// Single quotes inside paths are closed, escaped and reopened (`'\''`).
#[must_use]
pub fn concat_manifest(tracks: &[PathBuf]) -> String {
    tracks
        .iter()
        .map(|t| {
            let escaped = t.to_string_lossy().replace('\'', r"'\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_quiet_overwriting_command() {
        let cmd = FfmpegCommand::new()
            .input("in put.mp4")
            .args(["-c", "copy"])
            .output("out.mp4");
        assert_eq!(
            cmd.display(),
            "-hide_banner -loglevel error -y -i in put.mp4 -c copy out.mp4"
        );
        assert!(cmd.has_pair("-i", "in put.mp4"));
        assert_eq!(cmd.value_of("-c"), Some(OsStr::new("copy")));
        assert_eq!(cmd.target(), Some(OsStr::new("out.mp4")));
    }

    #[test]
    fn paths_stay_single_arguments() {
        let cmd = FfmpegCommand::new().input("/tmp/a b/c;rm -rf.wav");
        assert_eq!(cmd.as_args().len(), 6);
        assert_eq!(cmd.as_args()[5], "/tmp/a b/c;rm -rf.wav");
    }

    #[test]
    fn manifest_escapes_quotes() {
        let manifest = concat_manifest(&[
            PathBuf::from("/music/a.wav"),
            PathBuf::from("/music/it's.mp3"),
        ]);
        assert_eq!(
            manifest,
            "file '/music/a.wav'\nfile '/music/it'\\''s.mp3'\n"
        );
    }

    #[test]
    fn empty_manifest() {
        assert_eq!(concat_manifest(&[]), "");
    }
}

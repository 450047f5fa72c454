use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};

use super::{FileSystem, FsResponse, ProcessOutput, ProcessRunner};

/// Filesystem access backed by the host OS.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    home: PathBuf,
}

impl LocalFileSystem {
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        LocalFileSystem { home }
    }

    #[cfg(test)]
    fn with_home(home: impl Into<PathBuf>) -> Self {
        LocalFileSystem { home: home.into() }
    }

    /// Resolve `path` against `cwd`, expanding a leading `~`.
    fn resolve(&self, cwd: &str, path: &str) -> PathBuf {
        if path == "~" {
            return self.home.clone();
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return self.home.join(rest);
        }
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            Path::new(cwd).join(p)
        }
    }
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// `cp`/`mv` into an existing directory keep the source file name.
fn destination(src: &Path, dest: PathBuf) -> PathBuf {
    if dest.is_dir()
        && let Some(name) = src.file_name()
    {
        return dest.join(name);
    }
    dest
}

impl FileSystem for LocalFileSystem {
    fn pwd(&self, cwd: &str) -> Result<String> {
        let dir = fs::canonicalize(cwd).with_context(|| format!("pwd: {cwd}"))?;
        Ok(dir.display().to_string())
    }

    fn ls(&self, cwd: &str, path: Option<&str>) -> Result<Vec<String>> {
        let target = self.resolve(cwd, path.unwrap_or("."));
        let entries = fs::read_dir(&target)
            .with_context(|| format!("ls: cannot access '{}'", path.unwrap_or(".")))?;
        let mut names = entries
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    fn cd(&self, cwd: &str, path: &str) -> Result<FsResponse> {
        let target = self.resolve(cwd, path);
        match fs::canonicalize(&target) {
            Ok(dir) if dir.is_dir() => Ok(FsResponse::with_data(dir.display().to_string())),
            Ok(_) => Ok(FsResponse::failed(format!("cd: not a directory: {path}"))),
            Err(e) => Ok(FsResponse::failed(format!("cd: {path}: {e}"))),
        }
    }

    fn cat(&self, cwd: &str, path: &str) -> Result<FsResponse> {
        match fs::read_to_string(self.resolve(cwd, path)) {
            Ok(content) => Ok(FsResponse::with_data(content)),
            Err(e) => Ok(FsResponse::failed(format!("cat: {path}: {e}"))),
        }
    }

    fn mkdir(&self, cwd: &str, path: &str) -> Result<FsResponse> {
        match fs::create_dir_all(self.resolve(cwd, path)) {
            Ok(()) => Ok(FsResponse::ok()),
            Err(e) => Ok(FsResponse::failed(format!("mkdir: {path}: {e}"))),
        }
    }

    fn touch(&self, cwd: &str, path: &str) -> Result<FsResponse> {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.resolve(cwd, path));
        match result {
            Ok(_) => Ok(FsResponse::ok()),
            Err(e) => Ok(FsResponse::failed(format!("touch: {path}: {e}"))),
        }
    }

    fn rm(&self, cwd: &str, path: &str, recursive: bool) -> Result<FsResponse> {
        let target = self.resolve(cwd, path);
        let result = if target.is_dir() {
            if !recursive {
                return Ok(FsResponse::failed(format!("rm: {path}: is a directory")));
            }
            fs::remove_dir_all(&target)
        } else {
            fs::remove_file(&target)
        };
        match result {
            Ok(()) => Ok(FsResponse::ok()),
            Err(e) => Ok(FsResponse::failed(format!("rm: {path}: {e}"))),
        }
    }

    fn cp(&self, cwd: &str, src: &str, dest: &str) -> Result<FsResponse> {
        let from = self.resolve(cwd, src);
        let to = destination(&from, self.resolve(cwd, dest));
        match fs::copy(&from, &to) {
            Ok(_) => Ok(FsResponse::ok()),
            Err(e) => Ok(FsResponse::failed(format!("cp: {src}: {e}"))),
        }
    }

    fn mv(&self, cwd: &str, src: &str, dest: &str) -> Result<FsResponse> {
        let from = self.resolve(cwd, src);
        let to = destination(&from, self.resolve(cwd, dest));
        match fs::rename(&from, &to) {
            Ok(()) => Ok(FsResponse::ok()),
            Err(e) => Ok(FsResponse::failed(format!("mv: {src}: {e}"))),
        }
    }

    fn computer_name(&self) -> Result<String> {
        hostname()
    }

    fn home_dir(&self) -> String {
        self.home.display().to_string()
    }
}

#[cfg(unix)]
fn hostname() -> Result<String> {
    let mut buf = [0u8; 256];
    // SAFETY: `buf` is a live, writable buffer and its exact length is passed,
    // so gethostname cannot write out of bounds.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len()) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error()).context("gethostname failed");
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..end]).into_owned();
    if name.is_empty() {
        bail!("host name is empty");
    }
    Ok(name)
}

#[cfg(not(unix))]
fn hostname() -> Result<String> {
    std::env::var("COMPUTERNAME").context("COMPUTERNAME is not set")
}

/// Runs programs installed on the host, e.g. `git`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProcessRunner;

impl ProcessRunner for LocalProcessRunner {
    fn run(&self, cwd: &str, argv: &[String]) -> Result<ProcessOutput> {
        let Some((program, args)) = argv.split_first() else {
            bail!("no program given");
        };
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .with_context(|| format!("failed to run {program}"))?;
        Ok(ProcessOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

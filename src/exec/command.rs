// src/exec/command.rs

//! Spawning processes with their stdout and stderr captured together.

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use nix::fcntl::OFlag;
use nix::unistd::pipe2;
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// A running child whose merged output is being collected in the
/// background.
#[derive(Debug)]
pub struct CapturedChild {
    pub child: Child,
    pub output: JoinHandle<io::Result<Vec<u8>>>,
}

impl CapturedChild {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the child to exit and for its output to be fully read.
    pub async fn wait_with_output(mut self) -> io::Result<(ExitStatus, Vec<u8>)> {
        let status = self.child.wait().await?;
        let output = collect_output(self.output).await?;
        Ok((status, output))
    }
}

/// Await the output collector of a finished child.
pub async fn collect_output(handle: JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    handle.await.map_err(io::Error::other)?
}

/// Spawn `cmd` with stdout and stderr sharing one pipe and stdin from
/// `/dev/null`.
///
/// The child is not killed when its handle is dropped: commands outlive an
/// engine shutdown.
pub fn spawn_captured(mut cmd: Command) -> io::Result<CapturedChild> {
    let (reader, writer) = pipe2(OFlag::O_CLOEXEC)?;

    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(writer.try_clone()?))
        .stderr(Stdio::from(writer))
        .kill_on_drop(false);

    let child = cmd.spawn()?;
    // Drop our copies of the write end, otherwise the reader never sees EOF.
    drop(cmd);

    let mut receiver = pipe::Receiver::from_owned_fd(reader)?;
    let output = tokio::spawn(async move {
        let mut buf = Vec::new();
        receiver.read_to_end(&mut buf).await?;
        Ok(buf)
    });

    Ok(CapturedChild { child, output })
}

/// Run `command` through `sh -c` and wait for it.
pub async fn run_shell(command: &str) -> io::Result<(i32, Vec<u8>)> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    let (status, output) = spawn_captured(cmd)?.wait_with_output().await?;
    Ok((exit_code(status), output))
}

/// Exit code of a finished process; `-signo` when it was killed by a
/// signal.
pub fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| -sig))
        .unwrap_or(-1)
}

//! Console verifier: one connection, one command, one pattern, one deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::time::Instant;

use super::config::VerifierConfig;
use super::governor;
use super::session::{Session, SessionState};
use super::verdict::Verdict;
use crate::channel::{LineMatcher, MatchReport, Pattern, ResponseMatcher};
use crate::error::{ChannelError, Result};
use crate::transport::connect;

/// Upper bound on shutting down the write side after a session.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Verifier that runs each check over a fresh console connection.
///
/// Handles:
/// - Connecting with a bounded connect timeout
/// - Sending the command in one write
/// - Racing the response matcher against the response deadline
/// - Closing the connection on every exit path
///
/// Failures never escape as errors; they are captured in the [`Verdict`].
#[derive(Debug, Clone)]
pub struct ConsoleVerifier {
    config: VerifierConfig,
}

impl ConsoleVerifier {
    /// Create a verifier, validating the configuration.
    pub fn new(config: VerifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Connect, send `command`, and wait for a line containing `pattern`.
    ///
    /// `command` is written byte for byte; it must carry its own line
    /// terminator (usually `\n`).
    pub async fn verify(&self, command: &str, pattern: &str) -> Verdict {
        let session = Session::new(command, pattern);
        match Pattern::new(pattern) {
            Ok(pattern) => {
                let connecting = connect(&self.config.target);
                self.connect_and_run(session, connecting, command, Arc::new(pattern))
                    .await
            }
            Err(e) => conclude(session.finish(Err(e.into()))),
        }
    }

    /// Like [`verify`](Self::verify), with a custom line matcher.
    ///
    /// `description` is only used in the verdict.
    pub async fn verify_with(
        &self,
        command: &str,
        matcher: Arc<dyn LineMatcher>,
        description: &str,
    ) -> Verdict {
        let session = Session::new(command, description);
        let connecting = connect(&self.config.target);
        self.connect_and_run(session, connecting, command, matcher).await
    }

    /// Run a check over an already open stream.
    ///
    /// The stream is owned by the session and closed before this returns.
    pub async fn verify_stream<S>(&self, stream: S, command: &str, pattern: &str) -> Verdict
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let session = Session::new(command, pattern);
        match Pattern::new(pattern) {
            Ok(pattern) => {
                self.run_session(session, stream, command, Arc::new(pattern))
                    .await
            }
            Err(e) => conclude(session.finish(Err(e.into()))),
        }
    }

    async fn connect_and_run<C, S>(
        &self,
        mut session: Session,
        connecting: C,
        command: &str,
        matcher: Arc<dyn LineMatcher>,
    ) -> Verdict
    where
        C: Future<Output = Result<S>>,
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        session.advance(SessionState::Connecting);
        match connecting.await {
            Ok(connection) => self.run_session(session, connection, command, matcher).await,
            Err(e) => conclude(session.finish(Err(e))),
        }
    }

    async fn run_session<S>(
        &self,
        mut session: Session,
        stream: S,
        command: &str,
        matcher: Arc<dyn LineMatcher>,
    ) -> Verdict
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        session.advance(SessionState::Connected);
        let deadline = Instant::now() + self.config.response_timeout;
        let (reader, mut writer) = tokio::io::split(stream);

        let result = self
            .exchange(&mut session, reader, &mut writer, command, matcher, deadline)
            .await;

        // The read half is gone by now; shutting down and dropping the
        // write half releases the stream.
        match tokio::time::timeout(CLOSE_TIMEOUT, writer.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("shutdown after session failed: {}", e),
            Err(_) => debug!("shutdown after session timed out"),
        }
        drop(writer);

        conclude(session.finish(result))
    }

    async fn exchange<S>(
        &self,
        session: &mut Session,
        reader: ReadHalf<S>,
        writer: &mut WriteHalf<S>,
        command: &str,
        matcher: Arc<dyn LineMatcher>,
        deadline: Instant,
    ) -> Result<MatchReport>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        tokio::time::timeout_at(deadline, send(writer, command.as_bytes()))
            .await
            .map_err(|_| ChannelError::Timeout(self.config.response_timeout))??;
        session.advance(SessionState::CommandSent);

        let response = ResponseMatcher::new(matcher, self.config.lines_to_skip)
            .with_max_line_length(self.config.max_line_length)
            .with_strip_ansi(self.config.strip_ansi);

        session.advance(SessionState::Reading);
        governor::race(response.run(reader), deadline, self.config.response_timeout).await
    }
}

/// Write the whole payload; any error or short write fails the session.
async fn send<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(payload)
        .await
        .map_err(ChannelError::Write)?;
    writer.flush().await.map_err(ChannelError::Write)?;
    Ok(())
}

fn conclude(verdict: Verdict) -> Verdict {
    debug!("{}", verdict);
    verdict
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use tokio::io::{AsyncReadExt, DuplexStream, ReadBuf};

    use super::*;
    use crate::error::{Error, FailureKind, TransportError};
    use crate::transport::connect_with;
    use crate::verify::{Outcome, VerifierBuilder};

    fn verifier(response_timeout: Duration) -> ConsoleVerifier {
        VerifierBuilder::unix("/unused/console.sock")
            .response_timeout(response_timeout)
            .build()
            .unwrap()
    }

    /// Scripted console: reads the command, waits, replies, then either
    /// hangs up or waits for the verifier to close.
    fn spawn_console(
        mut peer: DuplexStream,
        reply: &'static [&'static str],
        delay: Duration,
        hang_up: bool,
    ) -> tokio::task::JoinHandle<Vec<u8>> {
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1024];
            let n = peer.read(&mut buf).await.unwrap_or(0);
            let received = buf[..n].to_vec();

            tokio::time::sleep(delay).await;
            for line in reply {
                if peer.write_all(line.as_bytes()).await.is_err() {
                    return received;
                }
            }

            if !hang_up {
                while let Ok(n) = peer.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                }
            }
            received
        })
    }

    /// Stream wrapper counting how often the underlying stream is dropped.
    struct Tracked {
        inner: DuplexStream,
        drops: Arc<AtomicUsize>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl AsyncRead for Tracked {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.inner).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for Tracked {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Pin::new(&mut self.inner).poll_write(cx, buf)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Pin::new(&mut self.inner).poll_flush(cx)
        }

        fn poll_shutdown(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.inner).poll_shutdown(cx)
        }
    }

    /// Stream whose writes fail or write nothing, recording read attempts.
    struct BrokenWriter {
        zero_write: bool,
        read_attempted: Arc<AtomicBool>,
    }

    impl AsyncRead for BrokenWriter {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            self.read_attempted.store(true, Ordering::SeqCst);
            Poll::Pending
        }
    }

    impl AsyncWrite for BrokenWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.zero_write {
                Poll::Ready(Ok(0))
            } else {
                Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
            }
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_match_after_echo_and_prompt() {
        let (local, peer) = tokio::io::duplex(1024);
        let console = spawn_console(
            peer,
            &["cmd\n", "prompt>\n", "test-file\n"],
            Duration::ZERO,
            false,
        );

        let verdict = verifier(Duration::from_secs(5))
            .verify_stream(local, "ls /mnt/test-mount/\n", "test-file")
            .await;

        assert!(verdict.passed(), "{}", verdict);
        assert_eq!(verdict.matched_line.as_deref(), Some("test-file"));
        assert_eq!(verdict.lines_read, 3);
        assert_eq!(console.await.unwrap(), b"ls /mnt/test-mount/\n");
    }

    #[tokio::test]
    async fn test_close_before_match_is_read_error() {
        let (local, peer) = tokio::io::duplex(1024);
        spawn_console(peer, &["cmd\n", "prompt>\n"], Duration::ZERO, true);

        let verdict = verifier(Duration::from_secs(5))
            .verify_stream(local, "cat greeting\n", "hello")
            .await;

        assert!(!verdict.passed());
        assert_eq!(verdict.outcome, Outcome::Failed);
        assert_eq!(verdict.failure_kind(), Some(FailureKind::Read));
        assert_eq!(verdict.last_state(), SessionState::ReadError);
    }

    #[tokio::test]
    async fn test_silent_console_times_out() {
        let (local, peer) = tokio::io::duplex(1024);
        spawn_console(peer, &["hello\n"], Duration::from_secs(2), false);

        let start = std::time::Instant::now();
        let verdict = verifier(Duration::from_secs(1))
            .verify_stream(local, "cat greeting\n", "hello")
            .await;
        let elapsed = start.elapsed();

        assert!(!verdict.passed());
        assert_eq!(verdict.outcome, Outcome::TimedOut);
        assert!(verdict.cause().unwrap().is_timeout());
        assert!(elapsed >= Duration::from_millis(900));
        assert!(elapsed < Duration::from_millis(1800), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_missing_socket_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = VerifierBuilder::unix(dir.path().join("console.sock"))
            .response_timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        let start = std::time::Instant::now();
        let verdict = verifier.verify("ls\n", "hello").await;

        assert!(!verdict.passed());
        assert_eq!(verdict.failure_kind(), Some(FailureKind::Connect));
        assert!(!verdict.command_sent());
        assert_eq!(verdict.last_state(), SessionState::Connecting);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_skipped_lines_never_match() {
        let (local, peer) = tokio::io::duplex(1024);
        spawn_console(peer, &["hello\n", "hello\n"], Duration::ZERO, true);

        let verdict = verifier(Duration::from_secs(5))
            .verify_stream(local, "echo hello\n", "hello")
            .await;

        assert!(!verdict.passed());
        assert_eq!(verdict.lines_read, 2);
    }

    #[tokio::test]
    async fn test_stream_closed_exactly_once_on_timeout() {
        let drops = Arc::new(AtomicUsize::new(0));
        let (inner, peer) = tokio::io::duplex(1024);
        spawn_console(peer, &[], Duration::ZERO, false);

        let stream = Tracked {
            inner,
            drops: drops.clone(),
        };
        let verdict = verifier(Duration::from_millis(200))
            .verify_stream(stream, "ls\n", "never")
            .await;

        assert_eq!(verdict.outcome, Outcome::TimedOut);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stream_closed_exactly_once_on_match() {
        let drops = Arc::new(AtomicUsize::new(0));
        let (inner, peer) = tokio::io::duplex(1024);
        spawn_console(peer, &["ls\n", "/ # \n", "bin\n"], Duration::ZERO, false);

        let stream = Tracked {
            inner,
            drops: drops.clone(),
        };
        let verdict = verifier(Duration::from_secs(5))
            .verify_stream(stream, "ls\n", "bin")
            .await;

        assert!(verdict.passed());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_write_error_short_circuits() {
        let read_attempted = Arc::new(AtomicBool::new(false));
        let stream = BrokenWriter {
            zero_write: false,
            read_attempted: read_attempted.clone(),
        };

        let verdict = verifier(Duration::from_secs(5))
            .verify_stream(stream, "ls\n", "bin")
            .await;

        assert!(!verdict.passed());
        assert_eq!(verdict.failure_kind(), Some(FailureKind::Write));
        assert!(!verdict.command_sent());
        assert!(!read_attempted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_short_write_short_circuits() {
        let read_attempted = Arc::new(AtomicBool::new(false));
        let stream = BrokenWriter {
            zero_write: true,
            read_attempted: read_attempted.clone(),
        };

        let verdict = verifier(Duration::from_secs(5))
            .verify_stream(stream, "ls\n", "bin")
            .await;

        match verdict.cause() {
            Some(Error::Channel(ChannelError::Write(e))) => {
                assert_eq!(e.kind(), io::ErrorKind::WriteZero)
            }
            other => panic!("unexpected cause: {:?}", other),
        }
        assert!(!read_attempted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_pattern_fails_without_io() {
        let read_attempted = Arc::new(AtomicBool::new(false));
        let stream = BrokenWriter {
            zero_write: false,
            read_attempted: read_attempted.clone(),
        };

        let verdict = verifier(Duration::from_secs(5))
            .verify_stream(stream, "ls\n", "")
            .await;

        assert_eq!(verdict.failure_kind(), Some(FailureKind::Config));
        assert_eq!(verdict.last_state(), SessionState::Idle);
        assert!(!read_attempted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_repeated_runs_agree() {
        let mut outcomes = Vec::new();
        for _ in 0..3 {
            let (local, peer) = tokio::io::duplex(1024);
            spawn_console(
                peer,
                &["cmd\n", "prompt>\n", "noise\n", "test-file\n"],
                Duration::ZERO,
                false,
            );
            let verdict = verifier(Duration::from_secs(5))
                .verify_stream(local, "ls\n", "test-file")
                .await;
            outcomes.push((verdict.outcome, verdict.lines_read));
        }
        assert!(outcomes.iter().all(|o| *o == (Outcome::Matched, 4)));
    }

    #[tokio::test]
    async fn test_command_sent_verbatim() {
        let (local, peer) = tokio::io::duplex(1024);
        let console = spawn_console(
            peer,
            &["ls\r\n", "/ # \n", "bin\n"],
            Duration::ZERO,
            false,
        );

        let verdict = verifier(Duration::from_secs(5))
            .verify_stream(local, "ls\r", "bin")
            .await;

        assert!(verdict.passed(), "{}", verdict);
        assert_eq!(console.await.unwrap(), b"ls\r");
    }

    #[tokio::test]
    async fn test_hanging_connect_times_out_without_write() {
        let verifier = VerifierBuilder::unix("/run/vc/vm/foobar/console.sock")
            .connect_timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let target = verifier.config().target.clone();
        let connecting = connect_with(&target, std::future::pending());

        let start = std::time::Instant::now();
        let verdict = verifier
            .connect_and_run(
                Session::new("ls\n", "bin"),
                connecting,
                "ls\n",
                Arc::new(Pattern::new("bin").unwrap()),
            )
            .await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!verdict.passed());
        assert_eq!(verdict.failure_kind(), Some(FailureKind::Connect));
        assert!(matches!(
            verdict.cause(),
            Some(Error::Transport(TransportError::ConnectTimeout { .. }))
        ));
        assert!(!verdict.command_sent());
        assert_eq!(verdict.last_state(), SessionState::Connecting);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_verify_over_unix_socket() {
        use tokio::net::UnixListener;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.sock");
        let listener = UnixListener::bind(&path).unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 256];
            let n = stream.read(&mut buf).await.unwrap();
            let echo = buf[..n].to_vec();
            stream.write_all(&echo).await.unwrap();
            stream.write_all(b"/ # \r\n").await.unwrap();
            stream.write_all(b"hello hello!\r\n").await.unwrap();
            let _ = stream.read(&mut buf).await;
        });

        let verifier = VerifierBuilder::unix(&path).build().unwrap();
        let verdict = verifier.verify("cat test-file | grep hello\n", "hello").await;

        assert!(verdict.passed(), "{}", verdict);
        assert_eq!(verdict.matched_line.as_deref(), Some("hello hello!"));
        assert_eq!(
            verdict.states,
            vec![
                SessionState::Idle,
                SessionState::Connecting,
                SessionState::Connected,
                SessionState::CommandSent,
                SessionState::Reading,
                SessionState::Matched,
                SessionState::Closed,
            ]
        );
    }
}

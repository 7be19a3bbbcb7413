use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use extrulink_frame::{decode_hex_frame, Frame, FrameCodec, FrameError};
use extrulink_telemetry::{LineError, LineScope, Telemetry};
use extrulink_transport::{open_inbound, Endpoint};
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::Result;
use crate::lines::{LineCodec, Record, DEFAULT_MAX_LINE_LENGTH};

/// Pause between reconnect attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// What kind of records an endpoint carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// Delimited simulator rows. Spool statistics are always applied; live
    /// telemetry columns only when `include_telemetry` is set.
    SimText { include_telemetry: bool },
    /// 8-byte binary readings from the controller's message pipe.
    PipeMessages,
    /// One hex-encoded reading per line.
    TcpHexLines,
}

/// What to do when reading from an open feed fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadErrorPolicy {
    /// Log, wait the backoff, reconnect.
    #[default]
    Reconnect,
    /// End the loop with the error.
    Stop,
}

/// How a session over one open stream ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The writer went away cleanly.
    PeerClosed,
    /// Shutdown was requested.
    Cancelled,
}

/// Tuning for an [`InboundLoop`].
#[derive(Debug, Clone)]
pub struct InboundConfig {
    pub backoff: Duration,
    pub on_read_error: ReadErrorPolicy,
    /// Column separator of simulator rows.
    pub delimiter: String,
    /// Longest text record kept; longer ones are dropped.
    pub max_line_length: usize,
}

impl Default for InboundConfig {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF,
            on_read_error: ReadErrorPolicy::default(),
            delimiter: "|".to_string(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Keeps one feed connected and pushes every record into [`Telemetry`].
#[derive(Debug)]
pub struct InboundLoop {
    endpoint: Endpoint,
    feed: Feed,
    telemetry: Arc<Telemetry>,
    config: InboundConfig,
}

impl InboundLoop {
    pub fn new(endpoint: Endpoint, feed: Feed, telemetry: Arc<Telemetry>) -> Self {
        Self {
            endpoint,
            feed,
            telemetry,
            config: InboundConfig::default(),
        }
    }

    /// Override loop tuning.
    pub fn with_config(mut self, config: InboundConfig) -> Self {
        self.config = config;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Run until cancelled.
    ///
    /// Open failures are retried forever after the backoff. A clean close
    /// reconnects at once. Read errors follow the configured
    /// [`ReadErrorPolicy`]; with `Stop` the error is returned.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let endpoint = self.endpoint.clone();
        self.run_with(cancel, || open_inbound(&endpoint)).await
    }

    async fn run_with<F, Fut, R, E>(&self, cancel: CancellationToken, mut open: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        R: AsyncRead + Unpin,
        E: fmt::Display,
    {
        let endpoint = &self.endpoint;
        loop {
            let opened = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                opened = open() => opened,
            };
            let stream = match opened {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(%endpoint, error = %err, "feed unavailable, retrying");
                    if !self.pause(&cancel).await {
                        return Ok(());
                    }
                    continue;
                }
            };
            info!(
                %endpoint,
                transport = endpoint.transport_name(),
                feed = ?self.feed,
                "feed connected"
            );

            match self.session(stream, &cancel).await {
                Ok(SessionEnd::Cancelled) => return Ok(()),
                Ok(SessionEnd::PeerClosed) => {
                    info!(%endpoint, "feed closed by peer, reconnecting");
                }
                Err(err) => match self.config.on_read_error {
                    ReadErrorPolicy::Stop => {
                        error!(%endpoint, error = %err, "feed read failed, stopping");
                        return Err(err);
                    }
                    ReadErrorPolicy::Reconnect => {
                        warn!(%endpoint, error = %err, "feed read failed, reconnecting");
                        if !self.pause(&cancel).await {
                            return Ok(());
                        }
                    }
                },
            }
        }
    }

    /// Read records from one open stream until it ends.
    pub async fn session<R>(&self, stream: R, cancel: &CancellationToken) -> Result<SessionEnd>
    where
        R: AsyncRead + Unpin,
    {
        match self.feed {
            Feed::PipeMessages => {
                let mut frames = FramedRead::new(stream, FrameCodec::new());
                loop {
                    let next = tokio::select! {
                        _ = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
                        next = frames.next() => next,
                    };
                    match next {
                        None => return Ok(SessionEnd::PeerClosed),
                        Some(Ok(frame)) => self.handle_frame(&frame),
                        Some(Err(FrameError::Truncated { len })) => {
                            warn!(endpoint = %self.endpoint, len, "dropping partial frame");
                        }
                        Some(Err(err)) => return Err(err.into()),
                    }
                }
            }
            Feed::SimText { .. } | Feed::TcpHexLines => {
                let codec = LineCodec::new(self.config.max_line_length);
                let mut lines = FramedRead::new(stream, codec);
                loop {
                    let next = tokio::select! {
                        _ = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
                        next = lines.next() => next,
                    };
                    match next {
                        None => return Ok(SessionEnd::PeerClosed),
                        Some(Ok(Record::Line(line))) => self.handle_line(&line),
                        Some(Ok(Record::Malformed(reason))) => {
                            warn!(endpoint = %self.endpoint, %reason, "dropping record");
                        }
                        Some(Err(err)) => return Err(err.into()),
                    }
                }
            }
        }
    }

    fn handle_line(&self, line: &str) {
        match self.feed {
            Feed::SimText { include_telemetry } => {
                let scope = if include_telemetry {
                    LineScope::All
                } else {
                    LineScope::SpoolOnly
                };
                match self
                    .telemetry
                    .ingest_line(line, &self.config.delimiter, scope)
                {
                    Ok(report) => trace!(
                        telemetry = report.telemetry_fields,
                        spool = report.spool_fields,
                        "row applied"
                    ),
                    Err(err @ LineError::TooFewTokens { .. }) => trace!(error = %err, "row skipped"),
                    Err(err) => warn!(endpoint = %self.endpoint, error = %err, "dropping row"),
                }
            }
            Feed::TcpHexLines => {
                if line.trim().is_empty() {
                    return;
                }
                match decode_hex_frame(line) {
                    Ok(frame) => self.handle_frame(&frame),
                    Err(err) => warn!(endpoint = %self.endpoint, error = %err, "dropping reading"),
                }
            }
            Feed::PipeMessages => {}
        }
    }

    fn handle_frame(&self, frame: &Frame) {
        if let Some(metric) = self.telemetry.ingest_frame(frame) {
            debug!(metric = metric.name(), value = frame.value, "reading applied");
        }
    }

    /// Sleep the backoff; `false` when cancelled meanwhile.
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config.backoff) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use extrulink_frame::encode_command;
    use extrulink_telemetry::LiveEvent;
    use tokio::io::{AsyncWriteExt, ReadBuf};
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    use super::*;
    use crate::error::LinkError;

    const WAIT: Duration = Duration::from_secs(5);

    fn quick() -> InboundConfig {
        InboundConfig {
            backoff: Duration::from_millis(20),
            ..InboundConfig::default()
        }
    }

    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
        }
    }

    #[tokio::test]
    async fn sim_session_applies_rows_and_skips_bad_ones() {
        let telemetry = Arc::new(Telemetry::default());
        let mut events = telemetry.events().subscribe();
        let feed = InboundLoop::new(
            Endpoint::named_pipe("/tmp/unused"),
            Feed::SimText {
                include_telemetry: true,
            },
            telemetry.clone(),
        );

        let input: &[u8] = b"Invalid data\n\
            noon | 1 | 2\n\
            12:00:00.000 | 1.0 | 2.5 | 50 | 100 | 1.7 | 201.1 | 0 | 50 | 2 | 50 | 100\n";
        let end = feed.session(input, &CancellationToken::new()).await.unwrap();
        assert_eq!(end, SessionEnd::PeerClosed);

        let dataset = telemetry.store().dataset();
        assert_eq!(dataset.diameter.value, 1.7);
        assert_eq!(dataset.temperature.value, 201.1);
        assert!(matches!(events.try_recv(), Ok(LiveEvent::Line { .. })));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn spool_only_feed_keeps_live_metrics_untouched() {
        let telemetry = Arc::new(Telemetry::default());
        let feed = InboundLoop::new(
            Endpoint::named_pipe("/tmp/unused"),
            Feed::SimText {
                include_telemetry: false,
            },
            telemetry.clone(),
        );

        let input: &[u8] = b"12:00:00.000|1|2|3|4|5|6|7|30|1.75|9|150\n";
        feed.session(input, &CancellationToken::new()).await.unwrap();
        assert_eq!(telemetry.store().dataset().diameter.value, 0.0);
        assert_eq!(telemetry.store().current_spool().filament_mass.value, 150.0);
    }

    #[tokio::test]
    async fn pipe_session_reverses_frames() {
        let telemetry = Arc::new(Telemetry::default());
        let feed = InboundLoop::new(
            Endpoint::named_pipe("/tmp/unused"),
            Feed::PipeMessages,
            telemetry.clone(),
        );

        let mut input = Vec::new();
        input.extend_from_slice(&encode_command(0x02, 205));
        input.extend_from_slice(&encode_command(0x7f, 1));
        input.extend_from_slice(&encode_command(0x03, 40));
        input.extend_from_slice(&[0x01, 0x02, 0x03]);

        let end = feed
            .session(input.as_slice(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(end, SessionEnd::PeerClosed);

        let dataset = telemetry.store().dataset();
        assert_eq!(dataset.temperature.value, 205.0);
        assert_eq!(dataset.spooler_rpm.value, 40.0);
        assert_eq!(dataset.diameter.value, 0.0);
    }

    #[tokio::test]
    async fn hex_session_drops_bad_readings() {
        let telemetry = Arc::new(Telemetry::default());
        let feed = InboundLoop::new(
            Endpoint::tcp("127.0.0.1:1"),
            Feed::TcpHexLines,
            telemetry.clone(),
        );

        let input: &[u8] = b"zz\n\n0100\n0400000000000064\r\n";
        feed.session(input, &CancellationToken::new()).await.unwrap();
        assert_eq!(telemetry.store().dataset().screw_rpm.value, 100.0);
        assert_eq!(telemetry.store().dataset().diameter.value, 0.0);
    }

    #[tokio::test]
    async fn read_error_is_surfaced() {
        let feed = InboundLoop::new(
            Endpoint::tcp("127.0.0.1:1"),
            Feed::TcpHexLines,
            Arc::new(Telemetry::default()),
        );
        let err = feed
            .session(BrokenReader, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Io(_)));
    }

    #[tokio::test]
    async fn invalid_utf8_row_is_dropped_and_later_rows_apply() {
        let telemetry = Arc::new(Telemetry::default());
        let feed = InboundLoop::new(
            Endpoint::named_pipe("/tmp/unused"),
            Feed::SimText {
                include_telemetry: true,
            },
            telemetry.clone(),
        );

        let input: &[u8] = b"12:00:00.000|0|0|0|0|\xff|0|0\n\
            12:00:01.000|0|0|0|0|1.7|201.1|0\n";
        let end = feed.session(input, &CancellationToken::new()).await.unwrap();
        assert_eq!(end, SessionEnd::PeerClosed);

        let dataset = telemetry.store().dataset();
        assert_eq!(dataset.diameter.value, 1.7);
        assert_eq!(dataset.temperature.value, 201.1);
    }

    #[tokio::test]
    async fn overlong_row_is_dropped_and_later_rows_apply() {
        let telemetry = Arc::new(Telemetry::default());
        let feed = InboundLoop::new(Endpoint::tcp("127.0.0.1:1"), Feed::TcpHexLines, telemetry.clone())
            .with_config(InboundConfig {
                max_line_length: 32,
                ..InboundConfig::default()
            });

        let mut input = vec![b'0'; 1000];
        input.extend_from_slice(b"\n0400000000000064\n");
        let end = feed
            .session(input.as_slice(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(end, SessionEnd::PeerClosed);
        assert_eq!(telemetry.store().dataset().screw_rpm.value, 100.0);
    }

    #[tokio::test]
    async fn tcp_feed_reconnects_after_clean_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (mut first, _) = listener.accept().await.unwrap();
            first.write_all(b"0100000000000002\n").await.unwrap();
            drop(first);
            let (mut second, _) = listener.accept().await.unwrap();
            second.write_all(b"02000000000000c8\n").await.unwrap();
            second
        });

        let telemetry = Arc::new(Telemetry::default());
        let mut events = telemetry.events().subscribe();
        let cancel = CancellationToken::new();
        let feed = InboundLoop::new(Endpoint::tcp(address), Feed::TcpHexLines, telemetry.clone())
            .with_config(quick());
        let task = tokio::spawn(feed.run(cancel.clone()));

        for _ in 0..2 {
            timeout(WAIT, events.recv()).await.unwrap().unwrap();
        }
        assert_eq!(telemetry.store().dataset().diameter.value, 2.0);
        assert_eq!(telemetry.store().dataset().temperature.value, 200.0);

        cancel.cancel();
        timeout(WAIT, task).await.unwrap().unwrap().unwrap();
        drop(server.await.unwrap());
    }

    #[tokio::test]
    async fn stop_policy_returns_read_error() {
        let feed = InboundLoop::new(
            Endpoint::tcp("127.0.0.1:1"),
            Feed::TcpHexLines,
            Arc::new(Telemetry::default()),
        )
        .with_config(InboundConfig {
            on_read_error: ReadErrorPolicy::Stop,
            ..quick()
        });

        let opens = AtomicUsize::new(0);
        let result = timeout(
            WAIT,
            feed.run_with(CancellationToken::new(), || {
                opens.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, io::Error>(BrokenReader) }
            }),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(LinkError::Io(_))));
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconnect_policy_reopens_after_read_error() {
        let feed = InboundLoop::new(
            Endpoint::tcp("127.0.0.1:1"),
            Feed::TcpHexLines,
            Arc::new(Telemetry::default()),
        )
        .with_config(quick());

        let cancel = CancellationToken::new();
        let opens = AtomicUsize::new(0);
        let result = timeout(
            WAIT,
            feed.run_with(cancel.clone(), || {
                if opens.fetch_add(1, Ordering::SeqCst) == 2 {
                    cancel.cancel();
                }
                async { Ok::<_, io::Error>(BrokenReader) }
            }),
        )
        .await
        .unwrap();
        assert!(result.is_ok());
        assert_eq!(opens.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancel_interrupts_retry_backoff() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let feed = InboundLoop::new(
            Endpoint::tcp(address),
            Feed::TcpHexLines,
            Arc::new(Telemetry::default()),
        )
        .with_config(InboundConfig {
            backoff: Duration::from_secs(3600),
            ..InboundConfig::default()
        });

        let cancel = CancellationToken::new();
        let task = tokio::spawn(feed.run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        timeout(WAIT, task).await.unwrap().unwrap().unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fifo_feed_receives_controller_frames() {
        use extrulink_transport::create_fifo;
        use tokio::net::unix::pipe;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msgFromSim");
        create_fifo(&path, 0o600).unwrap();

        let telemetry = Arc::new(Telemetry::default());
        let mut events = telemetry.events().subscribe();
        let cancel = CancellationToken::new();
        let feed = InboundLoop::new(
            Endpoint::named_pipe(&path),
            Feed::PipeMessages,
            telemetry.clone(),
        )
        .with_config(quick());
        let task = tokio::spawn(feed.run(cancel.clone()));

        let mut tx = None;
        for _ in 0..250 {
            match pipe::OpenOptions::new().open_sender(&path) {
                Ok(sender) => {
                    tx = Some(sender);
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }
        let mut tx = tx.expect("feed should open the fifo for reading");
        tx.write_all(&encode_command(0x06, 1)).await.unwrap();

        let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
        assert!(matches!(event, LiveEvent::Message { id: 0x06, value: 1, .. }));
        assert_eq!(telemetry.store().dataset().contact_switch.value, 1.0);

        drop(tx);
        cancel.cancel();
        timeout(WAIT, task).await.unwrap().unwrap().unwrap();
    }
}

// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Blocking iterator over an asynchronous chat stream
//!
//! Each stream gets one worker thread that owns a current-thread runtime for
//! the lifetime of that stream. The worker performs the request, decodes SSE
//! frames and hands every chunk over a channel of capacity one as soon as it
//! is parsed. Closing the channel is the completion signal; a worker failure
//! is delivered just before it and surfaced after the last chunk.
//!
//! Dropping a [`ChunkStream`] early cancels the in-flight request and joins
//! the worker, so no thread outlives the stream.

use std::{
    ops::ControlFlow,
    sync::Arc,
    thread::{self, JoinHandle},
};

use tokio::{runtime, sync::mpsc, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::{
    client::{build_http_client, send_paid},
    config::LlmConfig,
    error::{LlmError, LlmResult},
    payment::PaymentSigner,
    sse::{SseDecoder, SseFrame},
    types::{ChatRequest, StreamChunk},
};

/// Everything the worker needs to run one stream
#[derive(Debug)]
pub(crate) struct StreamJob {
    pub(crate) config: Arc<LlmConfig>,
    pub(crate) url: Url,
    pub(crate) signer: Option<Arc<dyn PaymentSigner>>,
    pub(crate) request: ChatRequest,
}

#[derive(Debug)]
enum WorkerMessage {
    Chunk(StreamChunk),
    Failed(LlmError),
}

/// Chunks of a streamed chat, in arrival order
///
/// Yields `Ok` for every chunk and, if the exchange failed, one final `Err`
/// carrying the original failure. Iteration ends at the `[DONE]` marker or
/// when the server ends the stream, so frames after the one marked
/// [`is_final`](StreamChunk::is_final), such as usage, are still delivered.
#[derive(Debug)]
pub struct ChunkStream {
    receiver: mpsc::Receiver<WorkerMessage>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
    pending_error: Option<LlmError>,
    finished: bool,
}

impl ChunkStream {
    pub(crate) fn spawn(job: StreamJob) -> LlmResult<Self> {
        let (sender, receiver) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let worker = thread::Builder::new()
            .name("llm-stream".to_string())
            .spawn(move || run_worker(&job, &sender, &worker_cancel))?;

        Ok(Self {
            receiver,
            cancel,
            worker: Some(worker),
            pending_error: None,
            finished: false,
        })
    }

    /// Whether the worker thread has been joined
    pub fn is_finished(&self) -> bool {
        self.worker.is_none()
    }

    /// Cancel the worker and wait for it to exit
    fn shutdown(&mut self) -> Option<LlmError> {
        self.finished = true;
        self.cancel.cancel();
        self.receiver.close();

        let worker = self.worker.take()?;
        match worker.join() {
            Ok(()) => None,
            Err(_) => Some(LlmError::WorkerPanicked),
        }
    }
}

impl Iterator for ChunkStream {
    type Item = LlmResult<StreamChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            match self.receiver.blocking_recv() {
                Some(WorkerMessage::Chunk(chunk)) => return Some(Ok(chunk)),
                Some(WorkerMessage::Failed(error)) => self.pending_error = Some(error),
                None => {
                    let panicked = self.shutdown();
                    return self.pending_error.take().or(panicked).map(Err);
                }
            }
        }
    }
}

impl Drop for ChunkStream {
    fn drop(&mut self) {
        if self.worker.is_some() {
            debug!("Chunk stream dropped before completion, cancelling worker");
            self.shutdown();
        }
    }
}

fn run_worker(
    job: &StreamJob,
    sender: &mpsc::Sender<WorkerMessage>,
    cancel: &CancellationToken,
) {
    let runtime = match runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let _ = sender.blocking_send(WorkerMessage::Failed(error.into()));
            return;
        }
    };

    runtime.block_on(async {
        tokio::select! {
            () = cancel.cancelled() => debug!("Chat stream cancelled"),
            result = pump(job, sender) => {
                if let Err(error) = result {
                    warn!(%error, "Chat stream failed");
                    let _ = sender.send(WorkerMessage::Failed(error)).await;
                }
            }
        }
    });
}

/// Perform the exchange and forward chunks until the stream ends
async fn pump(job: &StreamJob, sender: &mpsc::Sender<WorkerMessage>) -> LlmResult<()> {
    let http = build_http_client(&job.config, false)?;
    let settlement = job
        .request
        .settlement_mode
        .unwrap_or(job.config.settlement_mode);
    let payload = job.request.payload(true);

    let handshake = send_paid(
        &http,
        &job.config,
        job.signer.as_deref(),
        job.url.clone(),
        &payload,
        settlement,
    );
    let mut response = timeout(job.config.timeout(), handshake)
        .await
        .map_err(|_| LlmError::StreamProtocol {
            status: None,
            message: format!(
                "no response headers within {} seconds",
                job.config.timeout_seconds
            ),
        })??;

    let mut decoder = SseDecoder::new();
    let mut forwarded = 0_usize;
    let idle = job.config.timeout();
    loop {
        let read = timeout(idle, response.chunk())
            .await
            .map_err(|_| LlmError::StreamProtocol {
                status: None,
                message: format!(
                    "no stream data within {} seconds",
                    job.config.timeout_seconds
                ),
            })??;
        let Some(bytes) = read else {
            break;
        };
        for frame in decoder.push(&bytes) {
            if forward(frame, sender, &mut forwarded).await.is_break() {
                debug!(forwarded, skipped = decoder.skipped(), "Chat stream complete");
                return Ok(());
            }
        }
    }
    if let Some(frame) = decoder.finish() {
        let _ = forward(frame, sender, &mut forwarded).await;
    }

    debug!(forwarded, skipped = decoder.skipped(), "Chat stream body ended");
    Ok(())
}

/// Hand one frame to the consumer; `Break` at the end marker or once the
/// consumer is gone
async fn forward(
    frame: SseFrame,
    sender: &mpsc::Sender<WorkerMessage>,
    forwarded: &mut usize,
) -> ControlFlow<()> {
    let SseFrame::Chunk(chunk) = frame else {
        return ControlFlow::Break(());
    };
    if sender.send(WorkerMessage::Chunk(chunk)).await.is_err() {
        debug!("Chunk consumer went away");
        return ControlFlow::Break(());
    }
    *forwarded += 1;
    ControlFlow::Continue(())
}

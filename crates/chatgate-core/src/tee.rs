use std::convert::Infallible;

use bytes::Bytes;
use chatgate_protocol::chat::ChatRequest;
use chatgate_provider_core::{AuditRecord, ByteStream, SharedAuditSink};
use chatgate_transform::stream2nostream::StreamAccumulator;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

/// Per-stream bookkeeping carried into the tee task.
pub struct TeeContext {
    pub trace_id: String,
    pub provider: String,
    pub user_id: String,
    pub request: ChatRequest,
    pub audit: SharedAuditSink,
    pub deadline: Instant,
}

pub type ClientBody = mpsc::Receiver<Result<Bytes, Infallible>>;

/// Forwards upstream chunks to the client unchanged while reassembling the
/// answer. The audit record is written once, after upstream ends.
///
/// Each chunk is sent to the client before it reaches the accumulator. If the
/// client goes away, forwarding stops but upstream is still drained so the
/// record is as complete as the provider made it. The record is handed to the
/// sink before the client body is closed.
pub fn spawn_tee(upstream: ByteStream, ctx: TeeContext) -> ClientBody {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(run_tee(upstream, tx, ctx));
    rx
}

async fn run_tee(
    mut upstream: ByteStream,
    tx: mpsc::Sender<Result<Bytes, Infallible>>,
    ctx: TeeContext,
) {
    let mut accumulator = StreamAccumulator::new();
    let mut client_open = true;
    let mut truncated = false;

    loop {
        let item = match timeout_at(ctx.deadline, upstream.recv()).await {
            Ok(item) => item,
            Err(_) => {
                warn!(event = "stream_deadline", trace_id = %ctx.trace_id, provider = %ctx.provider);
                truncated = true;
                break;
            }
        };
        let chunk = match item {
            None => break,
            Some(Ok(chunk)) => chunk,
            Some(Err(failure)) => {
                warn!(
                    event = "upstream_read_failed",
                    trace_id = %ctx.trace_id,
                    provider = %ctx.provider,
                    error = %failure
                );
                truncated = true;
                break;
            }
        };

        if client_open {
            match timeout_at(ctx.deadline, tx.send(Ok(chunk.clone()))).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    info!(event = "client_disconnected", trace_id = %ctx.trace_id);
                    client_open = false;
                }
                Err(_) => {
                    warn!(event = "stream_deadline", trace_id = %ctx.trace_id, provider = %ctx.provider);
                    accumulator.push_bytes(&chunk);
                    truncated = true;
                    break;
                }
            }
        }
        accumulator.push_bytes(&chunk);
    }

    if accumulator.skipped() > 0 {
        warn!(
            event = "sse_payloads_skipped",
            trace_id = %ctx.trace_id,
            skipped = accumulator.skipped()
        );
    }
    let assembled = accumulator.finish(&ctx.request.model, truncated);
    info!(
        event = "stream_finished",
        trace_id = %ctx.trace_id,
        provider = %ctx.provider,
        truncated = assembled.truncated,
        client_open = client_open,
        chars = assembled.text.chars().count()
    );
    let record = AuditRecord::capture(
        ctx.user_id,
        ctx.request.model.clone(),
        &ctx.request,
        &assembled,
    );
    ctx.audit.record(record);
    // Client body ends only after the record is queued.
    drop(tx);
}

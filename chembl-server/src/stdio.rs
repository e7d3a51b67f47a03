//! Newline-delimited JSON-RPC over a byte stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::ServerResult;
use crate::protocol::SharedService;
use crate::scheduler::RequestScheduler;

const RESPONSE_BUFFER: usize = 64;

/// Serves requests read line by line from `reader`, writing one response per
/// line to `writer`.
///
/// Each request runs as its own task, so a slow invocation does not hold up
/// the ones behind it; responses are written in completion order. Reading
/// pauses while the scheduler has no free permit. Returns
/// after `reader` reaches end of input and every pending response is
/// written.
///
/// # Errors
///
/// Returns [`crate::ServerError::Io`] if reading or writing fails.
pub async fn serve<R, W>(
    service: SharedService,
    scheduler: RequestScheduler,
    reader: R,
    writer: W,
) -> ServerResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(RESPONSE_BUFFER);
    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        writer.shutdown().await
    });

    info!(limit = scheduler.limit().get(), "serving on stdio");
    let mut lines = BufReader::new(reader).lines();
    let mut read_result = Ok(());
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                read_result = Err(err);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let service = SharedService::clone(&service);
        let tx = tx.clone();
        let spawned = scheduler
            .spawn(async move {
                if let Some(response) = service.handle_text(&line).await {
                    if tx.send(response.to_line()).await.is_err() {
                        debug!("response dropped, writer closed");
                    }
                }
            })
            .await;
        if let Err(err) = spawned {
            warn!(error = %err, "request not scheduled");
        }
    }
    drop(tx);

    let write_result = match writer_task.await {
        Ok(result) => result,
        Err(err) => Err(std::io::Error::other(err)),
    };
    info!("stdio input closed");
    read_result?;
    write_result?;
    Ok(())
}

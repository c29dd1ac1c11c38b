//! Cancellable streaming of blob contents.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Transfer cancelled after {copied} bytes")]
    Cancelled { copied: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Copy `reader` into `writer` until EOF or until `cancel` fires.
///
/// Returns the number of bytes written. On cancellation the writer is left
/// with whatever was copied so far; cleaning up the destination is the
/// caller's job.
pub async fn copy_with_cancel<R, W>(
    reader: &mut R,
    writer: &mut W,
    cancel: &CancellationToken,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut copied: u64 = 0;

    loop {
        let n = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransferError::Cancelled { copied }),
            n = reader.read(&mut buf) => n?,
        };
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        copied += n as u64;
    }

    writer.flush().await?;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copies_everything() {
        let data = vec![7u8; CHUNK_SIZE * 2 + 13];
        let mut reader = data.as_slice();
        let mut out: Vec<u8> = Vec::new();
        let token = CancellationToken::new();

        let n = copy_with_cancel(&mut reader, &mut out, &token).await.unwrap();
        assert_eq!(n, data.len() as u64);
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_transfer() {
        let token = CancellationToken::new();
        token.cancel();

        // A reader that never finishes: only cancellation can end the copy.
        let (_keep_open, mut reader) = tokio::io::duplex(16);
        let mut out: Vec<u8> = Vec::new();

        let err = copy_with_cancel(&mut reader, &mut out, &token)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Cancelled { copied: 0 }));
        assert!(out.is_empty());
    }
}

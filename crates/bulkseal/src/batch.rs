//! Line-oriented batch processing: one item per input line, one JSON record
//! per output line, output in input order.

use std::future::Future;
use std::str::FromStr;

use anyhow::{Context, Result};
use common::protocol::BatchSummary;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::bulk::BulkError;
use crate::service::BulkSealer;

/// Which direction a batch runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Plaintext lines in, envelopes out.
    Encrypt,
    /// Envelope lines in, plaintext out.
    Decrypt,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "encrypt" => Ok(Mode::Encrypt),
            "decrypt" => Ok(Mode::Decrypt),
            other => anyhow::bail!("unknown mode {other:?}: expected \"encrypt\" or \"decrypt\""),
        }
    }
}

/// Read every line of `reader` as one item. Empty lines are kept as (empty)
/// items so that output indices match input line numbers.
///
/// # Errors
///
/// Returns an error if reading fails or a line is not UTF-8.
pub async fn read_items<R>(reader: R) -> Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut items = Vec::new();
    while let Some(line) = lines.next_line().await.context("failed to read input line")? {
        items.push(line);
    }
    Ok(items)
}

/// Like [`read_items`], but gives up as soon as `interrupt` resolves.
///
/// Lines arriving after the interrupt are never read, and no batch is run
/// for a partially read input.
///
/// # Errors
///
/// Returns an error if reading fails or `interrupt` resolves before EOF.
pub async fn read_items_until<R, I>(reader: R, interrupt: I) -> Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = ()>,
{
    tokio::select! {
        items = read_items(reader) => items,
        () = interrupt => anyhow::bail!("interrupted while reading input; no items were processed"),
    }
}

/// Turn a batch with cancelled items into an error so the process exits
/// non-zero. Records for every item have already been written.
///
/// # Errors
///
/// Returns an error if any item was skipped by cancellation.
pub fn ensure_complete(summary: &BatchSummary) -> Result<()> {
    if !summary.is_complete() {
        anyhow::bail!(
            "batch interrupted: {} of {} items were cancelled",
            summary.cancelled,
            summary.total
        );
    }
    Ok(())
}

/// Process `items` in `mode` and write one JSON record per item to `out`.
///
/// Per-item failures are written as records, not returned as errors.
///
/// # Errors
///
/// Returns an error if the worker task fails or writing to `out` fails.
pub async fn run_batch<W>(
    sealer: &BulkSealer,
    mode: Mode,
    items: Vec<String>,
    out: &mut W,
) -> Result<BatchSummary>
where
    W: AsyncWrite + Unpin,
{
    let mut summary = BatchSummary::default();
    match mode {
        Mode::Encrypt => {
            for (index, r) in sealer.encrypt_all_async(items).await?.iter().enumerate() {
                summary.record(r.error.as_ref().map(BulkError::kind));
                write_record(out, &r.to_record(index)).await?;
            }
        }
        Mode::Decrypt => {
            for (index, r) in sealer.decrypt_all_async(items).await?.iter().enumerate() {
                summary.record(r.error.as_ref().map(BulkError::kind));
                write_record(out, &r.to_record(index)).await?;
            }
        }
    }
    out.flush().await.context("failed to flush output")?;

    info!(
        ?mode,
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        retryable = summary.retryable,
        cancelled = summary.cancelled,
        "batch complete"
    );
    Ok(summary)
}

async fn write_record<W, T>(out: &mut W, record: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(record).context("failed to serialise record")?;
    line.push(b'\n');
    out.write_all(&line).await.context("failed to write record")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::SealerOptions;
    use common::protocol::{DecryptRecord, EncryptRecord};
    use common::FailureKind;
    use tokio_util::sync::CancellationToken;

    fn parse_lines<T: serde::de::DeserializeOwned>(buf: &[u8]) -> Vec<T> {
        std::str::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("encrypt".parse::<Mode>().unwrap(), Mode::Encrypt);
        assert_eq!("decrypt".parse::<Mode>().unwrap(), Mode::Decrypt);
        assert!("rotate".parse::<Mode>().is_err());
    }

    #[tokio::test]
    async fn read_items_keeps_empty_lines() {
        let input: &[u8] = b"a\n\nhello world\n";
        let items = read_items(input).await.unwrap();
        assert_eq!(items, vec!["a", "", "hello world"]);
    }

    #[tokio::test]
    async fn interrupt_during_read_stops_reading() {
        // The writer half stays open, so the reader never sees EOF.
        let (mut tx, rx) = tokio::io::duplex(64);
        tx.write_all(b"a\nhello world\n").await.unwrap();

        let err = read_items_until(tokio::io::BufReader::new(rx), async {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("interrupted"));

        // Input that arrives later is never read.
        let _ = tx.write_all(b"late\n").await;
    }

    #[tokio::test]
    async fn read_completes_without_interrupt() {
        let input: &[u8] = b"a\nb\n";
        let items = read_items_until(input, std::future::pending())
            .await
            .unwrap();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn cancelled_batch_is_not_complete() {
        let token = CancellationToken::new();
        token.cancel();
        let sealer = BulkSealer::from_secret(
            "secret-key",
            SealerOptions {
                concurrency_limit: 2,
                cancel: Some(token),
            },
        );

        let mut out = Vec::new();
        let summary = run_batch(&sealer, Mode::Encrypt, vec!["a".into(), "b".into()], &mut out)
            .await
            .unwrap();
        assert_eq!(summary.cancelled, 2);
        assert_eq!(summary.retryable, 2);

        // Records are still written for every item before the error.
        let records: Vec<EncryptRecord> = parse_lines(&out);
        assert_eq!(records.len(), 2);
        assert!(ensure_complete(&summary).is_err());
    }

    #[tokio::test]
    async fn item_failures_alone_still_complete() {
        let sealer = BulkSealer::from_secret("secret-key", SealerOptions::default());
        let mut out = Vec::new();
        let summary = run_batch(&sealer, Mode::Encrypt, vec![String::new()], &mut out)
            .await
            .unwrap();
        assert_eq!(summary.failed, 1);
        assert!(ensure_complete(&summary).is_ok());
    }

    #[tokio::test]
    async fn encrypt_then_decrypt_through_records() {
        let sealer = BulkSealer::from_secret("secret-key", SealerOptions::default());
        let items = vec!["a".to_owned(), String::new(), "hello world".to_owned()];

        let mut out = Vec::new();
        let summary = run_batch(&sealer, Mode::Encrypt, items, &mut out)
            .await
            .unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.failed, 1);

        let records: Vec<EncryptRecord> = parse_lines(&out);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].error.as_ref().unwrap().code, FailureKind::EmptyInput);

        let envelopes: Vec<String> = records
            .iter()
            .map(|r| r.encrypted.clone().unwrap_or_default())
            .collect();
        let mut out = Vec::new();
        run_batch(&sealer, Mode::Decrypt, envelopes, &mut out)
            .await
            .unwrap();

        let records: Vec<DecryptRecord> = parse_lines(&out);
        assert_eq!(records[0].decrypted.as_deref(), Some("a"));
        assert_eq!(records[2].decrypted.as_deref(), Some("hello world"));
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.index, i);
        }
    }

    #[tokio::test]
    async fn wrong_key_reports_generic_decrypt_failure() {
        let writer = BulkSealer::from_secret("secret-key", SealerOptions::default());
        let reader = BulkSealer::from_secret("other-key", SealerOptions::default());
        let envelope = writer.encrypt_all(&["payload"]).remove(0).encrypted;

        let mut out = Vec::new();
        run_batch(&reader, Mode::Decrypt, vec![envelope, "@@".into()], &mut out)
            .await
            .unwrap();

        let records: Vec<DecryptRecord> = parse_lines(&out);
        let forged = records[0].error.clone().unwrap();
        let malformed = records[1].error.clone().unwrap();
        assert_eq!(forged, malformed);
        assert_eq!(forged.code, FailureKind::DecryptFailed);
    }
}

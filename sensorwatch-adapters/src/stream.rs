//! Byte stream transport.
//!
//! Carries one payload per line over any tokio reader or writer. Pointing a
//! [`LinePublisher`] at stdout and a [`LineSubscriber`] at stdin lets two
//! processes talk through a shell pipe without a broker.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{AdapterError, Delivery, Publisher, Subscriber};

/// A subscriber that reads newline-delimited payloads from an async reader.
///
/// Blank lines are skipped. End of input ends the subscription.
#[derive(Debug)]
pub struct LineSubscriber<R> {
    reader: BufReader<R>,
    topic: String,
    description: String,
    line: String,
    finished: bool,
}

impl<R> LineSubscriber<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Read payloads from `reader`, labelling each delivery with `topic`.
    pub fn new(reader: R, topic: &str, description: &str) -> Self {
        Self {
            reader: BufReader::new(reader),
            topic: topic.to_string(),
            description: format!("stream: {}", description),
            line: String::new(),
            finished: false,
        }
    }
}

#[async_trait]
impl<R> Subscriber for LineSubscriber<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn recv(&mut self) -> Option<Result<Delivery, AdapterError>> {
        while !self.finished {
            self.line.clear();
            match self.reader.read_line(&mut self.line).await {
                Ok(0) => {
                    self.finished = true;
                }
                Ok(_) => {
                    let payload = self.line.trim();
                    if payload.is_empty() {
                        continue;
                    }
                    return Some(Ok(Delivery::new(
                        self.topic.clone(),
                        payload.as_bytes().to_vec(),
                    )));
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(AdapterError::Io(e)));
                }
            }
        }
        None
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        self.finished = true;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// A publisher that writes one payload per line to an async writer.
///
/// Topics and keys are not represented on the wire.
#[derive(Debug)]
pub struct LinePublisher<W> {
    writer: W,
    description: String,
}

impl<W> LinePublisher<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Write payloads to `writer`.
    pub fn new(writer: W, description: &str) -> Self {
        Self {
            writer,
            description: format!("stream: {}", description),
        }
    }

    /// Take back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> Publisher for LinePublisher<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish(
        &mut self,
        _topic: &str,
        _key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), AdapterError> {
        if payload.contains(&b'\n') {
            return Err(AdapterError::Publish(
                "payload contains a line break".to_string(),
            ));
        }
        self.writer.write_all(payload).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        self.writer.flush().await?;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

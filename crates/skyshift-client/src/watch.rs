//! Reconnecting watch stream: wraps the ndjson body of a `?watch=true`
//! request and, on any connection error or a server-initiated close,
//! backs off and reconnects rather than ending the stream outright, per
//! the source's `Watcher.watch()` generator (`watcher.py`) and §4.4/§5's
//! "fixed backoff (3s default)... after a configurable retry limit the
//! iterator terminates."

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;

use skyshift_types::WatchEvent;

use crate::{extract_detail, BodySnafu, Client, ClientError, RequestSnafu};
use snafu::ResultExt;

/// The fixed reconnect delay after a dropped watch connection (§4.4, §5).
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(3);

/// How many consecutive reconnect failures a [`Watch`] tolerates before it
/// gives up and ends the stream (§4.4: "after a configurable retry limit
/// the iterator terminates").
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

enum State {
    Idle { failures: u32 },
    Streaming { chunks: ByteStream, buf: String },
    Exhausted,
}

async fn connect(client: &Client, url: &str) -> Result<reqwest::Response, ClientError> {
    let builder = client.authed(client.http_get(url));
    let response = builder.send().await.context(RequestSnafu { url: url.to_string() })?;
    if !response.status().is_success() {
        let status = response.status();
        let bytes = response.bytes().await.context(BodySnafu { url: url.to_string() })?;
        return Err(ClientError::Api { status, detail: extract_detail(&bytes) });
    }
    Ok(response)
}

struct Ctx<'a> {
    client: &'a Client,
    url: &'a str,
    backoff: Duration,
    retry_limit: u32,
}

async fn step<T>(ctx: &Ctx<'_>, mut state: State) -> Option<(Result<WatchEvent<T>, ClientError>, State)>
where
    T: DeserializeOwned,
{
    loop {
        state = match state {
            State::Exhausted => return None,
            State::Idle { failures } => match connect(ctx.client, ctx.url).await {
                Ok(response) => State::Streaming { chunks: response.bytes_stream().boxed(), buf: String::new() },
                Err(error) => {
                    if failures >= ctx.retry_limit {
                        tracing::error!(url = %ctx.url, %error, "watch retry limit exceeded, giving up");
                        return None;
                    }
                    tracing::warn!(url = %ctx.url, %error, attempt = failures + 1, "watch connection failed, retrying");
                    tokio::time::sleep(ctx.backoff).await;
                    State::Idle { failures: failures + 1 }
                }
            },
            State::Streaming { mut chunks, mut buf } => {
                if let Some(pos) = buf.find('\n') {
                    let line: String = buf.drain(..=pos).collect();
                    let line = line.trim_end();
                    if line.is_empty() {
                        State::Streaming { chunks, buf }
                    } else {
                        let event = serde_json::from_str::<WatchEvent<T>>(line).context(crate::DecodeSnafu);
                        return Some((event, State::Streaming { chunks, buf }));
                    }
                } else {
                    match chunks.next().await {
                        Some(Ok(bytes)) => {
                            buf.push_str(&String::from_utf8_lossy(&bytes));
                            State::Streaming { chunks, buf }
                        }
                        Some(Err(error)) => {
                            tracing::warn!(url = %ctx.url, %error, "watch stream errored, reconnecting");
                            State::Idle { failures: 0 }
                        }
                        None => {
                            tracing::warn!(url = %ctx.url, "watch stream closed, reconnecting");
                            State::Idle { failures: 0 }
                        }
                    }
                }
            }
        };
    }
}

/// A reconnecting stream of `WatchEvent<T>`, returned by [`Client::watch`].
/// Terminates (yields `None`) once [`DEFAULT_RETRY_LIMIT`] consecutive
/// reconnect attempts have failed; a successful reconnect resets the
/// failure counter.
pub struct Watch<T> {
    inner: Pin<Box<dyn Stream<Item = Result<WatchEvent<T>, ClientError>> + Send>>,
}

impl<T> Watch<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub(crate) fn new(client: Client, url: String) -> Self {
        Self::with_backoff(client, url, DEFAULT_BACKOFF, DEFAULT_RETRY_LIMIT)
    }

    pub(crate) fn with_backoff(client: Client, url: String, backoff: Duration, retry_limit: u32) -> Self {
        let inner = stream::unfold(State::Idle { failures: 0 }, move |state| {
            let client = client.clone();
            let url = url.clone();
            async move {
                let ctx = Ctx { client: &client, url: &url, backoff, retry_limit };
                step::<T>(&ctx, state).await
            }
        });
        Self { inner: Box::pin(inner) }
    }
}

impl<T> Stream for Watch<T> {
    type Item = Result<WatchEvent<T>, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> std::task::Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gives_up_after_retry_limit_is_exceeded() {
        let client = Client::new("http://127.0.0.1:1");
        let mut watch = Watch::<skyshift_types::Namespace>::with_backoff(
            client,
            "/namespaces?watch=true".to_string(),
            Duration::from_millis(1),
            2,
        );
        let mut failures = 0;
        while let Some(result) = watch.next().await {
            assert!(result.is_err());
            failures += 1;
        }
        assert_eq!(failures, 3);
    }
}

//! # fetch — the single quote request of a run
//!
//! One GET against the quote service with the comma-joined watch-list.  The
//! body is streamed until the first line break; that line is the payload.
//! There are no retries: a failure aborts the run and the operator re-runs.

use futures_util::StreamExt;
use tracing::{debug, info};

use crate::config::{Config, SYMBOLS_PLACEHOLDER};
use crate::error::QuoteError;

/// Substitute the batch lookup key into the endpoint template.
pub fn quote_url(template: &str, symbol_list: &str) -> String {
    template.replace(SYMBOLS_PLACEHOLDER, symbol_list)
}

/// Fetch the raw payload for `symbol_list`.
pub async fn fetch_payload(
    client: &reqwest::Client,
    config: &Config,
    symbol_list: &str,
) -> Result<String, QuoteError> {
    let url = quote_url(&config.quote_url, symbol_list);
    info!(url = %url, "Quote request sent — awaiting response...");

    let resp = client
        .get(&url)
        .timeout(config.http_timeout)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(QuoteError::Transport(format!("quote service answered HTTP {status}: {body}")));
    }
    info!(%status, "Quote response received");

    let mut body = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        match chunk.iter().position(|b| *b == b'\n') {
            Some(end) => {
                body.extend_from_slice(&chunk[..end]);
                break;
            }
            None => body.extend_from_slice(&chunk),
        }
    }

    let payload = first_line(&body)?;
    debug!(bytes = payload.len(), "Payload read");
    Ok(payload)
}

/// Decode the first line of `body`; an empty line is a transport failure.
fn first_line(body: &[u8]) -> Result<String, QuoteError> {
    let text = String::from_utf8_lossy(body);
    let line = text.lines().next().unwrap_or("").trim_end_matches('\r');
    if line.trim().is_empty() {
        return Err(QuoteError::Transport("quote service returned an empty body".into()));
    }
    Ok(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_url_substitutes_list() {
        let url = quote_url("https://quotes.example/csv?s={symbols}&f=sl1d", "MSFT,T,VFIAX");
        assert_eq!(url, "https://quotes.example/csv?s=MSFT,T,VFIAX&f=sl1d");
    }

    #[test]
    fn test_first_line_only() {
        assert_eq!(first_line(b"{\"query\":{}}\r\ntrailer").unwrap(), "{\"query\":{}}");
    }

    #[test]
    fn test_empty_body_is_transport_error() {
        assert!(matches!(first_line(b""), Err(QuoteError::Transport(_))));
        assert!(matches!(first_line(b"  \n{}"), Err(QuoteError::Transport(_))));
    }
}

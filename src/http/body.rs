use futures_util::StreamExt;

use crate::config::DEFAULT_MAX_RESPONSE_SIZE;

/// Reads at most `limit` bytes of the response body, truncating silently.
/// A limit of zero means the default cap.
///
/// On a stream error the bytes read so far are returned with the error, so the
/// caller can keep the status and whatever arrived.
pub(crate) async fn read_capped_body(
    response: reqwest::Response,
    limit: usize,
) -> (Vec<u8>, Option<reqwest::Error>) {
    let limit = if limit == 0 {
        DEFAULT_MAX_RESPONSE_SIZE
    } else {
        limit
    };
    let initial = response
        .content_length()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0)
        .min(limit);
    let mut body = Vec::with_capacity(initial);
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(err) => return (body, Some(err)),
        };
        let room = limit.saturating_sub(body.len());
        if bytes.len() >= room {
            if let Some(head) = bytes.get(..room) {
                body.extend_from_slice(head);
            }
            break;
        }
        body.extend_from_slice(&bytes);
    }
    (body, None)
}

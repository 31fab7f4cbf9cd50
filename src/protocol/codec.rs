use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use super::commands::Request;
use crate::error::Error;


/// Readiness prompt sent by the bridge after connecting.
pub const PROMPT: u8 = b'>';

/// End of every response: a newline followed by the next prompt.
pub const TERMINATOR: &[u8] = b"\n>";

/// Suffix of a successful response, stripped from the returned body.
pub const SUCCESS_MARKER: &str = "OK\r\n";

/// Line separator inside multi-line responses.
pub const LINE_SEPARATOR: &str = "\r\n";


/// A frame received from the bridge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RxFrame {
    /// The bare `>` readiness prompt.
    Prompt,

    /// A response body with the trailing `>` and `OK\r\n` removed.
    Response(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    AwaitingPrompt,
    AwaitingResponse,
}

/// Codec for one bridge transaction: prompt, then request line, then response.
///
/// The decoder first yields [`RxFrame::Prompt`], then one
/// [`RxFrame::Response`] per request sent.
#[derive(Debug)]
pub struct BridgeProtocolCodec {
    phase: Phase,
}

impl BridgeProtocolCodec {
    pub fn new() -> Self {
        Self { phase: Phase::AwaitingPrompt }
    }
}

impl Default for BridgeProtocolCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the ASCII response and strip the protocol framing.
fn response_body(raw: &[u8]) -> Result<String, Error> {
    let text = std::str::from_utf8(raw)
        .ok()
        .filter(|text| text.is_ascii())
        .ok_or_else(|| Error::Protocol(format!("response is not ASCII: {raw:x?}")))?;

    let body = if text.ends_with("\n>") { &text[..text.len() - 1] } else { text };
    let body = body.strip_suffix(SUCCESS_MARKER).unwrap_or(body);

    Ok(body.to_string())
}

impl Decoder for BridgeProtocolCodec {
    type Item = RxFrame;

    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.phase {
            Phase::AwaitingPrompt => {
                let Some(end) = src.iter().position(|&byte| byte == PROMPT) else {
                    return Ok(None);
                };

                let prompt = src.split_to(end + 1);
                if prompt[..] != [PROMPT] {
                    return Err(Error::Protocol(format!(
                        "prompt not found, got {:?}", String::from_utf8_lossy(&prompt)
                    )));
                }

                self.phase = Phase::AwaitingResponse;

                Ok(Some(RxFrame::Prompt))
            }

            Phase::AwaitingResponse => {
                let Some(idx) = src.windows(TERMINATOR.len()).position(|window| window == TERMINATOR) else {
                    return Ok(None);
                };

                let raw = src.split_to(idx + TERMINATOR.len());
                trace!(raw = %String::from_utf8_lossy(&raw).escape_debug(), "response frame");

                // the terminator doubles as the prompt for the next request,
                // so the codec stays in the response phase
                Ok(Some(RxFrame::Response(response_body(&raw)?)))
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None if buf.is_empty() => Ok(None),
            None => Err(Error::Protocol(format!(
                "connection closed with {} bytes of unterminated data", buf.len()
            ))),
        }
    }
}

impl Encoder<Request<'_>> for BridgeProtocolCodec {
    type Error = Error;

    fn encode(&mut self, request: Request<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = request.to_string();

        if !line.is_ascii() {
            return Err(Error::Validation(format!("request {line:?} is not ASCII")));
        }

        trace!(%line, "request frame");

        dst.reserve(line.len() + 1);
        dst.put(line.as_bytes());
        dst.put_u8(b'\n');

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    use super::*;

    #[tokio::test]
    async fn test_codec_decode() {
        let data = b"> IEF001 ON    021.0C 023.5C Med  Cool  OK - 0\r\nOK\r\n>";

        let mut fr = FramedRead::new(&data[..], BridgeProtocolCodec::new());

        assert_eq!(fr.next().await.unwrap().unwrap(), RxFrame::Prompt);
        assert_eq!(
            fr.next().await.unwrap().unwrap(),
            RxFrame::Response(" IEF001 ON    021.0C 023.5C Med  Cool  OK - 0\r\n".to_string())
        );
        assert!(fr.next().await.is_none());
    }

    #[tokio::test]
    async fn test_codec_decode_info() {
        let data = b">Unit: X\r\nVersion: 1.0\r\nOK\r\n>";

        let mut fr = FramedRead::new(&data[..], BridgeProtocolCodec::new());

        assert_eq!(fr.next().await.unwrap().unwrap(), RxFrame::Prompt);
        assert_eq!(
            fr.next().await.unwrap().unwrap(),
            RxFrame::Response("Unit: X\r\nVersion: 1.0\r\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_codec_failure_response_kept() {
        let data = b">Unsupported Feature\r\n>";

        let mut fr = FramedRead::new(&data[..], BridgeProtocolCodec::new());

        fr.next().await.unwrap().unwrap();
        assert_eq!(
            fr.next().await.unwrap().unwrap(),
            RxFrame::Response("Unsupported Feature\r\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_codec_bad_prompt() {
        let data = b"Welcome\r\n>";

        let mut fr = FramedRead::new(&data[..], BridgeProtocolCodec::new());

        let err = fr.next().await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Protocol(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_codec_unterminated_response() {
        let data = b">OK\r\n";

        let mut fr = FramedRead::new(&data[..], BridgeProtocolCodec::new());

        fr.next().await.unwrap().unwrap();
        let err = fr.next().await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Protocol(_)), "{err:?}");
    }

    #[test]
    fn test_codec_partial_reads() {
        let mut codec = BridgeProtocolCodec::new();
        let mut buf = BytesMut::new();

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.put(&b">a\r"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(RxFrame::Prompt));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.put(&b"\nOK\r"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.put(&b"\n>"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(RxFrame::Response("a\r\n".to_string())));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_codec_rejects_non_ascii() {
        let mut codec = BridgeProtocolCodec::new();
        let mut buf = BytesMut::from(&b">caf\xc3\xa9\r\n>"[..]);

        codec.decode(&mut buf).unwrap();
        assert!(matches!(codec.decode(&mut buf), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_codec_encode() {
        let mut codec = BridgeProtocolCodec::new();

        let mut buf = BytesMut::new();
        codec.encode(Request::ListUnit("L1.100"), &mut buf).expect("encode");
        assert_eq!(&buf[..], b"ls2 L1.100\n");

        let mut buf = BytesMut::new();
        let err = codec.encode(Request::SetFanSpeed { unit: "L1.100", speed: "r\u{e1}pido" }, &mut buf).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(buf.is_empty());
    }
}

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::errors::ProtocolError;
use super::frame::{
    Command, RespFrame, CRLF, NULL_LENGTH, PREFIX_ARRAY, PREFIX_BULK, PREFIX_ERROR,
    PREFIX_INTEGER, PREFIX_SIMPLE,
};

#[derive(Debug, Default)]
pub struct RespCodec;

impl RespCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for RespCodec {
    type Item = RespFrame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match parse_frame(&src[..])? {
            Some((frame, consumed)) => {
                src.advance(consumed);
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<Command> for RespCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put_u8(PREFIX_ARRAY);
        dst.put_slice(item.args.len().to_string().as_bytes());
        dst.put_slice(CRLF);

        for arg in &item.args {
            dst.put_u8(PREFIX_BULK);
            dst.put_slice(arg.len().to_string().as_bytes());
            dst.put_slice(CRLF);
            dst.put_slice(arg);
            dst.put_slice(CRLF);
        }

        Ok(())
    }
}

// ========================================
// PARSING
// ========================================

/// Parses one complete reply from the front of `buf`.
/// Returns `None` when more bytes are needed; nothing is consumed in that case.
fn parse_frame(buf: &[u8]) -> Result<Option<(RespFrame, usize)>, ProtocolError> {
    let Some(&prefix) = buf.first() else {
        return Ok(None);
    };
    let Some((line, line_len)) = read_line(&buf[1..]) else {
        return Ok(None);
    };
    let header_len = 1 + line_len;

    match prefix {
        PREFIX_SIMPLE => Ok(Some((RespFrame::Simple(lossy(line)), header_len))),
        PREFIX_ERROR => Ok(Some((RespFrame::Error(lossy(line)), header_len))),
        PREFIX_INTEGER => Ok(Some((RespFrame::Integer(parse_int(line)?), header_len))),
        PREFIX_BULK => {
            let len = parse_int(line)?;
            if len == NULL_LENGTH {
                return Ok(Some((RespFrame::Null, header_len)));
            }
            let len = usize::try_from(len).map_err(|_| ProtocolError::InvalidInteger(lossy(line)))?;
            let total = header_len + len + CRLF.len();
            if buf.len() < total {
                return Ok(None);
            }
            if &buf[header_len + len..total] != CRLF {
                return Err(ProtocolError::UnterminatedBulk(len));
            }
            let data = Bytes::copy_from_slice(&buf[header_len..header_len + len]);
            Ok(Some((RespFrame::Bulk(data), total)))
        }
        PREFIX_ARRAY => {
            let count = parse_int(line)?;
            if count == NULL_LENGTH {
                return Ok(Some((RespFrame::Null, header_len)));
            }
            let count =
                usize::try_from(count).map_err(|_| ProtocolError::InvalidInteger(lossy(line)))?;
            let mut items = Vec::with_capacity(count.min(1024));
            let mut pos = header_len;
            for _ in 0..count {
                match parse_frame(&buf[pos..])? {
                    Some((item, used)) => {
                        items.push(item);
                        pos += used;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((RespFrame::Array(items), pos)))
        }
        other => Err(ProtocolError::UnexpectedPrefix(other)),
    }
}

/// Returns the line content (without CRLF) and the number of bytes it spans including CRLF.
fn read_line(buf: &[u8]) -> Option<(&[u8], usize)> {
    buf.windows(2)
        .position(|w| w == CRLF)
        .map(|end| (&buf[..end], end + CRLF.len()))
}

fn parse_int(line: &[u8]) -> Result<i64, ProtocolError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ProtocolError::InvalidInteger(lossy(line)))
}

fn lossy(line: &[u8]) -> String {
    String::from_utf8_lossy(line).into_owned()
}

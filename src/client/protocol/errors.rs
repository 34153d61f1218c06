use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unexpected reply prefix byte 0x{0:02x}")]
    UnexpectedPrefix(u8),

    #[error("invalid length or integer line: {0:?}")]
    InvalidInteger(String),

    #[error("bulk string of {0} bytes is not terminated by CRLF")]
    UnterminatedBulk(usize),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

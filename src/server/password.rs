use bytes::Bytes;
use std::fmt;

// Once we have the password we don't want it to accidentally get printed or
// logged, so we wrap it in a type whose Debug implementation hides it.
#[derive(PartialEq, Eq, Clone)]
pub struct Password(Bytes);

impl Password {
    pub fn new<B: Into<Bytes>>(bytes: B) -> Self {
        Password(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

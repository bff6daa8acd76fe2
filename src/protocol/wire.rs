//! Byte-level cursors for the fixed-layout payloads.
//!
//! All integers on the wire are big-endian unsigned. Readers assume the
//! payload length was already validated against the message type's fixed
//! size; `decode` performs that check before constructing a `Reader`.

/// Sequential reader over a length-validated payload.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Take the next `N` bytes as a fixed array.
    pub(crate) fn array<const N: usize>(&mut self) -> [u8; N] {
        let (head, rest) = self.buf.split_at(N);
        self.buf = rest;
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        out
    }

    pub(crate) fn byte(&mut self) -> u8 {
        self.array::<1>()[0]
    }

    pub(crate) fn be_u32(&mut self) -> u32 {
        u32::from_be_bytes(self.array())
    }

    pub(crate) fn be_u64(&mut self) -> u64 {
        u64::from_be_bytes(self.array())
    }
}

/// Frame builder: header byte followed by the fixed payload.
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Start a frame of exactly `1 + payload_size` bytes.
    pub(crate) fn frame(header: u8, payload_size: usize) -> Self {
        let mut buf = Vec::with_capacity(1 + payload_size);
        buf.push(header);
        Self { buf }
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    pub(crate) fn be_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn be_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

//! Out-of-band stream attachments (embedded fonts, cover art, ...).

use std::fmt;

/// A named binary resource carried alongside a stream.
///
/// Attachments are queried on demand, never pushed; every enumeration hands
/// the caller an independently-owned snapshot (see
/// `DecoderHost::attachments` in `codecbridge-codecs`).
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Resource name, typically a file name.
    pub name: String,
    /// MIME type of the payload.
    pub mime: String,
    /// The resource bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data,
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_deep() {
        let a = Attachment::new("font.ttf", "font/ttf", vec![1, 2, 3]);
        let mut b = a.clone();
        b.data[0] = 99;
        assert_eq!(a.data, vec![1, 2, 3]);
    }
}

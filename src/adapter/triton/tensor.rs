//! BYTES tensor codec for the KServe v2 binary data extension.
//!
//! Each element is serialized as a 4-byte little-endian length followed by
//! that many raw bytes, elements back to back with no padding. Text is carried
//! as UTF-8 and decoded strictly, so a round trip never alters content.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

const LENGTH_PREFIX: usize = 4;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    #[error("tensor data truncated at byte {offset}: need {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    #[error("element {index} is not valid UTF-8: {reason}")]
    InvalidUtf8 { index: usize, reason: String },

    #[error("element {index} is {len} bytes, larger than a BYTES element can hold")]
    ElementTooLarge { index: usize, len: usize },
}

/// A column of byte strings, shape `[len, 1]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BytesTensor {
    elements: Vec<Bytes>,
}

impl BytesTensor {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let elements = texts
            .into_iter()
            .map(|text| Bytes::copy_from_slice(text.as_ref().as_bytes()))
            .collect();
        Self { elements }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Shape as sent to the server: one row per element, one column.
    #[must_use]
    pub fn shape(&self) -> [usize; 2] {
        [self.elements.len(), 1]
    }

    /// Size of [`Self::encode`]'s output.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.elements.iter().map(|e| LENGTH_PREFIX + e.len()).sum()
    }

    pub fn encode(&self) -> Result<Bytes, TensorError> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        for (index, element) in self.elements.iter().enumerate() {
            let len = u32::try_from(element.len()).map_err(|_| TensorError::ElementTooLarge {
                index,
                len: element.len(),
            })?;
            buf.put_u32_le(len);
            buf.put_slice(element);
        }
        Ok(buf.freeze())
    }

    pub fn decode(mut data: Bytes) -> Result<Self, TensorError> {
        let total = data.len();
        let mut elements = Vec::new();
        while data.has_remaining() {
            let offset = total - data.remaining();
            if data.remaining() < LENGTH_PREFIX {
                return Err(TensorError::Truncated {
                    offset,
                    needed: LENGTH_PREFIX - data.remaining(),
                });
            }
            let len = data.get_u32_le() as usize;
            if data.remaining() < len {
                return Err(TensorError::Truncated {
                    offset: offset + LENGTH_PREFIX,
                    needed: len - data.remaining(),
                });
            }
            elements.push(data.split_to(len));
        }
        Ok(Self { elements })
    }

    pub fn into_texts(self) -> Result<Vec<String>, TensorError> {
        self.elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                String::from_utf8(element.to_vec()).map_err(|e| TensorError::InvalidUtf8 {
                    index,
                    reason: e.utf8_error().to_string(),
                })
            })
            .collect()
    }
}

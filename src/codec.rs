//! Offset-based reader over account bytes
//!
//! Primitive values are decoded with `borsh`; this module only tracks the offset
//! so callers can decode at arbitrary positions of a shared buffer and learn where
//! the next value starts.

use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;

use crate::errors::{CoreError, Result};

/// Cursor over a shared account buffer
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at `offset`
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    /// Current offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left after the current offset
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Advance by `len` bytes without decoding them
    pub fn skip(&mut self, len: usize, what: &str) -> Result<()> {
        if len > self.remaining() {
            return Err(CoreError::decode(what, self.offset, "unexpected end of buffer"));
        }
        self.offset += len;
        Ok(())
    }

    /// Decode any borsh value at the current offset
    pub fn read<T: BorshDeserialize>(&mut self, what: &str) -> Result<T> {
        let start = self.offset;
        let mut slice = self
            .data
            .get(start..)
            .ok_or_else(|| CoreError::decode(what, start, "offset past end of buffer"))?;
        let before = slice.len();
        let value = T::deserialize(&mut slice).map_err(|e| CoreError::decode(what, start, e))?;
        self.offset += before - slice.len();
        Ok(value)
    }

    #[inline]
    pub fn read_u8(&mut self, what: &str) -> Result<u8> {
        self.read::<u8>(what)
    }

    #[inline]
    pub fn read_bool(&mut self, what: &str) -> Result<bool> {
        self.read::<bool>(what)
    }

    #[inline]
    pub fn read_u32(&mut self, what: &str) -> Result<u32> {
        self.read::<u32>(what)
    }

    #[inline]
    pub fn read_u64(&mut self, what: &str) -> Result<u64> {
        self.read::<u64>(what)
    }

    #[inline]
    pub fn read_string(&mut self, what: &str) -> Result<String> {
        self.read::<String>(what)
    }

    pub fn read_pubkey(&mut self, what: &str) -> Result<Pubkey> {
        self.read::<[u8; 32]>(what).map(Pubkey::new_from_array)
    }

    /// Decode a borsh `Option<T>` whose inner value is produced by `f`
    pub fn read_option<T>(
        &mut self,
        what: &str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Option<T>> {
        let start = self.offset;
        match self.read_u8(what)? {
            0 => Ok(None),
            1 => f(self).map(Some),
            other => Err(CoreError::decode(
                what,
                start,
                format!("invalid option marker {}", other),
            )),
        }
    }

    /// Decode a borsh `Vec<T>` (u32 length prefix) whose items are produced by `f`
    pub fn read_vec<T>(
        &mut self,
        what: &str,
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let len = self.read_u32(what)? as usize;
        // Every item occupies at least one byte, so cap the reservation by what is left.
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            items.push(f(self)?);
        }
        Ok(items)
    }

    /// Borrow `len` bytes starting at `offset` without moving the cursor
    pub fn slice_at(data: &'a [u8], offset: usize, len: usize, what: &str) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| data.get(offset..end))
            .ok_or_else(|| {
                CoreError::decode(
                    what,
                    offset,
                    format!("range of {} bytes exceeds buffer of {} bytes", len, data.len()),
                )
            })
    }
}

/// Convert an on-chain u64 offset into a buffer index
pub fn to_index(offset: u64, data: &[u8], what: &str) -> Result<usize> {
    usize::try_from(offset)
        .ok()
        .filter(|idx| *idx < data.len())
        .ok_or_else(|| {
            CoreError::decode(
                what,
                offset as usize,
                format!("offset outside buffer of {} bytes", data.len()),
            )
        })
}

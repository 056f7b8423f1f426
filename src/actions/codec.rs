//! Little-endian serialization of packed action arrays

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{
    array::{ACTIONS_PER_WORD, BITS_PER_ACTION},
    Action, PackedActions,
};
use crate::error::{ActionsError, Result};

/// Size of the serialized header in bytes (template start, score, action count)
pub const SIZE_HEADER: usize = 12;

/// Checks every code and the padding bits of a packed word buffer
fn validate_words(count: usize, words: &[u32]) -> Result<()> {
    for pos in 0..count {
        let word = words[pos / ACTIONS_PER_WORD];
        let shift = BITS_PER_ACTION * (ACTIONS_PER_WORD - 1 - pos % ACTIONS_PER_WORD);
        let code = ((word >> shift) & 0xF) as u8;
        if Action::try_from(code).is_err() {
            return Err(ActionsError::InvalidActionCode {
                code,
                position: pos,
            }
            .into());
        }
    }
    let used = count % ACTIONS_PER_WORD;
    if used != 0 {
        let padding_mask = u32::MAX >> (BITS_PER_ACTION * used);
        if words[words.len() - 1] & padding_mask != 0 {
            return Err(ActionsError::PaddingBitsSet.into());
        }
    }
    Ok(())
}

impl PackedActions {
    /// Builds an array from its raw parts, validating codes and padding.
    ///
    /// # Arguments
    ///
    /// * `template_start` - Zero-based template position of the first action
    /// * `score` - The alignment score
    /// * `count` - The number of actions held in `words`
    /// * `words` - Packed codes, newest action in the top nibble of the first word
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * `words` is shorter than `count` requires
    /// * A code is not a known action
    /// * Bits beyond `count` are set
    pub fn from_words(template_start: i32, score: i32, count: usize, words: &[u32]) -> Result<Self> {
        let required = count.div_ceil(ACTIONS_PER_WORD);
        if words.len() < required {
            return Err(ActionsError::InvalidSize(words.len(), required).into());
        }
        let words = &words[..required];
        validate_words(count, words)?;
        Ok(Self::from_raw_parts(template_start, score, count, words.to_vec()))
    }

    /// Number of bytes written by [`write_bytes`](Self::write_bytes)
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        SIZE_HEADER + 4 * self.len().div_ceil(ACTIONS_PER_WORD)
    }

    /// Writes the header and packed words to a writer
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the writer fails.
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut header = [0u8; SIZE_HEADER];
        LittleEndian::write_i32(&mut header[0..4], self.template_start());
        LittleEndian::write_i32(&mut header[4..8], self.score());
        LittleEndian::write_u32(&mut header[8..12], self.len() as u32);
        writer.write_all(&header)?;
        self.words()
            .iter()
            .try_for_each(|&w| writer.write_u32::<LittleEndian>(w))?;
        Ok(())
    }

    /// Serializes into a new byte vector
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; self.size_in_bytes()];
        LittleEndian::write_i32(&mut buffer[0..4], self.template_start());
        LittleEndian::write_i32(&mut buffer[4..8], self.score());
        LittleEndian::write_u32(&mut buffer[8..12], self.len() as u32);
        LittleEndian::write_u32_into(self.words(), &mut buffer[SIZE_HEADER..]);
        buffer
    }

    /// Parses an array from the start of a byte buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is smaller than the header claims,
    /// the count is negative, or the packed words fail validation.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < SIZE_HEADER {
            return Err(ActionsError::InvalidSize(buffer.len(), SIZE_HEADER).into());
        }
        let template_start = LittleEndian::read_i32(&buffer[0..4]);
        let score = LittleEndian::read_i32(&buffer[4..8]);
        let raw_count = LittleEndian::read_i32(&buffer[8..12]);
        let count = usize::try_from(raw_count).map_err(|_| ActionsError::NegativeCount(raw_count))?;
        let nwords = count.div_ceil(ACTIONS_PER_WORD);
        let expected = SIZE_HEADER + 4 * nwords;
        if buffer.len() < expected {
            return Err(ActionsError::InvalidSize(buffer.len(), expected).into());
        }
        let mut words = vec![0u32; nwords];
        LittleEndian::read_u32_into(&buffer[SIZE_HEADER..expected], &mut words);
        validate_words(count, &words)?;
        Ok(Self::from_raw_parts(template_start, score, count, words))
    }

    /// Reads an array from a reader
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails, the stream ends before the claimed actions,
    /// or the data is invalid (see [`from_bytes`](Self::from_bytes)).
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let template_start = reader.read_i32::<LittleEndian>()?;
        let score = reader.read_i32::<LittleEndian>()?;
        let raw_count = reader.read_i32::<LittleEndian>()?;
        let count = usize::try_from(raw_count).map_err(|_| ActionsError::NegativeCount(raw_count))?;
        let nwords = count.div_ceil(ACTIONS_PER_WORD);

        // the buffer grows with the bytes actually read, not with the claimed count
        let mut data = Vec::new();
        reader
            .by_ref()
            .take(4 * nwords as u64)
            .read_to_end(&mut data)?;
        if data.len() < 4 * nwords {
            return Err(
                ActionsError::InvalidSize(SIZE_HEADER + data.len(), SIZE_HEADER + 4 * nwords).into(),
            );
        }
        let mut words = vec![0u32; nwords];
        LittleEndian::read_u32_into(&data, &mut words);
        validate_words(count, &words)?;
        Ok(Self::from_raw_parts(template_start, score, count, words))
    }
}

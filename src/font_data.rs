//! Byte views over font data.
//!
//! `ReadableFontData` is a shared, immutable and cheaply sliceable view. `WritableFontData` is
//! an exclusively owned buffer that builders serialize into. A writable buffer becomes readable
//! by consuming it with `into_readable`, so no view is ever aliased by a writer.

use std::fmt;
use std::io;
use std::num::Wrapping;
use std::rc::Rc;

use byteorder::{BigEndian, ByteOrder};

use crate::binary::read::ReadScope;
use crate::binary::write::{Placeholder, WriteBinary, WriteContext, WriteSlice};
use crate::checksum;
use crate::error::{ParseError, WriteError};

/// How much space a builder needs to serialize its model.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SerializeSize {
    /// Exactly this many bytes. The buffer is zero filled and can't grow.
    Fixed(usize),
    /// Around this many bytes. The buffer grows as it is written.
    Estimate(usize),
}

impl SerializeSize {
    pub fn size(self) -> usize {
        match self {
            SerializeSize::Fixed(size) | SerializeSize::Estimate(size) => size,
        }
    }

    /// The size of two serializations written back to back. Fixed only if both are.
    pub fn combine(self, other: SerializeSize) -> SerializeSize {
        match (self, other) {
            (SerializeSize::Fixed(a), SerializeSize::Fixed(b)) => SerializeSize::Fixed(a + b),
            (a, b) => SerializeSize::Estimate(a.size() + b.size()),
        }
    }
}

/// Immutable view of a range of shared font data.
#[derive(Clone)]
pub struct ReadableFontData {
    storage: Rc<[u8]>,
    offset: usize,
    length: usize,
}

/// Mutable, exclusively owned font data.
pub struct WritableFontData {
    data: Vec<u8>,
    fixed: bool,
    position: usize,
}

impl ReadableFontData {
    pub fn new(data: Vec<u8>) -> Self {
        let length = data.len();
        ReadableFontData {
            storage: Rc::from(data),
            offset: 0,
            length,
        }
    }

    pub fn empty() -> Self {
        ReadableFontData::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn bytes(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.length]
    }

    pub fn scope(&self) -> ReadScope<'_> {
        ReadScope::new(self.bytes())
    }

    /// The OpenType checksum of this data, zero padded to a 32-bit boundary.
    pub fn checksum(&self) -> u32 {
        let Wrapping(sum) = checksum::table_checksum(self.bytes());
        sum
    }

    /// A view of `length` bytes starting at `offset`, sharing storage with `self`.
    pub fn slice(&self, offset: usize, length: usize) -> Result<ReadableFontData, ParseError> {
        let end = offset.checked_add(length).ok_or(ParseError::BadOffset)?;
        if offset > self.length {
            return Err(ParseError::BadOffset);
        }
        if end > self.length {
            return Err(ParseError::BadEof);
        }
        Ok(ReadableFontData {
            storage: Rc::clone(&self.storage),
            offset: self.offset + offset,
            length,
        })
    }

    /// A view from `offset` to the end of this data.
    pub fn slice_from(&self, offset: usize) -> Result<ReadableFontData, ParseError> {
        let length = self.length.checked_sub(offset).ok_or(ParseError::BadOffset)?;
        self.slice(offset, length)
    }

    pub fn copy_to<C: WriteContext>(&self, ctxt: &mut C) -> Result<usize, WriteError> {
        ctxt.write_bytes(self.bytes())?;
        Ok(self.length)
    }

    pub fn copy_to_writer<W: io::Write>(&self, writer: &mut W) -> io::Result<usize> {
        writer.write_all(self.bytes())?;
        Ok(self.length)
    }

    /// An independent, growable copy of this data.
    pub fn to_writable(&self) -> WritableFontData {
        WritableFontData::from_vec(self.bytes().to_vec())
    }

    /// Returns `true` if `a` and `b` are views of the same storage.
    pub fn ptr_eq(a: &ReadableFontData, b: &ReadableFontData) -> bool {
        Rc::ptr_eq(&a.storage, &b.storage)
    }
}

impl Default for ReadableFontData {
    fn default() -> Self {
        ReadableFontData::empty()
    }
}

impl From<Vec<u8>> for ReadableFontData {
    fn from(data: Vec<u8>) -> Self {
        ReadableFontData::new(data)
    }
}

impl From<&[u8]> for ReadableFontData {
    fn from(data: &[u8]) -> Self {
        ReadableFontData::new(data.to_vec())
    }
}

impl PartialEq for ReadableFontData {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl Eq for ReadableFontData {}

impl fmt::Debug for ReadableFontData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadableFontData")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .finish()
    }
}

impl WritableFontData {
    pub fn create(size: SerializeSize) -> Self {
        match size {
            SerializeSize::Fixed(length) => WritableFontData::fixed(length),
            SerializeSize::Estimate(estimate) => WritableFontData::growable(estimate),
        }
    }

    /// A zero filled buffer of exactly `length` bytes.
    pub fn fixed(length: usize) -> Self {
        WritableFontData {
            data: vec![0; length],
            fixed: true,
            position: 0,
        }
    }

    /// An empty buffer with room for `estimate` bytes that grows on demand.
    pub fn growable(estimate: usize) -> Self {
        WritableFontData {
            data: Vec::with_capacity(estimate),
            fixed: false,
            position: 0,
        }
    }

    /// A growable buffer holding `data`.
    pub fn from_vec(data: Vec<u8>) -> Self {
        WritableFontData {
            data,
            fixed: false,
            position: 0,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Length of the data. For a growable buffer this is the end of the furthest write.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn scope(&self) -> ReadScope<'_> {
        ReadScope::new(&self.data)
    }

    /// Move the sequential write cursor used by the `WriteContext` implementation.
    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub fn into_readable(self) -> ReadableFontData {
        ReadableFontData::new(self.data)
    }

    fn region(&mut self, offset: usize, length: usize) -> Result<&mut [u8], WriteError> {
        let end = offset.checked_add(length).ok_or(WriteError::BadValue)?;
        if end > self.data.len() {
            if self.fixed {
                return Err(WriteError::BadValue);
            }
            self.data.resize(end, 0);
        }
        Ok(&mut self.data[offset..end])
    }

    pub fn write_u8_at(&mut self, offset: usize, value: u8) -> Result<usize, WriteError> {
        self.region(offset, 1)?[0] = value;
        Ok(1)
    }

    pub fn write_u16_at(&mut self, offset: usize, value: u16) -> Result<usize, WriteError> {
        BigEndian::write_u16(self.region(offset, 2)?, value);
        Ok(2)
    }

    pub fn write_i16_at(&mut self, offset: usize, value: i16) -> Result<usize, WriteError> {
        BigEndian::write_i16(self.region(offset, 2)?, value);
        Ok(2)
    }

    pub fn write_u32_at(&mut self, offset: usize, value: u32) -> Result<usize, WriteError> {
        BigEndian::write_u32(self.region(offset, 4)?, value);
        Ok(4)
    }

    pub fn write_bytes_at(&mut self, offset: usize, bytes: &[u8]) -> Result<usize, WriteError> {
        self.region(offset, bytes.len())?.copy_from_slice(bytes);
        Ok(bytes.len())
    }
}

impl WriteContext for WritableFontData {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        let written = self.write_bytes_at(self.position, data)?;
        self.position += written;
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        let region = self.region(self.position, count)?;
        region.iter_mut().for_each(|byte| *byte = 0);
        self.position += count;
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.position
    }

    fn write_placeholder<T, HostType>(
        &mut self,
        placeholder: Placeholder<T, HostType>,
        val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>,
    {
        let data = placeholder.region(&mut self.data)?;
        let mut slice = WriteSlice::new(data);
        T::write(&mut slice, val)
    }
}

impl fmt::Debug for WritableFontData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WritableFontData")
            .field("length", &self.data.len())
            .field("fixed", &self.fixed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{U16Be, U32Be};

    #[test]
    fn test_slice_shares_storage() {
        let data = ReadableFontData::new(vec![1, 2, 3, 4, 5, 6]);
        let slice = data.slice(2, 3).unwrap();
        assert_eq!(slice.bytes(), &[3, 4, 5]);
        assert!(ReadableFontData::ptr_eq(&data, &slice));

        let inner = slice.slice_from(1).unwrap();
        assert_eq!(inner.bytes(), &[4, 5]);
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let data = ReadableFontData::new(vec![1, 2, 3]);
        assert_eq!(data.slice(4, 0), Err(ParseError::BadOffset));
        assert_eq!(data.slice(1, 3), Err(ParseError::BadEof));
        assert_eq!(data.slice(usize::MAX, 2), Err(ParseError::BadOffset));
        assert!(data.slice(3, 0).unwrap().is_empty());
    }

    #[test]
    fn test_to_writable_is_independent() {
        let data = ReadableFontData::new(vec![0, 0, 0, 0]);
        let mut writable = data.to_writable();
        writable.write_u16_at(0, 0xABCD).unwrap();
        assert_eq!(data.bytes(), &[0, 0, 0, 0]);
        assert_eq!(writable.bytes(), &[0xAB, 0xCD, 0, 0]);
    }

    #[test]
    fn test_fixed_rejects_overflow() {
        let mut data = WritableFontData::create(SerializeSize::Fixed(4));
        assert_eq!(data.len(), 4);
        assert_eq!(data.write_u32_at(0, 1), Ok(4));
        assert_eq!(data.write_u16_at(3, 1), Err(WriteError::BadValue));
        assert!(U32Be::write(&mut data, 7u32).is_ok());
        assert_eq!(U16Be::write(&mut data, 7u16), Err(WriteError::BadValue));
    }

    #[test]
    fn test_growable_extends() {
        let mut data = WritableFontData::create(SerializeSize::Estimate(2));
        assert!(data.is_empty());
        data.write_u8_at(5, 9).unwrap();
        assert_eq!(data.len(), 6);
        assert_eq!(data.bytes(), &[0, 0, 0, 0, 0, 9]);

        U16Be::write(&mut data, 0x0102u16).unwrap();
        assert_eq!(data.bytes_written(), 2);
        assert_eq!(data.into_readable().bytes(), &[1, 2, 0, 0, 0, 9]);
    }

    #[test]
    fn test_placeholder() {
        let mut data = WritableFontData::growable(0);
        let placeholder = data.placeholder::<U16Be, u16>().unwrap();
        U16Be::write(&mut data, 2u16).unwrap();
        data.write_placeholder(placeholder, 1).unwrap();
        assert_eq!(data.bytes(), &[0, 1, 0, 2]);
    }

    #[test]
    fn test_checksum_pads() {
        let data = ReadableFontData::new(vec![0, 0, 0, 1, 2]);
        assert_eq!(data.checksum(), 0x0200_0001);
    }

    #[test]
    fn test_combine_sizes() {
        let fixed = SerializeSize::Fixed(4);
        assert_eq!(fixed.combine(SerializeSize::Fixed(6)), SerializeSize::Fixed(10));
        assert_eq!(
            fixed.combine(SerializeSize::Estimate(6)),
            SerializeSize::Estimate(10)
        );
    }
}

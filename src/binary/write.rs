#![deny(missing_docs)]

//! Write binary data

use std::marker::PhantomData;

use crate::binary::read::ReadUnchecked;
use crate::binary::{I16Be, I32Be, I64Be, U16Be, U32Be, U8};
use crate::error::WriteError;

/// An in-memory buffer that implements `WriteContext`.
#[derive(Debug, Default, Clone)]
pub struct WriteBuffer {
    data: Vec<u8>,
}

/// A `WriteContext` over a fixed region of an existing buffer.
pub(crate) struct WriteSlice<'a> {
    offset: usize,
    data: &'a mut [u8],
}

/// A `WriteContext` implementation that just counts the bytes written.
#[derive(Debug, Default)]
pub struct WriteCounter {
    count: usize,
}

/// A `WriteContext` implementation that writes nothing.
struct NullWriter;

/// A placeholder for a value that will be filled in later using WriteContext::write_placeholder
pub struct Placeholder<T, HostType>
where
    T: WriteBinary<HostType>,
{
    offset: usize,
    length: usize,
    marker: PhantomData<T>,
    host: PhantomData<HostType>,
}

/// Trait that describes a type that can be written to a `WriteContext` in binary form.
pub trait WriteBinary<HostType = Self> {
    /// The type of the value returned by `write`.
    type Output;

    /// Write the binary representation of Self to `ctxt`.
    fn write<C: WriteContext>(ctxt: &mut C, val: HostType) -> Result<Self::Output, WriteError>;
}

/// Trait for types that can have binary data written to them.
pub trait WriteContext {
    /// Write the values produced by an iterator into a `WriteContext`.
    fn write_iter<T, HostType>(
        &mut self,
        iter: impl Iterator<Item = HostType>,
    ) -> Result<(), WriteError>
    where
        Self: Sized,
        T: WriteBinary<HostType>,
    {
        for val in iter {
            T::write(self, val)?;
        }

        Ok(())
    }

    /// Write a slice of bytes to a `WriteContext`.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError>;

    /// Write the specified number of zero bytes to the `WriteContext`.
    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError>;

    /// The total number of bytes written so far.
    fn bytes_written(&self) -> usize;

    /// Return a placeholder to `T` in the context for filling in later.
    fn placeholder<T, HostType>(&mut self) -> Result<Placeholder<T, HostType>, WriteError>
    where
        T: WriteBinary<HostType> + ReadUnchecked,
    {
        let offset = self.bytes_written();
        self.write_zeros(T::SIZE)?;

        Ok(Placeholder {
            offset,
            length: T::SIZE,
            marker: PhantomData,
            host: PhantomData,
        })
    }

    /// Consumes the placeholder and writes the supplied value into it
    fn write_placeholder<T, HostType>(
        &mut self,
        placeholder: Placeholder<T, HostType>,
        val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>;
}

impl<T> WriteBinary<T> for U8
where
    T: Into<u8>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: u8 = t.into();
        ctxt.write_bytes(&[val])
    }
}

impl<T> WriteBinary<T> for I16Be
where
    T: Into<i16>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i16 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for U16Be
where
    T: Into<u16>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: u16 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for I32Be
where
    T: Into<i32>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i32 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for U32Be
where
    T: Into<u32>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: u32 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for I64Be
where
    T: Into<i64>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i64 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl WriteContext for WriteBuffer {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        self.data.resize(self.data.len() + count, 0);
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.data.len()
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

impl<'a> WriteSlice<'a> {
    pub(crate) fn new(data: &'a mut [u8]) -> Self {
        WriteSlice { offset: 0, data }
    }

    fn region(&mut self, length: usize) -> Result<&mut [u8], WriteError> {
        let region = self
            .data
            .get_mut(self.offset..)
            .and_then(|rest| rest.get_mut(..length))
            .ok_or(WriteError::BadValue)?;
        self.offset += length;
        Ok(region)
    }
}

impl<'a> WriteContext for WriteSlice<'a> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.region(data.len())?.copy_from_slice(data);
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        self.region(count)?.fill(0);
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.offset
    }

    fn write_placeholder<T, HostType>(
        &mut self,
        _placeholder: Placeholder<T, HostType>,
        _val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>,
    {
        Err(WriteError::NotImplemented)
    }
}

impl WriteContext for WriteCounter {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.count += data.len();
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        self.count += count;
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.count
    }

    fn write_placeholder<T, HostType>(
        &mut self,
        _placeholder: Placeholder<T, HostType>,
        val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>,
    {
        T::write(&mut NullWriter, val)
    }
}

impl WriteContext for NullWriter {
    fn write_bytes(&mut self, _data: &[u8]) -> Result<(), WriteError> {
        Ok(())
    }

    fn write_zeros(&mut self, _count: usize) -> Result<(), WriteError> {
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        0
    }

    fn write_placeholder<T, HostType>(
        &mut self,
        _placeholder: Placeholder<T, HostType>,
        _val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>,
    {
        Err(WriteError::NotImplemented)
    }
}

impl<T, HostType> Placeholder<T, HostType>
where
    T: WriteBinary<HostType>,
{
    /// The region of `data` reserved by this placeholder.
    pub(crate) fn region<'d>(&self, data: &'d mut [u8]) -> Result<&'d mut [u8], WriteError> {
        let end = self
            .offset
            .checked_add(self.length)
            .ok_or(WriteError::PlaceholderMismatch)?;
        data.get_mut(self.offset..end)
            .ok_or(WriteError::PlaceholderMismatch)
    }
}

impl WriteBuffer {
    /// Create a new, empty `WriteBuffer`
    pub fn new() -> Self {
        WriteBuffer { data: Vec::new() }
    }

    /// Retrieve a slice of the data held by this buffer
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the current size of the data held by this buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been written to this buffer
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume `self` and return the inner buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl WriteCounter {
    /// Create a new, empty `WriteCounter`
    pub fn new() -> Self {
        WriteCounter { count: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;

    struct TableTag {
        tag: u32,
    }

    impl WriteBinary<&Self> for TableTag {
        type Output = ();

        fn write<C: WriteContext>(ctxt: &mut C, val: &Self) -> Result<(), WriteError> {
            U32Be::write(ctxt, val.tag)
        }
    }

    #[test]
    fn test_basic() {
        let mut ctxt = WriteBuffer::new();
        TableTag::write(&mut ctxt, &TableTag { tag: tag::HDMX }).unwrap();
        I16Be::write(&mut ctxt, -2i16).unwrap();
        ctxt.write_zeros(2).unwrap();

        assert_eq!(ctxt.bytes(), b"hdmx\xFF\xFE\0\0");
        assert_eq!(ctxt.bytes_written(), 8);
    }

    #[test]
    fn test_write_placeholder() {
        let mut ctxt = WriteBuffer::new();
        U8::write(&mut ctxt, 1).unwrap();
        let placeholder = ctxt.placeholder::<U16Be, u16>().unwrap();
        U8::write(&mut ctxt, 3).unwrap();
        ctxt.write_placeholder(placeholder, 2).unwrap();
        assert_eq!(ctxt.bytes(), &[1, 0, 2, 3]);
    }

    #[test]
    fn test_write_placeholder_overflow() {
        // A value larger than the reserved space is an error
        let mut data = [0u8; 2];
        let mut slice = WriteSlice::new(&mut data);
        assert_eq!(U32Be::write(&mut slice, 7u32), Err(WriteError::BadValue));
        U16Be::write(&mut slice, 7u16).unwrap();
        assert_eq!(data, [0, 7]);
    }

    #[test]
    fn test_counter() {
        let mut counter = WriteCounter::new();
        U32Be::write(&mut counter, 7u32).unwrap();
        let placeholder = counter.placeholder::<U16Be, u16>().unwrap();
        counter.write_placeholder(placeholder, 9).unwrap();
        assert_eq!(counter.bytes_written(), 6);
    }
}

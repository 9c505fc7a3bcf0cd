use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;

use crate::debug;

/// An owned, unescaped representation of a CSV record.
///
/// Fields are stored contiguously in a single byte buffer and delimited by a
/// table of `(start, end)` ranges over this buffer, so that reading a record
/// never needs one allocation per field.
#[derive(Default, Clone, Eq)]
pub struct ByteRecord {
    data: Vec<u8>,
    bounds: Vec<(usize, usize)>,
}

impl ByteRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(data: usize, fields: usize) -> Self {
        Self {
            data: Vec::with_capacity(data),
            bounds: Vec::with_capacity(fields),
        }
    }

    /// Number of fields of the record.
    #[inline]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every field while keeping allocated capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
        self.bounds.clear();
    }

    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.bounds.truncate(len);

        if let Some((_, end)) = self.bounds.last() {
            self.data.truncate(*end);
        } else {
            self.data.clear();
        }
    }

    /// Returns the concatenated bytes of all the fields.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the `(start, end)` range of every field over [`Self::as_slice`].
    #[inline]
    pub fn bounds(&self) -> &[(usize, usize)] {
        &self.bounds
    }

    #[inline]
    pub fn iter(&self) -> ByteRecordIter<'_> {
        ByteRecordIter {
            record: self,
            current_forward: 0,
            current_backward: self.len(),
        }
    }

    #[inline(always)]
    pub fn push_field(&mut self, bytes: &[u8]) {
        let start = self.data.len();

        self.data.extend_from_slice(bytes);
        self.bounds.push((start, self.data.len()));
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.bounds
            .get(index)
            .copied()
            .map(|(start, end)| &self.data[start..end])
    }

    /// Returns the nth field as a `&str`, if it is in bounds and is valid
    /// UTF-8.
    #[inline]
    pub fn get_str(&self, index: usize) -> Option<&str> {
        self.get(index)
            .and_then(|cell| std::str::from_utf8(cell).ok())
    }
}

impl PartialEq for ByteRecord {
    fn eq(&self, other: &Self) -> bool {
        if self.bounds.len() != other.bounds.len() {
            return false;
        }

        self.iter()
            .zip(other.iter())
            .all(|(self_cell, other_cell)| self_cell == other_cell)
    }
}

impl Hash for ByteRecord {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());

        for cell in self.iter() {
            state.write(cell);
        }
    }
}

impl Index<usize> for ByteRecord {
    type Output = [u8];

    #[inline]
    fn index(&self, i: usize) -> &[u8] {
        let (start, end) = self.bounds[i];
        &self.data[start..end]
    }
}

impl<T: AsRef<[u8]>> Extend<T> for ByteRecord {
    #[inline]
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for x in iter {
            self.push_field(x.as_ref());
        }
    }
}

impl<T: AsRef<[u8]>> FromIterator<T> for ByteRecord {
    #[inline]
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut record = Self::new();
        record.extend(iter);
        record
    }
}

impl<'r> IntoIterator for &'r ByteRecord {
    type IntoIter = ByteRecordIter<'r>;
    type Item = &'r [u8];

    #[inline]
    fn into_iter(self) -> ByteRecordIter<'r> {
        self.iter()
    }
}

impl fmt::Debug for ByteRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ByteRecord(")?;
        f.debug_list()
            .entries(self.iter().map(debug::Bytes))
            .finish()?;
        write!(f, ")")?;
        Ok(())
    }
}

pub struct ByteRecordIter<'a> {
    record: &'a ByteRecord,
    current_forward: usize,
    current_backward: usize,
}

impl ExactSizeIterator for ByteRecordIter<'_> {}

impl<'a> Iterator for ByteRecordIter<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.current_forward == self.current_backward {
            None
        } else {
            let (start, end) = self.record.bounds[self.current_forward];

            self.current_forward += 1;

            Some(&self.record.data[start..end])
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.current_backward - self.current_forward;

        (size, Some(size))
    }

    #[inline]
    fn count(self) -> usize
    where
        Self: Sized,
    {
        self.len()
    }
}

impl DoubleEndedIterator for ByteRecordIter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.current_forward == self.current_backward {
            None
        } else {
            self.current_backward -= 1;

            let (start, end) = self.record.bounds[self.current_backward];

            Some(&self.record.data[start..end])
        }
    }
}

/// Incrementally fills a [`ByteRecord`] as the parser decodes fields.
///
/// `start` is the offset into the record's data where the field currently
/// being assembled begins.
pub(crate) struct ByteRecordBuilder<'r> {
    record: &'r mut ByteRecord,
    start: usize,
}

impl<'r> ByteRecordBuilder<'r> {
    /// Wrap a record, resuming the field following its last finalized one.
    #[inline(always)]
    pub(crate) fn wrap(record: &'r mut ByteRecord) -> Self {
        let start = record.bounds.last().map(|(_, end)| *end).unwrap_or(0);

        Self { record, start }
    }

    #[inline(always)]
    pub(crate) fn extend_from_slice(&mut self, slice: &[u8]) {
        self.record.data.extend_from_slice(slice);
    }

    #[inline(always)]
    pub(crate) fn push_byte(&mut self, byte: u8) {
        self.record.data.push(byte);
    }

    /// Whether no byte was decoded yet for the current field.
    #[inline(always)]
    pub(crate) fn field_is_empty(&self) -> bool {
        self.record.data.len() == self.start
    }

    /// Whether nothing at all was decoded for the current record.
    #[inline(always)]
    pub(crate) fn is_pristine(&self) -> bool {
        self.record.bounds.is_empty() && self.record.data.is_empty()
    }

    #[inline]
    pub(crate) fn finalize_field(&mut self) {
        let start = self.start;
        self.start = self.record.data.len();

        debug_assert!(start <= self.start);

        self.record.bounds.push((start, self.start));
    }
}

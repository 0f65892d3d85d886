//! Bounds-checked reader over fixed-layout certificate buffers.
//!
//! Every read names the section it belongs to, so a short buffer surfaces as
//! a format error pointing at that section. The reader also records the byte
//! range of each section it hands out; consecutive reads under one name
//! merge into a single range.

use std::ops::Range;

use crate::infra::error::{Ep11Error, Ep11Result};

/// Named byte range consumed from a certificate buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub range: Range<usize>,
}

pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    sections: Vec<Section>,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            sections: Vec::new(),
        }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Read `n` bytes belonging to `section` and advance.
    pub fn take(&mut self, n: usize, section: &'static str) -> Ep11Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Ep11Error::format(
                section,
                format!(
                    "needs {n} bytes at offset {}, only {} remain",
                    self.pos,
                    self.remaining()
                ),
            ));
        }
        let range = self.pos..self.pos + n;
        self.pos += n;
        match self.sections.last_mut() {
            Some(last) if last.name == section && last.range.end == range.start => {
                last.range.end = range.end;
            }
            _ => self.sections.push(Section {
                name: section,
                range: range.clone(),
            }),
        }
        Ok(&self.data[range])
    }

    pub fn u16(&mut self, section: &'static str) -> Ep11Result<u16> {
        let bytes = self.take(2, section)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32(&mut self, section: &'static str) -> Ep11Result<u32> {
        let bytes = self.take(4, section)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Require that the whole buffer was consumed.
    pub fn finish(self, section: &'static str) -> Ep11Result<Vec<Section>> {
        if self.pos != self.data.len() {
            return Err(Ep11Error::format(
                section,
                format!("{} unparsed bytes after offset {}", self.remaining(), self.pos),
            ));
        }
        Ok(self.sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_and_records_sections() {
        let data = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0xaa];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.u16("a").unwrap(), 1);
        assert_eq!(cursor.u32("b").unwrap(), 2);
        assert_eq!(cursor.take(1, "c").unwrap(), &[0xaa]);
        let sections = cursor.finish("end").unwrap();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[1].range, 2..6);
    }

    #[test]
    fn test_consecutive_reads_merge() {
        let mut cursor = Cursor::new(&[0u8; 8]);
        cursor.u16("header").unwrap();
        cursor.u16("header").unwrap();
        cursor.u32("header").unwrap();
        let sections = cursor.finish("header").unwrap();
        assert_eq!(sections, vec![Section { name: "header", range: 0..8 }]);
    }

    #[test]
    fn test_short_buffer_names_section() {
        let mut cursor = Cursor::new(&[0u8; 3]);
        let err = cursor.u32("header").unwrap_err();
        assert!(err.to_string().contains("header"));
    }

    #[test]
    fn test_finish_rejects_leftover() {
        let mut cursor = Cursor::new(&[0u8; 3]);
        cursor.take(2, "x").unwrap();
        assert!(cursor.finish("trailer").is_err());
    }
}

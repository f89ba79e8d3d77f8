//! The finished metafile and its header
//!
//! A closed session yields an [`EnhMetafile`], either a memory block or a
//! read-only map of the file it was written to. The header parsing here
//! also serves readers of existing EMF data.

use crate::emf_records::{self, EMR_EOF, EMR_HEADER, ENHMETA_SIGNATURE, ENHMETA_VERSION};
use crate::error::{RecorderError, RecorderResult};
use crate::record::RecordBuilder;
use crate::types::{Rect, SizeL};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use std::io::Cursor;

/// Size of ENHMETAHEADER with the pixel format and micrometre fields
pub const HEADER_SIZE: usize = 108;

// Header field offsets patched when a session closes
pub(crate) const OFF_BOUNDS: usize = 8;
pub(crate) const OFF_FRAME: usize = 24;
pub(crate) const OFF_BYTES: usize = 48;
pub(crate) const OFF_RECORDS: usize = 52;
pub(crate) const OFF_HANDLES: usize = 56;

/// Check if data starts with an EMF header record
pub fn is_emf_format(data: &[u8]) -> bool {
    data.len() >= 44
        && LittleEndian::read_u32(&data[0..4]) == EMR_HEADER
        && LittleEndian::read_u32(&data[40..44]) == ENHMETA_SIGNATURE
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetafileHeader {
    /// Size of the header record, description included
    pub size: u32,
    /// Device-space bounds of the picture
    pub bounds: Rect,
    /// Picture frame in 0.01 mm units
    pub frame: Rect,
    pub version: u32,
    pub bytes: u32,
    pub records: u32,
    pub handles: u16,
    /// Description length in UTF-16 units
    pub description_len: u32,
    pub description_offset: u32,
    pub palette_entries: u32,
    pub device: SizeL,
    pub millimeters: SizeL,
    pub pixel_format_size: u32,
    pub pixel_format_offset: u32,
    pub open_gl: u32,
    pub micrometers: SizeL,
}

impl MetafileHeader {
    /// Header for a fresh recording: one record (itself) and one handle
    /// (the reserved slot)
    pub fn new(frame: Rect, device: SizeL, millimeters: SizeL, description: &[u16]) -> Self {
        let description_bytes = description.len() * 2;
        let size = (HEADER_SIZE + ((description_bytes + 3) & !3)) as u32;
        Self {
            size,
            bounds: Rect::EMPTY,
            frame,
            version: ENHMETA_VERSION,
            bytes: size,
            records: 1,
            handles: 1,
            description_len: description.len() as u32,
            description_offset: if description.is_empty() {
                0
            } else {
                HEADER_SIZE as u32
            },
            palette_entries: 0,
            device,
            millimeters,
            pixel_format_size: 0,
            pixel_format_offset: 0,
            open_gl: 0,
            micrometers: SizeL::new(millimeters.cx * 1000, millimeters.cy * 1000),
        }
    }

    /// Serialize the header record, followed by the description
    pub fn encode(&self, description: &[u16]) -> Vec<u8> {
        let mut b = RecordBuilder::new(EMR_HEADER);
        b.rect(self.bounds)
            .rect(self.frame)
            .u32(ENHMETA_SIGNATURE)
            .u32(self.version)
            .u32(self.bytes)
            .u32(self.records)
            .u16(self.handles)
            .u16(0)
            .u32(self.description_len)
            .u32(self.description_offset)
            .u32(self.palette_entries)
            .size(self.device)
            .size(self.millimeters)
            .u32(self.pixel_format_size)
            .u32(self.pixel_format_offset)
            .u32(self.open_gl)
            .size(self.micrometers);
        for unit in description {
            b.u16(*unit);
        }
        b.finish()
    }

    /// Parse the header record at the start of `data`
    pub fn parse(data: &[u8]) -> RecorderResult<Self> {
        if !is_emf_format(data) {
            return Err(RecorderError::InvalidMetafile(
                "missing EMF header signature".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);
        let rect = |c: &mut Cursor<&[u8]>| -> std::io::Result<Rect> {
            Ok(Rect::new(
                c.read_i32::<LittleEndian>()?,
                c.read_i32::<LittleEndian>()?,
                c.read_i32::<LittleEndian>()?,
                c.read_i32::<LittleEndian>()?,
            ))
        };
        let size = |c: &mut Cursor<&[u8]>| -> std::io::Result<SizeL> {
            Ok(SizeL::new(
                c.read_i32::<LittleEndian>()?,
                c.read_i32::<LittleEndian>()?,
            ))
        };

        let _record_type = cursor.read_u32::<LittleEndian>()?;
        let header_size = cursor.read_u32::<LittleEndian>()?;
        let bounds = rect(&mut cursor)?;
        let frame = rect(&mut cursor)?;
        let _signature = cursor.read_u32::<LittleEndian>()?;
        let version = cursor.read_u32::<LittleEndian>()?;
        let bytes = cursor.read_u32::<LittleEndian>()?;
        let records = cursor.read_u32::<LittleEndian>()?;
        let handles = cursor.read_u16::<LittleEndian>()?;
        let _reserved = cursor.read_u16::<LittleEndian>()?;
        let description_len = cursor.read_u32::<LittleEndian>()?;
        let description_offset = cursor.read_u32::<LittleEndian>()?;
        let palette_entries = cursor.read_u32::<LittleEndian>()?;
        let device = size(&mut cursor)?;
        let millimeters = size(&mut cursor)?;

        let mut header = Self {
            size: header_size,
            bounds,
            frame,
            version,
            bytes,
            records,
            handles,
            description_len,
            description_offset,
            palette_entries,
            device,
            millimeters,
            pixel_format_size: 0,
            pixel_format_offset: 0,
            open_gl: 0,
            micrometers: SizeL::default(),
        };

        // Older writers stop after the millimetre size
        if header_size as usize >= HEADER_SIZE {
            header.pixel_format_size = cursor.read_u32::<LittleEndian>()?;
            header.pixel_format_offset = cursor.read_u32::<LittleEndian>()?;
            header.open_gl = cursor.read_u32::<LittleEndian>()?;
            header.micrometers = size(&mut cursor)?;
        }
        Ok(header)
    }

    /// Application name and title, if a description is present
    pub fn description(&self, data: &[u8]) -> Option<(String, String)> {
        if self.description_len == 0 {
            return None;
        }
        let start = self.description_offset as usize;
        let end = start + self.description_len as usize * 2;
        let units: Vec<u16> = data
            .get(start..end)?
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .collect();
        let mut parts = units.split(|u| *u == 0);
        let app = String::from_utf16_lossy(parts.next()?);
        let title = String::from_utf16_lossy(parts.next().unwrap_or(&[]));
        Some((app, title))
    }
}

/// One record as stored in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub record_type: u32,
    pub size: u32,
    /// Bytes after the type and size fields
    pub payload: &'a [u8],
}

impl RawRecord<'_> {
    pub fn type_name(&self) -> &'static str {
        emf_records::get_record_type_name(self.record_type)
    }
}

/// Walks records by their size fields; stops at the first malformed one
pub struct RecordIter<'a> {
    data: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = RawRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset + 8 > self.data.len() {
            return None;
        }
        let record_type = LittleEndian::read_u32(&self.data[self.offset..]);
        let size = LittleEndian::read_u32(&self.data[self.offset + 4..]);
        let end = self.offset + size as usize;
        if size < 8 || size % 4 != 0 || end > self.data.len() {
            self.done = true;
            return None;
        }
        let record = RawRecord {
            record_type,
            size,
            payload: &self.data[self.offset + 8..end],
        };
        self.offset = end;
        if record_type == EMR_EOF {
            self.done = true;
        }
        Some(record)
    }
}

/// Immutable result of a closed recording session
#[derive(Debug)]
pub enum EnhMetafile {
    Memory(Vec<u8>),
    /// Read-only view of the file the session wrote
    Mapped(Mmap),
}

impl EnhMetafile {
    /// Wrap existing EMF bytes, checking the header first
    pub fn from_bytes(data: Vec<u8>) -> RecorderResult<Self> {
        MetafileHeader::parse(&data)?;
        Ok(EnhMetafile::Memory(data))
    }

    pub fn is_on_disk(&self) -> bool {
        matches!(self, EnhMetafile::Mapped(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EnhMetafile::Memory(data) => data.as_slice(),
            EnhMetafile::Mapped(map) => &map[..],
        }
    }

    pub fn header(&self) -> RecorderResult<MetafileHeader> {
        MetafileHeader::parse(self.as_bytes())
    }

    /// Every record, the header first and the end-of-file record last
    pub fn records(&self) -> RecordIter<'_> {
        RecordIter {
            data: self.as_bytes(),
            offset: 0,
            done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn sample_header() -> (MetafileHeader, Vec<u16>) {
        let description: Vec<u16> = "App\0Pic\0\0".encode_utf16().collect();
        let header = MetafileHeader::new(
            Rect::EMPTY,
            SizeL::new(1920, 1080),
            SizeL::new(508, 286),
            &description,
        );
        (header, description)
    }

    #[test]
    fn test_header_layout() {
        let (header, description) = sample_header();
        let bytes = header.encode(&description);
        // 9 units = 18 bytes, padded to 20
        assert_eq!(bytes.len(), HEADER_SIZE + 20);
        assert_eq!(header.size as usize, bytes.len());
        assert_eq!(LittleEndian::read_u32(&bytes[OFF_BYTES..]), bytes.len() as u32);
        assert_eq!(LittleEndian::read_u32(&bytes[OFF_RECORDS..]), 1);
        assert_eq!(LittleEndian::read_u16(&bytes[OFF_HANDLES..]), 1);
        assert_eq!(LittleEndian::read_u16(&bytes[58..60]), 0);
        assert_eq!(LittleEndian::read_u32(&bytes[60..64]), 9);
        assert_eq!(LittleEndian::read_u32(&bytes[64..68]), HEADER_SIZE as u32);
        assert_eq!(LittleEndian::read_i32(&bytes[100..104]), 508_000);
        assert_eq!(LittleEndian::read_u16(&bytes[108..110]), 'A' as u16);
    }

    #[test]
    fn test_header_without_description() {
        let header = MetafileHeader::new(
            Rect::new(0, 0, 100, 100),
            SizeL::new(800, 600),
            SizeL::new(200, 150),
            &[],
        );
        let bytes = header.encode(&[]);
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(LittleEndian::read_u32(&bytes[64..68]), 0);
    }

    #[test]
    fn test_parse_round_trip() {
        let (header, description) = sample_header();
        let bytes = header.encode(&description);
        let parsed = MetafileHeader::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(
            parsed.description(&bytes),
            Some(("App".to_string(), "Pic".to_string()))
        );
    }

    #[test]
    fn test_is_emf_format() {
        let (header, description) = sample_header();
        assert!(is_emf_format(&header.encode(&description)));
        assert!(!is_emf_format(&[1, 0, 0, 0]));
        assert!(matches!(
            MetafileHeader::parse(&[0u8; 120]),
            Err(RecorderError::InvalidMetafile(_))
        ));
    }

    #[test]
    fn test_record_walk_stops_at_eof() {
        let (header, description) = sample_header();
        let mut bytes = header.encode(&description);
        bytes.extend(Record::Empty(emf_records::EMR_SAVEDC).encode());
        bytes.extend(Record::Eof.encode());
        bytes.extend([0xffu8; 8]);
        let metafile = EnhMetafile::Memory(bytes);
        let types: Vec<u32> = metafile.records().map(|r| r.record_type).collect();
        assert_eq!(types, vec![EMR_HEADER, emf_records::EMR_SAVEDC, EMR_EOF]);
        assert_eq!(metafile.records().last().unwrap().type_name(), "EMR_EOF");
        assert!(!metafile.is_on_disk());
    }
}

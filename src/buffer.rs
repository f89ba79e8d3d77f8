//! Growable byte arena holding the header and every appended record

use crate::error::{RecorderError, RecorderResult};
use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::emf_records;

pub struct RecordBuffer {
    data: Vec<u8>,
    records: u32,
}

impl RecordBuffer {
    /// Start a stream with its header record already in place
    pub fn with_header(header: Vec<u8>) -> Self {
        Self {
            data: header,
            records: 1,
        }
    }

    /// Append one complete record.
    ///
    /// Growth is `capacity * 1.5 + record size`. The record count and byte
    /// length only move once the copy has happened, so a failed growth
    /// leaves the buffer as it was.
    pub fn append(&mut self, record: &[u8]) -> RecorderResult<()> {
        if record.len() < 8 || record.len() % 4 != 0 {
            return Err(RecorderError::InvalidArgument(format!(
                "record length {} is not a positive multiple of 4",
                record.len()
            )));
        }
        let declared = LittleEndian::read_u32(&record[4..8]) as usize;
        if declared != record.len() {
            return Err(RecorderError::InvalidArgument(format!(
                "record declares {} bytes but holds {}",
                declared,
                record.len()
            )));
        }
        let total = self.data.len() + record.len();
        if total > u32::MAX as usize {
            return Err(RecorderError::RecordTooLarge(record.len()));
        }

        if total > self.data.capacity() {
            let capacity = self.data.capacity();
            let grown = capacity + capacity / 2 + record.len();
            self.data
                .try_reserve_exact(grown - self.data.len())
                .map_err(|_| RecorderError::Allocation("record buffer"))?;
        }
        self.data.extend_from_slice(record);
        self.records += 1;

        let record_type = LittleEndian::read_u32(&record[0..4]);
        trace!(
            "record {} {} ({} bytes)",
            self.records,
            emf_records::get_record_type_name(record_type),
            record.len()
        );
        Ok(())
    }

    /// Total bytes used, header included
    pub fn byte_length(&self) -> usize {
        self.data.len()
    }

    /// Records in the stream, header included
    pub fn record_count(&self) -> u32 {
        self.records
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Overwrite already-written bytes; used to finalize header fields
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        LittleEndian::write_u32(&mut self.data[offset..offset + 4], value);
    }

    pub fn patch_u16(&mut self, offset: usize, value: u16) {
        LittleEndian::write_u16(&mut self.data[offset..offset + 2], value);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

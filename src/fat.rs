//! In-memory cluster allocation table.
//!
//! The whole table is loaded at mount time and retained for the volume's
//! lifetime; entry width follows the variant.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{FatError, short_read};

/// FAT32 table entries use only the low 28 bits.
pub const FAT32_LINK_MASK: u32 = 0x0FFF_FFFF;

const FAT16_EOC: u32 = 0xFFF8;
const FAT32_EOC: u32 = 0x0FFF_FFF8;

/// Cluster-link table; entry *i* holds the next cluster in the chain that
/// runs through cluster *i*, or a free/reserved/end-of-chain marker.
#[derive(Debug)]
pub enum AllocationTable {
    Fat16(Vec<u16>),
    Fat32(Vec<u32>),
}

impl AllocationTable {
    pub(crate) fn read_fat16<R: Read>(r: &mut R, table_bytes: usize) -> Result<Self, FatError> {
        let mut entries = vec![0u16; table_bytes / 2];
        r.read_u16_into::<LittleEndian>(&mut entries).map_err(short_read)?;
        Ok(Self::Fat16(entries))
    }

    pub(crate) fn read_fat32<R: Read>(r: &mut R, table_bytes: usize) -> Result<Self, FatError> {
        let mut entries = vec![0u32; table_bytes / 4];
        r.read_u32_into::<LittleEndian>(&mut entries).map_err(short_read)?;
        Ok(Self::Fat32(entries))
    }

    /// Number of cluster slots in the table.
    pub fn len(&self) -> usize {
        match self {
            Self::Fat16(t) => t.len(),
            Self::Fat32(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Media-descriptor byte mirrored into entry 0 by the formatter.
    pub fn media_descriptor(&self) -> u8 {
        match self {
            Self::Fat16(t) => t.first().map_or(0, |&v| v as u8),
            Self::Fat32(t) => t.first().map_or(0, |&v| v as u8),
        }
    }

    /// Link stored for `cluster`, masked per variant; `None` when the
    /// cluster falls outside the table.
    pub fn next(&self, cluster: u32) -> Option<u32> {
        match self {
            Self::Fat16(t) => t.get(cluster as usize).map(|&v| v as u32),
            Self::Fat32(t) => t.get(cluster as usize).map(|&v| v & FAT32_LINK_MASK),
        }
    }

    /// Whether `link` marks the end of a cluster chain.
    pub fn is_end_of_chain(&self, link: u32) -> bool {
        match self {
            Self::Fat16(_) => link >= FAT16_EOC,
            Self::Fat32(_) => link >= FAT32_EOC,
        }
    }
}

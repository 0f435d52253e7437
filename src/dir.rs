//! Directory entries and the traversal engine.

use std::io::{Read, Seek};

use crate::error::FatError;
use crate::volume::FatVolume;

pub const DIR_ENTRY_SIZE: usize = 32;
pub const SHORT_NAME_LEN: usize = 11;
const NAME_PART_LEN: usize = 8;

/// First name byte of a deleted entry; skipped, scanning continues.
pub(crate) const DELETED_MARKER: u8 = 0xE5;

pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LONG_NAME: u8 = ATTR_READ_ONLY | ATTR_HIDDEN | ATTR_SYSTEM | ATTR_VOLUME_ID;

/// Decoded 32-byte directory record.
///
/// Values are caller-owned snapshots copied out of the traversal buffer;
/// nothing points back into the volume. Timestamps are left undecoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub(crate) raw_name: [u8; SHORT_NAME_LEN],
    pub attr: u8,
    pub(crate) cluster_hi: u16,
    pub(crate) cluster_lo: u16,
    pub size: u32,
}

impl DirEntry {
    pub(crate) fn decode(raw: &[u8; DIR_ENTRY_SIZE]) -> Self {
        let mut raw_name = [0u8; SHORT_NAME_LEN];
        raw_name.copy_from_slice(&raw[..SHORT_NAME_LEN]);
        Self {
            raw_name,
            attr: raw[11],
            cluster_hi: u16::from_le_bytes([raw[20], raw[21]]),
            cluster_lo: u16::from_le_bytes([raw[26], raw[27]]),
            size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        }
    }

    /// Synthetic entry standing for the root directory.
    pub(crate) fn root(start_cluster: u32) -> Self {
        let mut raw_name = [b' '; SHORT_NAME_LEN];
        raw_name[0] = b'\\';
        Self {
            raw_name,
            attr: ATTR_DIRECTORY,
            cluster_hi: (start_cluster >> 16) as u16,
            cluster_lo: start_cluster as u16,
            size: 0,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.attr & ATTR_DIRECTORY != 0
    }

    pub fn is_long_name(&self) -> bool {
        self.attr & ATTR_LONG_NAME == ATTR_LONG_NAME
    }

    pub fn is_volume_label(&self) -> bool {
        self.attr & ATTR_VOLUME_ID != 0 && !self.is_long_name()
    }

    /// Starting cluster assembled from the split high/low words.
    pub fn first_cluster(&self) -> u32 {
        (self.cluster_hi as u32) << 16 | self.cluster_lo as u32
    }

    /// Formatted 8.3 name, e.g. `"README  TXT"` → `README.TXT`.
    ///
    /// The period is appended only when the extension field's first byte is
    /// not a space.
    pub fn name(&self) -> String {
        let base = &self.raw_name[..NAME_PART_LEN];
        let ext = &self.raw_name[NAME_PART_LEN..];
        let base_end = base.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        let mut name = String::with_capacity(SHORT_NAME_LEN + 1);
        name.push_str(&String::from_utf8_lossy(&base[..base_end]));
        if ext[0] != b' ' {
            let ext_end = ext.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
            name.push('.');
            name.push_str(&String::from_utf8_lossy(&ext[..ext_end]));
        }
        name
    }
}

/// ASCII case-insensitive comparison of a formatted short name with a query.
pub fn names_match(short: &str, query: &str) -> bool {
    short.len() == query.len()
        && short
            .bytes()
            .zip(query.bytes())
            .all(|(a, b)| a.eq_ignore_ascii_case(&b))
}

// ─── Traversal engine ──────────────────────────────────────────────────────────

impl<S: Read + Seek> FatVolume<S> {
    /// Drives `visitor` over the directory starting at `start_cluster`;
    /// returns the entry the visitor stopped on, if any.
    ///
    /// Cluster numbers 0 and 1 address the FAT16 fixed root region, which is
    /// bounded by its entry capacity rather than a cluster chain. Chained
    /// directories advance through the allocation table once a cluster's
    /// entries are consumed.
    ///
    /// A first name byte of zero ends the whole directory, not just the
    /// current cluster. Deleted entries are skipped without invoking the
    /// visitor; long-name entries are passed through (visitors ignore them).
    pub fn walk_dir<V>(
        &mut self,
        start_cluster: u32,
        mut visitor: V,
    ) -> Result<Option<DirEntry>, FatError>
    where
        V: FnMut(&DirEntry) -> bool,
    {
        let mut raw = [0u8; DIR_ENTRY_SIZE];

        if start_cluster <= 1 {
            for index in 0..self.max_root_entries {
                let offset = self.cluster_offset(start_cluster, index * DIR_ENTRY_SIZE as u32);
                self.read_at(offset, &mut raw)?;
                if raw[0] == 0 {
                    return Ok(None);
                }
                if raw[0] == DELETED_MARKER {
                    continue;
                }
                let entry = DirEntry::decode(&raw);
                if !visitor(&entry) {
                    return Ok(Some(entry));
                }
            }
            return Ok(None);
        }

        let entries_per_cluster = self.cluster_bytes / DIR_ENTRY_SIZE as u32;
        let mut cluster = start_cluster;
        let mut hops = 0usize;
        loop {
            for index in 0..entries_per_cluster {
                let offset = self.cluster_offset(cluster, index * DIR_ENTRY_SIZE as u32);
                self.read_at(offset, &mut raw)?;
                if raw[0] == 0 {
                    return Ok(None);
                }
                if raw[0] == DELETED_MARKER {
                    continue;
                }
                let entry = DirEntry::decode(&raw);
                if !visitor(&entry) {
                    return Ok(Some(entry));
                }
            }

            let link = self
                .table
                .next(cluster)
                .ok_or(FatError::CorruptImage("directory cluster outside table"))?;
            if self.table.is_end_of_chain(link) {
                return Ok(None);
            }
            if link < 2 {
                return Err(FatError::CorruptImage("directory chain links to reserved cluster"));
            }
            // A chain longer than the table must revisit a cluster.
            hops += 1;
            if hops > self.table.len() {
                return Err(FatError::CorruptImage("directory cluster chain cycle"));
            }
            cluster = link;
        }
    }
}

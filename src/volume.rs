//! Mounted FAT volume: parsing, cluster addressing, path resolution.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use log::debug;

use crate::bpb::{BootSector, ExtendedInfo, Fat16Info, Fat32Info};
use crate::dir::{DIR_ENTRY_SIZE, DirEntry, names_match};
use crate::error::FatError;
use crate::fat::AllocationTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FatVariant {
    Fat16,
    Fat32,
}

impl fmt::Display for FatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fat16 => "FAT16",
            Self::Fat32 => "FAT32",
        })
    }
}

/// One mounted image: owns the stream and the full allocation table.
///
/// All reads go through the explicit seek-then-read [`FatVolume::read_at`]
/// primitive, so traversals and cursors never share ambient stream position;
/// the `&mut self` borrow is the only serialization point needed.
#[derive(Debug)]
pub struct FatVolume<S> {
    pub(crate) stream: S,
    variant: FatVariant,
    pub(crate) table: AllocationTable,
    pub(crate) cluster_bytes: u32,
    pub(crate) root_offset: u64,
    /// Root-directory entry capacity; 0 on FAT32.
    pub(crate) max_root_entries: u32,
    /// Start of the root directory: the header's root cluster on FAT32,
    /// the sentinel 1 on FAT16 (addresses the fixed root region).
    root_cluster: u32,
    boot: BootSector,
    extended: ExtendedInfo,
}

impl<S> FatVolume<S> {
    pub fn variant(&self) -> FatVariant {
        self.variant
    }

    pub fn boot_sector(&self) -> &BootSector {
        &self.boot
    }

    pub fn extended_info(&self) -> &ExtendedInfo {
        &self.extended
    }

    pub fn cluster_bytes(&self) -> u32 {
        self.cluster_bytes
    }

    pub fn allocation_table(&self) -> &AllocationTable {
        &self.table
    }

    /// Synthetic entry for the root directory.
    pub fn root_entry(&self) -> DirEntry {
        DirEntry::root(self.root_cluster)
    }

    /// Absolute byte offset of `offset` within `cluster`.
    ///
    /// Cluster numbers 0 and 1 address the fixed root region; data clusters
    /// start at 2, immediately after it. Pure arithmetic; an offset past the
    /// end of the stream surfaces as an I/O error on the following read.
    pub fn cluster_offset(&self, cluster: u32, offset: u32) -> u64 {
        if cluster <= 1 {
            self.root_offset + offset as u64
        } else {
            let root_region = self.max_root_entries as u64 * DIR_ENTRY_SIZE as u64;
            self.root_offset
                + root_region
                + (cluster as u64 - 2) * self.cluster_bytes as u64
                + offset as u64
        }
    }
}

impl<S: Read + Seek> FatVolume<S> {
    /// Mounts the image: parses the headers, loads the allocation table,
    /// and cross-checks the media descriptor.
    pub fn mount(mut stream: S) -> Result<Self, FatError> {
        stream.seek(SeekFrom::Start(0))?;
        let boot = BootSector::read_from(&mut stream)?;

        let extended = if boot.is_fat32() {
            ExtendedInfo::Fat32(Fat32Info::read_from(&mut stream)?)
        } else {
            ExtendedInfo::Fat16(Fat16Info::read_from(&mut stream)?)
        };

        // FAT12 shares the FAT16 layout but packs 12-bit table entries,
        // which neither table width can represent.
        if let ExtendedInfo::Fat16(info) = &extended {
            if info.fs_type.starts_with(b"FAT12") {
                return Err(FatError::UnsupportedVariant);
            }
        }

        if boot.bytes_per_sector == 0 || boot.sectors_per_cluster == 0 {
            return Err(FatError::CorruptImage("zero sector or cluster size"));
        }

        let (variant, fat_size_sectors, root_cluster) = match &extended {
            ExtendedInfo::Fat16(_) => (FatVariant::Fat16, boot.fat_size_16 as u32, 1),
            ExtendedInfo::Fat32(info) => (FatVariant::Fat32, info.fat_size_32, info.root_cluster),
        };

        let fat_bytes = fat_size_sectors as u64 * boot.bytes_per_sector as u64;
        let fat_start = boot.reserved_sectors as u64 * boot.bytes_per_sector as u64;
        stream.seek(SeekFrom::Start(fat_start))?;
        let table = match variant {
            FatVariant::Fat16 => AllocationTable::read_fat16(&mut stream, fat_bytes as usize)?,
            FatVariant::Fat32 => AllocationTable::read_fat32(&mut stream, fat_bytes as usize)?,
        };

        if table.media_descriptor() != boot.media_type {
            return Err(FatError::CorruptImage("invalid media descriptor"));
        }

        let cluster_bytes = boot.bytes_per_sector as u32 * boot.sectors_per_cluster as u32;
        let root_offset = fat_start + fat_bytes * boot.num_fats as u64;
        debug!(
            "mounted {variant} volume: {cluster_bytes} bytes/cluster, \
             {} table entries, root region at {root_offset:#x}",
            table.len()
        );

        Ok(Self {
            stream,
            variant,
            table,
            cluster_bytes,
            root_offset,
            max_root_entries: boot.root_entry_count as u32,
            root_cluster,
            boot,
            extended,
        })
    }

    /// Positioned read: seeks to `offset`, then fills `buf` exactly.
    pub(crate) fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), FatError> {
        self.stream.seek(SeekFrom::Start(offset))?;
        self.stream.read_exact(buf)?;
        Ok(())
    }

    /// Resolves a backslash-delimited path to its directory entry.
    ///
    /// Empty components are dropped, so `\`, `\\` and the empty string all
    /// name the root. A missing component anywhere in the path yields
    /// [`FatError::NotFound`] for the whole call; the volume stays usable.
    pub fn lookup(&mut self, path: &str) -> Result<DirEntry, FatError> {
        let mut current = self.root_entry();
        for component in path.split('\\').filter(|c| !c.is_empty()) {
            if !current.is_dir() {
                return Err(FatError::NotFound);
            }
            let found = self.walk_dir(current.first_cluster(), |entry| {
                if entry.is_long_name() || entry.is_volume_label() {
                    return true;
                }
                !names_match(&entry.name(), component)
            })?;
            current = match found {
                Some(entry) => entry,
                None => {
                    debug!("component {component:?} not found");
                    return Err(FatError::NotFound);
                }
            };
        }
        Ok(current)
    }

    /// Collects the visible entries of the directory `entry` describes,
    /// skipping long-name and volume-label records.
    pub fn read_dir(&mut self, entry: &DirEntry) -> Result<Vec<DirEntry>, FatError> {
        if !entry.is_dir() {
            return Err(FatError::NotFound);
        }
        let mut entries = Vec::new();
        self.walk_dir(entry.first_cluster(), |e| {
            if !e.is_long_name() && !e.is_volume_label() {
                entries.push(e.clone());
            }
            true
        })?;
        Ok(entries)
    }
}

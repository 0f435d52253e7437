//! Boot sector and BIOS Parameter Block decoding.
//!
//! The first 36 bytes of every FAT image are the common header; what follows
//! depends on the variant. The variant is selected solely by the 16-bit FAT
//! size field: zero means FAT32, anything else FAT16 (or FAT12, which is
//! rejected at mount time by its filesystem-type tag).

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{FatError, short_read};

pub const OEM_NAME_LEN: usize = 8;
pub const LABEL_LEN: usize = 11;
pub const FS_TYPE_LEN: usize = 8;

/// Common header fields shared by every FAT variant.
#[derive(Clone, Debug)]
pub struct BootSector {
    pub oem_name: [u8; OEM_NAME_LEN],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    /// Root-directory entry capacity; 0 on FAT32.
    pub root_entry_count: u16,
    /// 16-bit total sector count; 0 when the volume needs the 32-bit field.
    pub total_sectors_16: u16,
    pub media_type: u8,
    /// 16-bit FAT size in sectors; 0 signals FAT32.
    pub fat_size_16: u16,
    pub sectors_per_track: u16,
    pub num_heads: u16,
    pub hidden_sectors: u32,
    pub total_sectors_32: u32,
}

impl BootSector {
    /// Decode the 36-byte common header from the start of the image.
    pub(crate) fn read_from<R: Read>(r: &mut R) -> Result<Self, FatError> {
        let mut jmp = [0u8; 3];
        r.read_exact(&mut jmp).map_err(short_read)?;
        let mut oem_name = [0u8; OEM_NAME_LEN];
        r.read_exact(&mut oem_name).map_err(short_read)?;
        Ok(Self {
            oem_name,
            bytes_per_sector: r.read_u16::<LittleEndian>().map_err(short_read)?,
            sectors_per_cluster: r.read_u8().map_err(short_read)?,
            reserved_sectors: r.read_u16::<LittleEndian>().map_err(short_read)?,
            num_fats: r.read_u8().map_err(short_read)?,
            root_entry_count: r.read_u16::<LittleEndian>().map_err(short_read)?,
            total_sectors_16: r.read_u16::<LittleEndian>().map_err(short_read)?,
            media_type: r.read_u8().map_err(short_read)?,
            fat_size_16: r.read_u16::<LittleEndian>().map_err(short_read)?,
            sectors_per_track: r.read_u16::<LittleEndian>().map_err(short_read)?,
            num_heads: r.read_u16::<LittleEndian>().map_err(short_read)?,
            hidden_sectors: r.read_u32::<LittleEndian>().map_err(short_read)?,
            total_sectors_32: r.read_u32::<LittleEndian>().map_err(short_read)?,
        })
    }

    pub fn is_fat32(&self) -> bool {
        self.fat_size_16 == 0
    }

    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }
}

/// FAT16 extended block (bytes 36..62 of the boot sector).
#[derive(Clone, Debug)]
pub struct Fat16Info {
    pub drive_number: u8,
    pub boot_signature: u8,
    pub volume_id: u32,
    pub volume_label: [u8; LABEL_LEN],
    pub fs_type: [u8; FS_TYPE_LEN],
}

impl Fat16Info {
    pub(crate) fn read_from<R: Read>(r: &mut R) -> Result<Self, FatError> {
        let drive_number = r.read_u8().map_err(short_read)?;
        let _reserved = r.read_u8().map_err(short_read)?;
        let boot_signature = r.read_u8().map_err(short_read)?;
        let volume_id = r.read_u32::<LittleEndian>().map_err(short_read)?;
        let mut volume_label = [0u8; LABEL_LEN];
        r.read_exact(&mut volume_label).map_err(short_read)?;
        let mut fs_type = [0u8; FS_TYPE_LEN];
        r.read_exact(&mut fs_type).map_err(short_read)?;
        Ok(Self { drive_number, boot_signature, volume_id, volume_label, fs_type })
    }

    /// Volume label with trailing padding removed.
    pub fn volume_label_str(&self) -> String {
        String::from_utf8_lossy(&self.volume_label).trim_end().to_string()
    }
}

/// FAT32 extended block (bytes 36..90), ending in a FAT16-shaped tail.
#[derive(Clone, Debug)]
pub struct Fat32Info {
    pub fat_size_32: u32,
    pub ext_flags: u16,
    pub fs_version: u16,
    pub root_cluster: u32,
    pub fs_info_sector: u16,
    pub backup_boot_sector: u16,
    pub tail: Fat16Info,
}

impl Fat32Info {
    pub(crate) fn read_from<R: Read>(r: &mut R) -> Result<Self, FatError> {
        let fat_size_32 = r.read_u32::<LittleEndian>().map_err(short_read)?;
        let ext_flags = r.read_u16::<LittleEndian>().map_err(short_read)?;
        let fs_version = r.read_u16::<LittleEndian>().map_err(short_read)?;
        let root_cluster = r.read_u32::<LittleEndian>().map_err(short_read)?;
        let fs_info_sector = r.read_u16::<LittleEndian>().map_err(short_read)?;
        let backup_boot_sector = r.read_u16::<LittleEndian>().map_err(short_read)?;
        let mut reserved = [0u8; 12];
        r.read_exact(&mut reserved).map_err(short_read)?;
        let tail = Fat16Info::read_from(r)?;
        Ok(Self {
            fat_size_32,
            ext_flags,
            fs_version,
            root_cluster,
            fs_info_sector,
            backup_boot_sector,
            tail,
        })
    }
}

/// Variant-specific half of the boot sector.
#[derive(Clone, Debug)]
pub enum ExtendedInfo {
    Fat16(Fat16Info),
    Fat32(Fat32Info),
}

impl ExtendedInfo {
    /// The FAT16-shaped block both variants carry (FAT32 embeds it as a tail).
    pub fn fat16_block(&self) -> &Fat16Info {
        match self {
            Self::Fat16(info) => info,
            Self::Fat32(info) => &info.tail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn common_header() -> Vec<u8> {
        let mut h = Vec::new();
        h.extend_from_slice(&[0xEB, 0x3C, 0x90]); // jump
        h.extend_from_slice(b"MSDOS5.0"); // OEM
        h.extend_from_slice(&512u16.to_le_bytes()); // bytes/sector
        h.push(4); // sectors/cluster
        h.extend_from_slice(&1u16.to_le_bytes()); // reserved
        h.push(2); // FATs
        h.extend_from_slice(&512u16.to_le_bytes()); // root entries
        h.extend_from_slice(&20480u16.to_le_bytes()); // total sectors (16)
        h.push(0xF8); // media
        h.extend_from_slice(&9u16.to_le_bytes()); // FAT size (16)
        h.extend_from_slice(&63u16.to_le_bytes()); // sectors/track
        h.extend_from_slice(&16u16.to_le_bytes()); // heads
        h.extend_from_slice(&0u32.to_le_bytes()); // hidden
        h.extend_from_slice(&0u32.to_le_bytes()); // total sectors (32)
        h
    }

    #[test]
    fn decode_common_header() {
        let bytes = common_header();
        let boot = BootSector::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(&boot.oem_name, b"MSDOS5.0");
        assert_eq!(boot.bytes_per_sector, 512);
        assert_eq!(boot.sectors_per_cluster, 4);
        assert_eq!(boot.reserved_sectors, 1);
        assert_eq!(boot.num_fats, 2);
        assert_eq!(boot.root_entry_count, 512);
        assert_eq!(boot.media_type, 0xF8);
        assert_eq!(boot.fat_size_16, 9);
        assert!(!boot.is_fat32());
        assert_eq!(boot.total_sectors(), 20480);
    }

    #[test]
    fn fat32_signalled_by_zero_fat_size() {
        let mut bytes = common_header();
        bytes[22] = 0;
        bytes[23] = 0;
        let boot = BootSector::read_from(&mut Cursor::new(bytes)).unwrap();
        assert!(boot.is_fat32());
    }

    #[test]
    fn short_header_is_truncated() {
        let bytes = common_header();
        let err = BootSector::read_from(&mut Cursor::new(&bytes[..20])).unwrap_err();
        assert!(matches!(err, FatError::Truncated));
    }

    #[test]
    fn decode_fat16_block() {
        let mut bytes = Vec::new();
        bytes.push(0x80); // drive number
        bytes.push(0); // reserved
        bytes.push(0x29); // boot signature
        bytes.extend_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        bytes.extend_from_slice(b"TESTVOLUME ");
        bytes.extend_from_slice(b"FAT16   ");
        let info = Fat16Info::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(info.drive_number, 0x80);
        assert_eq!(info.volume_id, 0xDEAD_BEEF);
        assert_eq!(info.volume_label_str(), "TESTVOLUME");
        assert_eq!(&info.fs_type, b"FAT16   ");
    }

    #[test]
    fn decode_fat32_block_with_tail() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&123u32.to_le_bytes()); // FAT size (32)
        bytes.extend_from_slice(&0u16.to_le_bytes()); // ext flags
        bytes.extend_from_slice(&0u16.to_le_bytes()); // version
        bytes.extend_from_slice(&2u32.to_le_bytes()); // root cluster
        bytes.extend_from_slice(&1u16.to_le_bytes()); // fs-info sector
        bytes.extend_from_slice(&6u16.to_le_bytes()); // backup boot sector
        bytes.extend_from_slice(&[0u8; 12]); // reserved
        bytes.push(0x80);
        bytes.push(0);
        bytes.push(0x29);
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(b"NO NAME    ");
        bytes.extend_from_slice(b"FAT32   ");
        let info = Fat32Info::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(info.fat_size_32, 123);
        assert_eq!(info.root_cluster, 2);
        assert_eq!(&info.tail.fs_type, b"FAT32   ");
    }
}

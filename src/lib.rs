//! Read-only accessor for FAT16 and FAT32 filesystem images.
//!
//! Mounts a raw image from any seekable byte stream, resolves
//! backslash-delimited paths, lists directories, and streams file contents
//! by cluster-chain traversal. FAT12 images are rejected; long filenames
//! are recognized only to be skipped.
//!
//! ```no_run
//! use std::fs::File;
//! use fatimg::FatVolume;
//!
//! let mut vol = FatVolume::mount(File::open("fat16.img")?)?;
//! let entry = vol.lookup("\\INCLUDE\\WIFI.H")?;
//! let mut cursor = vol.open(&entry);
//! let mut buf = [0u8; 4096];
//! while vol.read(&mut cursor, &mut buf)? > 0 {
//!     // consume buf
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bpb;
pub mod dir;
pub mod error;
pub mod fat;
pub mod file;
pub mod volume;

pub use bpb::{BootSector, ExtendedInfo, Fat16Info, Fat32Info};
pub use dir::{DirEntry, names_match};
pub use error::FatError;
pub use fat::AllocationTable;
pub use file::FileCursor;
pub use volume::{FatVariant, FatVolume};

// ─── Shared test fixtures ──────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testutil {
    use std::io::{Cursor, Write};

    /// Format an in-memory image of the given size and FAT type.
    ///
    /// 512-byte clusters keep multi-cluster files cheap to produce and make
    /// the cluster count (size / 512) pick the type fatfs is asked for.
    pub(crate) fn make_image(size: usize, fat_type: fatfs::FatType) -> Vec<u8> {
        let mut cursor = Cursor::new(vec![0u8; size]);
        fatfs::format_volume(
            &mut cursor,
            fatfs::FormatVolumeOptions::new()
                .fat_type(fat_type)
                .bytes_per_cluster(512),
        )
        .expect("format_volume failed");
        cursor.into_inner()
    }

    /// 16 MiB FAT16 volume (32768 clusters, well inside the FAT16 range).
    pub(crate) fn fat16_image() -> Vec<u8> {
        make_image(16 * 1024 * 1024, fatfs::FatType::Fat16)
    }

    /// 40 MiB FAT32 volume; FAT32 needs at least 65525 data clusters.
    pub(crate) fn fat32_image() -> Vec<u8> {
        make_image(40 * 1024 * 1024, fatfs::FatType::Fat32)
    }

    /// Write a file into the image via fatfs. `path` is '/'-separated and
    /// parent directories must already exist.
    pub(crate) fn write_file(image: &mut Vec<u8>, path: &str, content: &[u8]) {
        let mut cursor = Cursor::new(image);
        let fs = fatfs::FileSystem::new(&mut cursor, fatfs::FsOptions::new())
            .expect("FileSystem::new failed");
        let mut file = fs.root_dir().create_file(path).expect("create_file failed");
        file.truncate().unwrap();
        file.write_all(content).unwrap();
    }

    pub(crate) fn make_dir(image: &mut Vec<u8>, path: &str) {
        let mut cursor = Cursor::new(image);
        let fs = fatfs::FileSystem::new(&mut cursor, fatfs::FsOptions::new())
            .expect("FileSystem::new failed");
        fs.root_dir().create_dir(path).expect("create_dir failed");
    }

    /// Hand-built 64 KiB FAT16 skeleton: 512-byte sectors, 4 sectors per
    /// cluster, 1 reserved sector, one FAT of 9 sectors, 512 root entries.
    /// FAT bytes = 4608, so the root region sits at 512 + 4608 = 5120 and
    /// the data region at 5120 + 512 * 32 = 21504.
    pub(crate) fn geometry_fixture() -> Vec<u8> {
        let mut img = vec![0u8; 64 * 1024];
        img[0..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        img[3..11].copy_from_slice(b"MSDOS5.0");
        img[11..13].copy_from_slice(&512u16.to_le_bytes()); // bytes/sector
        img[13] = 4; // sectors/cluster
        img[14..16].copy_from_slice(&1u16.to_le_bytes()); // reserved
        img[16] = 1; // FATs
        img[17..19].copy_from_slice(&512u16.to_le_bytes()); // root entries
        img[19..21].copy_from_slice(&128u16.to_le_bytes()); // total sectors
        img[21] = 0xF8; // media
        img[22..24].copy_from_slice(&9u16.to_le_bytes()); // FAT size
        img[54..62].copy_from_slice(b"FAT16   ");
        img[512..514].copy_from_slice(&0xFFF8u16.to_le_bytes()); // FAT[0]
        img[514..516].copy_from_slice(&0xFFFFu16.to_le_bytes()); // FAT[1]
        img
    }

    pub(crate) const FIXTURE_ROOT_OFFSET: usize = 5120;
    pub(crate) const FIXTURE_DATA_OFFSET: usize = 5120 + 512 * 32;
}

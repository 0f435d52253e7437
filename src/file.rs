//! Sequential file reads across cluster boundaries.

use std::io::{Read, Seek};

use log::warn;

use crate::dir::DirEntry;
use crate::error::FatError;
use crate::volume::FatVolume;

/// Read position for one open file.
///
/// Holds its own snapshot of the directory entry; dropping a cursor
/// releases nothing on the volume, and any number of cursors may be open at
/// once because every read repositions the stream itself.
pub struct FileCursor {
    entry: DirEntry,
    position: u32,
    cluster: u32,
}

impl FileCursor {
    /// Current byte position, `0..=size`.
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn size(&self) -> u32 {
        self.entry.size
    }
}

impl<S: Read + Seek> FatVolume<S> {
    /// Opens a cursor at the start of the file `entry` describes.
    pub fn open(&self, entry: &DirEntry) -> FileCursor {
        FileCursor {
            entry: entry.clone(),
            position: 0,
            cluster: entry.first_cluster(),
        }
    }

    /// Copies the next bytes of the file into `buf`.
    ///
    /// Each iteration copies the minimum of the remaining file bytes, the
    /// remaining bytes in the current cluster, and the remaining request,
    /// following the allocation table whenever a copy exhausts the current
    /// cluster exactly. Returns the number of bytes copied; 0 once the end
    /// of the file is reached (not an error).
    pub fn read(&mut self, cursor: &mut FileCursor, buf: &mut [u8]) -> Result<usize, FatError> {
        let mut copied = 0usize;
        while copied < buf.len() {
            let file_left = (cursor.entry.size - cursor.position) as usize;
            if file_left == 0 {
                break;
            }
            if cursor.cluster < 2 || self.table.is_end_of_chain(cursor.cluster) {
                warn!("cluster chain ended {file_left} bytes before the recorded file size");
                break;
            }

            let in_cluster = cursor.position % self.cluster_bytes;
            let cluster_left = (self.cluster_bytes - in_cluster) as usize;
            let count = (buf.len() - copied).min(cluster_left).min(file_left);
            let offset = self.cluster_offset(cursor.cluster, in_cluster);
            self.read_at(offset, &mut buf[copied..copied + count])?;
            copied += count;
            cursor.position += count as u32;

            if count == cluster_left {
                // 0 is never a valid link; the guard above turns it into a
                // short read on the next pass.
                cursor.cluster = self.table.next(cursor.cluster).unwrap_or(0);
            }
        }
        Ok(copied)
    }
}

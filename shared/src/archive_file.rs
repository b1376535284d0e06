//! Saved archive files: the magic `SMAR`, a little-endian `u32` format
//! version, then the archive as a bincode list of per-slice groups.

use std::fmt;

use bincode::{Decode, Encode};

use crate::archive::SelectionArchive;
use crate::selection::RectSelection;
use crate::SliceIndex;

pub const ARCHIVE_FILE_MAGIC: [u8; 4] = *b"SMAR";
pub const ARCHIVE_FILE_VERSION: u32 = 1;

/// One slice worth of archived rectangles, each stored as
/// `[x, y, width, height]` in slice pixels.
#[derive(Encode, Decode)]
struct SliceGroup {
    slice_index: SliceIndex,
    rects: Vec<[f64; 4]>,
}

#[derive(Debug, PartialEq)]
pub enum ArchiveFileDecodeError {
    /// Missing magic or truncated header.
    NotAnArchive,
    UnsupportedVersion(u32),
    /// The body does not decode, or has bytes left over.
    Corrupt,
    /// A stored rectangle has non-finite or negative geometry.
    InvalidSelection { slice_index: SliceIndex },
}

impl fmt::Display for ArchiveFileDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFileDecodeError::NotAnArchive => write!(f, "not a selection archive file"),
            ArchiveFileDecodeError::UnsupportedVersion(version) => {
                write!(f, "unsupported archive file version {version}")
            }
            ArchiveFileDecodeError::Corrupt => write!(f, "archive file body is corrupt"),
            ArchiveFileDecodeError::InvalidSelection { slice_index } => {
                write!(f, "archive file holds an invalid selection on slice {slice_index}")
            }
        }
    }
}

impl std::error::Error for ArchiveFileDecodeError {}

pub fn encode_archive_file(archive: &SelectionArchive<RectSelection>) -> Vec<u8> {
    let groups: Vec<SliceGroup> = archive
        .groups()
        .map(|(slice_index, entries)| SliceGroup {
            slice_index,
            rects: entries
                .iter()
                .map(|rect| [rect.x, rect.y, rect.width, rect.height])
                .collect(),
        })
        .collect();
    let mut payload = ARCHIVE_FILE_MAGIC.to_vec();
    payload.extend_from_slice(&ARCHIVE_FILE_VERSION.to_le_bytes());
    match bincode::encode_into_std_write(&groups, &mut payload, bincode::config::standard()) {
        Ok(written) => {
            log::debug!("archive file: {} slice(s) in {written} bytes", groups.len())
        }
        Err(err) => log::error!("archive file: encoding failed: {err}"),
    }
    payload
}

pub fn decode_archive_file(
    payload: &[u8],
) -> Result<SelectionArchive<RectSelection>, ArchiveFileDecodeError> {
    let rest = payload
        .strip_prefix(&ARCHIVE_FILE_MAGIC[..])
        .ok_or(ArchiveFileDecodeError::NotAnArchive)?;
    let (version, body) = rest
        .split_first_chunk::<4>()
        .ok_or(ArchiveFileDecodeError::NotAnArchive)?;
    let version = u32::from_le_bytes(*version);
    if version != ARCHIVE_FILE_VERSION {
        return Err(ArchiveFileDecodeError::UnsupportedVersion(version));
    }
    let (groups, read): (Vec<SliceGroup>, usize) =
        bincode::decode_from_slice(body, bincode::config::standard())
            .map_err(|_| ArchiveFileDecodeError::Corrupt)?;
    if read != body.len() {
        return Err(ArchiveFileDecodeError::Corrupt);
    }

    let mut archive = SelectionArchive::new();
    for SliceGroup { slice_index, rects } in groups {
        for [x, y, width, height] in rects {
            let well_formed = [x, y, width, height].iter().all(|value| value.is_finite())
                && width >= 0.0
                && height >= 0.0;
            if !well_formed {
                return Err(ArchiveFileDecodeError::InvalidSelection { slice_index });
            }
            archive.push(RectSelection::new(slice_index, x, y, width, height));
        }
    }
    Ok(archive)
}

//! Tag removal for MP3, WAV and FLAC, working on raw container bytes.

use super::{MetadataStripper, StripError};
use std::fs;
use std::path::Path;

const ID3V1_LEN: usize = 128;
const ID3V1_EXT_LEN: usize = 227;

/// FLAC metadata block types that describe the audio stream itself.
const FLAC_STREAMINFO: u8 = 0;
const FLAC_SEEKTABLE: u8 = 3;
const FLAC_CUESHEET: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AudioKind {
    Mp3,
    Wav,
    Flac,
}

/// Dispatches on the container signature, not the extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioStripper;

impl MetadataStripper for AudioStripper {
    fn strip(&self, input: &Path, output: &Path) -> Result<(), StripError> {
        let data = fs::read(input).map_err(|e| StripError::io(input, e))?;
        let cleaned = strip_audio(&data)?;
        fs::write(output, cleaned).map_err(|e| StripError::io(output, e))
    }
}

/// Return `data` with every tag block removed.
pub fn strip_audio(data: &[u8]) -> Result<Vec<u8>, StripError> {
    match sniff(data) {
        Some(AudioKind::Mp3) => strip_mp3(data),
        Some(AudioKind::Wav) => strip_wav(data),
        Some(AudioKind::Flac) => strip_flac(data),
        None => Err(StripError::malformed("audio", "unrecognized container signature")),
    }
}

fn sniff(data: &[u8]) -> Option<AudioKind> {
    if data.starts_with(b"fLaC") {
        return Some(AudioKind::Flac);
    }
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WAVE" {
        return Some(AudioKind::Wav);
    }
    if data.starts_with(b"ID3") {
        // A broken tag is reported by the MP3 path.
        return match skip_id3v2(data) {
            Ok(body) if body.starts_with(b"fLaC") => Some(AudioKind::Flac),
            _ => Some(AudioKind::Mp3),
        };
    }
    // MPEG frame sync: eleven set bits.
    if data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0 {
        return Some(AudioKind::Mp3);
    }
    None
}

/// Skip any leading ID3v2 tags.
fn skip_id3v2(mut data: &[u8]) -> Result<&[u8], StripError> {
    while data.starts_with(b"ID3") {
        if data.len() < 10 {
            return Err(StripError::malformed("mp3", "truncated ID3v2 header"));
        }
        let flags = data[5];
        let mut size = 0usize;
        for &b in &data[6..10] {
            if b & 0x80 != 0 {
                return Err(StripError::malformed("mp3", "ID3v2 size is not syncsafe"));
            }
            size = (size << 7) | b as usize;
        }
        let footer = if flags & 0x10 != 0 { 10 } else { 0 };
        let total = 10 + size + footer;
        if total > data.len() {
            return Err(StripError::malformed("mp3", "ID3v2 tag runs past end of file"));
        }
        data = &data[total..];
    }
    Ok(data)
}

fn strip_mp3(data: &[u8]) -> Result<Vec<u8>, StripError> {
    let mut body = skip_id3v2(data)?;
    if body.len() >= ID3V1_LEN && body[body.len() - ID3V1_LEN..].starts_with(b"TAG") {
        body = &body[..body.len() - ID3V1_LEN];
        if body.len() >= ID3V1_EXT_LEN && body[body.len() - ID3V1_EXT_LEN..].starts_with(b"TAG+") {
            body = &body[..body.len() - ID3V1_EXT_LEN];
        }
    }
    Ok(body.to_vec())
}

fn strip_wav(data: &[u8]) -> Result<Vec<u8>, StripError> {
    let mut kept: Vec<u8> = Vec::with_capacity(data.len());
    let mut has_fmt = false;
    let mut has_data = false;
    let mut pos = 12;

    while pos + 8 <= data.len() {
        let id = &data[pos..pos + 4];
        let size = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]]) as usize;
        let padded = size + (size & 1);
        let end = pos + 8 + size;
        if end > data.len() {
            return Err(StripError::malformed("wav", "chunk runs past end of file"));
        }
        let chunk_end = (pos + 8 + padded).min(data.len());

        match id {
            b"fmt " | b"fact" | b"data" => {
                has_fmt |= id == b"fmt ";
                has_data |= id == b"data";
                kept.extend_from_slice(&data[pos..end]);
                if padded != size {
                    kept.push(0);
                }
            }
            _ => {}
        }
        pos = chunk_end;
    }

    if !has_fmt || !has_data {
        return Err(StripError::malformed("wav", "missing fmt or data chunk"));
    }

    let riff_size = u32::try_from(kept.len() + 4)
        .map_err(|_| StripError::malformed("wav", "file exceeds RIFF size limit"))?;
    let mut out = Vec::with_capacity(kept.len() + 12);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(&kept);
    Ok(out)
}

fn strip_flac(data: &[u8]) -> Result<Vec<u8>, StripError> {
    let data = skip_id3v2(data)?;
    if !data.starts_with(b"fLaC") {
        return Err(StripError::malformed("flac", "missing fLaC marker"));
    }

    let mut blocks: Vec<&[u8]> = Vec::new();
    let mut pos = 4;
    loop {
        if pos + 4 > data.len() {
            return Err(StripError::malformed("flac", "truncated metadata block header"));
        }
        let header = data[pos];
        let is_last = header & 0x80 != 0;
        let block_type = header & 0x7F;
        if block_type == 127 {
            return Err(StripError::malformed("flac", "invalid metadata block type"));
        }
        if pos == 4 && block_type != FLAC_STREAMINFO {
            return Err(StripError::malformed("flac", "first block is not STREAMINFO"));
        }
        let len = u32::from_be_bytes([0, data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let end = pos + 4 + len;
        if end > data.len() {
            return Err(StripError::malformed("flac", "metadata block runs past end of file"));
        }
        if matches!(block_type, FLAC_STREAMINFO | FLAC_SEEKTABLE | FLAC_CUESHEET) {
            blocks.push(&data[pos..end]);
        }
        pos = end;
        if is_last {
            break;
        }
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(b"fLaC");
    let last = blocks.len() - 1;
    for (i, block) in blocks.iter().enumerate() {
        let type_bits = block[0] & 0x7F;
        out.push(if i == last { type_bits | 0x80 } else { type_bits });
        out.extend_from_slice(&block[1..]);
    }
    out.extend_from_slice(&data[pos..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syncsafe(n: usize) -> [u8; 4] {
        [
            ((n >> 21) & 0x7F) as u8,
            ((n >> 14) & 0x7F) as u8,
            ((n >> 7) & 0x7F) as u8,
            (n & 0x7F) as u8,
        ]
    }

    fn id3v2(body: &[u8]) -> Vec<u8> {
        let mut tag = b"ID3\x04\x00\x00".to_vec();
        tag.extend_from_slice(&syncsafe(body.len()));
        tag.extend_from_slice(body);
        tag
    }

    const FRAMES: &[u8] = &[0xFF, 0xFB, 0x90, 0x64, 1, 2, 3, 4, 5, 6];

    #[test]
    fn test_mp3_strips_both_tag_versions() {
        let mut data = id3v2(b"TIT2\0\0\0\x05\0\0Song");
        data.extend_from_slice(FRAMES);
        let mut v1 = b"TAG".to_vec();
        v1.resize(ID3V1_LEN, b'x');
        data.extend_from_slice(&v1);

        assert_eq!(strip_audio(&data).unwrap(), FRAMES);
    }

    #[test]
    fn test_mp3_without_tags_is_unchanged() {
        assert_eq!(strip_audio(FRAMES).unwrap(), FRAMES);
    }

    #[test]
    fn test_mp3_rejects_oversized_tag() {
        let mut data = b"ID3\x04\x00\x00".to_vec();
        data.extend_from_slice(&syncsafe(500));
        data.extend_from_slice(FRAMES);
        assert!(matches!(strip_audio(&data), Err(StripError::Malformed { format: "mp3", .. })));
    }

    fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut c = id.to_vec();
        c.extend_from_slice(&(body.len() as u32).to_le_bytes());
        c.extend_from_slice(body);
        if body.len() % 2 == 1 {
            c.push(0);
        }
        c
    }

    fn riff(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn test_wav_keeps_only_audio_chunks() {
        let fmt = chunk(b"fmt ", &[1, 0, 1, 0, 0x44, 0xAC, 0, 0, 0x88, 0x58, 1, 0, 2, 0, 16, 0]);
        let list = chunk(b"LIST", b"INFOIART\x07\0\0\0Artist\0");
        let data = chunk(b"data", &[0, 1, 2]);
        let input = riff(&[fmt.clone(), list, data.clone()]);

        let out = strip_audio(&input).unwrap();
        assert_eq!(out, riff(&[fmt, data]));
        assert!(!out.windows(4).any(|w| w == b"LIST"));
    }

    #[test]
    fn test_wav_without_data_is_malformed() {
        let input = riff(&[chunk(b"fmt ", &[0; 16])]);
        assert!(matches!(strip_audio(&input), Err(StripError::Malformed { format: "wav", .. })));
    }

    fn flac_block(block_type: u8, last: bool, body: &[u8]) -> Vec<u8> {
        let len = (body.len() as u32).to_be_bytes();
        let mut b = vec![if last { block_type | 0x80 } else { block_type }, len[1], len[2], len[3]];
        b.extend_from_slice(body);
        b
    }

    #[test]
    fn test_flac_drops_comments_and_pictures() {
        let streaminfo = [7u8; 34];
        let mut input = b"fLaC".to_vec();
        input.extend(flac_block(FLAC_STREAMINFO, false, &streaminfo));
        input.extend(flac_block(4, false, b"vendor+ARTIST=someone"));
        input.extend(flac_block(FLAC_SEEKTABLE, false, &[0; 18]));
        input.extend(flac_block(6, true, b"jpegbytes"));
        input.extend_from_slice(&[0xFF, 0xF8, 9, 9]);

        let out = strip_audio(&input).unwrap();

        let mut expected = b"fLaC".to_vec();
        expected.extend(flac_block(FLAC_STREAMINFO, false, &streaminfo));
        expected.extend(flac_block(FLAC_SEEKTABLE, true, &[0; 18]));
        expected.extend_from_slice(&[0xFF, 0xF8, 9, 9]);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_flac_behind_id3_is_detected() {
        let mut input = id3v2(b"junk");
        input.extend_from_slice(b"fLaC");
        input.extend(flac_block(FLAC_STREAMINFO, true, &[1; 34]));

        let out = strip_audio(&input).unwrap();
        assert!(out.starts_with(b"fLaC"));
        assert_eq!(out.len(), 4 + 4 + 34);
    }

    #[test]
    fn test_unknown_signature() {
        assert!(strip_audio(b"OggS....").is_err());
    }

    #[test]
    fn test_stripper_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.mp3");
        let mut data = id3v2(b"TALB\0\0\0\x03\0\0abc");
        data.extend_from_slice(FRAMES);
        fs::write(&input, &data).unwrap();

        AudioStripper.strip(&input, &input).unwrap();
        assert_eq!(fs::read(&input).unwrap(), FRAMES);
    }
}

//! ID3v2.3 tag writer
//!
//! Builds the tag by hand because the layout mixes two integer encodings
//! and two text encodings in ways general-purpose tag libraries keep
//! getting subtly wrong for v2.3:
//!
//! - The tag-level size (header bytes 6-9) is **synchsafe**: 7 bits per
//!   byte, top bit always clear.
//! - Frame-level sizes (frame bytes 4-7) are **plain big-endian** u32.
//! - TIT2/TCON text is UTF-8 (encoding byte 0x03); TYER and the APIC
//!   MIME/description strings are Latin-1 (encoding byte 0x00).
//!
//! Layout: `[10-byte tag header][frames][audio bytes verbatim]`.

use chrono::Datelike;

/// Tag header length (also the offset of the first frame)
const TAG_HEADER_LEN: usize = 10;

/// Frame header length: 4-byte id, 4-byte size, 2 flag bytes
const FRAME_HEADER_LEN: usize = 10;

/// Text encoding byte for Latin-1
const ENCODING_LATIN1: u8 = 0x00;

/// Text encoding byte for UTF-8
const ENCODING_UTF8: u8 = 0x03;

/// APIC picture type for front cover art
const PICTURE_TYPE_FRONT_COVER: u8 = 0x03;

/// MIME type written into every APIC frame
const APIC_MIME: &str = "image/jpeg";

/// Description written into every APIC frame
const APIC_DESCRIPTION: &str = "Cover";

/// Genre written into the TCON frame, regardless of mode
const GENRE: &str = "Nightcore";

/// One frame: 4-character id plus raw payload
struct Id3Frame {
    id: [u8; 4],
    payload: Vec<u8>,
}

/// An ID3v2.3 tag under construction
///
/// Frames are emitted in insertion order; the tag is consumed by
/// [`into_bytes`](Id3Tag::into_bytes), which prepends the header and
/// appends the audio stream untouched.
pub struct Id3Tag {
    frames: Vec<Id3Frame>,
}

impl Id3Tag {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Append a UTF-8 text frame (encoding byte 0x03)
    pub fn text_utf8(&mut self, id: [u8; 4], text: &str) {
        let mut payload = Vec::with_capacity(1 + text.len());
        payload.push(ENCODING_UTF8);
        payload.extend_from_slice(text.as_bytes());
        self.frames.push(Id3Frame { id, payload });
    }

    /// Append a Latin-1 text frame (encoding byte 0x00)
    pub fn text_latin1(&mut self, id: [u8; 4], text: &str) {
        let mut payload = Vec::with_capacity(1 + text.len());
        payload.push(ENCODING_LATIN1);
        push_latin1(&mut payload, text);
        self.frames.push(Id3Frame { id, payload });
    }

    /// Append an APIC front-cover frame wrapping `jpeg` bytes
    ///
    /// Payload: encoding byte, MIME + terminator, picture type,
    /// description + terminator, then the raw image.
    pub fn picture(&mut self, jpeg: &[u8]) {
        let mut payload =
            Vec::with_capacity(3 + APIC_MIME.len() + APIC_DESCRIPTION.len() + 2 + jpeg.len());
        payload.push(ENCODING_LATIN1);
        push_latin1(&mut payload, APIC_MIME);
        payload.push(0x00);
        payload.push(PICTURE_TYPE_FRONT_COVER);
        push_latin1(&mut payload, APIC_DESCRIPTION);
        payload.push(0x00);
        payload.extend_from_slice(jpeg);
        self.frames.push(Id3Frame { id: *b"APIC", payload });
    }

    /// Total size of all frames including their headers
    fn frames_len(&self) -> usize {
        self.frames
            .iter()
            .map(|f| FRAME_HEADER_LEN + f.payload.len())
            .sum()
    }

    /// Serialize the tag and append the audio stream verbatim
    pub fn into_bytes(self, audio: &[u8]) -> Vec<u8> {
        let frames_len = self.frames_len();
        // The synchsafe field holds 28 significant bits.
        debug_assert!(frames_len < (1 << 28), "ID3 frames exceed synchsafe range");

        let mut out = Vec::with_capacity(TAG_HEADER_LEN + frames_len + audio.len());

        out.extend_from_slice(b"ID3");
        out.push(0x03); // version 2.3.0
        out.push(0x00);
        out.push(0x00); // flags
        out.extend_from_slice(&synchsafe_bytes(frames_len as u32));

        for frame in &self.frames {
            out.extend_from_slice(&frame.id);
            // Frame sizes are ordinary big-endian in v2.3, not synchsafe.
            out.extend_from_slice(&(frame.payload.len() as u32).to_be_bytes());
            out.extend_from_slice(&[0x00, 0x00]);
            out.extend_from_slice(&frame.payload);
        }

        out.extend_from_slice(audio);
        out
    }
}

impl Default for Id3Tag {
    fn default() -> Self {
        Self::new()
    }
}

/// Prepend the standard Nocturne tag to an MP3 stream
///
/// Frames in order: TIT2 (title, UTF-8), TCON ("Nightcore", UTF-8), TYER
/// (current year, Latin-1), and APIC when artwork is present. The MP3
/// bytes follow unchanged.
pub fn attach_id3(mp3_bytes: &[u8], title: &str, artwork: Option<&[u8]>) -> Vec<u8> {
    let mut tag = Id3Tag::new();
    tag.text_utf8(*b"TIT2", title);
    tag.text_utf8(*b"TCON", GENRE);
    tag.text_latin1(*b"TYER", &chrono::Local::now().year().to_string());
    if let Some(jpeg) = artwork {
        tag.picture(jpeg);
    }
    tag.into_bytes(mp3_bytes)
}

/// Encode the 28-bit value into 4 synchsafe bytes, 7 bits each
fn synchsafe_bytes(size: u32) -> [u8; 4] {
    [
        ((size >> 21) & 0x7F) as u8,
        ((size >> 14) & 0x7F) as u8,
        ((size >> 7) & 0x7F) as u8,
        (size & 0x7F) as u8,
    ]
}

/// Append `text` as Latin-1 bytes; characters above U+00FF become '?'
fn push_latin1(out: &mut Vec<u8>, text: &str) {
    for c in text.chars() {
        out.push(if (c as u32) <= 0xFF { c as u8 } else { b'?' });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn decode_synchsafe(bytes: &[u8]) -> u32 {
        ((bytes[0] as u32) << 21)
            | ((bytes[1] as u32) << 14)
            | ((bytes[2] as u32) << 7)
            | (bytes[3] as u32)
    }

    #[test]
    fn test_tag_size_is_synchsafe() {
        // One frame with a 290-byte payload gives exactly 300 bytes of
        // frames (10-byte header + payload).
        let mut tag = Id3Tag::new();
        tag.text_utf8(*b"TIT2", &"x".repeat(289));
        let out = tag.into_bytes(&[]);

        for &b in &out[6..10] {
            assert_eq!(b & 0x80, 0, "synchsafe bytes must have the top bit clear");
        }
        assert_eq!(decode_synchsafe(&out[6..10]), 300);
        assert_eq!(out[6..10], [0, 0, 2, 44]);
    }

    #[test]
    fn test_frame_size_is_plain_big_endian() {
        // 19 title bytes plus the encoding byte: payload length 20.
        let mut tag = Id3Tag::new();
        tag.text_utf8(*b"TIT2", "0123456789012345678");
        let out = tag.into_bytes(&[]);

        assert_eq!(&out[10..14], b"TIT2");
        assert_eq!(&out[14..18], &[0, 0, 0, 20]);
        assert_eq!(&out[18..20], &[0, 0]);
    }

    #[test]
    fn test_tag_header_version_and_flags() {
        let out = attach_id3(b"", "t", None);
        assert_eq!(&out[0..3], b"ID3");
        assert_eq!(out[3], 0x03);
        assert_eq!(out[4], 0x00);
        assert_eq!(out[5], 0x00);
    }

    #[test]
    fn test_frames_in_order_and_audio_verbatim() {
        let audio = b"\xFF\xFBMPEGDATA";
        let art = [0xFF, 0xD8, 0xFF, 0xE0, 0x01];
        let out = attach_id3(audio, "Song", Some(&art));

        let tit2 = find(&out, b"TIT2").unwrap();
        let tcon = find(&out, b"TCON").unwrap();
        let tyer = find(&out, b"TYER").unwrap();
        let apic = find(&out, b"APIC").unwrap();
        assert_eq!(tit2, TAG_HEADER_LEN);
        assert!(tit2 < tcon && tcon < tyer && tyer < apic);

        assert!(out.ends_with(audio));

        // Tag size covers exactly the frames: header + frames + audio.
        let frames_len = decode_synchsafe(&out[6..10]) as usize;
        assert_eq!(out.len(), TAG_HEADER_LEN + frames_len + audio.len());
    }

    #[test]
    fn test_title_is_utf8_with_encoding_byte() {
        let out = attach_id3(b"", "Tëst", None);
        let pos = find(&out, b"TIT2").unwrap();
        let size = u32::from_be_bytes(out[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let payload = &out[pos + 10..pos + 10 + size];
        assert_eq!(payload[0], 0x03);
        assert_eq!(&payload[1..], "Tëst".as_bytes());
    }

    #[test]
    fn test_genre_is_fixed_nightcore() {
        let out = attach_id3(b"", "t", None);
        let pos = find(&out, b"TCON").unwrap();
        let payload = &out[pos + 10..pos + 10 + 10];
        assert_eq!(payload[0], 0x03);
        assert_eq!(&payload[1..], b"Nightcore");
    }

    #[test]
    fn test_year_is_latin1_current_year() {
        let out = attach_id3(b"", "t", None);
        let pos = find(&out, b"TYER").unwrap();
        let size = u32::from_be_bytes(out[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let payload = &out[pos + 10..pos + 10 + size];

        let year = chrono::Local::now().year().to_string();
        assert_eq!(payload[0], 0x00, "TYER must be Latin-1 encoded");
        assert_eq!(&payload[1..], year.as_bytes());
    }

    #[test]
    fn test_apic_payload_layout() {
        let art = [0x01, 0x02, 0x03];
        let out = attach_id3(b"", "t", Some(&art));
        let pos = find(&out, b"APIC").unwrap();
        let size = u32::from_be_bytes(out[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let payload = &out[pos + 10..pos + 10 + size];

        let mut expected = vec![0x00];
        expected.extend_from_slice(b"image/jpeg");
        expected.push(0x00);
        expected.push(0x03);
        expected.extend_from_slice(b"Cover");
        expected.push(0x00);
        expected.extend_from_slice(&art);
        assert_eq!(payload, expected.as_slice());
    }

    #[test]
    fn test_missing_artwork_omits_apic() {
        let out = attach_id3(b"audio", "t", None);
        assert!(find(&out, b"APIC").is_none());
    }

    #[test]
    fn test_latin1_replaces_wide_chars() {
        let mut out = Vec::new();
        push_latin1(&mut out, "a\u{0151}b"); // ő is outside Latin-1
        assert_eq!(out, b"a?b");
    }
}

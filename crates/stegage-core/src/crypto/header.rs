//! Textual ciphertext header.
//!
//! The header follows the age v1 layout with a single scrypt stanza:
//!
//! ```text
//! age-encryption.org/v1
//! -> scrypt <base64 salt> <work factor>
//! <base64 wrapped file key, wrapped at 64 columns>
//! --- <base64 HMAC-SHA256>
//! ```
//!
//! The MAC covers every byte from the start of the header through `---`.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::MAGIC;
use crate::crypto::key::{DerivedKey, FILE_KEY_LEN, SALT_LEN};
use crate::error::{Result, StegageError};

type HmacSha256 = Hmac<Sha256>;

/// First line of every header.
pub const VERSION_LINE: &[u8] = b"age-encryption.org/v1";

/// Poly1305 tag length.
pub const TAG_LEN: usize = 16;

/// Sealed file key inside the scrypt stanza body.
pub const WRAPPED_KEY_LEN: usize = FILE_KEY_LEN + TAG_LEN;

/// Header MAC length.
pub const MAC_LEN: usize = 32;

const STANZA_PREFIX: &[u8] = b"-> ";
const MAC_PREFIX: &[u8] = b"---";
const SCRYPT_TAG: &[u8] = b"scrypt";
const COLUMNS_PER_LINE: usize = 64;

/// The scrypt recipient stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScryptStanza {
    pub salt: [u8; SALT_LEN],
    pub work_factor: u8,
    pub wrapped_key: [u8; WRAPPED_KEY_LEN],
}

impl ScryptStanza {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(STANZA_PREFIX);
        out.extend_from_slice(SCRYPT_TAG);
        out.push(b' ');
        out.extend_from_slice(STANDARD_NO_PAD.encode(self.salt).as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.work_factor.to_string().as_bytes());
        out.push(b'\n');

        let body = STANDARD_NO_PAD.encode(self.wrapped_key);
        for line in body.as_bytes().chunks(COLUMNS_PER_LINE) {
            out.extend_from_slice(line);
            out.push(b'\n');
        }
        // The last body line must be short, so a full one is followed by an empty line.
        if body.len() % COLUMNS_PER_LINE == 0 {
            out.push(b'\n');
        }
    }
}

/// Header bytes covered by the MAC.
fn header_without_mac(stanza: &ScryptStanza) -> Vec<u8> {
    let mut out = Vec::with_capacity(160);
    out.extend_from_slice(VERSION_LINE);
    out.push(b'\n');
    stanza.write(&mut out);
    out.extend_from_slice(MAC_PREFIX);
    out
}

/// Serialize the full header, MAC line included.
pub(crate) fn encode_header(stanza: &ScryptStanza, mac_key: &DerivedKey) -> Result<Vec<u8>> {
    let mut out = header_without_mac(stanza);
    let mac = compute_mac(mac_key, &out)?;
    out.push(b' ');
    out.extend_from_slice(STANDARD_NO_PAD.encode(mac).as_bytes());
    out.push(b'\n');
    Ok(out)
}

/// Encoded header length for a given work factor.
pub(crate) fn header_len(work_factor: u8) -> usize {
    let stanza = ScryptStanza {
        salt: [0u8; SALT_LEN],
        work_factor,
        wrapped_key: [0u8; WRAPPED_KEY_LEN],
    };
    header_without_mac(&stanza).len() + 1 + STANDARD_NO_PAD.encode([0u8; MAC_LEN]).len() + 1
}

fn new_mac(key: &DerivedKey) -> Result<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(key.as_bytes())
        .map_err(|e| StegageError::KeyDerivationFailed(format!("Invalid MAC key: {}", e)))
}

pub(crate) fn compute_mac(key: &DerivedKey, data: &[u8]) -> Result<[u8; MAC_LEN]> {
    let mut mac = new_mac(key)?;
    mac.update(data);
    let tag = mac.finalize().into_bytes();
    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(&tag);
    Ok(out)
}

/// Constant-time MAC check.
pub(crate) fn verify_mac(key: &DerivedKey, data: &[u8], expected: &[u8; MAC_LEN]) -> Result<()> {
    let mut mac = new_mac(key)?;
    mac.update(data);
    mac.verify_slice(expected)
        .map_err(|_| StegageError::AuthenticationFailed)
}

/// A header parsed out of a blob.
#[derive(Debug)]
pub(crate) struct ParsedHeader<'a> {
    pub stanza: ScryptStanza,
    /// Bytes the MAC is computed over
    pub mac_input: &'a [u8],
    pub mac: [u8; MAC_LEN],
    /// Offset of the first payload byte
    pub len: usize,
}

struct RawStanza<'a> {
    tag: &'a [u8],
    args: Vec<&'a [u8]>,
    body: Vec<u8>,
}

struct Lines<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Next line without its newline, plus its start offset.
    fn next_line(&mut self) -> Result<(usize, &'a [u8])> {
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| malformed("unexpected end of header"))?;
        let start = self.pos;
        self.pos += end + 1;
        Ok((start, &rest[..end]))
    }
}

fn malformed(message: &str) -> StegageError {
    StegageError::MalformedHeader(message.to_string())
}

fn decode_base64(data: &[u8], what: &str) -> Result<Vec<u8>> {
    STANDARD_NO_PAD
        .decode(data)
        .map_err(|_| malformed(&format!("invalid base64 in {}", what)))
}

fn is_valid_arg(arg: &[u8]) -> bool {
    !arg.is_empty() && arg.iter().all(|b| (33..=126).contains(b))
}

fn parse_stanza<'a>(line: &'a [u8], lines: &mut Lines<'a>) -> Result<RawStanza<'a>> {
    let mut parts = line[STANZA_PREFIX.len()..].split(|&b| b == b' ');
    let tag = parts.next().unwrap_or_default();
    let args: Vec<&[u8]> = parts.collect();
    if !is_valid_arg(tag) || !args.iter().all(|arg| is_valid_arg(arg)) {
        return Err(malformed("invalid stanza arguments"));
    }

    let mut encoded = Vec::new();
    loop {
        let (_, body_line) = lines.next_line()?;
        if body_line.len() > COLUMNS_PER_LINE {
            return Err(malformed("stanza body line too long"));
        }
        encoded.extend_from_slice(body_line);
        if body_line.len() < COLUMNS_PER_LINE {
            break;
        }
    }
    let body = decode_base64(&encoded, "stanza body")?;

    Ok(RawStanza { tag, args, body })
}

fn parse_work_factor(arg: &[u8]) -> Result<u8> {
    let is_decimal = !arg.is_empty() && arg.iter().all(u8::is_ascii_digit) && arg[0] != b'0';
    if !is_decimal || arg.len() > 2 {
        return Err(malformed("invalid scrypt work factor"));
    }
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<u8>().ok())
        .ok_or_else(|| malformed("invalid scrypt work factor"))
}

fn scrypt_stanza(raw: &RawStanza<'_>) -> Result<ScryptStanza> {
    if raw.args.len() != 2 {
        return Err(malformed("scrypt stanza needs a salt and a work factor"));
    }

    let salt_bytes = decode_base64(raw.args[0], "scrypt salt")?;
    let salt: [u8; SALT_LEN] = salt_bytes
        .as_slice()
        .try_into()
        .map_err(|_| malformed("scrypt salt has the wrong length"))?;

    let work_factor = parse_work_factor(raw.args[1])?;

    let wrapped_key: [u8; WRAPPED_KEY_LEN] = raw
        .body
        .as_slice()
        .try_into()
        .map_err(|_| malformed("wrapped file key has the wrong length"))?;

    Ok(ScryptStanza {
        salt,
        work_factor,
        wrapped_key,
    })
}

/// Parse the header at the start of `blob`.
///
/// Only structure is checked here. The MAC is verified by the engine once the
/// file key has been unwrapped.
pub(crate) fn parse_header(blob: &[u8]) -> Result<ParsedHeader<'_>> {
    if !blob.starts_with(MAGIC) {
        return Err(malformed("unrecognized magic"));
    }

    let mut lines = Lines::new(blob);
    let (_, first) = lines.next_line()?;
    if first != VERSION_LINE {
        return Err(malformed("unsupported format version"));
    }

    let mut stanzas = Vec::new();
    let (mac_start, mac_line) = loop {
        let (start, line) = lines.next_line()?;
        if line.starts_with(STANZA_PREFIX) {
            stanzas.push(parse_stanza(line, &mut lines)?);
        } else if line.starts_with(MAC_PREFIX) {
            break (start, line);
        } else {
            return Err(malformed("unexpected header line"));
        }
    };

    let scrypt_count = stanzas.iter().filter(|s| s.tag == SCRYPT_TAG).count();
    let stanza = match (scrypt_count, stanzas.len()) {
        (1, 1) => scrypt_stanza(&stanzas[0])?,
        (0, _) => return Err(malformed("no passphrase stanza")),
        _ => return Err(malformed("scrypt stanza must be the only stanza")),
    };

    let mac_encoded = mac_line
        .strip_prefix(b"--- ".as_slice())
        .ok_or_else(|| malformed("missing header MAC"))?;
    let mac: [u8; MAC_LEN] = decode_base64(mac_encoded, "header MAC")?
        .as_slice()
        .try_into()
        .map_err(|_| malformed("header MAC has the wrong length"))?;

    Ok(ParsedHeader {
        stanza,
        mac_input: &blob[..mac_start + MAC_PREFIX.len()],
        mac,
        len: lines.pos,
    })
}

//! The bit-exact wire codec for [`PprfKey`]. All integers are unsigned
//! 64-bit, big-endian, on both the write and the read path.

use crate::{
    pprf::key::{PprfKey, SecretRoot},
    secret::SecretBytes,
    tag::MAX_TAG_LEN,
    PkwError,
};

use byteorder::{BigEndian, ByteOrder};

pub(crate) fn serialize(key: &PprfKey) -> SecretBytes {
    let key_bytes = key.key_len / 8;
    let body_len: usize = key
        .nodes
        .iter()
        .map(|node| 8 + node.prefix().len() + key_bytes)
        .sum();
    let mut out = Vec::with_capacity(32 + body_len);

    put_u64(&mut out, key.tag_len as u64);
    put_u64(&mut out, key.key_len as u64);
    put_u64(&mut out, key.puncs);
    put_u64(&mut out, key.nodes.len() as u64);
    for node in &key.nodes {
        put_u64(&mut out, node.prefix().len() as u64);
        out.extend_from_slice(node.prefix().as_bytes());
        out.extend_from_slice(node.value().as_slice());
    }

    SecretBytes::from(out)
}

pub(crate) fn deserialize(bytes: &[u8]) -> Result<PprfKey, PkwError> {
    let mut reader = Reader { buf: bytes, pos: 0 };

    let tag_len = reader.read_u64()?;
    let key_len = reader.read_u64()?;
    let puncs = reader.read_u64()?;
    let n_nodes = reader.read_u64()?;

    if key_len == 0 || key_len % 8 != 0 {
        return Err(PkwError::PprfDeserialization);
    }
    if tag_len == 0 || tag_len > MAX_TAG_LEN as u64 {
        return Err(PkwError::PprfDeserialization);
    }
    let key_bytes = (key_len / 8) as usize;

    // No preallocation from the declared count; a lying count fails the
    // exact-consumption check below instead
    let mut nodes = Vec::new();
    for _ in 0..n_nodes {
        let prefix_len = reader.read_u64()?;
        let prefix_bytes = reader.read_bytes(prefix_len)?;
        if !prefix_bytes.iter().all(|&b| b == b'0' || b == b'1') {
            return Err(PkwError::PprfDeserialization);
        }
        let prefix: String = prefix_bytes.iter().map(|&b| b as char).collect();

        let value = reader.read_bytes(key_bytes as u64)?;
        nodes.push(SecretRoot::new(
            prefix,
            SecretBytes::from(value.to_vec()),
        ));
    }

    // The declared sizes must consume the buffer exactly
    if reader.pos != bytes.len() {
        return Err(PkwError::PprfDeserialization);
    }

    Ok(PprfKey::from_parts(
        key_len as usize,
        tag_len as usize,
        puncs,
        nodes,
    ))
}

fn put_u64(out: &mut Vec<u8>, val: u64) {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, val);
    out.extend_from_slice(&buf);
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn read_u64(&mut self) -> Result<u64, PkwError> {
        let bytes = self.read_bytes(8)?;
        Ok(BigEndian::read_u64(bytes))
    }

    fn read_bytes(&mut self, len: u64) -> Result<&'a [u8], PkwError> {
        let remaining = (self.buf.len() - self.pos) as u64;
        if remaining < len {
            return Err(PkwError::PprfDeserialization);
        }
        let len = len as usize;
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}

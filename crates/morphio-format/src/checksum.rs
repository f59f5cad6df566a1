//! Jenkins lookup3 `hashlittle`, the checksum HDF5 puts on v2 metadata.

use byteorder::{ByteOrder, LittleEndian};

/// Checksum of `data` as stored in v2 superblocks and object headers.
pub fn jenkins_lookup3(data: &[u8]) -> u32 {
    hashlittle(data, 0)
}

fn mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    for (k_ac, k_ba, k_cb) in [(4, 6, 8), (16, 19, 4)] {
        *a = a.wrapping_sub(*c) ^ c.rotate_left(k_ac);
        *c = c.wrapping_add(*b);
        *b = b.wrapping_sub(*a) ^ a.rotate_left(k_ba);
        *a = a.wrapping_add(*c);
        *c = c.wrapping_sub(*b) ^ b.rotate_left(k_cb);
        *b = b.wrapping_add(*a);
    }
}

fn final_mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *c = (*c ^ *b).wrapping_sub(b.rotate_left(14));
    *a = (*a ^ *c).wrapping_sub(c.rotate_left(11));
    *b = (*b ^ *a).wrapping_sub(a.rotate_left(25));
    *c = (*c ^ *b).wrapping_sub(b.rotate_left(16));
    *a = (*a ^ *c).wrapping_sub(c.rotate_left(4));
    *b = (*b ^ *a).wrapping_sub(a.rotate_left(14));
    *c = (*c ^ *b).wrapping_sub(b.rotate_left(24));
}

fn add_block(block: &[u8], a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_add(LittleEndian::read_u32(&block[0..4]));
    *b = b.wrapping_add(LittleEndian::read_u32(&block[4..8]));
    *c = c.wrapping_add(LittleEndian::read_u32(&block[8..12]));
}

fn hashlittle(data: &[u8], initval: u32) -> u32 {
    let seed = 0xdead_beef_u32
        .wrapping_add(data.len() as u32)
        .wrapping_add(initval);
    let (mut a, mut b, mut c) = (seed, seed, seed);

    let mut rest = data;
    while rest.len() > 12 {
        add_block(&rest[..12], &mut a, &mut b, &mut c);
        mix(&mut a, &mut b, &mut c);
        rest = &rest[12..];
    }
    if rest.is_empty() {
        return c;
    }

    // the byte-wise tail cases are equivalent to a zero-padded final block
    let mut tail = [0u8; 12];
    tail[..rest.len()].copy_from_slice(rest);
    add_block(&tail, &mut a, &mut b, &mut c);
    final_mix(&mut a, &mut b, &mut c);
    c
}

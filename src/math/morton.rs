//! Morton encoding (Z-order curve) for octree layer keys
//!
//! Codes interleave x, y, z bits as `..z1y1x1 z0y0x0`, so appending three bits
//! selects a child octant and dropping three bits yields the parent.

/// Morton key of a cell within one octree layer
pub type MortonCode = u64;

/// Largest coordinate representable per axis (21 bits)
pub const MAX_COORD: u32 = (1 << 21) - 1;

/// Spread bits of a 21-bit integer into every third bit of a 64-bit integer
fn spread_bits(x: u32) -> u64 {
    let mut x = x as u64 & 0x1fffff; // 21 bits max
    x = (x | (x << 32)) & 0x1f00000000ffff;
    x = (x | (x << 16)) & 0x1f0000ff0000ff;
    x = (x | (x << 8)) & 0x100f00f00f00f00f;
    x = (x | (x << 4)) & 0x10c30c30c30c30c3;
    x = (x | (x << 2)) & 0x1249249249249249;
    x
}

/// Compact every third bit of a 64-bit integer into a 21-bit integer
fn compact_bits(x: u64) -> u32 {
    let mut x = x & 0x1249249249249249;
    x = (x | (x >> 2)) & 0x10c30c30c30c30c3;
    x = (x | (x >> 4)) & 0x100f00f00f00f00f;
    x = (x | (x >> 8)) & 0x1f0000ff0000ff;
    x = (x | (x >> 16)) & 0x1f00000000ffff;
    x = (x | (x >> 32)) & 0x1fffff;
    x as u32
}

/// Encode 3D coordinates into a Morton code.
/// Each coordinate must fit in 21 bits (0..=2097151).
pub fn encode_morton_3d(x: u32, y: u32, z: u32) -> MortonCode {
    debug_assert!(
        x <= MAX_COORD && y <= MAX_COORD && z <= MAX_COORD,
        "Morton input ({}, {}, {}) exceeds 21 bits", x, y, z
    );
    spread_bits(x) | (spread_bits(y) << 1) | (spread_bits(z) << 2)
}

/// Decode Morton code back to 3D coordinates
pub fn decode_morton_3d(code: MortonCode) -> (u32, u32, u32) {
    (
        compact_bits(code),
        compact_bits(code >> 1),
        compact_bits(code >> 2),
    )
}

/// Code of child `octant` (0-7, bit 0=x, bit 1=y, bit 2=z) one layer down
#[inline]
pub fn child_code(parent: MortonCode, octant: u8) -> MortonCode {
    debug_assert!(octant < 8);
    (parent << 3) | octant as MortonCode
}

/// Code of the containing cell one layer up
#[inline]
pub fn parent_code(code: MortonCode) -> MortonCode {
    code >> 3
}

/// Which octant of its parent this code occupies
#[inline]
pub fn octant_of(code: MortonCode) -> u8 {
    (code & 7) as u8
}

//! 3D Morton (Z-order) codes for up to 21 bits per axis.
//!
//! Child index at every octree level is `x << 2 | y << 1 | z`.

fn spread(value: u32) -> u64 {
    let mut v = value as u64 & 0x1f_ffff;
    v = (v | (v << 32)) & 0x1f_0000_0000_ffff;
    v = (v | (v << 16)) & 0x1f_0000_ff00_00ff;
    v = (v | (v << 8)) & 0x100f_00f0_0f00_f00f;
    v = (v | (v << 4)) & 0x10c3_0c30_c30c_30c3;
    v = (v | (v << 2)) & 0x1249_2492_4924_9249;
    v
}

fn compact(code: u64) -> u32 {
    let mut v = code & 0x1249_2492_4924_9249;
    v = (v | (v >> 2)) & 0x10c3_0c30_c30c_30c3;
    v = (v | (v >> 4)) & 0x100f_00f0_0f00_f00f;
    v = (v | (v >> 8)) & 0x1f_0000_ff00_00ff;
    v = (v | (v >> 16)) & 0x1f_0000_0000_ffff;
    v = (v | (v >> 32)) & 0x1f_ffff;
    v as u32
}

pub(crate) fn encode(x: u32, y: u32, z: u32) -> u64 {
    (spread(x) << 2) | (spread(y) << 1) | spread(z)
}

pub(crate) fn decode(code: u64) -> [u32; 3] {
    [compact(code >> 2), compact(code >> 1), compact(code)]
}

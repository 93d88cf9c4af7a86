use contracts::Rgba;
use detector::class_index;

pub const PALETTE: [&str; 16] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E9", "#F8C471", "#82E0AA", "#F1948A", "#85C1E9", "#F4D03F", "#A569BD",
];

/// Stable color for a label.
///
/// COCO labels use their class index; anything else is hashed (FNV-1a) so the
/// same remote label always gets the same color.
pub fn color_for(label: &str) -> Rgba {
    let index = class_index(label).unwrap_or_else(|| fnv1a(label) as usize);
    palette_color(index)
}

pub fn palette_color(index: usize) -> Rgba {
    Rgba::from_hex(PALETTE[index % PALETTE.len()]).unwrap_or(Rgba::WHITE)
}

fn fnv1a(s: &str) -> u32 {
    s.bytes().fold(0x811c_9dc5u32, |hash, b| {
        (hash ^ b as u32).wrapping_mul(0x0100_0193)
    })
}

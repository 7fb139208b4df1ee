//! DevSleuth application icon generator.
//!
//! Produces a procedural icon: a small device tree (one root chip wired to
//! two child chips) with a magnifying-glass ring over the right child.
//! Rendered at any resolution as RGBA pixel data for the window icon.

/// Generate a DevSleuth icon as egui `IconData`.
pub fn generate_icon(size: u32) -> egui::IconData {
    egui::IconData {
        rgba: render_icon(size),
        width: size,
        height: size,
    }
}

/// Rounded box in unit coordinates: centre, half extents, corner radius.
struct Chip {
    cx: f32,
    cy: f32,
    hw: f32,
    hh: f32,
    color: [u8; 3],
}

const ROOT: Chip = Chip {
    cx: 0.5,
    cy: 0.22,
    hw: 0.17,
    hh: 0.12,
    color: [0x4f, 0xc1, 0xb6],
};
const LEFT: Chip = Chip {
    cx: 0.24,
    cy: 0.72,
    hw: 0.14,
    hh: 0.10,
    color: [0x7d, 0xa7, 0xd9],
};
const RIGHT: Chip = Chip {
    cx: 0.72,
    cy: 0.70,
    hw: 0.14,
    hh: 0.10,
    color: [0xe0, 0xa4, 0x58],
};

const WIRE: [u8; 3] = [0x8c, 0x99, 0xa6];
const RING: [u8; 3] = [0xdc, 0xe2, 0xe8];

/// Render the icon into an RGBA pixel buffer (top-to-bottom row order).
pub fn render_icon(size: u32) -> Vec<u8> {
    let s = size as f32;
    let mut pixels = vec![0u8; (size * size * 4) as usize];

    let corner = 0.04 * s;
    let wire_half = (0.025 * s).max(0.6);
    let bus_y = 0.47 * s;
    let ring_radius = 0.2 * s;
    let ring_half = (0.03 * s).max(0.7);

    for y in 0..size {
        for x in 0..size {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let mut rgb = [0u8; 3];
            let mut alpha = 0.0f32;

            // Wires: root down to the bus, bus across, bus down to each child.
            let wires = [
                (ROOT.cx * s, ROOT.cy * s, ROOT.cx * s, bus_y),
                (LEFT.cx * s, bus_y, RIGHT.cx * s, bus_y),
                (LEFT.cx * s, bus_y, LEFT.cx * s, LEFT.cy * s),
                (RIGHT.cx * s, bus_y, RIGHT.cx * s, RIGHT.cy * s),
            ];
            for (ax, ay, bx, by) in wires {
                let cover = coverage(segment_dist(px, py, ax, ay, bx, by) - wire_half);
                blend(&mut rgb, &mut alpha, WIRE, cover);
            }

            for chip in [&ROOT, &LEFT, &RIGHT] {
                let d = rounded_box_dist(
                    px - chip.cx * s,
                    py - chip.cy * s,
                    chip.hw * s,
                    chip.hh * s,
                    corner,
                );
                blend(&mut rgb, &mut alpha, chip.color, coverage(d));
            }

            // Lens ring over the right child.
            let dx = px - RIGHT.cx * s;
            let dy = py - RIGHT.cy * s;
            let ring_d = ((dx * dx + dy * dy).sqrt() - ring_radius).abs() - ring_half;
            blend(&mut rgb, &mut alpha, RING, coverage(ring_d));

            let idx = ((y * size + x) * 4) as usize;
            pixels[idx..idx + 3].copy_from_slice(&rgb);
            pixels[idx + 3] = (alpha * 255.0).clamp(0.0, 255.0) as u8;
        }
    }

    pixels
}

// ── Helpers ─────────────────────────────────────────────────────

/// Anti-aliased coverage of a signed distance (negative = inside).
fn coverage(d: f32) -> f32 {
    (0.5 - d).clamp(0.0, 1.0)
}

/// Paint `color` over the pixel with opacity `cover`.
fn blend(rgb: &mut [u8; 3], alpha: &mut f32, color: [u8; 3], cover: f32) {
    if cover <= 0.0 {
        return;
    }
    for (dst, src) in rgb.iter_mut().zip(color) {
        *dst = (*dst as f32 * (1.0 - cover) + src as f32 * cover) as u8;
    }
    *alpha += (1.0 - *alpha) * cover;
}

fn rounded_box_dist(dx: f32, dy: f32, hw: f32, hh: f32, r: f32) -> f32 {
    let qx = dx.abs() - (hw - r);
    let qy = dy.abs() - (hh - r);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - r
}

/// Distance from a point to a line segment.
fn segment_dist(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let abx = bx - ax;
    let aby = by - ay;
    let len_sq = abx * abx + aby * aby;
    if len_sq < 0.0001 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    let t = (((px - ax) * abx + (py - ay) * aby) / len_sq).clamp(0.0, 1.0);
    ((px - (ax + t * abx)).powi(2) + (py - (ay + t * aby)).powi(2)).sqrt()
}

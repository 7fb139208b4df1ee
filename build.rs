//! Build script: writes `assets/icon.ico` when missing and, on Windows,
//! embeds the application manifest and icon resource.

use std::path::Path;

const ICON_PATH: &str = "assets/icon.ico";

/// Frame sizes stored in the ICO, largest first.
const ICON_SIZES: [u32; 3] = [48, 32, 16];

/// Runs asInvoker with per-monitor DPI awareness.
const MANIFEST: &str = r#"
<assembly xmlns="urn:schemas-microsoft-com:asm.v1" manifestVersion="1.0">
  <trustInfo xmlns="urn:schemas-microsoft-com:asm.v3">
    <security>
      <requestedPrivileges>
        <requestedExecutionLevel level="asInvoker" uiAccess="false"/>
      </requestedPrivileges>
    </security>
  </trustInfo>
  <compatibility xmlns="urn:schemas-microsoft-com:compatibility.v1">
    <application>
      <supportedOS Id="{8e0f7a12-bfb3-4fe8-b9a5-48fd50a15a9a}"/>
    </application>
  </compatibility>
  <application xmlns="urn:schemas-microsoft-com:asm.v3">
    <windowsSettings>
      <dpiAware xmlns="http://schemas.microsoft.com/SMI/2005/WindowsSettings">true/pm</dpiAware>
      <dpiAwareness xmlns="http://schemas.microsoft.com/SMI/2016/WindowsSettings">PerMonitorV2</dpiAwareness>
    </windowsSettings>
  </application>
</assembly>
"#;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if !Path::new(ICON_PATH).exists() {
        let written = std::fs::create_dir_all("assets")
            .and_then(|()| std::fs::write(ICON_PATH, encode_ico(&ICON_SIZES)));
        if let Err(e) = written {
            println!("cargo:warning=Could not write {ICON_PATH}: {e}");
        }
    }

    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }
    let mut res = winresource::WindowsResource::new();
    res.set_manifest(MANIFEST);
    if Path::new(ICON_PATH).exists() {
        res.set_icon(ICON_PATH);
    }
    if let Err(e) = res.compile() {
        println!("cargo:warning=Windows resources not embedded: {e}");
    }
}

// ── ICO container ────────────────────────────────────────────────────

/// Bytes per ICONDIR header and per ICONDIRENTRY.
const ICONDIR_LEN: usize = 6;
const ICONDIRENTRY_LEN: usize = 16;

/// Encode one rendered frame per size into a single ICO file.
fn encode_ico(sizes: &[u32]) -> Vec<u8> {
    let frames: Vec<(u32, Vec<u8>)> = sizes
        .iter()
        .map(|&size| (size, ico_frame(&render_icon_rgba(size), size)))
        .collect();

    let mut out = Vec::new();
    put_u16(&mut out, 0);
    put_u16(&mut out, 1);
    put_u16(&mut out, frames.len() as u16);

    let mut offset = ICONDIR_LEN + ICONDIRENTRY_LEN * frames.len();
    for (size, frame) in &frames {
        // A dimension byte of 0 means 256.
        let dim = u8::try_from(*size).unwrap_or(0);
        out.extend_from_slice(&[dim, dim, 0, 0]);
        put_u16(&mut out, 1);
        put_u16(&mut out, 32);
        put_u32(&mut out, frame.len() as u32);
        put_u32(&mut out, offset as u32);
        offset += frame.len();
    }
    for (_, frame) in &frames {
        out.extend_from_slice(frame);
    }
    out
}

/// One ICO frame: BITMAPINFOHEADER, bottom-up BGRA pixels, then the
/// 1-bpp AND mask. `rgba` is top-down.
fn ico_frame(rgba: &[u8], size: u32) -> Vec<u8> {
    let side = size as usize;
    let mut out = Vec::with_capacity(40 + rgba.len() + side * side / 8);

    put_u32(&mut out, 40);
    put_u32(&mut out, size);
    // Height covers the XOR image and the AND mask.
    put_u32(&mut out, size * 2);
    put_u16(&mut out, 1);
    put_u16(&mut out, 32);
    out.extend_from_slice(&[0u8; 24]);

    let rows: Vec<&[u8]> = rgba.chunks_exact(side * 4).collect();
    for row in rows.iter().rev() {
        for px in row.chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }

    let mask_stride = side.div_ceil(32) * 4;
    for row in rows.iter().rev() {
        let mut mask = vec![0u8; mask_stride];
        for (x, px) in row.chunks_exact(4).enumerate() {
            if px[3] < 128 {
                mask[x / 8] |= 0x80 >> (x % 8);
            }
        }
        out.extend_from_slice(&mask);
    }
    out
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

// ── Icon rendering (self-contained, no workspace crate deps) ─────────

/// Render the DevSleuth icon as top-to-bottom RGBA pixels.
///
/// Mirrors `crates/devsleuth-gui/src/icon.rs` so the build script has no
/// dependency on workspace crates.
fn render_icon_rgba(size: u32) -> Vec<u8> {
    // (centre x, centre y, half width, half height, colour) in unit space.
    const CHIPS: [(f32, f32, f32, f32, [u8; 3]); 3] = [
        (0.5, 0.22, 0.17, 0.12, [0x4f, 0xc1, 0xb6]),
        (0.24, 0.72, 0.14, 0.10, [0x7d, 0xa7, 0xd9]),
        (0.72, 0.70, 0.14, 0.10, [0xe0, 0xa4, 0x58]),
    ];
    const WIRE: [u8; 3] = [0x8c, 0x99, 0xa6];
    const RING: [u8; 3] = [0xdc, 0xe2, 0xe8];

    let s = size as f32;
    let mut px_buf = vec![0u8; (size * size * 4) as usize];

    let corner = 0.04 * s;
    let wire_half = (0.025 * s).max(0.6);
    let bus_y = 0.47 * s;
    let ring_radius = 0.2 * s;
    let ring_half = (0.03 * s).max(0.7);
    let (root, left, right) = (CHIPS[0], CHIPS[1], CHIPS[2]);
    let wires = [
        (root.0 * s, root.1 * s, root.0 * s, bus_y),
        (left.0 * s, bus_y, right.0 * s, bus_y),
        (left.0 * s, bus_y, left.0 * s, left.1 * s),
        (right.0 * s, bus_y, right.0 * s, right.1 * s),
    ];

    for y in 0..size {
        for x in 0..size {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let mut rgb = [0u8; 3];
            let mut alpha = 0.0f32;

            for (ax, ay, bx, by) in wires {
                let cover = ico_coverage(ico_pt_seg_dist(px, py, ax, ay, bx, by) - wire_half);
                ico_blend(&mut rgb, &mut alpha, WIRE, cover);
            }
            for (cx, cy, hw, hh, color) in CHIPS {
                let d = ico_rounded_box_dist(px - cx * s, py - cy * s, hw * s, hh * s, corner);
                ico_blend(&mut rgb, &mut alpha, color, ico_coverage(d));
            }
            let dx = px - right.0 * s;
            let dy = py - right.1 * s;
            let ring_d = ((dx * dx + dy * dy).sqrt() - ring_radius).abs() - ring_half;
            ico_blend(&mut rgb, &mut alpha, RING, ico_coverage(ring_d));

            let idx = ((y * size + x) * 4) as usize;
            px_buf[idx..idx + 3].copy_from_slice(&rgb);
            px_buf[idx + 3] = (alpha * 255.0).clamp(0.0, 255.0) as u8;
        }
    }

    px_buf
}

fn ico_coverage(d: f32) -> f32 {
    (0.5 - d).clamp(0.0, 1.0)
}
fn ico_blend(rgb: &mut [u8; 3], alpha: &mut f32, color: [u8; 3], cover: f32) {
    if cover <= 0.0 {
        return;
    }
    for (dst, src) in rgb.iter_mut().zip(color) {
        *dst = (*dst as f32 * (1.0 - cover) + src as f32 * cover) as u8;
    }
    *alpha += (1.0 - *alpha) * cover;
}
fn ico_rounded_box_dist(dx: f32, dy: f32, hw: f32, hh: f32, r: f32) -> f32 {
    let qx = dx.abs() - (hw - r);
    let qy = dy.abs() - (hh - r);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - r
}
fn ico_pt_seg_dist(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let abx = bx - ax;
    let aby = by - ay;
    let len_sq = abx * abx + aby * aby;
    if len_sq < 0.0001 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    let t = (((px - ax) * abx + (py - ay) * aby) / len_sq).clamp(0.0, 1.0);
    ((px - (ax + t * abx)).powi(2) + (py - (ay + t * aby)).powi(2)).sqrt()
}

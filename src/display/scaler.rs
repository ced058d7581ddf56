// Scaler - Native frame to panel upscaling
//
// Two policies:
// - Integer2x: every source pixel becomes a 2×2 block, 192×128 centred on the panel
// - Interpolated2_5x: every 2×2 source tile becomes a 5×5 block, 240×160 full panel
//
// Geometry is validated when a mode is selected. The per-frame routines
// assume a validated geometry and never allocate.

use super::framebuffer::{
    Frame, NativeFrame, PanelFrame, Rect, NATIVE_HEIGHT, NATIVE_WIDTH, PANEL_HEIGHT, PANEL_WIDTH,
};
use super::overlay::BAR_HEIGHT;
use super::pixel::mix;
use super::surface::DestinationHandle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scaling policy for presenting the native frame on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Nearest-neighbour 2× replication, bordered on the panel
    #[default]
    Integer2x,

    /// 2.5× upscale with mixed seam pixels, fills the panel
    Interpolated2_5x,
}

impl ScalingMode {
    /// Human readable label, as shown in the settings menu
    pub fn label(self) -> &'static str {
        match self {
            ScalingMode::Integer2x => "2x",
            ScalingMode::Interpolated2_5x => "2.5x (No Filter)",
        }
    }

    /// Buffer the compositor writes into under this mode
    pub fn destination(self) -> DestinationHandle {
        match self {
            ScalingMode::Integer2x => DestinationHandle::Panel,
            ScalingMode::Interpolated2_5x => DestinationHandle::Scratch,
        }
    }
}

impl std::fmt::Display for ScalingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Rejected scaling geometry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{mode} scaling cannot map {native_width}x{native_height} onto {panel_width}x{panel_height}")]
pub struct GeometryError {
    /// Mode that was requested
    pub mode: ScalingMode,
    /// Source width
    pub native_width: usize,
    /// Source height
    pub native_height: usize,
    /// Panel width
    pub panel_width: usize,
    /// Panel height
    pub panel_height: usize,
}

/// Validated placement of the native frame for one scaling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleGeometry {
    /// Mode this geometry belongs to
    pub mode: ScalingMode,

    /// Where the frame lands in the destination canvas (panel for Integer2x,
    /// scratch for Interpolated2_5x), before any feedback shift
    pub image: Rect,

    /// Replication factor applied while placing the frame (2 or 1)
    pub placement_scale: usize,
}

impl ScaleGeometry {
    /// Compute and validate the geometry for a mode
    ///
    /// Both modes stage the image at the 2× border offset, which leaves room
    /// for the indicator bars above and below it.
    ///
    /// # Arguments
    /// * `mode` - Requested scaling mode
    /// * `native` - Source dimensions (width, height)
    /// * `panel` - Panel dimensions (width, height)
    pub fn new(
        mode: ScalingMode,
        native: (usize, usize),
        panel: (usize, usize),
    ) -> Result<Self, GeometryError> {
        let (nw, nh) = native;
        let (pw, ph) = panel;
        let reject = || GeometryError {
            mode,
            native_width: nw,
            native_height: nh,
            panel_width: pw,
            panel_height: ph,
        };

        if nw == 0 || nh == 0 || nw * 2 > pw || nh * 2 > ph {
            return Err(reject());
        }
        if (pw - nw * 2) % 2 != 0 || (ph - nh * 2) % 2 != 0 {
            return Err(reject());
        }
        let border_x = (pw - nw * 2) / 2;
        let border_y = (ph - nh * 2) / 2;
        if border_y < BAR_HEIGHT {
            return Err(reject());
        }

        match mode {
            ScalingMode::Integer2x => Ok(Self {
                mode,
                image: Rect::new(border_x, border_y, nw * 2, nh * 2),
                placement_scale: 2,
            }),
            ScalingMode::Interpolated2_5x => {
                let tiles_fit = nw % 2 == 0 && nh % 2 == 0;
                if !tiles_fit || nw / 2 * 5 != pw || nh / 2 * 5 != ph {
                    return Err(reject());
                }
                Ok(Self {
                    mode,
                    image: Rect::new(border_x, border_y, nw, nh),
                    placement_scale: 1,
                })
            }
        }
    }
}

/// Frame scaler bound to one validated geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaler {
    geometry: ScaleGeometry,
}

impl Scaler {
    /// Create a scaler for the fixed native/panel resolutions
    pub fn new(mode: ScalingMode) -> Result<Self, GeometryError> {
        let geometry = ScaleGeometry::new(
            mode,
            (NATIVE_WIDTH, NATIVE_HEIGHT),
            (PANEL_WIDTH, PANEL_HEIGHT),
        )?;
        Ok(Self { geometry })
    }

    /// Active scaling mode
    pub fn mode(&self) -> ScalingMode {
        self.geometry.mode
    }

    /// Validated geometry
    pub fn geometry(&self) -> &ScaleGeometry {
        &self.geometry
    }

    /// Write the native frame into the destination canvas
    ///
    /// `shift` moves the image vertically by whole canvas rows; callers keep
    /// it within the indicator bar height.
    pub fn place(&self, frame: &NativeFrame, canvas: &mut PanelFrame, shift: isize) {
        let image = self.geometry.image;
        let top = (image.y as isize + shift) as usize;
        let start = top * PANEL_WIDTH + image.x;
        let dst = &mut canvas.as_mut_slice()[start..];

        match self.geometry.placement_scale {
            2 => replicate_2x(frame, dst, PANEL_WIDTH),
            _ => copy_1x(frame, dst, PANEL_WIDTH),
        }
    }

    /// Whether a second pass from scratch to panel is required
    pub fn needs_upscale(&self) -> bool {
        self.geometry.mode == ScalingMode::Interpolated2_5x
    }

    /// Upscale the staged image from the scratch canvas onto the panel
    ///
    /// Does nothing under Integer2x, where the frame is already on the panel.
    pub fn upscale(&self, scratch: &PanelFrame, panel: &mut PanelFrame) {
        if !self.needs_upscale() {
            return;
        }
        let image = self.geometry.image;
        let src = &scratch.as_slice()[image.y * PANEL_WIDTH + image.x..];
        scale_2_5x(
            src,
            PANEL_WIDTH,
            image.width,
            image.height,
            panel.as_mut_slice(),
            PANEL_WIDTH,
        );
    }
}

/// Replicate every source pixel into a 2×2 block
///
/// # Arguments
/// * `src` - Source frame
/// * `dst` - Destination samples, starting at the top-left of the target area
/// * `dst_pitch` - Destination row stride in samples
pub fn replicate_2x<const W: usize, const H: usize>(
    src: &Frame<W, H>,
    dst: &mut [u16],
    dst_pitch: usize,
) {
    let out_w = W * 2;
    for (y, src_row) in src.as_slice().chunks_exact(W).enumerate() {
        let rows = &mut dst[2 * y * dst_pitch..2 * y * dst_pitch + dst_pitch + out_w];
        let (upper, lower) = rows.split_at_mut(dst_pitch);
        for (pair, &pixel) in upper[..out_w].chunks_exact_mut(2).zip(src_row) {
            pair[0] = pixel;
            pair[1] = pixel;
        }
        lower[..out_w].copy_from_slice(&upper[..out_w]);
    }
}

/// Copy the source frame 1:1 into a larger canvas
pub fn copy_1x<const W: usize, const H: usize>(
    src: &Frame<W, H>,
    dst: &mut [u16],
    dst_pitch: usize,
) {
    for (y, src_row) in src.as_slice().chunks_exact(W).enumerate() {
        dst[y * dst_pitch..y * dst_pitch + W].copy_from_slice(src_row);
    }
}

/// Upscale by 2.5× using fixed 2×2 → 5×5 tiles
///
/// ```text
/// source     target
/// p1 p2      p1  p1  m12 p2  p2
/// p3 p4      p1  p1  m12 p2  p2
///            m13 m13 all m24 m24
///            p3  p3  m34 p4  p4
///            p3  p3  m34 p4  p4
/// ```
///
/// The upper source row writes output rows 0-1 and stages row 2; the lower
/// source row completes row 2 by mixing the staged values with the new
/// corners, then writes rows 3-4.
///
/// # Arguments
/// * `src` - Source samples, starting at the top-left source pixel
/// * `src_pitch` - Source row stride in samples
/// * `width` - Source width (even)
/// * `height` - Source height (even)
/// * `dst` - Destination samples, starting at the top-left output pixel
/// * `dst_pitch` - Destination row stride in samples
pub fn scale_2_5x(
    src: &[u16],
    src_pitch: usize,
    width: usize,
    height: usize,
    dst: &mut [u16],
    dst_pitch: usize,
) {
    debug_assert!(width % 2 == 0 && height % 2 == 0, "source must be whole tiles");
    let out_w = width / 2 * 5;

    for ty in 0..height / 2 {
        let upper = &src[2 * ty * src_pitch..2 * ty * src_pitch + width];
        let lower = &src[(2 * ty + 1) * src_pitch..(2 * ty + 1) * src_pitch + width];

        let base = 5 * ty * dst_pitch;
        let block = &mut dst[base..base + 4 * dst_pitch + out_w];
        let (row0, rest) = block.split_at_mut(dst_pitch);
        let (row1, rest) = rest.split_at_mut(dst_pitch);
        let (row2, rest) = rest.split_at_mut(dst_pitch);
        let (row3, row4) = rest.split_at_mut(dst_pitch);

        for ((pair, out), staged) in upper
            .chunks_exact(2)
            .zip(row0.chunks_exact_mut(5))
            .zip(row2.chunks_exact_mut(5))
        {
            let (p1, p2) = (pair[0], pair[1]);
            let m12 = mix(p1, p2);
            out.copy_from_slice(&[p1, p1, m12, p2, p2]);
            staged.copy_from_slice(&[p1, p1, m12, p2, p2]);
        }
        row1[..out_w].copy_from_slice(&row0[..out_w]);

        for ((pair, out), middle) in lower
            .chunks_exact(2)
            .zip(row3.chunks_exact_mut(5))
            .zip(row2.chunks_exact_mut(5))
        {
            let (p3, p4) = (pair[0], pair[1]);
            let m34 = mix(p3, p4);
            out.copy_from_slice(&[p3, p3, m34, p4, p4]);

            let m13 = mix(p3, middle[0]);
            let all = mix(m34, middle[2]);
            let m24 = mix(p4, middle[3]);
            middle.copy_from_slice(&[m13, m13, all, m24, m24]);
        }
        row4[..out_w].copy_from_slice(&row3[..out_w]);
    }
}

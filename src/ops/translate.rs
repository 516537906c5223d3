//! Coordinate translation
//!
//! Shifts every tuple in place. The structure is gathered and validated
//! before anything is written, and cached boxes are shifted rather than
//! recomputed.

use crate::error::Result;
use crate::geometry::{layout, Box2D, Cursor};
use byteorder::{ByteOrder, LittleEndian};

/// Translated copy of `buf`
pub fn translate(buf: &[u8], dx: f64, dy: f64, dz: f64) -> Result<Vec<u8>> {
    let mut out = buf.to_vec();
    translate_in_place(&mut out, dx, dy, dz)?;
    Ok(out)
}

/// Add (dx, dy, dz) to every tuple; `dz` is ignored for tuples without Z
pub fn translate_in_place(buf: &mut [u8], dx: f64, dy: f64, dz: f64) -> Result<()> {
    let plan = layout(buf)?;

    for &(offset, dims, npoints) in &plan.seqs {
        let size = dims.stride() * 8;
        for i in 0..npoints {
            let t = &mut buf[offset + i * size..offset + (i + 1) * size];
            shift(&mut t[0..8], dx);
            shift(&mut t[8..16], dy);
            if dims.has_z() {
                shift(&mut t[16..24], dz);
            }
        }
    }

    for &offset in &plan.boxes {
        let shifted = Cursor::at(buf, offset).read_box()?.translate(dx, dy);
        write_box(&mut buf[offset..offset + 16], &shifted);
    }

    tracing::debug!(
        sequences = plan.seqs.len(),
        boxes = plan.boxes.len(),
        dx,
        dy,
        dz,
        "translated"
    );
    Ok(())
}

fn shift(field: &mut [u8], d: f64) {
    let v = LittleEndian::read_f64(field);
    LittleEndian::write_f64(field, v + d);
}

fn write_box(field: &mut [u8], b: &Box2D) {
    LittleEndian::write_f32(&mut field[0..4], b.xmin);
    LittleEndian::write_f32(&mut field[4..8], b.ymin);
    LittleEndian::write_f32(&mut field[8..12], b.xmax);
    LittleEndian::write_f32(&mut field[12..16], b.ymax);
}

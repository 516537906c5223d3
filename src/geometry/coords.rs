//! Coordinate tuples and point sequences
//!
//! A point sequence stores its ordinates flat (`x, y[, z][, m], x, y, ...`)
//! with a stride fixed by its [`Dims`]. Order is geometric order.

use serde::Serialize;

/// Dimensionality of a coordinate tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dims {
    Xy,
    Xyz,
    Xym,
    Xyzm,
}

impl Dims {
    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Dims::Xy,
            (true, false) => Dims::Xyz,
            (false, true) => Dims::Xym,
            (true, true) => Dims::Xyzm,
        }
    }

    pub fn has_z(self) -> bool {
        matches!(self, Dims::Xyz | Dims::Xyzm)
    }

    pub fn has_m(self) -> bool {
        matches!(self, Dims::Xym | Dims::Xyzm)
    }

    /// Number of doubles per tuple
    pub fn stride(self) -> usize {
        2 + self.has_z() as usize + self.has_m() as usize
    }

    /// Smallest dimensionality holding every axis of both
    pub fn union(self, other: Dims) -> Dims {
        Dims::from_flags(self.has_z() || other.has_z(), self.has_m() || other.has_m())
    }

    /// 0 = 2D, 1 = 3DM, 2 = 3DZ, 3 = 4D
    pub fn zm_flag(self) -> u8 {
        (self.has_z() as u8) * 2 + self.has_m() as u8
    }
}

/// One coordinate tuple; absent axes read as 0.0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub m: f64,
}

impl Coord {
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0, m: 0.0 }
    }

    pub fn new(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self { x, y, z, m }
    }

    /// Read one tuple of the given stride from a flat slice
    pub fn from_ordinates(ords: &[f64], dims: Dims) -> Self {
        let mut c = Coord::xy(ords[0], ords[1]);
        match dims {
            Dims::Xy => {}
            Dims::Xyz => c.z = ords[2],
            Dims::Xym => c.m = ords[2],
            Dims::Xyzm => {
                c.z = ords[2];
                c.m = ords[3];
            }
        }
        c
    }

    /// Append this tuple at the given stride; dropped axes are discarded
    pub fn push_ordinates(&self, out: &mut Vec<f64>, dims: Dims) {
        out.push(self.x);
        out.push(self.y);
        if dims.has_z() {
            out.push(self.z);
        }
        if dims.has_m() {
            out.push(self.m);
        }
    }

    pub fn distance2d(&self, other: &Coord) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn distance3d(&self, other: &Coord) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }
}

/// Ordered, fixed-stride list of tuples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSeq {
    dims: Dims,
    ords: Vec<f64>,
}

impl PointSeq {
    pub fn new(dims: Dims) -> Self {
        Self { dims, ords: Vec::new() }
    }

    pub fn with_capacity(dims: Dims, npoints: usize) -> Self {
        Self {
            dims,
            ords: Vec::with_capacity(npoints * dims.stride()),
        }
    }

    pub fn from_coords(dims: Dims, coords: &[Coord]) -> Self {
        let mut seq = Self::with_capacity(dims, coords.len());
        for c in coords {
            seq.push(*c);
        }
        seq
    }

    /// Build from a flat ordinate vector; its length must be a multiple of the stride
    pub fn from_ordinates(dims: Dims, ords: Vec<f64>) -> Option<Self> {
        if ords.len() % dims.stride() != 0 {
            return None;
        }
        Some(Self { dims, ords })
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.ords.len() / self.dims.stride()
    }

    pub fn is_empty(&self) -> bool {
        self.ords.is_empty()
    }

    pub fn ordinates(&self) -> &[f64] {
        &self.ords
    }

    pub fn get(&self, i: usize) -> Coord {
        let s = self.dims.stride();
        Coord::from_ordinates(&self.ords[i * s..(i + 1) * s], self.dims)
    }

    pub fn first(&self) -> Option<Coord> {
        (!self.is_empty()).then(|| self.get(0))
    }

    pub fn last(&self) -> Option<Coord> {
        (!self.is_empty()).then(|| self.get(self.len() - 1))
    }

    pub fn push(&mut self, c: Coord) {
        c.push_ordinates(&mut self.ords, self.dims);
    }

    pub fn insert(&mut self, index: usize, c: Coord) {
        let mut tuple = Vec::with_capacity(4);
        c.push_ordinates(&mut tuple, self.dims);
        let at = index * self.dims.stride();
        self.ords.splice(at..at, tuple);
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.ords
            .chunks_exact(self.dims.stride())
            .map(move |t| Coord::from_ordinates(t, self.dims))
    }

    /// Copy at a new stride; added axes are exactly 0.0
    pub fn to_dims(&self, dims: Dims) -> PointSeq {
        if dims == self.dims {
            return self.clone();
        }
        let mut out = PointSeq::with_capacity(dims, self.len());
        for c in self.iter() {
            let c = Coord {
                z: if self.dims.has_z() { c.z } else { 0.0 },
                m: if self.dims.has_m() { c.m } else { 0.0 },
                ..c
            };
            out.push(c);
        }
        out
    }

    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        let s = self.dims.stride();
        let has_z = self.dims.has_z();
        for t in self.ords.chunks_exact_mut(s) {
            t[0] += dx;
            t[1] += dy;
            if has_z {
                t[2] += dz;
            }
        }
    }

    pub fn reverse(&mut self) {
        let s = self.dims.stride();
        let n = self.len();
        for i in 0..n / 2 {
            let j = n - 1 - i;
            for k in 0..s {
                self.ords.swap(i * s + k, j * s + k);
            }
        }
    }

    /// First and last tuples equal in 2D
    pub fn is_closed2d(&self) -> bool {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => a.x == b.x && a.y == b.y,
            _ => false,
        }
    }

    pub fn length2d(&self) -> f64 {
        path_length(self.iter(), false)
    }

    /// 3D length when Z is present, 2D otherwise
    pub fn length(&self) -> f64 {
        path_length(self.iter(), self.dims.has_z())
    }

    /// Shoelace sum: positive for counter-clockwise rings
    pub fn signed_area(&self) -> f64 {
        signed_ring_area(self.iter())
    }
}

/// Sum of consecutive-point distances
pub fn path_length(mut points: impl Iterator<Item = Coord>, use_z: bool) -> f64 {
    let mut prev = match points.next() {
        Some(p) => p,
        None => return 0.0,
    };
    let mut total = 0.0;
    for p in points {
        total += if use_z { prev.distance3d(&p) } else { prev.distance2d(&p) };
        prev = p;
    }
    total
}

/// Planar signed area of a ring (shoelace formula)
pub fn signed_ring_area(points: impl Iterator<Item = Coord>) -> f64 {
    let mut points = points.peekable();
    let first = match points.peek() {
        Some(p) => *p,
        None => return 0.0,
    };
    let mut sum = 0.0;
    let mut prev = first;
    for p in points.skip(1) {
        sum += prev.x * p.y - p.x * prev.y;
        prev = p;
    }
    // Implicit closing edge, zero for closed rings
    sum += prev.x * first.y - first.x * prev.y;
    sum / 2.0
}

//! Reusable per-evaluation buffers.
//!
//! A term owns a [`ScratchPool`]. Each element evaluation borrows one
//! [`Scratch`] through a [`ScratchGuard`], which hands it back on drop, so
//! buffers are released on every exit path, `?` returns included.
//! Concurrent evaluations each get their own buffers.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

/// Buffers used while evaluating one element.
#[derive(Debug, Default)]
pub struct Scratch<const NEQS: usize, const NDIM: usize> {
    /// Flux at every flux point
    pub flux: Vec<[f64; NEQS]>,
    /// Wave speed at every flux point
    pub wave_speed: Vec<f64>,
    /// Solution at every flux point, face points averaged with the neighbour
    pub averaged: Vec<[f64; NEQS]>,
    /// Buffers of the face being processed
    pub face: FaceScratch<NEQS, NDIM>,
}

/// Buffers used while processing one face.
#[derive(Debug, Default)]
pub struct FaceScratch<const NEQS: usize, const NDIM: usize> {
    /// Face point map from this side to the other side
    pub map: Vec<usize>,
    /// Face point map used while resolving the neighbour's own faces
    pub map_other: Vec<usize>,
    /// Neighbour's solution at its flux points, face points averaged
    pub averaged_other: Vec<[f64; NEQS]>,
    /// This side's solution at the face points
    pub this: Vec<[f64; NEQS]>,
    /// Other side's solution at the face points
    pub other: Vec<[f64; NEQS]>,
    /// This side's gradient at the face points
    pub gradient_this: Vec<[[f64; NEQS]; NDIM]>,
    /// Other side's gradient at the face points
    pub gradient_other: Vec<[[f64; NEQS]; NDIM]>,
    /// Lifted gradient computed from this side
    pub lifted: Vec<[[f64; NEQS]; NDIM]>,
    /// Jump field on this element's flux points
    pub jump_this: Vec<[f64; NEQS]>,
    /// Jump field on the neighbour's flux points
    pub jump_other: Vec<[f64; NEQS]>,
}

impl<const NEQS: usize, const NDIM: usize> Scratch<NEQS, NDIM> {
    /// Zero the flux-point buffers for an element with `n_flux` flux points.
    pub fn reset(&mut self, n_flux: usize) {
        self.flux.clear();
        self.flux.resize(n_flux, [0.0; NEQS]);
        self.wave_speed.clear();
        self.wave_speed.resize(n_flux, 0.0);
    }
}

impl<const NEQS: usize, const NDIM: usize> FaceScratch<NEQS, NDIM> {
    /// Clear the per-point buffers.
    pub fn clear(&mut self) {
        self.map.clear();
        self.this.clear();
        self.other.clear();
        self.gradient_this.clear();
        self.gradient_other.clear();
        self.lifted.clear();
    }
}

/// Free list of scratch buffers.
#[derive(Debug, Default)]
pub struct ScratchPool<const NEQS: usize, const NDIM: usize> {
    free: Mutex<Vec<Scratch<NEQS, NDIM>>>,
}

impl<const NEQS: usize, const NDIM: usize> ScratchPool<NEQS, NDIM> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Borrow a scratch for one evaluation.
    pub fn acquire(&self) -> ScratchGuard<'_, NEQS, NDIM> {
        let scratch = self.free.lock().pop().unwrap_or_default();
        ScratchGuard {
            pool: self,
            scratch: Some(scratch),
        }
    }

    /// Number of buffers waiting for reuse.
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }
}

/// Scoped borrow of a [`Scratch`]; returns it to the pool on drop.
pub struct ScratchGuard<'a, const NEQS: usize, const NDIM: usize> {
    pool: &'a ScratchPool<NEQS, NDIM>,
    scratch: Option<Scratch<NEQS, NDIM>>,
}

impl<const NEQS: usize, const NDIM: usize> Deref for ScratchGuard<'_, NEQS, NDIM> {
    type Target = Scratch<NEQS, NDIM>;

    fn deref(&self) -> &Self::Target {
        // Only taken in drop
        match &self.scratch {
            Some(s) => s,
            None => unreachable!("scratch released twice"),
        }
    }
}

impl<const NEQS: usize, const NDIM: usize> DerefMut for ScratchGuard<'_, NEQS, NDIM> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.scratch {
            Some(s) => s,
            None => unreachable!("scratch released twice"),
        }
    }
}

impl<const NEQS: usize, const NDIM: usize> Drop for ScratchGuard<'_, NEQS, NDIM> {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            self.pool.free.lock().push(scratch);
        }
    }
}

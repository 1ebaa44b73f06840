//! Minimal data-set and progress collaborators used by the reader and writer.

use crate::extent::CartesianExtent;

/// Named array of `n_tuples * n_comps` interleaved `f32` values.
#[derive(Clone, Debug, PartialEq)]
pub struct DataArray {
    name: String,
    n_comps: usize,
    values: Vec<f32>,
}

impl DataArray {
    /// Zero-filled array.
    pub fn new(name: impl Into<String>, n_comps: usize, n_tuples: usize) -> Self {
        Self {
            name: name.into(),
            n_comps,
            values: vec![0.0; n_comps * n_tuples],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_components(&self) -> usize {
        self.n_comps
    }

    pub fn n_tuples(&self) -> usize {
        self.values.len().checked_div(self.n_comps).unwrap_or(0)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    pub fn tuple(&self, i: usize) -> &[f32] {
        &self.values[i * self.n_comps..(i + 1) * self.n_comps]
    }
}

/// Point-centred arrays of a data set, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointData {
    arrays: Vec<DataArray>,
}

impl PointData {
    /// Add a zero-filled array, replacing any array with the same name.
    pub fn add_array(&mut self, name: &str, n_comps: usize, n_tuples: usize) -> &mut DataArray {
        let array = DataArray::new(name, n_comps, n_tuples);
        let at = match self.arrays.iter().position(|a| a.name == name) {
            Some(i) => {
                self.arrays[i] = array;
                i
            }
            None => {
                self.arrays.push(array);
                self.arrays.len() - 1
            }
        };
        &mut self.arrays[at]
    }

    /// Insert a complete array, replacing any array with the same name.
    pub fn insert(&mut self, array: DataArray) {
        match self.arrays.iter_mut().find(|a| a.name == array.name) {
            Some(slot) => *slot = array,
            None => self.arrays.push(array),
        }
    }

    pub fn array(&self, name: &str) -> Option<&DataArray> {
        self.arrays.iter().find(|a| a.name == name)
    }

    pub fn array_mut(&mut self, name: &str) -> Option<&mut DataArray> {
        self.arrays.iter_mut().find(|a| a.name == name)
    }

    pub fn remove_array(&mut self, name: &str) -> Option<DataArray> {
        let i = self.arrays.iter().position(|a| a.name == name)?;
        Some(self.arrays.remove(i))
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataArray> + '_ {
        self.arrays.iter()
    }
}

/// Structured data set the reader fills and the writer drains.
pub trait DataSet {
    fn point_data(&self) -> &PointData;
    fn point_data_mut(&mut self) -> &mut PointData;

    fn set_extent(&mut self, extent: CartesianExtent);
    fn set_origin(&mut self, origin: [f64; 3]);
    fn set_spacing(&mut self, spacing: [f64; 3]);
    /// Node coordinates per axis; replaces origin and spacing.
    fn set_coordinates(&mut self, coords: [Vec<f64>; 3]);
}

/// Uniform or rectilinear image over an index extent.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub extent: CartesianExtent,
    pub origin: [f64; 3],
    pub spacing: [f64; 3],
    pub coords: Option<[Vec<f64>; 3]>,
    pub point_data: PointData,
}

impl Default for ImageData {
    fn default() -> Self {
        Self {
            extent: CartesianExtent::EMPTY,
            origin: [0.0; 3],
            spacing: [1.0; 3],
            coords: None,
            point_data: PointData::default(),
        }
    }
}

impl DataSet for ImageData {
    fn point_data(&self) -> &PointData {
        &self.point_data
    }

    fn point_data_mut(&mut self) -> &mut PointData {
        &mut self.point_data
    }

    fn set_extent(&mut self, extent: CartesianExtent) {
        self.extent = extent;
    }

    fn set_origin(&mut self, origin: [f64; 3]) {
        self.origin = origin;
    }

    fn set_spacing(&mut self, spacing: [f64; 3]) {
        self.spacing = spacing;
    }

    fn set_coordinates(&mut self, coords: [Vec<f64>; 3]) {
        self.coords = Some(coords);
    }
}

/// Receives completion fractions in `[0, 1]`.
pub trait ProgressSink {
    fn report(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn report(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Discards progress.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _fraction: f64) {}
}

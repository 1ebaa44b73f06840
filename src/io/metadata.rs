//! BOV dataset metadata: grid, array catalog and time-step catalog.
//!
//! # Text format
//! One `key=value` per line, whitespace tolerant, `#` starts a comment:
//!
//! ```text
//! nx=64
//! ny=64
//! nz=32
//! x0=0.0
//! dx=0.5
//! ext=gda
//! scalar:density
//! vector:velocity
//! stensor:stress
//! ```
//!
//! `nx`, `ny`, `nz` are required. Array declarations are `KIND:NAME` lines
//! with `KIND` one of `scalar`, `vector`, `tensor`, `stensor`. Unknown keys are
//! ignored with a warning.
//!
//! # Bricks
//! Component `c` of time step `s` lives in `<c>_<s>.<ext>` next to the
//! metadata file. Time steps are found by scanning the directory for the
//! first declared array's first component.

use crate::algs::wire::{cast_slice, pod_vec_from_bytes};
use crate::bov_error::BovError;
use crate::extent::CartesianExtent;
use crate::io::pack::{PackReader, PackWriter};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BRICK_EXTENSION: &str = "gda";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayKind {
    Scalar,
    Vector,
    Tensor,
    SymmetricTensor,
}

impl ArrayKind {
    pub const ALL: [ArrayKind; 4] = [
        ArrayKind::Scalar,
        ArrayKind::Vector,
        ArrayKind::Tensor,
        ArrayKind::SymmetricTensor,
    ];

    /// Declaration keyword in the metadata text.
    pub fn keyword(self) -> &'static str {
        match self {
            ArrayKind::Scalar => "scalar",
            ArrayKind::Vector => "vector",
            ArrayKind::Tensor => "tensor",
            ArrayKind::SymmetricTensor => "stensor",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == s)
    }

    /// Suffixes appended to the array name to form component file names.
    pub fn component_suffixes(self) -> &'static [&'static str] {
        match self {
            ArrayKind::Scalar => &[""],
            ArrayKind::Vector => &["x", "y", "z"],
            ArrayKind::Tensor => &["xx", "xy", "xz", "yx", "yy", "yz", "zx", "zy", "zz"],
            ArrayKind::SymmetricTensor => &["xx", "xy", "xz", "yy", "yz", "zz"],
        }
    }

    /// Number of component files on disk.
    pub fn n_file_components(self) -> usize {
        self.component_suffixes().len()
    }

    /// Number of interleaved components in memory; symmetric tensors are
    /// expanded to the full 3x3.
    pub fn n_mem_components(self) -> usize {
        match self {
            ArrayKind::SymmetricTensor => 9,
            k => k.n_file_components(),
        }
    }

    fn code(self) -> u32 {
        match self {
            ArrayKind::Scalar => 0,
            ArrayKind::Vector => 1,
            ArrayKind::Tensor => 2,
            ArrayKind::SymmetricTensor => 3,
        }
    }

    fn from_code(code: u32) -> Result<Self, BovError> {
        Self::ALL
            .into_iter()
            .find(|k| k.code() == code)
            .ok_or_else(|| BovError::Decode(format!("unknown array kind code {code}")))
    }
}

/// One entry of the array catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayInfo {
    pub name: String,
    pub kind: ArrayKind,
    /// Inactive arrays are skipped by reads and writes.
    pub active: bool,
}

impl ArrayInfo {
    pub fn new(name: impl Into<String>, kind: ArrayKind) -> Self {
        Self {
            name: name.into(),
            kind,
            active: true,
        }
    }

    /// Base names of the component files, in file-component order.
    pub fn component_names(&self) -> Vec<String> {
        self.kind
            .component_suffixes()
            .iter()
            .map(|s| format!("{}{s}", self.name))
            .collect()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenMode {
    Read,
    Write,
}

/// Everything known about a dataset apart from its brick contents.
#[derive(Clone, Debug, PartialEq)]
pub struct BovMetaData {
    file_name: String,
    dir: PathBuf,
    mode: OpenMode,
    brick_ext: String,
    file_ext: CartesianExtent,
    decomp_ext: CartesianExtent,
    origin: [f64; 3],
    spacing: [f64; 3],
    dt: f64,
    coords: Option<[Vec<f64>; 3]>,
    arrays: Vec<ArrayInfo>,
    time_steps: Vec<i64>,
}

impl BovMetaData {
    /// Fresh write-mode metadata for a grid of `dims` points.
    pub fn new(dims: [usize; 3]) -> Result<Self, BovError> {
        let [nx, ny, nz] = dims;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(BovError::Config(format!("grid dims {dims:?} must all be >= 1")));
        }
        let file_ext = CartesianExtent::from_dims(nx, ny, nz);
        Ok(Self {
            file_name: String::new(),
            dir: PathBuf::new(),
            mode: OpenMode::Write,
            brick_ext: DEFAULT_BRICK_EXTENSION.to_string(),
            file_ext,
            decomp_ext: file_ext,
            origin: [0.0; 3],
            spacing: [1.0; 3],
            dt: 1.0,
            coords: None,
            arrays: Vec::new(),
            time_steps: Vec::new(),
        })
    }

    /// Parse metadata text. Directory-dependent catalogs are left empty.
    pub fn parse(text: &str) -> Result<Self, BovError> {
        let mut dims: [Option<usize>; 3] = [None; 3];
        let mut origin = [0.0; 3];
        let mut spacing = [1.0; 3];
        let mut dt = 1.0;
        let mut brick_ext = DEFAULT_BRICK_EXTENSION.to_string();
        let mut arrays: Vec<ArrayInfo> = Vec::new();

        for (no, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let lineno = no + 1;

            let Some((key, value)) = line.split_once('=') else {
                let decl = line.split_once(':').and_then(|(kw, name)| {
                    ArrayKind::from_keyword(kw.trim()).map(|k| (k, name.trim()))
                });
                match decl {
                    Some((_, "")) => {
                        return Err(BovError::MetadataParse(format!(
                            "line {lineno}: array declaration without a name"
                        )));
                    }
                    Some((kind, name)) => {
                        if arrays.iter().any(|a| a.name == name) {
                            return Err(BovError::MetadataParse(format!(
                                "line {lineno}: array `{name}` declared twice"
                            )));
                        }
                        arrays.push(ArrayInfo::new(name, kind));
                        continue;
                    }
                    None => {
                        return Err(BovError::MetadataParse(format!(
                            "line {lineno}: expected `key=value`, got `{line}`"
                        )));
                    }
                }
            };
            let (key, value) = (key.trim(), value.trim());

            let float = || {
                value.parse::<f64>().map_err(|_| {
                    BovError::MetadataParse(format!("line {lineno}: `{key}` has invalid value `{value}`"))
                })
            };
            match key {
                "nx" | "ny" | "nz" => {
                    let q = (key.as_bytes()[1] - b'x') as usize;
                    let n = value.parse::<usize>().ok().filter(|&n| n >= 1).ok_or_else(|| {
                        BovError::MetadataParse(format!(
                            "line {lineno}: `{key}` must be a positive integer, got `{value}`"
                        ))
                    })?;
                    dims[q] = Some(n);
                }
                "x0" | "y0" | "z0" => origin[(key.as_bytes()[0] - b'x') as usize] = float()?,
                "dx" | "dy" | "dz" => spacing[(key.as_bytes()[1] - b'x') as usize] = float()?,
                "dt" => dt = float()?,
                "ext" => {
                    if value.is_empty() {
                        return Err(BovError::MetadataParse(format!(
                            "line {lineno}: empty brick extension"
                        )));
                    }
                    brick_ext = value.trim_start_matches('.').to_string();
                }
                _ => log::warn!("metadata line {lineno}: ignoring unknown key `{key}`"),
            }
        }

        let mut resolved = [0usize; 3];
        for (q, d) in dims.iter().enumerate() {
            resolved[q] = d.ok_or_else(|| {
                BovError::MetadataParse(format!("missing required key `n{}`", ['x', 'y', 'z'][q]))
            })?;
        }
        let mut md = Self::new(resolved)?;
        md.mode = OpenMode::Read;
        md.origin = origin;
        md.spacing = spacing;
        md.dt = dt;
        md.brick_ext = brick_ext;
        md.arrays = arrays;
        Ok(md)
    }

    /// Read the metadata file at `path`, then discover time steps and
    /// rectilinear coordinates next to it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BovError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| BovError::io(path, e))?;
        let mut md = Self::parse(&text)?;
        md.set_location(path);
        md.discover_time_steps()?;
        md.read_coordinates()?;
        log::debug!(
            "opened {} ({} arrays, {} time steps)",
            path.display(),
            md.arrays.len(),
            md.time_steps.len()
        );
        Ok(md)
    }

    /// Record the metadata file location; bricks are resolved relative to it.
    pub fn set_location(&mut self, path: &Path) {
        self.dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    pub fn to_text(&self) -> String {
        let mut s = String::new();
        let [nx, ny, nz] = self.file_ext.dims();
        let _ = writeln!(s, "# brick of values");
        let _ = writeln!(s, "nx={nx}\nny={ny}\nnz={nz}");
        for (q, axis) in ["x", "y", "z"].iter().enumerate() {
            let _ = writeln!(s, "{axis}0={}", self.origin[q]);
        }
        for (q, axis) in ["x", "y", "z"].iter().enumerate() {
            let _ = writeln!(s, "d{axis}={}", self.spacing[q]);
        }
        let _ = writeln!(s, "dt={}", self.dt);
        let _ = writeln!(s, "ext={}", self.brick_ext);
        for a in &self.arrays {
            let _ = writeln!(s, "{}:{}", a.kind.keyword(), a.name);
        }
        s
    }

    /// Write the metadata text to `path`, plus coordinate files when the grid
    /// is rectilinear.
    pub fn write_metadata(&mut self, path: impl AsRef<Path>) -> Result<(), BovError> {
        let path = path.as_ref();
        fs::write(path, self.to_text()).map_err(|e| BovError::io(path, e))?;
        self.set_location(path);
        if let Some(coords) = &self.coords {
            for (q, axis) in ["x", "y", "z"].iter().enumerate() {
                let cpath = self.dir.join(format!("{axis}.{}", self.brick_ext));
                let xs: Vec<f32> = coords[q].iter().map(|&v| v as f32).collect();
                fs::write(&cpath, cast_slice(&xs)).map_err(|e| BovError::io(&cpath, e))?;
            }
        }
        log::debug!("wrote metadata {}", path.display());
        Ok(())
    }

    /// Scan the dataset directory for steps of the first declared array.
    pub fn discover_time_steps(&mut self) -> Result<(), BovError> {
        self.time_steps.clear();
        let Some(first) = self.arrays.first() else {
            return Ok(());
        };
        let prefix = format!("{}_", first.component_names()[0]);
        let suffix = format!(".{}", self.brick_ext);
        let dir = if self.dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            self.dir.as_path()
        };
        let entries = fs::read_dir(dir).map_err(|e| BovError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| BovError::io(dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let step = name
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(suffix.as_str()))
                .and_then(|s| s.parse::<i64>().ok());
            if let Some(step) = step {
                self.time_steps.push(step);
            }
        }
        self.time_steps.sort_unstable();
        self.time_steps.dedup();
        Ok(())
    }

    /// Load `x/y/z.<ext>` coordinate files when all three are present.
    pub fn read_coordinates(&mut self) -> Result<(), BovError> {
        let paths: Vec<PathBuf> = ["x", "y", "z"]
            .iter()
            .map(|axis| self.dir.join(format!("{axis}.{}", self.brick_ext)))
            .collect();
        let present = paths.iter().filter(|p| p.is_file()).count();
        if present == 0 {
            return Ok(());
        }
        if present < 3 {
            log::warn!(
                "only {present} of 3 coordinate files found in {}; using uniform spacing",
                self.dir.display()
            );
            return Ok(());
        }
        let mut coords: [Vec<f64>; 3] = Default::default();
        for (q, p) in paths.iter().enumerate() {
            let raw = fs::read(p).map_err(|e| BovError::io(p, e))?;
            let xs: Vec<f32> = pod_vec_from_bytes(&raw).map_err(|m| BovError::Io {
                path: p.clone(),
                message: m,
            })?;
            if xs.len() != self.file_ext.width(q) {
                return Err(BovError::Io {
                    path: p.clone(),
                    message: format!(
                        "{} coordinates for {} points",
                        xs.len(),
                        self.file_ext.width(q)
                    ),
                });
            }
            coords[q] = xs.into_iter().map(f64::from).collect();
        }
        self.coords = Some(coords);
        Ok(())
    }

    pub fn pack(&self) -> Bytes {
        let mut w = PackWriter::new();
        w.str(&self.file_name)
            .str(&self.dir.to_string_lossy())
            .u32(match self.mode {
                OpenMode::Read => 0,
                OpenMode::Write => 1,
            })
            .str(&self.brick_ext)
            .i32s(&self.file_ext.as_array())
            .i32s(&self.decomp_ext.as_array())
            .f64s(&self.origin)
            .f64s(&self.spacing)
            .f64(self.dt)
            .bool(self.coords.is_some());
        if let Some(coords) = &self.coords {
            for c in coords {
                w.f64s(c);
            }
        }
        w.u32(self.arrays.len() as u32);
        for a in &self.arrays {
            w.str(&a.name).u32(a.kind.code()).bool(a.active);
        }
        w.u32(self.time_steps.len() as u32);
        for &s in &self.time_steps {
            w.i64(s);
        }
        w.finish()
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self, BovError> {
        let mut r = PackReader::new(bytes)?;
        let file_name = r.string()?;
        let dir = PathBuf::from(r.string()?);
        let mode = match r.u32()? {
            0 => OpenMode::Read,
            1 => OpenMode::Write,
            m => return Err(BovError::Decode(format!("unknown open mode {m}"))),
        };
        let brick_ext = r.string()?;
        let file_ext = extent_from(r.i32s()?)?;
        let decomp_ext = extent_from(r.i32s()?)?;
        let origin = triple(r.f64s()?)?;
        let spacing = triple(r.f64s()?)?;
        let dt = r.f64()?;
        let coords = if r.bool()? {
            Some([r.f64s()?, r.f64s()?, r.f64s()?])
        } else {
            None
        };
        let n_arrays = r.u32()? as usize;
        let mut arrays = Vec::with_capacity(n_arrays.min(r.remaining()));
        for _ in 0..n_arrays {
            let name = r.string()?;
            let kind = ArrayKind::from_code(r.u32()?)?;
            let active = r.bool()?;
            arrays.push(ArrayInfo { name, kind, active });
        }
        let n_steps = r.u32()? as usize;
        let mut time_steps = Vec::with_capacity(n_steps.min(r.remaining()));
        for _ in 0..n_steps {
            time_steps.push(r.i64()?);
        }
        Ok(Self {
            file_name,
            dir,
            mode,
            brick_ext,
            file_ext,
            decomp_ext,
            origin,
            spacing,
            dt,
            coords,
            arrays,
            time_steps,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: OpenMode) {
        self.mode = mode;
    }

    pub fn brick_extension(&self) -> &str {
        &self.brick_ext
    }

    pub fn set_brick_extension(&mut self, ext: &str) -> Result<(), BovError> {
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() {
            return Err(BovError::Config("empty brick extension".into()));
        }
        self.brick_ext = ext.to_string();
        Ok(())
    }

    /// Point extent of the whole dataset.
    pub fn file_extent(&self) -> &CartesianExtent {
        &self.file_ext
    }

    /// Sub-extent that readers decompose; the file extent by default.
    pub fn decomp_extent(&self) -> &CartesianExtent {
        &self.decomp_ext
    }

    pub fn set_decomp_extent(&mut self, ext: CartesianExtent) -> Result<(), BovError> {
        if ext.is_empty() || !self.file_ext.contains(&ext) {
            return Err(BovError::InvalidExtent(ext));
        }
        self.decomp_ext = ext;
        Ok(())
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn set_origin(&mut self, origin: [f64; 3]) {
        self.origin = origin;
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    pub fn set_spacing(&mut self, spacing: [f64; 3]) {
        self.spacing = spacing;
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    pub fn is_rectilinear(&self) -> bool {
        self.coords.is_some()
    }

    pub fn coordinates(&self) -> Option<&[Vec<f64>; 3]> {
        self.coords.as_ref()
    }

    pub fn set_coordinates(&mut self, coords: [Vec<f64>; 3]) -> Result<(), BovError> {
        for (q, c) in coords.iter().enumerate() {
            if c.len() != self.file_ext.width(q) {
                return Err(BovError::Config(format!(
                    "axis {q}: {} coordinates for {} points",
                    c.len(),
                    self.file_ext.width(q)
                )));
            }
        }
        self.coords = Some(coords);
        Ok(())
    }

    /// Declare an array; names are unique.
    pub fn add_array(&mut self, name: &str, kind: ArrayKind) -> Result<(), BovError> {
        if name.is_empty() || self.array(name).is_some() {
            return Err(BovError::Config(format!("array name `{name}` is empty or taken")));
        }
        self.arrays.push(ArrayInfo::new(name, kind));
        Ok(())
    }

    /// Catalog in declaration order.
    pub fn arrays(&self) -> &[ArrayInfo] {
        &self.arrays
    }

    pub fn array(&self, name: &str) -> Option<&ArrayInfo> {
        self.arrays.iter().find(|a| a.name == name)
    }

    /// Active arrays in declaration order.
    pub fn active_arrays(&self) -> impl Iterator<Item = &ArrayInfo> + '_ {
        self.arrays.iter().filter(|a| a.active)
    }

    fn set_active(&mut self, name: &str, active: bool) -> Result<(), BovError> {
        let a = self
            .arrays
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| BovError::MissingArray(name.to_string()))?;
        a.active = active;
        Ok(())
    }

    pub fn activate_array(&mut self, name: &str) -> Result<(), BovError> {
        self.set_active(name, true)
    }

    pub fn deactivate_array(&mut self, name: &str) -> Result<(), BovError> {
        self.set_active(name, false)
    }

    pub fn activate_all(&mut self) {
        self.arrays.iter_mut().for_each(|a| a.active = true);
    }

    pub fn deactivate_all(&mut self) {
        self.arrays.iter_mut().for_each(|a| a.active = false);
    }

    pub fn is_array_active(&self, name: &str) -> bool {
        self.array(name).is_some_and(|a| a.active)
    }

    /// Sorted time-step indices.
    pub fn time_steps(&self) -> &[i64] {
        &self.time_steps
    }

    pub fn has_time_step(&self, step: i64) -> bool {
        self.time_steps.binary_search(&step).is_ok()
    }

    /// Register a step produced by a writer.
    pub fn add_time_step(&mut self, step: i64) {
        if let Err(at) = self.time_steps.binary_search(&step) {
            self.time_steps.insert(at, step);
        }
    }

    /// Path of one component brick.
    pub fn brick_path(&self, component: &str, step: i64) -> PathBuf {
        self.dir
            .join(format!("{component}_{step}.{}", self.brick_ext))
    }
}

fn extent_from(v: Vec<i32>) -> Result<CartesianExtent, BovError> {
    let ext: [i32; 6] = v
        .try_into()
        .map_err(|v: Vec<i32>| BovError::Decode(format!("extent with {} entries", v.len())))?;
    Ok(CartesianExtent::new(ext))
}

fn triple(v: Vec<f64>) -> Result<[f64; 3], BovError> {
    v.try_into()
        .map_err(|v: Vec<f64>| BovError::Decode(format!("expected 3 values, got {}", v.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# sample dataset
nx = 8
ny=4
nz=2
x0=1.5
dz=0.25
ext=.bin
scalar:rho
vector:u
stensor:sigma
color=blue
";

    #[test]
    fn parse_sample() {
        let md = BovMetaData::parse(SAMPLE).unwrap();
        assert_eq!(md.file_extent().dims(), [8, 4, 2]);
        assert_eq!(md.origin(), [1.5, 0.0, 0.0]);
        assert_eq!(md.spacing(), [1.0, 1.0, 0.25]);
        assert_eq!(md.brick_extension(), "bin");
        let kinds: Vec<_> = md.arrays().iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![ArrayKind::Scalar, ArrayKind::Vector, ArrayKind::SymmetricTensor]
        );
        assert_eq!(md.mode(), OpenMode::Read);
    }

    #[test]
    fn missing_dims_and_bad_numbers() {
        assert!(matches!(
            BovMetaData::parse("nx=2\nny=2\n"),
            Err(BovError::MetadataParse(m)) if m.contains("nz")
        ));
        assert!(matches!(
            BovMetaData::parse("nx=2\nny=two\nnz=1"),
            Err(BovError::MetadataParse(m)) if m.contains("line 2")
        ));
        assert!(BovMetaData::parse("nx=0\nny=1\nnz=1").is_err());
        assert!(BovMetaData::parse("nx=1\nny=1\nnz=1\nbogus line").is_err());
    }

    #[test]
    fn component_names() {
        let t = ArrayInfo::new("s", ArrayKind::SymmetricTensor);
        assert_eq!(t.component_names(), vec!["sxx", "sxy", "sxz", "syy", "syz", "szz"]);
        assert_eq!(ArrayInfo::new("v", ArrayKind::Vector).component_names()[2], "vz");
        assert_eq!(ArrayInfo::new("p", ArrayKind::Scalar).component_names(), vec!["p"]);
        assert_eq!(ArrayKind::Tensor.n_file_components(), 9);
        assert_eq!(ArrayKind::SymmetricTensor.n_mem_components(), 9);
    }

    #[test]
    fn text_round_trip() {
        let mut md = BovMetaData::new([5, 6, 7]).unwrap();
        md.set_origin([1.0, -2.0, 0.5]);
        md.set_spacing([0.1, 0.2, 0.3]);
        md.add_array("rho", ArrayKind::Scalar).unwrap();
        md.add_array("e", ArrayKind::Tensor).unwrap();
        let back = BovMetaData::parse(&md.to_text()).unwrap();
        assert_eq!(back.file_extent(), md.file_extent());
        assert_eq!(back.origin(), md.origin());
        assert_eq!(back.spacing(), md.spacing());
        assert_eq!(back.arrays(), md.arrays());
    }

    #[test]
    fn pack_round_trip_keeps_activation() {
        let mut md = BovMetaData::parse(SAMPLE).unwrap();
        md.deactivate_array("u").unwrap();
        md.add_time_step(3);
        md.add_time_step(1);
        let back = BovMetaData::unpack(&md.pack()).unwrap();
        assert_eq!(back, md);
        assert!(!back.is_array_active("u"));
        assert_eq!(back.time_steps(), &[1, 3]);
    }

    #[test]
    fn activation_of_unknown_array_fails() {
        let mut md = BovMetaData::parse(SAMPLE).unwrap();
        assert_eq!(
            md.activate_array("nope"),
            Err(BovError::MissingArray("nope".into()))
        );
        md.deactivate_all();
        assert_eq!(md.active_arrays().count(), 0);
    }
}

//! Row-major tensors with 1-based indexing.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use prefix_ir::DeclType;

use super::Value;

/// Tensor indexing and construction failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TensorError {
    #[error("Index {index} out of range for dimension {dim} of length {len}")]
    IndexOutOfRange { index: i64, dim: usize, len: usize },
    #[error("Too many indices: tensor has {ndim} dimensions, got {given}")]
    TooManyIndices { ndim: usize, given: usize },
    #[error("Expected {ndim} indices for element access, got {given}")]
    NotAnElement { ndim: usize, given: usize },
    #[error("Invalid slice {start}-{end} for dimension {dim}")]
    InvalidRange { start: i64, end: i64, dim: usize },
    #[error("Tensor shape {shape:?} needs {expected} elements, got {got}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },
    #[error("Ragged tensor literal: sub-tensor shapes differ")]
    Ragged,
    #[error("Tensor element type mismatch: expected {expected} but got {found}")]
    ElementType {
        expected: &'static str,
        found: &'static str,
    },
}

/// One position of an index list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Single 1-based position; negative counts from the end.
    Index(i64),
    /// Inclusive 1-based slice; `None` means the first/last element.
    Range(Option<i64>, Option<i64>),
    /// The whole dimension.
    All,
}

/// Dense row-major tensor of values.
#[derive(Clone)]
pub struct Tensor {
    elem_type: DeclType,
    shape: Vec<usize>,
    strides: Vec<usize>,
    data: Vec<Value>,
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Element type shared by every element, or `Unknown` for mixed data.
fn common_type(data: &[Value]) -> DeclType {
    let mut types = data.iter().map(Value::decl_type);
    match types.next() {
        Some(first) if types.all(|t| t == first) => first,
        _ => DeclType::Unknown,
    }
}

/// Map a 1-based (or negative, from the end) index onto `0..len`.
fn resolve(index: i64, dim: usize, len: usize) -> Result<usize, TensorError> {
    let out_of_range = || TensorError::IndexOutOfRange { index, dim, len };
    let len_i = i64::try_from(len).map_err(|_| out_of_range())?;
    let zero_based = match index {
        i if i > 0 && i <= len_i => i - 1,
        i if i < 0 && -i <= len_i => len_i + i,
        _ => return Err(out_of_range()),
    };
    usize::try_from(zero_based).map_err(|_| out_of_range())
}

impl Tensor {
    /// Tensor of `shape` with every element set to `fill`.
    pub fn filled(shape: Vec<usize>, fill: &Value) -> Self {
        let len = shape.iter().product();
        let data = vec![fill.clone(); len];
        Self::from_parts(shape, data)
    }

    /// Tensor from row-major data.
    pub fn from_flat(shape: Vec<usize>, data: Vec<Value>) -> Result<Self, TensorError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(TensorError::ShapeMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(Self::from_parts(shape, data))
    }

    /// One-dimensional tensor.
    pub fn vector(data: Vec<Value>) -> Self {
        Self::from_parts(vec![data.len()], data)
    }

    /// Stack equally-shaped tensors along a new leading dimension.
    pub fn stack(parts: &[Tensor]) -> Result<Self, TensorError> {
        let Some(first) = parts.first() else {
            return Ok(Self::vector(Vec::new()));
        };
        if parts.iter().any(|t| t.shape != first.shape) {
            return Err(TensorError::Ragged);
        }
        let mut shape = Vec::with_capacity(first.shape.len() + 1);
        shape.push(parts.len());
        shape.extend_from_slice(&first.shape);
        let data = parts.iter().flat_map(|t| t.data.iter().cloned()).collect();
        Ok(Self::from_parts(shape, data))
    }

    fn from_parts(shape: Vec<usize>, data: Vec<Value>) -> Self {
        Tensor {
            elem_type: common_type(&data),
            strides: row_major_strides(&shape),
            shape,
            data,
        }
    }

    #[inline]
    pub fn elem_type(&self) -> DeclType {
        self.elem_type
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.data.iter()
    }

    fn offset(&self, indices: &[i64]) -> Result<usize, TensorError> {
        if indices.len() != self.ndim() {
            return Err(TensorError::NotAnElement {
                ndim: self.ndim(),
                given: indices.len(),
            });
        }
        indices
            .iter()
            .enumerate()
            .try_fold(0, |acc, (dim, &index)| {
                let i = resolve(index, dim + 1, self.shape[dim])?;
                Ok(acc + i * self.strides[dim])
            })
    }

    /// Element at a full 1-based index.
    pub fn get(&self, indices: &[i64]) -> Result<Value, TensorError> {
        let off = self.offset(indices)?;
        Ok(self.data[off].clone())
    }

    /// Overwrite the element at a full 1-based index.
    ///
    /// A tensor whose elements all share one type only accepts values of
    /// that type.
    pub fn set(&mut self, indices: &[i64], value: Value) -> Result<(), TensorError> {
        let off = self.offset(indices)?;
        if !value.matches_decl(self.elem_type) {
            return Err(TensorError::ElementType {
                expected: self.elem_type.keyword(),
                found: value.type_name(),
            });
        }
        self.data[off] = value;
        Ok(())
    }

    /// Apply an index list. A full list of single indices yields the
    /// element; anything else yields a new tensor holding copies of the
    /// selected elements. Missing trailing selectors select everything.
    pub fn select(&self, selectors: &[Selector]) -> Result<Value, TensorError> {
        if selectors.len() > self.ndim() {
            return Err(TensorError::TooManyIndices {
                ndim: self.ndim(),
                given: selectors.len(),
            });
        }
        if selectors.len() == self.ndim() {
            let singles: Option<Vec<i64>> = selectors
                .iter()
                .map(|s| match s {
                    Selector::Index(i) => Some(*i),
                    _ => None,
                })
                .collect();
            if let Some(indices) = singles {
                return self.get(&indices);
            }
        }

        // Per dimension: the selected 0-based positions, and whether the
        // dimension survives in the result.
        let mut picks: Vec<(Vec<usize>, bool)> = Vec::with_capacity(self.ndim());
        for (dim, &len) in self.shape.iter().enumerate() {
            let sel = selectors.get(dim).copied().unwrap_or(Selector::All);
            picks.push(match sel {
                Selector::Index(i) => (vec![resolve(i, dim + 1, len)?], false),
                Selector::All => ((0..len).collect(), true),
                Selector::Range(start, end) => {
                    let lo = start.map_or(Ok(0), |s| resolve(s, dim + 1, len))?;
                    let hi = match end {
                        Some(e) => resolve(e, dim + 1, len)?,
                        None => len.saturating_sub(1),
                    };
                    if lo > hi {
                        return Err(TensorError::InvalidRange {
                            start: start.unwrap_or(1),
                            end: end.unwrap_or(-1),
                            dim: dim + 1,
                        });
                    }
                    ((lo..=hi).collect(), true)
                }
            });
        }

        let shape: Vec<usize> = picks
            .iter()
            .filter(|(_, kept)| *kept)
            .map(|(p, _)| p.len())
            .collect();
        let mut data = Vec::with_capacity(shape.iter().product());
        self.gather(&picks, 0, 0, &mut data);
        Ok(Value::tensor(Self::from_parts(shape, data)))
    }

    fn gather(&self, picks: &[(Vec<usize>, bool)], dim: usize, base: usize, out: &mut Vec<Value>) {
        if dim == picks.len() {
            out.push(self.data[base].clone());
            return;
        }
        for &i in &picks[dim].0 {
            self.gather(picks, dim + 1, base + i * self.strides[dim], out);
        }
    }

    /// Copy with every element deep-copied.
    #[must_use]
    pub fn deep_copy(&self) -> Tensor {
        Tensor {
            elem_type: self.elem_type,
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            data: self.data.iter().map(Value::deep_copy).collect(),
        }
    }

    /// Nested `[...]` rendering, one bracket level per dimension.
    pub(super) fn fmt_with(
        &self,
        f: &mut fmt::Formatter<'_>,
        elem: fn(&Value, &mut fmt::Formatter<'_>) -> fmt::Result,
    ) -> fmt::Result {
        if self.ndim() == 0 {
            return f.write_str("[]");
        }
        self.fmt_dim(f, 0, 0, elem)
    }

    fn fmt_dim(
        &self,
        f: &mut fmt::Formatter<'_>,
        dim: usize,
        base: usize,
        elem: fn(&Value, &mut fmt::Formatter<'_>) -> fmt::Result,
    ) -> fmt::Result {
        f.write_str("[")?;
        for i in 0..self.shape[dim] {
            if i > 0 {
                f.write_str(", ")?;
            }
            let off = base + i * self.strides[dim];
            if dim + 1 == self.ndim() {
                elem(&self.data[off], f)?;
            } else {
                self.fmt_dim(f, dim + 1, off, elem)?;
            }
        }
        f.write_str("]")
    }
}

/// Shared, lock-protected tensor handle.
#[derive(Clone)]
pub struct TensorRef(Arc<RwLock<Tensor>>);

impl TensorRef {
    pub fn new(t: Tensor) -> Self {
        TensorRef(Arc::new(RwLock::new(t)))
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Tensor> {
        self.0.read()
    }

    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Tensor> {
        self.0.write()
    }

    #[inline]
    pub fn ptr_eq(a: &TensorRef, b: &TensorRef) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

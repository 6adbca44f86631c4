//! Edge-based grids for altitude and wavelength.
//!
//! A [`Grid`] is a set of strictly increasing edges defining contiguous
//! sections (layers of the atmosphere, or wavelength bands). Edges are stored
//! as an $(n_{\text{edges}}, n_{\text{columns}})$ array so that vertical
//! grids may differ from one atmospheric column to the next; grids that are
//! the same everywhere (e.g. wavelength) have a single column.
//!
//! Vertical grids are ordered bottom to top, i.e. section 0 is the layer
//! adjacent to the surface.

use ndarray::{s, Array2, ArrayView1};
use thiserror::Error;

use crate::precision::Real;

/// Errors from grid and profile construction.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("Grid '{name}' needs at least 2 edges, got {found}")]
    TooFewEdges { name: String, found: usize },

    #[error("Grid '{name}' needs at least one column")]
    NoColumns { name: String },

    #[error("Grid '{name}' edges must be strictly increasing (column {column}, edge {index})")]
    NotIncreasing {
        name: String,
        column: usize,
        index: usize,
    },

    #[error("Section {index} is out of range for grid '{name}' with {sections} sections")]
    SectionOutOfRange {
        name: String,
        index: usize,
        sections: usize,
    },

    #[error("'{name}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// A one-dimensional grid of sections, optionally varying by column.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Human-readable name, e.g. `"altitude"`.
    pub name: String,
    /// Units of the edge values, e.g. `"km"` or `"nm"`.
    pub units: String,
    edges: Array2<Real>,
}

impl Grid {
    /// Create a grid from an $(n_{\text{edges}}, n_{\text{columns}})$ array
    /// of edges.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        edges: Array2<Real>,
    ) -> Result<Self, GridError> {
        let name = name.into();
        if edges.nrows() < 2 {
            return Err(GridError::TooFewEdges {
                name,
                found: edges.nrows(),
            });
        }
        if edges.ncols() == 0 {
            return Err(GridError::NoColumns { name });
        }
        for (column, values) in edges.columns().into_iter().enumerate() {
            for index in 1..values.len() {
                // Written so that NaN edges are rejected too.
                if !(values[index] > values[index - 1]) {
                    return Err(GridError::NotIncreasing {
                        name,
                        column,
                        index,
                    });
                }
            }
        }

        Ok(Self {
            name,
            units: units.into(),
            edges,
        })
    }

    /// Create a single-column grid from a slice of edges.
    pub fn from_edges(
        name: impl Into<String>,
        units: impl Into<String>,
        edges: &[Real],
    ) -> Result<Self, GridError> {
        let array = Array2::from_shape_fn((edges.len(), 1), |(i, _)| edges[i]);
        Self::new(name, units, array)
    }

    /// Create a single-column grid of `sections` equal sections spanning
    /// `[lower, upper]`.
    pub fn uniform(
        name: impl Into<String>,
        units: impl Into<String>,
        lower: Real,
        upper: Real,
        sections: usize,
    ) -> Result<Self, GridError> {
        let step = (upper - lower) / sections.max(1) as Real;
        let edges: Vec<Real> = (0..=sections)
            .map(|i| lower + step * i as Real)
            .collect();
        Self::from_edges(name, units, &edges)
    }

    /// Number of sections (layers or bands).
    pub fn number_of_sections(&self) -> usize {
        self.edges.nrows() - 1
    }

    /// Number of columns the edges are defined for.
    pub fn number_of_columns(&self) -> usize {
        self.edges.ncols()
    }

    /// Edge values, shape $(n_{\text{edges}}, n_{\text{columns}})$.
    pub fn edges(&self) -> &Array2<Real> {
        &self.edges
    }

    /// Edges of a single column.
    pub fn column_edges(&self, column: usize) -> ArrayView1<'_, Real> {
        self.edges.column(column)
    }

    /// Section midpoints, shape $(n_{\text{sections}}, n_{\text{columns}})$.
    pub fn midpoints(&self) -> Array2<Real> {
        Array2::from_shape_fn(
            (self.number_of_sections(), self.number_of_columns()),
            |(i, c)| 0.5 * (self.edges[[i, c]] + self.edges[[i + 1, c]]),
        )
    }

    /// Section widths, shape $(n_{\text{sections}}, n_{\text{columns}})$.
    pub fn deltas(&self) -> Array2<Real> {
        Array2::from_shape_fn(
            (self.number_of_sections(), self.number_of_columns()),
            |(i, c)| self.edges[[i + 1, c]] - self.edges[[i, c]],
        )
    }

    /// A one-section grid covering section `index` of this grid.
    ///
    /// Used to hand the solver one wavelength band at a time.
    pub fn section(&self, index: usize) -> Result<Grid, GridError> {
        let sections = self.number_of_sections();
        if index >= sections {
            return Err(GridError::SectionOutOfRange {
                name: self.name.clone(),
                index,
                sections,
            });
        }
        Ok(Grid {
            name: self.name.clone(),
            units: self.units.clone(),
            edges: self.edges.slice(s![index..index + 2, ..]).to_owned(),
        })
    }

    /// Repeat a single-column grid for `columns` columns.
    pub fn broadcast_columns(&self, columns: usize) -> Result<Grid, GridError> {
        if self.number_of_columns() != 1 {
            return Err(GridError::ShapeMismatch {
                name: self.name.clone(),
                expected: (self.edges.nrows(), 1),
                found: self.edges.dim(),
            });
        }
        if columns == 0 {
            return Err(GridError::NoColumns {
                name: self.name.clone(),
            });
        }
        let edges = Array2::from_shape_fn((self.edges.nrows(), columns), |(i, _)| {
            self.edges[[i, 0]]
        });
        Ok(Grid {
            name: self.name.clone(),
            units: self.units.clone(),
            edges,
        })
    }
}

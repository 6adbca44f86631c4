//! Vertical number-density profiles.
//!
//! A [`Profile`] holds a quantity (typically a number density in
//! molecule cm⁻³) at the edges of a vertical [`Grid`], one set of values per
//! column. Radiators need the amount of absorber in each layer, so the
//! profile also integrates the edge values over each layer to give a layer
//! column density (molecule cm⁻²):
//!
//! $$
//! N_i = \frac{n_i - n_{i+1}}{\ln(n_i / n_{i+1})}\,\Delta z_i
//! $$
//!
//! which is exact for a density decaying exponentially across the layer. When
//! either edge value is zero or both are equal, the trapezoidal rule
//! $\tfrac12 (n_i + n_{i+1}) \Delta z_i$ is used instead.

use ndarray::Array2;

use crate::grid::{Grid, GridError};
use crate::precision::Real;

/// Conversion from kilometres (grid units) to centimetres (density units).
pub const KM_TO_CM: Real = 1.0e5;

/// Relative difference below which two edge values are treated as equal.
const EXPONENTIAL_THRESHOLD: Real = 1.0e-4;

/// A quantity defined at the edges of a vertical grid.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Human-readable name, e.g. `"air"` or `"O3"`.
    pub name: String,
    /// Units of the edge values.
    pub units: String,
    layer_densities: Array2<Real>,
}

impl Profile {
    /// Create a profile from edge values shaped like `grid.edges()`.
    ///
    /// The grid is expected to be in kilometres; layer densities are in the
    /// edge-value units multiplied by centimetres.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        grid: &Grid,
        edge_values: Array2<Real>,
    ) -> Result<Self, GridError> {
        let name = name.into();
        if edge_values.dim() != grid.edges().dim() {
            return Err(GridError::ShapeMismatch {
                name,
                expected: grid.edges().dim(),
                found: edge_values.dim(),
            });
        }

        let deltas = grid.deltas();
        let layer_densities = Array2::from_shape_fn(deltas.dim(), |(i, c)| {
            layer_column_density(
                edge_values[[i, c]],
                edge_values[[i + 1, c]],
                deltas[[i, c]] * KM_TO_CM,
            )
        });

        Ok(Self {
            name,
            units: units.into(),
            layer_densities,
        })
    }

    /// Create a profile from one set of edge values, repeated for every
    /// column of `grid`.
    pub fn from_edge_values(
        name: impl Into<String>,
        units: impl Into<String>,
        grid: &Grid,
        values: &[Real],
    ) -> Result<Self, GridError> {
        let name = name.into();
        let (edges, columns) = grid.edges().dim();
        if values.len() != edges {
            return Err(GridError::ShapeMismatch {
                name,
                expected: (edges, 1),
                found: (values.len(), 1),
            });
        }
        let array = Array2::from_shape_fn((edges, columns), |(i, _)| values[i]);
        Self::new(name, units, grid, array)
    }


    /// Layer column densities, shape $(n_{\text{layers}}, n_{\text{columns}})$.
    pub fn layer_densities(&self) -> &Array2<Real> {
        &self.layer_densities
    }
}

fn layer_column_density(lower: Real, upper: Real, thickness_cm: Real) -> Real {
    if lower > 0.0
        && upper > 0.0
        && ((lower - upper).abs() / lower.max(upper)) > EXPONENTIAL_THRESHOLD
    {
        (lower - upper) / (lower / upper).ln() * thickness_cm
    } else {
        0.5 * (lower + upper) * thickness_cm
    }
}

//! Assembly of the layer-coupling tridiagonal system.
//!
//! In each layer the diffuse fluxes are a combination of two homogeneous
//! solutions with weights $Y_1$, $Y_2$ plus the particular solution. With
//! $E = e^{-\lambda\tau'}$ the homogeneous solutions enter through
//!
//! $$
//! e_1 = 1 + \Gamma E, \quad e_2 = 1 - \Gamma E, \quad
//! e_3 = \Gamma + E, \quad e_4 = \Gamma - E
//! $$
//!
//! Continuity of the upwelling and downwelling fluxes at every interface,
//! no diffuse downwelling flux at the top and a Lambertian surface at the
//! bottom give $2N$ equations for the unknowns
//! $(Y_{1,0}, Y_{2,0}, Y_{1,1}, Y_{2,1}, \dots)$. Combining the two
//! continuity equations of each interface (Toon et al. 1989, eqs. 39-43)
//! makes the system tridiagonal.

use super::parameters::DeltaEddingtonParameters;
use super::source::SourceTerms;
use crate::types::Real;

/// Homogeneous-solution coefficients $e_1 \dots e_4$ of every layer.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenCoefficients {
    pub e1: Vec<Real>,
    pub e2: Vec<Real>,
    pub e3: Vec<Real>,
    pub e4: Vec<Real>,
}

impl EigenCoefficients {
    pub fn compute(params: &DeltaEddingtonParameters) -> Self {
        let layers = params.number_of_layers();
        let mut coefficients = Self {
            e1: Vec::with_capacity(layers),
            e2: Vec::with_capacity(layers),
            e3: Vec::with_capacity(layers),
            e4: Vec::with_capacity(layers),
        };
        for layer in 0..layers {
            let gamma = params.coupling[layer];
            let decay = (-params.lambda[layer] * params.optical_depth[layer]).exp();
            coefficients.e1.push(1.0 + gamma * decay);
            coefficients.e2.push(1.0 - gamma * decay);
            coefficients.e3.push(gamma + decay);
            coefficients.e4.push(gamma - decay);
        }
        coefficients
    }
}

/// A tridiagonal system $a_i x_{i-1} + b_i x_i + c_i x_{i+1} = d_i$.
///
/// `lower[0]` and `upper[n - 1]` refer to entries outside the matrix and
/// are always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalSystem {
    pub lower: Vec<Real>,
    pub main: Vec<Real>,
    pub upper: Vec<Real>,
    pub rhs: Vec<Real>,
}

impl TridiagonalSystem {
    fn zeros(rows: usize) -> Self {
        Self {
            lower: vec![0.0; rows],
            main: vec![0.0; rows],
            upper: vec![0.0; rows],
            rhs: vec![0.0; rows],
        }
    }

    pub fn number_of_rows(&self) -> usize {
        self.main.len()
    }
}

/// Build the $2N \times 2N$ system of one column.
///
/// # Arguments
/// * `coefficients` - Eigen-coefficients of every layer.
/// * `sources` - Source terms of every layer.
/// * `surface_reflectivity` - Lambertian reflectivity $R_{\text{sfc}}$.
pub fn assemble(
    coefficients: &EigenCoefficients,
    sources: &SourceTerms,
    surface_reflectivity: Real,
) -> TridiagonalSystem {
    let EigenCoefficients { e1, e2, e3, e4 } = coefficients;
    let layers = e1.len();
    let rows = 2 * layers;
    let mut system = TridiagonalSystem::zeros(rows);
    if layers == 0 {
        return system;
    }

    let c_up_top = &sources.upwelling_top;
    let c_up_bot = &sources.upwelling_bottom;
    let c_down_top = &sources.downwelling_top;
    let c_down_bot = &sources.downwelling_bottom;

    // Top boundary: no diffuse flux enters from above.
    system.main[0] = e1[0];
    system.upper[0] = -e2[0];
    system.rhs[0] = -c_down_top[0];

    // Interfaces between layer k and k + 1.
    for k in 0..layers - 1 {
        let odd = 2 * k + 1;
        system.lower[odd] = e1[k] * e2[k + 1] - e3[k] * e4[k + 1];
        system.main[odd] = e2[k] * e2[k + 1] - e4[k] * e4[k + 1];
        system.upper[odd] = e1[k + 1] * e4[k + 1] - e2[k + 1] * e3[k + 1];
        system.rhs[odd] = e2[k + 1] * (c_up_top[k + 1] - c_up_bot[k])
            + e4[k + 1] * (c_down_bot[k] - c_down_top[k + 1]);

        let even = 2 * k + 2;
        system.lower[even] = e2[k] * e3[k] - e4[k] * e1[k];
        system.main[even] = e1[k] * e1[k + 1] - e3[k] * e3[k + 1];
        system.upper[even] = e3[k] * e4[k + 1] - e1[k] * e2[k + 1];
        system.rhs[even] = e3[k] * (c_up_top[k + 1] - c_up_bot[k])
            + e1[k] * (c_down_bot[k] - c_down_top[k + 1]);
    }

    // Surface boundary: reflected diffuse and direct flux.
    let last = layers - 1;
    let reflectivity = surface_reflectivity;
    system.lower[rows - 1] = e1[last] - reflectivity * e3[last];
    system.main[rows - 1] = e2[last] - reflectivity * e4[last];
    system.rhs[rows - 1] =
        sources.surface_source - c_up_bot[last] + reflectivity * c_down_bot[last];

    system
}

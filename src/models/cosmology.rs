//! Distance–redshift relations.
//!
//! Distances are physical and in Mpc; densities in `M_sun / Mpc^3`.

/// Speed of light (km/s).
const C_KM_S: f64 = 299_792.458;

/// Critical density today for `h = 1`, in `M_sun / Mpc^3`.
const RHO_CRIT0_H2: f64 = 2.775_366_27e11;

/// Redshift step of the tabulated comoving distance.
const TABLE_DZ: f64 = 1e-3;

/// Upper end of the table; larger redshifts are integrated directly.
const TABLE_Z_MAX: f64 = 10.0;

/// Simpson intervals (even) for the integral past the table.
const TAIL_STEPS: usize = 2000;

/// Opaque cosmology consumed by the shear predictor and unit conversions.
pub trait Cosmology: Send + Sync {
    /// Angular-diameter distance from the observer to redshift `z` (Mpc).
    fn angular_diameter_distance(&self, z: f64) -> f64;

    /// Angular-diameter distance between `z1 < z2` (Mpc); zero when `z2 <= z1`.
    fn angular_diameter_distance_z1z2(&self, z1: f64, z2: f64) -> f64;

    /// Mean matter density at redshift `z` (`M_sun / Mpc^3`, physical).
    fn mean_matter_density(&self, z: f64) -> f64;
}

/// Spatially flat ΛCDM, radiation neglected.
#[derive(Debug, Clone)]
pub struct FlatLambdaCdm {
    /// Hubble constant (km/s/Mpc).
    pub h0: f64,
    pub omega_m: f64,
    /// Comoving distance at `z = i * TABLE_DZ`.
    comoving_table: Vec<f64>,
}

impl Default for FlatLambdaCdm {
    fn default() -> Self {
        Self::new(70.0, 0.27)
    }
}

impl FlatLambdaCdm {
    pub fn new(h0: f64, omega_m: f64) -> Self {
        let mut cosmo = Self {
            h0,
            omega_m,
            comoving_table: Vec::new(),
        };
        cosmo.comoving_table = cosmo.build_table();
        cosmo
    }

    fn hubble_distance(&self) -> f64 {
        C_KM_S / self.h0
    }

    fn inv_efunc(&self, z: f64) -> f64 {
        let zp1 = 1.0 + z;
        1.0 / (self.omega_m * zp1 * zp1 * zp1 + (1.0 - self.omega_m)).sqrt()
    }

    /// Cumulative Simpson integral of `1/E(z)` on the table grid.
    fn build_table(&self) -> Vec<f64> {
        let n = (TABLE_Z_MAX / TABLE_DZ).round() as usize;
        let dh = self.hubble_distance();
        let mut out = Vec::with_capacity(n + 1);
        let mut acc = 0.0;
        out.push(0.0);
        for i in 0..n {
            let a = i as f64 * TABLE_DZ;
            let b = a + TABLE_DZ;
            let mid = 0.5 * (a + b);
            acc += TABLE_DZ / 6.0 * (self.inv_efunc(a) + 4.0 * self.inv_efunc(mid) + self.inv_efunc(b));
            out.push(acc * dh);
        }
        out
    }

    /// Composite Simpson integral of `1/E(z)` from `z0` to `z1`, used beyond the table.
    ///
    /// Integrates over `u = 1/sqrt(1+z)`, where the integrand `2/sqrt(Ω_m + Ω_Λ u^6)`
    /// is smooth on `[0, 1]`, so the step count is fixed and `z1 = ∞` is finite.
    fn integrate_comoving(&self, z0: f64, z1: f64) -> f64 {
        let u0 = 1.0 / (1.0 + z0).sqrt();
        let u1 = 1.0 / (1.0 + z1).sqrt();
        let omega_l = 1.0 - self.omega_m;
        let integrand = |u: f64| 2.0 / (self.omega_m + omega_l * u.powi(6)).sqrt();

        let h = (u0 - u1) / TAIL_STEPS as f64;
        let mut sum = integrand(u0) + integrand(u1);
        for i in 1..TAIL_STEPS {
            let w = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += w * integrand(u1 + i as f64 * h);
        }
        sum * h / 3.0 * self.hubble_distance()
    }

    /// Line-of-sight comoving distance (Mpc).
    pub fn comoving_distance(&self, z: f64) -> f64 {
        if z <= 0.0 {
            return 0.0;
        }
        let last = self.comoving_table.len() - 1;
        let pos = z / TABLE_DZ;
        let i = pos.floor() as usize;
        if i >= last {
            let top = last as f64 * TABLE_DZ;
            return self.comoving_table[last] + self.integrate_comoving(top, z);
        }
        let t = pos - i as f64;
        self.comoving_table[i] * (1.0 - t) + self.comoving_table[i + 1] * t
    }
}

impl Cosmology for FlatLambdaCdm {
    fn angular_diameter_distance(&self, z: f64) -> f64 {
        self.comoving_distance(z) / (1.0 + z)
    }

    fn angular_diameter_distance_z1z2(&self, z1: f64, z2: f64) -> f64 {
        if z2 <= z1 {
            return 0.0;
        }
        (self.comoving_distance(z2) - self.comoving_distance(z1)) / (1.0 + z2)
    }

    fn mean_matter_density(&self, z: f64) -> f64 {
        let h = self.h0 / 100.0;
        let zp1 = 1.0 + z;
        self.omega_m * RHO_CRIT0_H2 * h * h * zp1 * zp1 * zp1
    }
}

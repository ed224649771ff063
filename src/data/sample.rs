//! Synthetic dataset generation.
//!
//! Produces the three tables the pipeline consumes:
//!
//! - a bank of ideal functions on a uniform grid (mixed trigonometric /
//!   polynomial / Gaussian shapes)
//! - training series: a few ideal functions picked at random, plus Gaussian noise
//! - test points: noisy samples of the picked functions mixed with off-curve points
//!
//! Everything is driven by a seeded `StdRng`, so a given config always yields the
//! same dataset.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{CurveId, CurveTable, QueryPoint};
use crate::error::AppError;

/// Knobs for [`generate_dataset`].
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub seed: u64,
    pub n_grid: usize,
    pub x_min: f64,
    pub x_step: f64,
    pub n_ideal: usize,
    pub n_train: usize,
    /// Standard deviation of the noise added to training series and test points.
    pub noise_sd: f64,
    pub n_test: usize,
    /// Share of test points drawn uniformly instead of from a picked function.
    pub off_curve_frac: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_grid: 400,
            x_min: -20.0,
            x_step: 0.1,
            n_ideal: 50,
            n_train: 4,
            noise_sd: 0.2,
            n_test: 100,
            off_curve_frac: 0.2,
        }
    }
}

/// Generated tables plus the ground-truth assignment of training series.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub ideal: CurveTable,
    pub train: CurveTable,
    pub test: Vec<QueryPoint>,
    /// `(training series, ideal function it was drawn from)`.
    pub truth: Vec<(CurveId, CurveId)>,
}

pub fn generate_dataset(config: &SampleConfig) -> Result<Dataset, AppError> {
    if config.n_grid < 2 {
        return Err(AppError::new(2, "Grid must have at least 2 points."));
    }
    if !(config.x_min.is_finite() && config.x_step.is_finite() && config.x_step > 0.0) {
        return Err(AppError::new(2, "Invalid grid start/step."));
    }
    if config.n_ideal == 0 || config.n_train == 0 || config.n_train > config.n_ideal {
        return Err(AppError::new(
            2,
            "Need 1 <= number of training series <= number of ideal functions.",
        ));
    }
    if !(0.0..=1.0).contains(&config.off_curve_frac) {
        return Err(AppError::new(2, "Off-curve fraction must be in [0, 1]."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sd)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;

    let xs: Vec<f64> = (0..config.n_grid)
        .map(|i| config.x_min + i as f64 * config.x_step)
        .collect();

    let shapes: Vec<Shape> = (0..config.n_ideal).map(|k| Shape::random(k, &mut rng)).collect();
    let ideal_cols: Vec<(CurveId, Vec<f64>)> = shapes
        .iter()
        .enumerate()
        .map(|(k, shape)| (CurveId(k as u32 + 1), xs.iter().map(|&x| shape.eval(x)).collect()))
        .collect();

    let ids: Vec<u32> = (1..=config.n_ideal as u32).collect();
    let picked: Vec<u32> = ids.choose_multiple(&mut rng, config.n_train).copied().collect();

    let mut truth = Vec::with_capacity(picked.len());
    let mut train_cols = Vec::with_capacity(picked.len());
    for (s, &id) in picked.iter().enumerate() {
        let shape = &shapes[id as usize - 1];
        let ys = xs.iter().map(|&x| shape.eval(x) + noise.sample(&mut rng)).collect();
        let series = CurveId(s as u32 + 1);
        truth.push((series, CurveId(id)));
        train_cols.push((series, ys));
    }

    let (y_lo, y_hi) = value_range(&ideal_cols);
    let mut test = Vec::with_capacity(config.n_test);
    for _ in 0..config.n_test {
        let x = xs[rng.gen_range(0..xs.len())];
        let roll: f64 = rng.r#gen();
        let y = if roll < config.off_curve_frac {
            rng.gen_range(y_lo..=y_hi)
        } else {
            let id = picked[rng.gen_range(0..picked.len())];
            shapes[id as usize - 1].eval(x) + noise.sample(&mut rng)
        };
        test.push(QueryPoint { x, y });
    }

    Ok(Dataset {
        ideal: CurveTable::new(xs.clone(), ideal_cols)?,
        train: CurveTable::new(xs, train_cols)?,
        test,
        truth,
    })
}

/// Parametric shape of one ideal function.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Sine { amp: f64, freq: f64, phase: f64 },
    Line { slope: f64, offset: f64 },
    Parabola { a: f64, offset: f64 },
    Bump { amp: f64, center: f64, width: f64 },
    Cubic { a: f64, b: f64 },
}

impl Shape {
    fn random(k: usize, rng: &mut StdRng) -> Self {
        match k % 5 {
            0 => Shape::Sine {
                amp: rng.gen_range(0.5..5.0),
                freq: rng.gen_range(0.2..2.0),
                phase: rng.gen_range(0.0..std::f64::consts::TAU),
            },
            1 => Shape::Line {
                slope: rng.gen_range(-3.0..3.0),
                offset: rng.gen_range(-10.0..10.0),
            },
            2 => Shape::Parabola {
                a: rng.gen_range(-0.1..0.1),
                offset: rng.gen_range(-10.0..10.0),
            },
            3 => Shape::Bump {
                amp: rng.gen_range(-20.0..20.0),
                center: rng.gen_range(-15.0..15.0),
                width: rng.gen_range(1.0..6.0),
            },
            _ => Shape::Cubic {
                a: rng.gen_range(-0.005..0.005),
                b: rng.gen_range(-1.0..1.0),
            },
        }
    }

    fn eval(self, x: f64) -> f64 {
        match self {
            Shape::Sine { amp, freq, phase } => amp * (freq * x + phase).sin(),
            Shape::Line { slope, offset } => slope * x + offset,
            Shape::Parabola { a, offset } => a * x * x + offset,
            Shape::Bump { amp, center, width } => {
                let z = (x - center) / width;
                amp * (-0.5 * z * z).exp()
            }
            Shape::Cubic { a, b } => a * x * x * x + b * x,
        }
    }
}

fn value_range(cols: &[(CurveId, Vec<f64>)]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in cols.iter().flat_map(|(_, ys)| ys.iter()) {
        lo = lo.min(*v);
        hi = hi.max(*v);
    }
    if lo.is_finite() && hi.is_finite() && hi > lo { (lo, hi) } else { (-1.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_dataset() {
        let config = SampleConfig {
            n_grid: 50,
            n_test: 20,
            ..SampleConfig::default()
        };
        let a = generate_dataset(&config).unwrap();
        let b = generate_dataset(&config).unwrap();
        assert_eq!(a.truth, b.truth);
        assert_eq!(a.test, b.test);
        assert_eq!(a.train.values(), b.train.values());
    }

    #[test]
    fn tables_share_one_grid_and_test_x_lies_on_it() {
        let data = generate_dataset(&SampleConfig::default()).unwrap();
        assert_eq!(data.ideal.len(), 50);
        assert_eq!(data.train.len(), 4);
        assert!(data.ideal.grid().ensure_same(data.train.grid()).is_ok());
        assert!(data.test.iter().all(|p| !data.ideal.grid().positions(p.x).is_empty()));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let too_many = SampleConfig {
            n_train: 60,
            ..SampleConfig::default()
        };
        assert!(generate_dataset(&too_many).is_err());

        let bad_grid = SampleConfig {
            n_grid: 1,
            ..SampleConfig::default()
        };
        assert!(generate_dataset(&bad_grid).is_err());
    }
}

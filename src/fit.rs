//! First-degree curve fitting for the diode variant's derived quantities.
//!
//! The diode post-processing selects the points whose dependent value
//! exceeds 70% of the series maximum, fits a line through them, and derives
//! the threshold voltage (x-intercept of the fit) and the serial resistance
//! (reciprocal slope).

/// Fraction of the series maximum above which points enter the fit.
pub const FIT_FRACTION: f64 = 0.7;

/// Errors raised by curve fitting.
#[derive(Debug, thiserror::Error)]
pub enum FitError {
    /// The series carries no points.
    #[error("Cannot fit an empty series")]
    EmptySeries,

    /// The x and y series disagree in length.
    #[error("Series length mismatch: {x} x values vs {y} y values")]
    LengthMismatch {
        /// Number of x values.
        x: usize,
        /// Number of y values.
        y: usize,
    },

    /// Fewer than two points passed the selection threshold.
    #[error("Not enough points above the fit threshold (got {0})")]
    TooFewPoints(usize),

    /// The fitted line is flat (or the x values carry no variance), so the
    /// threshold and resistance quantities are undefined.
    #[error("Fitted slope is degenerate; threshold and resistance are undefined")]
    DegenerateSlope,
}

/// A fitted first-degree polynomial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
}

impl LinearFit {
    /// Evaluate the fitted line at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Diode fit outcome: the line, the derived quantities, and the overlay
/// series evaluated over the full x range.
#[derive(Debug, Clone)]
pub struct DiodeFit {
    /// The fitted line.
    pub fit: LinearFit,
    /// X-intercept of the fitted line.
    pub threshold_voltage: f64,
    /// Reciprocal slope of the fitted line.
    pub serial_resistance: f64,
    /// Fit line evaluated at every x of the input series.
    pub fit_line: Vec<f64>,
}

/// Least-squares fit of a first-degree polynomial.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<LinearFit, FitError> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch { x: x.len(), y: y.len() });
    }
    if x.len() < 2 {
        return Err(FitError::TooFewPoints(x.len()));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        covariance += (xi - mean_x) * (yi - mean_y);
        variance += (xi - mean_x) * (xi - mean_x);
    }
    if variance == 0.0 {
        return Err(FitError::DegenerateSlope);
    }

    let slope = covariance / variance;
    Ok(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Fit the top-[`FIT_FRACTION`] subset of a series and derive the diode
/// quantities.
///
/// A zero fitted slope is an error by policy: the x-intercept and reciprocal
/// slope would be undefined, and the archive format cannot carry non-finite
/// sentinels.
pub fn diode_fit(x: &[f64], y: &[f64]) -> Result<DiodeFit, FitError> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch { x: x.len(), y: y.len() });
    }
    let max_y = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max_y.is_finite() {
        return Err(FitError::EmptySeries);
    }

    let threshold = FIT_FRACTION * max_y;
    let mut selected_x = Vec::new();
    let mut selected_y = Vec::new();
    for (&xi, &yi) in x.iter().zip(y) {
        if yi > threshold {
            selected_x.push(xi);
            selected_y.push(yi);
        }
    }

    let fit = linear_fit(&selected_x, &selected_y)?;
    if fit.slope == 0.0 {
        return Err(FitError::DegenerateSlope);
    }

    Ok(DiodeFit {
        fit,
        threshold_voltage: -fit.intercept / fit.slope,
        serial_resistance: 1.0 / fit.slope,
        fit_line: x.iter().map(|&xi| fit.evaluate(xi)).collect(),
    })
}

//! PyO3 bindings for Python integration

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use crate::error::PsdError;

mod spectrum_bindings;
mod analyzer_bindings;

impl From<PsdError> for PyErr {
    fn from(err: PsdError) -> PyErr {
        match err {
            PsdError::InvalidParameter { .. } => PyValueError::new_err(err.to_string()),
            PsdError::Fft(_) => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// Python module definition
#[pymodule]
fn vibration_psd(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(spectrum_bindings::plan_segments, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::welch_psd, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::maximax_psd, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::to_octave_bands, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::rms_from_psd, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::to_db, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::window_names, m)?)?;

    m.add_class::<analyzer_bindings::PySpectralAnalyzer>()?;

    Ok(())
}

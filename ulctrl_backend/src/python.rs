//! Python module `ulctrl_backend` (feature `python`).
//!
//! ```python
//! import ulctrl_backend as ul
//!
//! ul.load_config("boards.toml")      # optional; the demo board is used otherwise
//! board = ul.Board(0)
//! try:
//!     raw = board.a_in(0, "BIP10VOLTS")
//!     print(raw, board.to_eng_units("BIP10VOLTS", raw))
//! except ul.ULError as e:
//!     code, message = e.args
//! ```

use parking_lot::Mutex;
use pyo3::create_exception;
use pyo3::exceptions::PyException;
use pyo3::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use ulcore_backend::*;

use crate::board::Board;
use crate::library::{open_library, UniversalLibrary};
use crate::scan::AiScan;

create_exception!(ulctrl_backend, ULError, PyException);

static LIBRARY: Mutex<Option<Arc<dyn UniversalLibrary>>> = parking_lot::const_mutex(None);

fn to_py_err(err: UlError) -> PyErr {
    ULError::new_err((err.code(), err.message().to_string()))
}

fn library() -> PyResult<Arc<dyn UniversalLibrary>> {
    let mut lib = LIBRARY.lock();
    if let Some(lib) = lib.as_ref() {
        return Ok(lib.clone());
    }
    let opened = open_library(&UlConfig::demo()).map_err(|e| PyException::new_err(e.to_string()))?;
    *lib = Some(opened.clone());
    Ok(opened)
}

fn parse_range(range: &str) -> PyResult<UlRange> {
    range.parse().map_err(to_py_err)
}

/// Opens the library described by a TOML configuration file, replacing the current one.
#[pyfunction]
fn load_config(path: &str) -> PyResult<()> {
    let config = UlConfig::from_file(path).map_err(|e| PyException::new_err(e.to_string()))?;
    let lib = open_library(&config).map_err(|e| PyException::new_err(e.to_string()))?;
    *LIBRARY.lock() = Some(lib);
    Ok(())
}

#[pyfunction]
fn get_err_msg(code: i32) -> PyResult<String> {
    library()?.get_err_msg(code).map_err(to_py_err)
}

#[pyclass(name = "Board")]
pub struct PyBoard {
    board: Board,
}

#[pymethods]
impl PyBoard {
    #[new]
    pub fn new(board_num: i32) -> PyResult<Self> {
        Ok(PyBoard {
            board: Board::new(board_num, library()?),
        })
    }

    #[getter]
    pub fn board_num(&self) -> i32 {
        self.board.board_num()
    }

    pub fn a_in(&self, channel: i32, range: &str) -> PyResult<u16> {
        self.board.a_in(channel, parse_range(range)?).map_err(to_py_err)
    }

    pub fn to_eng_units(&self, range: &str, data_value: u16) -> PyResult<f32> {
        self.board
            .to_eng_units(parse_range(range)?, data_value)
            .map_err(to_py_err)
    }

    pub fn v_in(&self, channel: i32, range: &str) -> PyResult<f32> {
        self.board
            .v_in(channel, parse_range(range)?, VInOptions::DEFAULT)
            .map_err(to_py_err)
    }

    pub fn a_out(&self, channel: i32, range: &str, data_value: u16) -> PyResult<()> {
        self.board
            .a_out(channel, parse_range(range)?, data_value)
            .map_err(to_py_err)
    }

    pub fn v_out(&self, channel: i32, range: &str, value: f32) -> PyResult<()> {
        self.board
            .v_out(channel, parse_range(range)?, value, VInOptions::DEFAULT)
            .map_err(to_py_err)
    }

    pub fn d_in(&self, port: &str) -> PyResult<u16> {
        let port: DigitalPortType = port.parse().map_err(to_py_err)?;
        self.board.d_in(port).map_err(to_py_err)
    }

    pub fn d_out(&self, port: &str, data_value: u16) -> PyResult<()> {
        let port: DigitalPortType = port.parse().map_err(to_py_err)?;
        self.board.d_out(port, data_value).map_err(to_py_err)
    }

    /// Runs a finite scan and returns the samples as a `channels x samples` uint16 array.
    pub fn scan(
        &self,
        low_chan: i32,
        high_chan: i32,
        count: usize,
        rate: u32,
        range: &str,
        py: Python,
    ) -> PyResult<PyObject> {
        let range = parse_range(range)?;
        let scan = AiScan::start(&self.board, low_chan, high_chan, count, rate, range, ScanOptions::FOREGROUND)
            .map_err(to_py_err)?;
        let expected = scan.scans_per_buffer() as f64 / scan.params().rate.max(1) as f64;
        let done = py
            .allow_threads(|| scan.wait(Duration::from_secs_f64(2.0 * expected + 1.0)))
            .map_err(to_py_err)?;
        if !done {
            return Err(to_py_err(UlError::with_context(ErrorCode::INPUTTIMEOUT, "scan did not finish")));
        }
        let arr = scan.data().map_err(to_py_err)?;
        Ok(numpy::PyArray::from_array(py, &arr).to_object(py))
    }
}

#[pymodule]
fn ulctrl_backend(py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyBoard>()?;
    m.add_function(wrap_pyfunction!(get_err_msg, m)?)?;
    m.add_function(wrap_pyfunction!(load_config, m)?)?;
    m.add("ULError", py.get_type::<ULError>())?;
    Ok(())
}

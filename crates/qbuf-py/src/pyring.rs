use ::qbuf::RingBuffer;
use pyo3::{prelude::*, types::PyBytes};

use crate::pyerror::{to_length, to_py_err};

/// Python face of [`RingBuffer`].
#[pyclass(name = "RingBuffer", module = "qbuf")]
pub struct PyRingBuffer {
    inner: RingBuffer,
}

#[pymethods]
impl PyRingBuffer {
    #[new]
    #[pyo3(signature = (size, delimiter=None))]
    fn new(size: isize, delimiter: Option<Vec<u8>>) -> PyResult<Self> {
        let size = to_length(size)?;
        Ok(Self {
            inner: match delimiter {
                Some(delimiter) => RingBuffer::with_delimiter(size, delimiter),
                None => RingBuffer::new(size),
            },
        })
    }

    fn push(&mut self, py: Python<'_>, data: &[u8]) -> PyResult<()> {
        self.inner.push(data).map_err(|err| to_py_err(py, &err))
    }

    #[pyo3(signature = (length=None))]
    fn pop<'py>(&mut self, py: Python<'py>, length: Option<isize>) -> PyResult<Bound<'py, PyBytes>> {
        let data = match length {
            Some(length) => self
                .inner
                .pop(to_length(length)?)
                .map_err(|err| to_py_err(py, &err))?,
            None => self.inner.pop_all(),
        };
        Ok(PyBytes::new(py, &data))
    }

    fn popline<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        self.inner
            .popline()
            .map(|line| PyBytes::new(py, &line))
            .map_err(|err| to_py_err(py, &err))
    }

    fn poplines<'py>(&mut self, py: Python<'py>) -> PyResult<Vec<Bound<'py, PyBytes>>> {
        let lines = self.inner.poplines().map_err(|err| to_py_err(py, &err))?;
        Ok(lines.iter().map(|line| PyBytes::new(py, line)).collect())
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    #[getter]
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    #[getter]
    fn delimiter<'py>(&self, py: Python<'py>) -> Bound<'py, PyBytes> {
        PyBytes::new(py, self.inner.delimiter().unwrap_or_default())
    }

    #[setter]
    fn set_delimiter(&mut self, delimiter: Vec<u8>) {
        self.inner.set_delimiter(delimiter);
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

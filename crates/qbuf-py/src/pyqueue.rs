use ::qbuf::{BufferQueue, Bytes, NextRecord, PopOptions, StructValue, UnderflowPolicy};
use pyo3::{
    IntoPyObjectExt,
    prelude::*,
    types::{PyBytes, PyMemoryView, PyTuple},
};

use crate::pyerror::{to_length, to_py_err};

/// Python face of [`BufferQueue`].
#[pyclass(name = "BufferQueue", module = "qbuf")]
pub struct PyBufferQueue {
    inner: BufferQueue,
}

fn bytes<'py>(py: Python<'py>, data: &Bytes) -> Bound<'py, PyBytes> {
    PyBytes::new(py, data)
}

fn struct_value<'py>(py: Python<'py>, value: &StructValue) -> PyResult<Bound<'py, PyAny>> {
    match value {
        StructValue::Int(v) => v.into_bound_py_any(py),
        StructValue::UInt(v) => v.into_bound_py_any(py),
        StructValue::Float(v) => v.into_bound_py_any(py),
        StructValue::Bool(v) => v.into_bound_py_any(py),
        StructValue::Bytes(v) => Ok(bytes(py, v).into_any()),
    }
}

#[pymethods]
impl PyBufferQueue {
    #[new]
    #[pyo3(signature = (delimiter=None))]
    fn new(delimiter: Option<Vec<u8>>) -> Self {
        Self {
            inner: delimiter.map_or_else(BufferQueue::new, BufferQueue::with_delimiter),
        }
    }

    fn push(&mut self, data: &[u8]) {
        self.inner.push_slice(data);
    }

    /// Push each element of `iterable`. Elements before a non-bytes element
    /// stay pushed.
    fn push_many(&mut self, iterable: &Bound<'_, PyAny>) -> PyResult<()> {
        for item in iterable.try_iter()? {
            let item = item?;
            self.inner.push_slice(item.downcast::<PyBytes>()?.as_bytes());
        }
        Ok(())
    }

    /// Pop `length` bytes, or everything when `length` is `None`.
    ///
    /// With `as_view` the result is a `memoryview` over a copied `bytes`
    /// object, not over queue memory.
    #[pyo3(signature = (length=None, underflow=true, as_view=false))]
    fn pop<'py>(
        &mut self,
        py: Python<'py>,
        length: Option<isize>,
        underflow: bool,
        as_view: bool,
    ) -> PyResult<Bound<'py, PyAny>> {
        let length = length.map(to_length).transpose()?;
        let options = PopOptions {
            underflow: if underflow {
                UnderflowPolicy::Error
            } else {
                UnderflowPolicy::Clamp
            },
            as_view,
        };
        let data = self
            .inner
            .pop_with(length, options)
            .map_err(|err| to_py_err(py, &err))?;
        let data = bytes(py, &data).into_any();
        if as_view {
            Ok(PyMemoryView::from(&data)?.into_any())
        } else {
            Ok(data)
        }
    }

    fn pop_atmost<'py>(&mut self, py: Python<'py>, length: isize) -> PyResult<Bound<'py, PyBytes>> {
        Ok(bytes(py, &self.inner.pop_atmost(to_length(length)?)))
    }

    /// Pop `length` bytes as a `memoryview`.
    ///
    /// The view wraps a fresh `bytes` copy; it does not share memory with
    /// the queue's chunks.
    #[pyo3(signature = (length=None))]
    fn pop_view<'py>(
        &mut self,
        py: Python<'py>,
        length: Option<isize>,
    ) -> PyResult<Bound<'py, PyAny>> {
        self.pop(py, length, true, true)
    }

    fn pop_struct<'py>(&mut self, py: Python<'py>, format: &str) -> PyResult<Bound<'py, PyTuple>> {
        let values = self
            .inner
            .pop_struct(format)
            .map_err(|err| to_py_err(py, &err))?;
        let values = values
            .iter()
            .map(|value| struct_value(py, value))
            .collect::<PyResult<Vec<_>>>()?;
        PyTuple::new(py, values)
    }

    #[pyo3(signature = (delimiter=None, keepends=false))]
    fn popline<'py>(
        &mut self,
        py: Python<'py>,
        delimiter: Option<&[u8]>,
        keepends: bool,
    ) -> PyResult<Bound<'py, PyBytes>> {
        self.inner
            .popline_with(delimiter, keepends)
            .map(|line| bytes(py, &line))
            .map_err(|err| to_py_err(py, &err))
    }

    #[pyo3(signature = (delimiter=None))]
    fn poplines<'py>(
        &mut self,
        py: Python<'py>,
        delimiter: Option<&[u8]>,
    ) -> PyResult<Vec<Bound<'py, PyBytes>>> {
        let lines = self
            .inner
            .poplines_with(delimiter)
            .map_err(|err| to_py_err(py, &err))?;
        Ok(lines.iter().map(|line| bytes(py, line)).collect())
    }

    fn clear(&mut self) {
        self.inner.clear();
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

    fn __bool__(&self) -> bool {
        !self.inner.is_empty()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__<'py>(&mut self, py: Python<'py>) -> PyResult<Option<Bound<'py, PyBytes>>> {
        match self.inner.next_record() {
            Ok(NextRecord::Record(record)) => Ok(Some(bytes(py, &record))),
            Ok(NextRecord::Exhausted) => Ok(None),
            Err(err) => Err(to_py_err(py, &err)),
        }
    }
}

use ::qbuf::{ErrorKind, QueueError};
use pyo3::{
    create_exception,
    exceptions::PyValueError,
    prelude::*,
    types::PyType,
};

create_exception!(
    qbuf,
    BufferUnderflow,
    PyValueError,
    "Not enough bytes are buffered to satisfy the read."
);

/// Map a queue error onto the Python exception its kind corresponds to.
pub(crate) fn to_py_err(py: Python<'_>, err: &QueueError) -> PyErr {
    let message = err.to_string();
    match err.kind() {
        ErrorKind::Underflow => BufferUnderflow::new_err(message),
        ErrorKind::Value => PyValueError::new_err(message),
        ErrorKind::Format => match struct_error(py) {
            Ok(ty) => PyErr::from_type(ty, message),
            Err(err) => err,
        },
    }
}

fn struct_error(py: Python<'_>) -> PyResult<Bound<'_, PyType>> {
    Ok(py
        .import("struct")?
        .getattr("error")?
        .downcast_into::<PyType>()?)
}

/// Reject negative lengths the way Python slicing APIs do.
pub(crate) fn to_length(length: isize) -> PyResult<usize> {
    usize::try_from(length)
        .map_err(|_| PyValueError::new_err(format!("length must be non-negative, got {length}")))
}

mod pyerror;
mod pyqueue;
mod pyring;

pub use pyerror::BufferUnderflow;
pub use pyqueue::PyBufferQueue;
pub use pyring::PyRingBuffer;

use pyo3::prelude::*;

#[pymodule]
pub fn qbuf(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyBufferQueue>()?;
    m.add_class::<PyRingBuffer>()?;
    m.add("BufferUnderflow", m.py().get_type::<BufferUnderflow>())?;
    Ok(())
}

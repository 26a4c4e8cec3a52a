use pyo3::exceptions::{PyRuntimeError, PyStopIteration};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use std::sync::Arc;

use crate::config::LoaderConfig;
use crate::error::LoaderError;
use crate::loader::{GrpcConnector, LoaderClient};
use crate::runtime::executor::RuntimeConfig;
use crate::runtime::LoaderRuntime;

fn to_py_err(e: LoaderError) -> PyErr {
    match e {
        LoaderError::EndOfStream => PyStopIteration::new_err("loader exhausted"),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

#[pyclass(name = "Loader")]
struct PyLoader {
    runtime: Arc<LoaderRuntime>,
    inner: Option<LoaderClient>,
}

impl PyLoader {
    fn client(&mut self) -> PyResult<&mut LoaderClient> {
        self.inner
            .as_mut()
            .ok_or_else(|| PyRuntimeError::new_err("loader already deleted"))
    }
}

#[pymethods]
impl PyLoader {
    #[new]
    #[pyo3(signature = (dataset_name, name, ip, nums = 1, batch_size = -1))]
    fn new(
        py: Python<'_>,
        dataset_name: String,
        name: String,
        ip: String,
        nums: u32,
        batch_size: i32,
    ) -> PyResult<Self> {
        let runtime = LoaderRuntime::new(RuntimeConfig::default()).map_err(to_py_err)?;
        let config = LoaderConfig::new(dataset_name, name, ip)
            .with_nums(nums)
            .with_batch_size(batch_size);

        let handle = runtime.fetch_handle();
        let client = py
            .allow_threads(|| {
                runtime.block_on(async {
                    let connector = GrpcConnector::from_config(&config);
                    LoaderClient::create_with(&handle, connector, config).await
                })
            })
            .map_err(to_py_err)?;

        Ok(Self {
            runtime: Arc::new(runtime),
            inner: Some(client),
        })
    }

    /// Next record as bytes, or its slot address when `dummy` is set
    #[pyo3(signature = (dummy = false))]
    fn next(&mut self, py: Python<'_>, dummy: bool) -> PyResult<PyObject> {
        let runtime = self.runtime.clone();
        let client = self.client()?;
        if dummy {
            let slot = py
                .allow_threads(|| runtime.block_on(client.next_dummy()))
                .map_err(to_py_err)?;
            return Ok(slot.address.into_py(py));
        }
        let record = py
            .allow_threads(|| runtime.block_on(client.next()))
            .map_err(to_py_err)?;
        Ok(PyBytes::new(py, &record).into())
    }

    /// Release the record last returned by `next`
    fn readed(&mut self) -> PyResult<()> {
        self.client()?.mark_consumed().map_err(to_py_err)
    }

    fn reset(&mut self, py: Python<'_>) -> PyResult<()> {
        let runtime = self.runtime.clone();
        let client = self.client()?;
        py.allow_threads(|| runtime.block_on(client.reset()))
            .map_err(to_py_err)
    }

    fn delete(&mut self, py: Python<'_>) -> PyResult<()> {
        let Some(client) = self.inner.take() else {
            return Ok(());
        };
        let runtime = self.runtime.clone();
        let outcome = py.allow_threads(|| runtime.block_on(client.delete()));
        outcome.into_result().map(|_| ()).map_err(to_py_err)
    }

    fn __len__(&self) -> usize {
        self.inner.as_ref().map_or(0, |c| c.len() as usize)
    }
}

/// A Python module implemented in Rust.
#[pymodule]
pub fn joader_client(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyLoader>()?;
    Ok(())
}

use crate::traits::*;
use candle_util::candle_core::{Device, Tensor};
pub use nalgebra::{DMatrix, DVector};

impl ConvertMatOps for DMatrix<f64> {
    fn to_tensor(&self, dev: &Device) -> anyhow::Result<Tensor> {
        // nalgebra stores columns contiguously; tensors are row-major
        let data: Vec<f64> = self.transpose().as_slice().to_vec();
        Ok(Tensor::from_vec(data, (self.nrows(), self.ncols()), dev)?)
    }
}

impl ConvertMatOps for DVector<f64> {
    /// a column of shape `(n, 1)`
    fn to_tensor(&self, dev: &Device) -> anyhow::Result<Tensor> {
        Ok(Tensor::from_slice(self.as_slice(), (self.len(), 1), dev)?)
    }
}

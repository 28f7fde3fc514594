use candle_util::candle_core::{Device, Tensor};

/// Hand over to `Tensor`
pub trait ConvertMatOps {
    fn to_tensor(&self, dev: &Device) -> anyhow::Result<Tensor>;
}

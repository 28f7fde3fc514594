pub mod candle_glm_inference;
pub mod candle_inference;
pub mod candle_loss_functions;
pub mod candle_model_poisson;

pub use candle_core;
pub use candle_nn;

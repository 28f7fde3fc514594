pub mod common_io;
pub mod dmatrix_glm;
pub mod dmatrix_util;
pub mod simulate;
pub mod stats;
pub mod traits;

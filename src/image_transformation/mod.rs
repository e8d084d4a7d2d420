pub mod affine;
pub mod frame_mapping;
pub mod warp;

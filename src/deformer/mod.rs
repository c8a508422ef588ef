pub mod rotation_deformer;
pub mod warp_deformer;

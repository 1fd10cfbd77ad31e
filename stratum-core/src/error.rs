//! Failures of a composite pass. A pass either fully succeeds or fails with one of these,
//! partial results are never returned.

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidArgument {
    #[error("canvas size {width}x{height} is not positive")]
    ZeroCanvas { width: u32, height: u32 },
    #[error("layer {layer:?} has opacity {opacity}, expected [0, 1]")]
    Opacity { layer: String, opacity: f32 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferMismatch {
    #[error("expected {expected} samples, got {actual}")]
    DataLength { expected: usize, actual: usize },
    #[error("layer {layer:?} mask is {mask:?} but its content is {content:?}")]
    MaskSize {
        layer: String,
        mask: [u32; 2],
        content: [u32; 2],
    },
    #[error("adjustment of layer {layer:?} produced {actual:?}, expected {expected:?}")]
    AdjustmentOutput {
        layer: String,
        expected: [u32; 2],
        actual: [u32; 2],
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CompositeError {
    #[error("invalid argument: {}", .0)]
    InvalidArgument(#[from] InvalidArgument),
    #[error("buffer mismatch: {}", .0)]
    BufferMismatch(#[from] BufferMismatch),
    #[error("composite cancelled")]
    Cancelled,
}

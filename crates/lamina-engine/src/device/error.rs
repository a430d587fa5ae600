use thiserror::Error;

/// Failures reported by the graphics device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A shader stage failed to compile.
    #[error("{stage} shader '{name}' failed to compile: {log}")]
    Compile {
        stage: &'static str,
        name: String,
        log: String,
    },

    /// The program failed to link.
    #[error("program '{name}' failed to link: {log}")]
    Link { name: String, log: String },
}

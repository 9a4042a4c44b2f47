//! The operator installed by the binary.

/// Implements every operator port against configuration files.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operator;

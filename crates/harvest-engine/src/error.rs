//! Engine errors.

use harvest_config::ConfigError;

use crate::state::RunStatus;

/// Errors that can occur while hosting a definition.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// The definition failed validation.
  #[error("invalid definition")]
  InvalidDefinition(#[from] ConfigError),

  /// A run was asked to move between states that are not connected.
  #[error("invalid run transition from {from:?} to {to:?}")]
  InvalidTransition { from: RunStatus, to: RunStatus },

  /// The runner is no longer accepting activations.
  #[error("runner channel closed")]
  ChannelClosed,
}

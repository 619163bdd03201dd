use std::time::Duration;

use harvest_config::DefaultArgs;

/// Fixed-delay retry policy applied to failed attempts.
///
/// Every failure is retried the same way whatever its cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub retries: u32,
  pub delay: Duration,
}

impl RetryPolicy {
  pub fn none() -> Self {
    Self {
      retries: 0,
      delay: Duration::ZERO,
    }
  }

  pub fn from_args(args: &DefaultArgs) -> Self {
    Self {
      retries: args.retries,
      delay: args.retry_delay(),
    }
  }

  /// Attempts a run may make in total.
  pub fn max_tries(&self) -> u32 {
    self.retries.saturating_add(1)
  }

  /// Whether a failure of attempt `try_number` (1-based) gets another attempt.
  pub fn should_retry(&self, try_number: u32) -> bool {
    try_number < self.max_tries()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_single_retry() {
    let policy = RetryPolicy {
      retries: 1,
      delay: Duration::from_secs(300),
    };

    assert_eq!(policy.max_tries(), 2);
    assert!(policy.should_retry(1));
    assert!(!policy.should_retry(2));
  }

  #[test]
  fn test_no_retries() {
    assert!(!RetryPolicy::none().should_retry(1));
  }

  #[test]
  fn test_from_args() {
    let args = DefaultArgs {
      owner: "ops".to_string(),
      depends_on_past: false,
      retries: 1,
      retry_delay_secs: 300,
    };

    let policy = RetryPolicy::from_args(&args);
    assert_eq!(policy.delay, Duration::from_secs(300));
    assert_eq!(policy.retries, 1);
  }
}

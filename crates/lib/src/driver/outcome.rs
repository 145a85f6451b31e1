/// Result of resolving one target.
///
/// Outcomes are ordered `UpToDate < Updated < Failed`. The worst outcome
/// among a target's prerequisites is a lower bound on its own outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
  /// Nothing changed; the build action did not run.
  UpToDate,
  /// The build action ran and succeeded.
  Updated,
  /// The build action, or that of a prerequisite target, failed.
  Failed,
}

impl Outcome {
  /// Combine two outcomes; the worse one wins.
  pub fn aggregate(self, other: Outcome) -> Outcome {
    self.max(other)
  }

  /// The worst of `outcomes`, or `UpToDate` when empty.
  pub fn worst(outcomes: impl IntoIterator<Item = Outcome>) -> Outcome {
    outcomes.into_iter().fold(Outcome::UpToDate, Outcome::aggregate)
  }

  pub fn is_failure(self) -> bool {
    self == Outcome::Failed
  }
}

impl std::fmt::Display for Outcome {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Outcome::UpToDate => f.write_str("up to date"),
      Outcome::Updated => f.write_str("updated"),
      Outcome::Failed => f.write_str("failed"),
    }
  }
}

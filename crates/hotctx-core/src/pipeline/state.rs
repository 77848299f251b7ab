use std::fmt;

/// Lifecycle of one CLI invocation.
///
/// `Idle → HealthChecked → Indexed → Generated → Done`; `Indexed` and
/// `Generated` may each be skipped, and `Failed` is reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    HealthChecked,
    Indexed,
    Generated,
    Done,
    Failed,
}

impl PipelineState {
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use PipelineState::{Done, Failed, Generated, HealthChecked, Idle, Indexed};

        matches!(
            (self, next),
            (_, Failed)
                | (Idle, HealthChecked)
                | (HealthChecked, Indexed | Generated | Done)
                | (Indexed, Generated | Done)
                | (Generated, Done)
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::HealthChecked => "health-checked",
            Self::Indexed => "indexed",
            Self::Generated => "generated",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineState::*;
    use super::*;

    const ALL: [PipelineState; 6] = [Idle, HealthChecked, Indexed, Generated, Done, Failed];

    #[test]
    fn forward_path() {
        assert!(Idle.can_transition_to(HealthChecked));
        assert!(HealthChecked.can_transition_to(Indexed));
        assert!(Indexed.can_transition_to(Generated));
        assert!(Generated.can_transition_to(Done));
    }

    #[test]
    fn optional_steps_can_be_skipped() {
        assert!(HealthChecked.can_transition_to(Generated));
        assert!(HealthChecked.can_transition_to(Done));
        assert!(Indexed.can_transition_to(Done));
    }

    #[test]
    fn failed_reachable_from_every_state() {
        for state in ALL {
            assert!(state.can_transition_to(Failed), "{state} -> failed");
        }
    }

    #[test]
    fn work_requires_health_first() {
        assert!(!Idle.can_transition_to(Indexed));
        assert!(!Idle.can_transition_to(Generated));
        assert!(!Idle.can_transition_to(Done));
    }

    #[test]
    fn no_backward_or_post_terminal_moves() {
        assert!(!Generated.can_transition_to(Indexed));
        assert!(!Indexed.can_transition_to(HealthChecked));
        for next in [Idle, HealthChecked, Indexed, Generated, Done] {
            assert!(!Done.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
    }

    #[test]
    fn terminal_states() {
        assert!(Done.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Generated.is_terminal());
    }
}

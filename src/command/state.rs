//! Command loop states and transition policy.

/// Command loop state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CommandState {
    /// Poll the UART for input.
    #[default]
    AwaitInput,
    /// Check the received command. No checks yet.
    Validate,
    /// Echo the received bytes and log them.
    Respond,
}

/// Which state follows each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// AwaitInput → Validate → Respond → AwaitInput.
    #[default]
    Echo,
    /// Never leave the current state. Starting from AwaitInput this
    /// polls forever and never answers.
    Hold,
}

impl TransitionPolicy {
    /// State to run after `current`.
    #[inline]
    pub fn next(self, current: CommandState) -> CommandState {
        match self {
            TransitionPolicy::Hold => current,
            TransitionPolicy::Echo => match current {
                CommandState::AwaitInput => CommandState::Validate,
                CommandState::Validate => CommandState::Respond,
                CommandState::Respond => CommandState::AwaitInput,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_cycles_all_states() {
        let policy = TransitionPolicy::Echo;
        let mut state = CommandState::default();
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(state);
            state = policy.next(state);
        }
        assert_eq!(
            seen,
            vec![
                CommandState::AwaitInput,
                CommandState::Validate,
                CommandState::Respond,
                CommandState::AwaitInput,
                CommandState::Validate,
                CommandState::Respond,
            ]
        );
    }

    #[test]
    fn test_hold_never_moves() {
        let policy = TransitionPolicy::Hold;
        assert_eq!(policy.next(CommandState::AwaitInput), CommandState::AwaitInput);
        assert_eq!(policy.next(CommandState::Respond), CommandState::Respond);
    }
}

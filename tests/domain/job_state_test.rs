use rstest::rstest;

use voxbridge::domain::{JobState, Stage};

#[rstest]
#[case(JobState::Queued, JobState::Transcribing)]
#[case(JobState::Transcribing, JobState::Translating)]
#[case(JobState::Transcribing, JobState::Synthesizing)]
#[case(JobState::Transcribing, JobState::Completed)]
#[case(JobState::Translating, JobState::Synthesizing)]
#[case(JobState::Translating, JobState::Completed)]
#[case(JobState::Synthesizing, JobState::Completed)]
fn given_forward_step_when_checking_transition_then_allowed(
    #[case] from: JobState,
    #[case] to: JobState,
) {
    assert!(from.can_transition_to(to));
}

#[rstest]
#[case(JobState::Queued, JobState::Translating)]
#[case(JobState::Queued, JobState::Completed)]
#[case(JobState::Translating, JobState::Transcribing)]
#[case(JobState::Synthesizing, JobState::Translating)]
#[case(JobState::Transcribing, JobState::Transcribing)]
fn given_skip_or_backward_step_when_checking_transition_then_rejected(
    #[case] from: JobState,
    #[case] to: JobState,
) {
    assert!(!from.can_transition_to(to));
}

#[rstest]
#[case(JobState::Queued)]
#[case(JobState::Transcribing)]
#[case(JobState::Translating)]
#[case(JobState::Synthesizing)]
fn given_active_state_when_failing_or_cancelling_then_allowed(#[case] from: JobState) {
    assert!(from.can_transition_to(JobState::Failed));
    assert!(from.can_transition_to(JobState::Cancelled));
}

#[rstest]
#[case(JobState::Completed)]
#[case(JobState::Failed)]
#[case(JobState::Cancelled)]
fn given_terminal_state_when_checking_any_transition_then_rejected(#[case] from: JobState) {
    assert!(from.is_terminal());
    for next in [
        JobState::Queued,
        JobState::Transcribing,
        JobState::Translating,
        JobState::Synthesizing,
        JobState::Completed,
        JobState::Failed,
        JobState::Cancelled,
    ] {
        assert!(!from.can_transition_to(next), "{} -> {}", from, next);
    }
}

#[test]
fn given_state_string_when_parsing_then_round_trips() {
    let parsed: JobState = "synthesizing".parse().unwrap();
    assert_eq!(parsed, JobState::Synthesizing);
    assert_eq!(parsed.to_string(), "synthesizing");
    assert!("paused".parse::<JobState>().is_err());
}

#[test]
fn given_stage_when_mapping_to_state_then_running_state_matches() {
    for stage in Stage::ALL {
        assert_eq!(JobState::for_stage(stage).stage(), Some(stage));
    }
    assert_eq!(JobState::Queued.stage(), None);
}

//! Section transition state machine
//!
//! A transition plays the current section's OUT motion, then the target's IN
//! motion, then commits the new index. Waiting on an animation is modelled
//! as a [`PhaseTicket`]: the controller hands one to the [`PhaseRunner`] and
//! resumes when the same ticket comes back through
//! [`TransitionController::phase_finished`].
//!
//! While a transition is in flight every other request is dropped, not
//! queued, and `current_index` keeps reporting the old section.

use super::section::{Direction, Phase, PhaseMotion, SectionDeck};

/// Token for one running phase animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTicket {
    pub seq: u64,
    pub phase: Phase,
    pub direction: Direction,
}

/// Plays phase animations and reports completion later.
///
/// Implementations must eventually pass the ticket back to
/// [`TransitionController::phase_finished`]; they must not call it from
/// inside `play`.
pub trait PhaseRunner {
    fn play(&mut self, section: usize, motion: &PhaseMotion, ticket: PhaseTicket);
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Idle {
        current: usize,
    },
    Transitioning {
        current: usize,
        target: usize,
        direction: Direction,
        phase: Phase,
    },
}

/// Why a request was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Loading,
    OutOfRange,
    AlreadyCurrent,
    Busy,
}

/// Result of [`TransitionController::request_section`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// OUT phase is playing
    Started { target: usize, direction: Direction },
    /// Reduced motion: index committed immediately
    Committed { index: usize },
    Ignored(IgnoreReason),
}

/// Result of [`TransitionController::phase_finished`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// OUT finished, IN is playing
    Advanced,
    /// IN finished, new index committed
    Committed { index: usize },
    /// Ticket does not match the running phase
    Stale,
}

#[derive(Debug, Clone)]
pub struct TransitionController {
    deck: SectionDeck,
    state: TransitionState,
    loading: bool,
    reduce_motion: bool,
    next_seq: u64,
    pending: Option<PhaseTicket>,
}

impl TransitionController {
    /// Starts idle on section 0. `loading` starts true; the page clears it
    /// once it is ready.
    pub fn new(deck: SectionDeck) -> Self {
        Self {
            deck,
            state: TransitionState::Idle { current: 0 },
            loading: true,
            reduce_motion: false,
            next_seq: 0,
            pending: None,
        }
    }

    pub fn deck(&self) -> &SectionDeck {
        &self.deck
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Committed section index (pre-transition value while locked)
    pub fn current_index(&self) -> usize {
        match self.state {
            TransitionState::Idle { current } | TransitionState::Transitioning { current, .. } => {
                current
            }
        }
    }

    pub fn current_id(&self) -> &str {
        self.deck.id(self.current_index()).unwrap_or_default()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        matches!(self.state, TransitionState::Transitioning { .. })
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn reduce_motion(&self) -> bool {
        self.reduce_motion
    }

    /// Affects the next request; an in-flight transition runs to completion
    pub fn set_reduce_motion(&mut self, reduce: bool) {
        self.reduce_motion = reduce;
    }

    pub fn pending_ticket(&self) -> Option<PhaseTicket> {
        self.pending
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_index() > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.current_index() < self.deck.last_index()
    }

    /// Ask for a section change. Invalid requests are dropped silently; the
    /// returned reason is informational only.
    pub fn request_section<R>(&mut self, target: usize, runner: &mut R) -> RequestOutcome
    where
        R: PhaseRunner + ?Sized,
    {
        let current = self.current_index();

        let rejected = if self.loading {
            Some(IgnoreReason::Loading)
        } else if target >= self.deck.len() {
            Some(IgnoreReason::OutOfRange)
        } else if target == current {
            Some(IgnoreReason::AlreadyCurrent)
        } else if self.is_locked() {
            Some(IgnoreReason::Busy)
        } else {
            None
        };
        if let Some(reason) = rejected {
            log::debug!("section request {} dropped: {:?}", target, reason);
            return RequestOutcome::Ignored(reason);
        }

        if self.reduce_motion {
            self.state = TransitionState::Idle { current: target };
            log::info!("section {} ({}) [reduced motion]", target, self.current_id());
            return RequestOutcome::Committed { index: target };
        }

        let direction = Direction::between(current, target);
        self.state = TransitionState::Transitioning {
            current,
            target,
            direction,
            phase: Phase::Out,
        };
        log::debug!("transition {} -> {} ({})", current, target, direction.as_str());
        self.start_phase(current, Phase::Out, direction, runner);

        RequestOutcome::Started { target, direction }
    }

    /// Resume after a phase animation completed
    pub fn phase_finished<R>(&mut self, ticket: PhaseTicket, runner: &mut R) -> PhaseOutcome
    where
        R: PhaseRunner + ?Sized,
    {
        if self.pending != Some(ticket) {
            log::debug!("stale phase ticket {:?}", ticket);
            return PhaseOutcome::Stale;
        }
        self.pending = None;

        let TransitionState::Transitioning {
            current,
            target,
            direction,
            phase,
        } = self.state
        else {
            return PhaseOutcome::Stale;
        };

        match phase {
            Phase::Out => {
                self.state = TransitionState::Transitioning {
                    current,
                    target,
                    direction,
                    phase: Phase::In,
                };
                self.start_phase(target, Phase::In, direction, runner);
                PhaseOutcome::Advanced
            }
            Phase::In => {
                self.state = TransitionState::Idle { current: target };
                log::info!("section {} ({})", target, self.current_id());
                PhaseOutcome::Committed { index: target }
            }
        }
    }

    /// Adopt an index reported by native scrolling. Only applies while idle
    /// and not loading.
    pub fn observe(&mut self, index: usize) -> bool {
        if self.loading || self.is_locked() || index >= self.deck.len() {
            return false;
        }
        if index == self.current_index() {
            return false;
        }
        self.state = TransitionState::Idle { current: index };
        log::debug!("scrolled to section {} ({})", index, self.current_id());
        true
    }

    fn start_phase<R>(&mut self, section: usize, phase: Phase, direction: Direction, runner: &mut R)
    where
        R: PhaseRunner + ?Sized,
    {
        self.next_seq += 1;
        let ticket = PhaseTicket {
            seq: self.next_seq,
            phase,
            direction,
        };
        self.pending = Some(ticket);

        // Decks never shrink, so the section always exists
        if let Some(s) = self.deck.get(section) {
            let motion = *s.phases.motion(phase, direction);
            runner.play(section, &motion, ticket);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::settings::TransitionSettings;
    use proptest::prelude::*;

    /// Runner that records what it was asked to play
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRunner {
        pub plays: Vec<(usize, Phase, Direction, PhaseTicket)>,
    }

    impl RecordingRunner {
        pub fn last_ticket(&self) -> PhaseTicket {
            self.plays.last().map(|p| p.3).unwrap()
        }
    }

    impl PhaseRunner for RecordingRunner {
        fn play(&mut self, section: usize, _motion: &PhaseMotion, ticket: PhaseTicket) {
            self.plays.push((section, ticket.phase, ticket.direction, ticket));
        }
    }

    pub(crate) fn ready_controller(n: usize) -> TransitionController {
        let ids: Vec<String> = (0..n).map(|i| format!("s{i}")).collect();
        let deck = SectionDeck::new(ids, &TransitionSettings::default()).unwrap();
        let mut controller = TransitionController::new(deck);
        controller.set_loading(false);
        controller
    }

    fn finish_transition(c: &mut TransitionController, runner: &mut RecordingRunner) {
        while c.is_locked() {
            let ticket = runner.last_ticket();
            c.phase_finished(ticket, runner);
        }
    }

    #[test]
    fn test_down_transition_scenario() {
        let mut c = ready_controller(5);
        let mut runner = RecordingRunner::default();

        let outcome = c.request_section(1, &mut runner);
        assert_eq!(
            outcome,
            RequestOutcome::Started {
                target: 1,
                direction: Direction::Down
            }
        );
        assert!(c.is_locked());
        assert_eq!(c.current_index(), 0);
        assert_eq!(runner.plays.len(), 1);
        assert_eq!(runner.plays[0].0, 0);
        assert_eq!((runner.plays[0].1, runner.plays[0].2), (Phase::Out, Direction::Down));

        assert_eq!(
            c.phase_finished(runner.last_ticket(), &mut runner),
            PhaseOutcome::Advanced
        );
        assert_eq!(c.current_index(), 0);
        assert_eq!(runner.plays.len(), 2);
        assert_eq!(runner.plays[1].0, 1);
        assert_eq!((runner.plays[1].1, runner.plays[1].2), (Phase::In, Direction::Down));

        assert_eq!(
            c.phase_finished(runner.last_ticket(), &mut runner),
            PhaseOutcome::Committed { index: 1 }
        );
        assert_eq!(c.state(), TransitionState::Idle { current: 1 });
        assert_eq!(runner.plays.len(), 2);
    }

    #[test]
    fn test_up_transition_uses_up_motions() {
        let mut c = ready_controller(5);
        let mut runner = RecordingRunner::default();
        c.request_section(3, &mut runner);
        finish_transition(&mut c, &mut runner);
        runner.plays.clear();

        c.request_section(2, &mut runner);
        finish_transition(&mut c, &mut runner);
        let phases: Vec<_> = runner.plays.iter().map(|p| (p.0, p.1, p.2)).collect();
        assert_eq!(
            phases,
            vec![(3, Phase::Out, Direction::Up), (2, Phase::In, Direction::Up)]
        );
        assert_eq!(c.current_index(), 2);
    }

    #[test]
    fn test_precondition_order() {
        let mut c = ready_controller(5);
        let mut runner = RecordingRunner::default();

        c.set_loading(true);
        // Loading wins over every other reason
        assert_eq!(
            c.request_section(99, &mut runner),
            RequestOutcome::Ignored(IgnoreReason::Loading)
        );
        c.set_loading(false);

        assert_eq!(
            c.request_section(5, &mut runner),
            RequestOutcome::Ignored(IgnoreReason::OutOfRange)
        );
        assert_eq!(
            c.request_section(0, &mut runner),
            RequestOutcome::Ignored(IgnoreReason::AlreadyCurrent)
        );

        c.request_section(2, &mut runner);
        assert_eq!(
            c.request_section(3, &mut runner),
            RequestOutcome::Ignored(IgnoreReason::Busy)
        );
        assert!(runner.plays.len() == 1);
    }

    #[test]
    fn test_overlapping_request_is_dropped_not_queued() {
        let mut c = ready_controller(5);
        let mut runner = RecordingRunner::default();
        c.request_section(1, &mut runner);
        c.request_section(4, &mut runner);
        c.phase_finished(runner.last_ticket(), &mut runner);
        c.request_section(4, &mut runner);
        c.phase_finished(runner.last_ticket(), &mut runner);

        assert_eq!(c.state(), TransitionState::Idle { current: 1 });
        assert_eq!(runner.plays.len(), 2);
    }

    #[test]
    fn test_stale_and_duplicate_tickets() {
        let mut c = ready_controller(3);
        let mut runner = RecordingRunner::default();
        c.request_section(1, &mut runner);
        let out_ticket = runner.last_ticket();

        assert_eq!(c.phase_finished(out_ticket, &mut runner), PhaseOutcome::Advanced);
        // Same OUT ticket again (e.g. a watchdog firing after the real finish)
        assert_eq!(c.phase_finished(out_ticket, &mut runner), PhaseOutcome::Stale);
        assert_eq!(runner.plays.len(), 2);

        let forged = PhaseTicket {
            seq: 999,
            ..runner.last_ticket()
        };
        assert_eq!(c.phase_finished(forged, &mut runner), PhaseOutcome::Stale);
        assert!(c.is_locked());

        let in_ticket = runner.last_ticket();
        assert_eq!(
            c.phase_finished(in_ticket, &mut runner),
            PhaseOutcome::Committed { index: 1 }
        );
        assert_eq!(c.phase_finished(in_ticket, &mut runner), PhaseOutcome::Stale);
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn test_reduced_motion_commits_synchronously() {
        let mut c = ready_controller(5);
        let mut runner = RecordingRunner::default();
        c.set_reduce_motion(true);

        assert_eq!(
            c.request_section(4, &mut runner),
            RequestOutcome::Committed { index: 4 }
        );
        assert_eq!(c.state(), TransitionState::Idle { current: 4 });
        assert!(runner.plays.is_empty());
        assert!(c.pending_ticket().is_none());
    }

    #[test]
    fn test_reduce_motion_mid_transition_lets_it_finish() {
        let mut c = ready_controller(5);
        let mut runner = RecordingRunner::default();
        c.request_section(1, &mut runner);
        c.set_reduce_motion(true);
        assert_eq!(
            c.request_section(2, &mut runner),
            RequestOutcome::Ignored(IgnoreReason::Busy)
        );
        finish_transition(&mut c, &mut runner);
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn test_observe_only_when_idle() {
        let mut c = ready_controller(5);
        let mut runner = RecordingRunner::default();
        assert!(c.observe(3));
        assert_eq!(c.current_index(), 3);
        assert!(!c.observe(3));
        assert!(!c.observe(7));

        c.request_section(4, &mut runner);
        assert!(!c.observe(0));
        assert_eq!(c.current_index(), 3);
    }

    #[test]
    fn test_prev_next_availability() {
        let mut c = ready_controller(2);
        let mut runner = RecordingRunner::default();
        assert!(!c.can_go_prev());
        assert!(c.can_go_next());
        c.request_section(1, &mut runner);
        finish_transition(&mut c, &mut runner);
        assert!(c.can_go_prev());
        assert!(!c.can_go_next());
        assert_eq!(c.current_id(), "s1");
    }

    proptest! {
        #[test]
        fn prop_valid_requests_commit(n in 1usize..8, start in 0usize..8, target in 0usize..8) {
            let mut c = ready_controller(n);
            let mut runner = RecordingRunner::default();
            let start = start % n;
            c.observe(start);

            let outcome = c.request_section(target, &mut runner);
            finish_transition(&mut c, &mut runner);

            if target < n && target != start {
                let started = matches!(outcome, RequestOutcome::Started { .. });
                prop_assert!(started);
                prop_assert_eq!(c.state(), TransitionState::Idle { current: target });
                prop_assert_eq!(runner.plays.len(), 2);
            } else {
                let ignored = matches!(outcome, RequestOutcome::Ignored(_));
                prop_assert!(ignored);
                prop_assert_eq!(c.state(), TransitionState::Idle { current: start });
                prop_assert!(runner.plays.is_empty());
            }
        }

        #[test]
        fn prop_requests_while_locked_never_change_target(
            targets in proptest::collection::vec(0usize..6, 1..10)
        ) {
            let mut c = ready_controller(6);
            let mut runner = RecordingRunner::default();
            c.request_section(5, &mut runner);
            for t in targets {
                let expected = if t == 0 {
                    IgnoreReason::AlreadyCurrent
                } else {
                    IgnoreReason::Busy
                };
                prop_assert_eq!(c.request_section(t, &mut runner), RequestOutcome::Ignored(expected));
                prop_assert_eq!(c.current_index(), 0);
            }
            finish_transition(&mut c, &mut runner);
            prop_assert_eq!(c.current_index(), 5);
            prop_assert_eq!(runner.plays.len(), 2);
        }
    }
}

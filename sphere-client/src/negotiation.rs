use sphere_core::{PeerId, SdpKind};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Stable,
    /// Local offer applied and sent, waiting for the answer.
    OfferSent,
    /// Remote offer applied, local answer not sent yet.
    AnswerPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenegotiationReason {
    Initial,
    TracksChanged,
    NegotiationNeeded,
    IceRestart,
    /// Our offer was rolled back to accept the remote one.
    Rollback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferDecision {
    SendNow { ice_restart: bool },
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDecision {
    Apply { rollback: bool },
    IgnoreCollision,
    IgnoreStaleAnswer,
}

/// Per-peer offer/answer bookkeeping.
///
/// Offers are only produced from `Stable`; anything requested meanwhile waits
/// in `pending` and is coalesced into a single offer once the exchange in
/// flight completes. Collisions are settled by role: the polite side rolls
/// back, the impolite side ignores the incoming offer.
#[derive(Debug)]
pub struct Negotiator {
    polite: bool,
    state: NegotiationState,
    pending: VecDeque<RenegotiationReason>,
    ignoring_offer: bool,
    /// The offer in flight asks for new ICE credentials.
    restart_in_flight: bool,
}

impl Negotiator {
    pub fn new(local: &PeerId, remote: &PeerId) -> Self {
        Self {
            polite: local.is_polite_towards(remote),
            state: NegotiationState::Stable,
            pending: VecDeque::new(),
            ignoring_offer: false,
            restart_in_flight: false,
        }
    }

    pub fn is_polite(&self) -> bool {
        self.polite
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// True while an ignored colliding offer may still trickle candidates.
    pub fn is_ignoring_offer(&self) -> bool {
        self.ignoring_offer
    }

    pub fn request_offer(&mut self, reason: RenegotiationReason) -> OfferDecision {
        self.enqueue(reason);
        if self.state == NegotiationState::Stable {
            self.begin_offer()
        } else {
            OfferDecision::Queued
        }
    }

    /// Creating or sending the offer failed; the attempt is dropped.
    pub fn offer_failed(&mut self) {
        self.state = NegotiationState::Stable;
        self.restart_in_flight = false;
    }

    /// Gives up on an offer that was never answered. Returns false when no
    /// offer was outstanding.
    pub fn abandon_offer(&mut self) -> bool {
        if self.state != NegotiationState::OfferSent {
            return false;
        }
        self.state = NegotiationState::Stable;
        self.ignoring_offer = false;
        self.restart_in_flight = false;
        true
    }

    pub fn on_remote_description(&mut self, kind: SdpKind) -> RemoteDecision {
        match (kind, self.state) {
            (SdpKind::Offer, NegotiationState::OfferSent) => {
                if !self.polite {
                    self.ignoring_offer = true;
                    return RemoteDecision::IgnoreCollision;
                }
                if self.restart_in_flight
                    && !self.pending.contains(&RenegotiationReason::IceRestart)
                {
                    self.pending.push_front(RenegotiationReason::IceRestart);
                }
                if !self.pending.contains(&RenegotiationReason::Rollback) {
                    self.pending.push_front(RenegotiationReason::Rollback);
                }
                self.restart_in_flight = false;
                self.ignoring_offer = false;
                self.state = NegotiationState::AnswerPending;
                RemoteDecision::Apply { rollback: true }
            }
            (SdpKind::Offer, _) => {
                self.ignoring_offer = false;
                self.state = NegotiationState::AnswerPending;
                RemoteDecision::Apply { rollback: false }
            }
            (SdpKind::Answer, NegotiationState::OfferSent) => {
                RemoteDecision::Apply { rollback: false }
            }
            (SdpKind::Answer, _) => RemoteDecision::IgnoreStaleAnswer,
        }
    }

    /// The remote description could not be applied.
    pub fn remote_failed(&mut self) -> Option<OfferDecision> {
        self.state = NegotiationState::Stable;
        self.next_pending()
    }

    pub fn answer_sent(&mut self) -> Option<OfferDecision> {
        self.state = NegotiationState::Stable;
        self.next_pending()
    }

    pub fn answer_applied(&mut self) -> Option<OfferDecision> {
        self.state = NegotiationState::Stable;
        self.restart_in_flight = false;
        self.next_pending()
    }

    fn enqueue(&mut self, reason: RenegotiationReason) {
        if !self.pending.contains(&reason) {
            self.pending.push_back(reason);
        }
    }

    fn next_pending(&mut self) -> Option<OfferDecision> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.begin_offer())
    }

    fn begin_offer(&mut self) -> OfferDecision {
        let ice_restart = self
            .pending
            .drain(..)
            .any(|reason| reason == RenegotiationReason::IceRestart);
        self.state = NegotiationState::OfferSent;
        self.restart_in_flight = ice_restart;
        OfferDecision::SendNow { ice_restart }
    }
}

use std::sync::Arc;

use tracing::error;

use crate::application::panels::notifier::{Notification, Notifier};
use crate::domain::models::{Candidate, ElectionSnapshot};
use crate::domain::services::{ContractError, ElectionApi};

/// Read-only view of the election for voters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VotingView {
    pub election: ElectionSnapshot,
    pub candidates: Vec<Candidate>,
}

pub struct VotingPanel {
    election: Arc<dyn ElectionApi>,
    notifier: Arc<dyn Notifier>,
    view: VotingView,
}

impl VotingPanel {
    pub fn new(election: Arc<dyn ElectionApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { election, notifier, view: VotingView::default() }
    }

    pub fn view(&self) -> &VotingView {
        &self.view
    }

    pub async fn mount(&mut self) {
        let (name, started, finalized, candidates, winner) = tokio::join!(
            self.election.get_election_name(),
            self.election.has_election_started(),
            self.election.has_election_finalized(),
            self.election.get_candidates(),
            self.election.get_winner(),
        );

        if let Some(name) = self.checked(name, "Error Fetching election name.") {
            if !name.trim().is_empty() {
                self.view.election.name = Some(name);
            }
        }
        if let Some(started) = self.checked(started, "Error Fetching election start state.") {
            self.view.election.has_started = started;
        }
        if let Some(finalized) = self.checked(finalized, "Error Fetching election finalized state.") {
            self.view.election.has_finalized = finalized;
        }
        if let Some(candidates) = self.checked(candidates, "Error fetching candidates.") {
            self.view.candidates = candidates;
        }
        if let Some(winner) = self.checked(winner, "Error Fetching election winner.") {
            if winner.is_decided() {
                self.view.election.winner = Some(winner.name);
            }
        }
    }

    /// Current state in one line, e.g. "General: voting open"
    pub fn status_line(&self) -> String {
        let election = &self.view.election;
        let name = election.name.as_deref().unwrap_or("No election");
        let state = match (election.has_started, election.has_finalized) {
            (_, true) => "finalized",
            (true, false) => "voting open",
            (false, false) => "not started",
        };
        format!("{}: {}", name, state)
    }

    fn checked<T>(&self, result: Result<T, ContractError>, message: &str) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                error!("{}: {}", message, e);
                self.notifier.notify(Notification::error(message));
                None
            }
        }
    }
}

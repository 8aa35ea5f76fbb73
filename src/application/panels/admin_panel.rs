use std::sync::Arc;

use tracing::{error, info};

use crate::application::panels::notifier::{Notification, Notifier};
use crate::domain::models::{AddCandidateRequest, AddVoterRequest, Candidate, CreateElectionRequest, Voter};
use crate::domain::services::{parse_address, ContractError, ElectionApi};
use crate::infrastructure::contracts::election_client::parse_election_time;

/// Election lifecycle control offered to the administrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Start,
    End,
}

/// What the admin panel shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminView {
    pub election_name: Option<String>,
    pub winner_name: Option<String>,
    pub candidates: Vec<Candidate>,
    pub voters: Vec<Voter>,
    pub has_started: bool,
    pub has_finalized: bool,
}

impl AdminView {
    /// Start before the election runs, End while it runs, nothing once finalized
    pub fn lifecycle_action(&self) -> Option<LifecycleAction> {
        match (self.has_started, self.has_finalized) {
            (_, true) => None,
            (false, false) => Some(LifecycleAction::Start),
            (true, false) => Some(LifecycleAction::End),
        }
    }
}

/// Administrator view over the election contract.
///
/// Every fetch is independent: a failure notifies the user and keeps the
/// previous value. Each action performs one write and then re-reads what it
/// changed.
pub struct AdminPanel {
    election: Arc<dyn ElectionApi>,
    notifier: Arc<dyn Notifier>,
    view: AdminView,
}

impl AdminPanel {
    pub fn new(election: Arc<dyn ElectionApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { election, notifier, view: AdminView::default() }
    }

    pub fn view(&self) -> &AdminView {
        &self.view
    }

    /// Fetch everything the panel shows, concurrently
    pub async fn mount(&mut self) {
        let (candidates, name, voters, started, finalized, winner) = tokio::join!(
            self.election.get_candidates(),
            self.election.get_election_name(),
            self.election.get_voters(),
            self.election.has_election_started(),
            self.election.has_election_finalized(),
            self.election.get_winner(),
        );

        self.apply_candidates(candidates);
        self.apply_election_name(name);
        self.apply_voters(voters);
        self.apply_started(started);
        self.apply_finalized(finalized);
        self.apply_winner(winner);
    }

    // ============ ACTIONS ============

    pub async fn create_election(&mut self, name: &str, start: &str, end: &str) {
        let request = match (parse_election_time(start), parse_election_time(end)) {
            (Ok(start_time), Ok(end_time)) => CreateElectionRequest { name: name.to_string(), start_time, end_time },
            (Err(e), _) | (_, Err(e)) => return self.report("Error creating election", &e),
        };

        match self.election.create_election(request).await {
            Ok(_) => {
                self.view.election_name = Some(name.to_string());
                self.notifier.notify(Notification::info("Election created successfully!"));
                let refreshed = self.election.get_election_name().await;
                self.apply_election_name(refreshed);
            }
            Err(e) => self.report("Error creating election", &e),
        }
    }

    pub async fn add_candidate(&mut self, address: &str, name: &str, party: &str) {
        let speculative = parse_address(address).ok().map(|address| Candidate {
            address,
            name: name.to_string(),
            party: party.to_string(),
        });
        let rollback_len = self.view.candidates.len();
        self.view.candidates.extend(speculative);

        let request = AddCandidateRequest {
            address: address.to_string(),
            name: name.to_string(),
            party: party.to_string(),
        };
        match self.election.add_candidate(request).await {
            Ok(_) => {
                self.notifier.notify(Notification::info("Candidate added successfully!"));
                let refreshed = self.election.get_candidates().await;
                self.apply_candidates(refreshed);
            }
            Err(e) => {
                self.view.candidates.truncate(rollback_len);
                self.report("Error adding candidate", &e);
            }
        }
    }

    pub async fn add_voter(&mut self, address: &str, name: &str, age: u64) {
        let speculative = parse_address(address).ok().map(|address| Voter {
            address,
            name: name.to_string(),
            age,
        });
        let rollback_len = self.view.voters.len();
        self.view.voters.extend(speculative);

        let request = AddVoterRequest { address: address.to_string(), name: name.to_string(), age };
        match self.election.add_voter(request).await {
            Ok(_) => {
                self.notifier.notify(Notification::info("Voter added successfully!"));
                let refreshed = self.election.get_voters().await;
                self.apply_voters(refreshed);
            }
            Err(e) => {
                self.view.voters.truncate(rollback_len);
                self.report("Error adding voter", &e);
            }
        }
    }

    pub async fn start_election(&mut self) {
        match self.election.start_election().await {
            Ok(_) => {
                self.view.has_started = true;
                self.notifier.notify(Notification::info("Election Started successfully!"));
                let refreshed = self.election.has_election_started().await;
                self.apply_started(refreshed);
            }
            Err(e) => self.report("Error starting election", &e),
        }
    }

    pub async fn end_election(&mut self) {
        match self.election.end_election().await {
            Ok(_) => {
                self.notifier.notify(Notification::info("Election Finalized successfully!"));
                let (finalized, winner) =
                    tokio::join!(self.election.has_election_finalized(), self.election.get_winner());
                self.apply_finalized(finalized);
                self.apply_winner(winner);
            }
            Err(e) => self.report("Error ending election", &e),
        }
    }

    // ============ STATE UPDATES ============

    fn apply_candidates(&mut self, result: Result<Vec<Candidate>, ContractError>) {
        match result {
            Ok(candidates) if !candidates.is_empty() => self.view.candidates = candidates,
            Ok(_) => {}
            Err(e) => self.fetch_failed("Error fetching candidates.", &e),
        }
    }

    fn apply_voters(&mut self, result: Result<Vec<Voter>, ContractError>) {
        match result {
            Ok(voters) if !voters.is_empty() => self.view.voters = voters,
            Ok(_) => {}
            Err(e) => self.fetch_failed("Error Fetching voters.", &e),
        }
    }

    fn apply_election_name(&mut self, result: Result<String, ContractError>) {
        match result {
            Ok(name) if !name.trim().is_empty() => self.view.election_name = Some(name),
            Ok(_) => {}
            Err(e) => self.fetch_failed("Error Fetching election name.", &e),
        }
    }

    fn apply_winner(&mut self, result: Result<crate::domain::models::Winner, ContractError>) {
        match result {
            Ok(winner) if winner.is_decided() => self.view.winner_name = Some(winner.name),
            Ok(_) => {}
            Err(e) => self.fetch_failed("Error Fetching election winner.", &e),
        }
    }

    fn apply_started(&mut self, result: Result<bool, ContractError>) {
        match result {
            Ok(started) => self.view.has_started = started,
            Err(e) => self.fetch_failed("Error Fetching election start state.", &e),
        }
    }

    fn apply_finalized(&mut self, result: Result<bool, ContractError>) {
        match result {
            Ok(finalized) => self.view.has_finalized = finalized,
            Err(e) => self.fetch_failed("Error Fetching election finalized state.", &e),
        }
    }

    fn fetch_failed(&self, message: &str, err: &ContractError) {
        error!("{}: {}", message, err);
        self.notifier.notify(Notification::error(message));
    }

    fn report(&self, prefix: &str, err: &ContractError) {
        info!("{}: {}", prefix, err);
        self.notifier.notify(Notification::error(format!("{}: {}", prefix, err.user_message())));
    }
}

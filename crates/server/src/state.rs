use axum::extract::FromRef;
use engine::{AdmissionEngine, VoteLedger};

#[derive(Clone)]
pub struct AppState {
    pub admission: AdmissionEngine,
    pub votes: VoteLedger,
}

impl FromRef<AppState> for AdmissionEngine {
    fn from_ref(state: &AppState) -> Self {
        state.admission.clone()
    }
}

impl FromRef<AppState> for VoteLedger {
    fn from_ref(state: &AppState) -> Self {
        state.votes.clone()
    }
}

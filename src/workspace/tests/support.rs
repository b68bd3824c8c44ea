//! Builders and fixtures shared by the workspace unit tests.

use crate::workspace::domain::{
    BranchName, RepositoryFullName, ReviewRequest, ReviewRequestData, ReviewRequestNumber,
    ReviewState, ReviewerLogin, SessionName, WorkspaceSession,
};
use camino::Utf8PathBuf;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use std::sync::Mutex;
use std::time::Duration;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += chrono::TimeDelta::from_std(by).expect("duration in range");
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(epoch())
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// 2026-03-01T09:30:00Z.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub fn repo(name: &str) -> RepositoryFullName {
    RepositoryFullName::new(name).expect("valid repository name")
}

pub fn branch(name: &str) -> BranchName {
    BranchName::new(name).expect("valid branch name")
}

pub fn number(value: u64) -> ReviewRequestNumber {
    ReviewRequestNumber::new(value).expect("positive review request number")
}

pub fn login(name: &str) -> ReviewerLogin {
    ReviewerLogin::new(name).expect("valid login")
}

pub fn session_name(name: &str) -> SessionName {
    SessionName::new(name).expect("valid session name")
}

pub fn session(name: &str, dir: &str) -> WorkspaceSession {
    WorkspaceSession::new(session_name(name), Utf8PathBuf::from(dir), epoch(), false)
}

pub fn open_request(repository: &str, value: u64, source: &str) -> ReviewRequest {
    ReviewRequest::new(ReviewRequestData {
        number: number(value),
        title: format!("Request {value}"),
        body: String::new(),
        source_branch: branch(source),
        target_branch: branch("main"),
        repository: repo(repository),
        state: ReviewState::Open,
        url: format!("https://reviews.invalid/{repository}/pull/{value}"),
        author: login("octocat"),
        draft: false,
        created_at: epoch(),
        updated_at: epoch(),
    })
}

pub fn ssh_remote(repository: &str) -> String {
    format!("git@github.com:{repository}.git")
}

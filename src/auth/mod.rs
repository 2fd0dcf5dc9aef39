pub mod session;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::events::{AppEvent, EventBus};
use crate::models::UserRole;
use crate::scheduler::Scheduler;

pub use session::{MemorySessionStore, SessionStore};

const LOGIN_FAILED: &str = "Please check your credentials";
const SIGN_UP_FAILED: &str = "Please fill out all fields";

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
}

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Login and sign-up collaborator. There is no credential store: any
/// complete form is accepted after the simulated round trip.
#[derive(Clone)]
pub struct AuthService {
    session: Arc<dyn SessionStore>,
    scheduler: Arc<dyn Scheduler>,
    events: EventBus,
    delay: Duration,
}

impl AuthService {
    pub fn new(
        session: Arc<dyn SessionStore>,
        scheduler: Arc<dyn Scheduler>,
        events: EventBus,
        delay: Duration,
    ) -> Self {
        Self {
            session,
            scheduler,
            events,
            delay,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.get()
    }

    pub async fn login(&self, credentials: &Credentials) -> AppResult<()> {
        self.scheduler.sleep(self.delay).await;

        if !present(&credentials.email) || !present(&credentials.password) {
            warn!(
                has_email = present(&credentials.email),
                has_password = present(&credentials.password),
                "login failed"
            );
            return Err(AppError::unauthorized(LOGIN_FAILED));
        }

        self.session.set(true);
        info!(email = %credentials.email, "login succeeded");
        self.events.emit(AppEvent::LoginSucceeded {
            email: credentials.email.trim().to_string(),
        });
        Ok(())
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> AppResult<()> {
        self.scheduler.sleep(self.delay).await;

        let complete = present(&request.name)
            && present(&request.email)
            && present(&request.password)
            && request.role.is_some();
        if !complete {
            warn!(
                has_name = present(&request.name),
                has_email = present(&request.email),
                has_password = present(&request.password),
                has_role = request.role.is_some(),
                "sign up failed"
            );
            return Err(AppError::unauthorized(SIGN_UP_FAILED));
        }

        self.session.set(true);
        info!(email = %request.email, role = ?request.role, "account created");
        self.events.emit(AppEvent::AccountCreated {
            email: request.email.trim().to_string(),
        });
        Ok(())
    }

    pub fn logout(&self) {
        self.session.clear();
        info!("session cleared");
    }
}

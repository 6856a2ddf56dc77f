use admissions::auth::AuthService;
use admissions::clock::Clock;
use admissions::config::{AuthConfig, IntakeConfig};
use admissions::store::InMemoryStore;
use admissions::workflows::applications::PreRegistrationService;
use admissions::workflows::registration::RegistrationWindowService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type WindowService = RegistrationWindowService<InMemoryStore>;
pub(crate) type IntakeService = PreRegistrationService<InMemoryStore, InMemoryStore>;

/// Services sharing one store and one clock.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) window: Arc<WindowService>,
    pub(crate) applications: Arc<IntakeService>,
    pub(crate) auth: Arc<AuthService>,
}

impl Services {
    pub(crate) fn in_memory(
        auth: &AuthConfig,
        intake: IntakeConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let window = Arc::new(RegistrationWindowService::new(store.clone(), clock.clone()));
        let applications = Arc::new(PreRegistrationService::new(
            store,
            window.clone(),
            clock.clone(),
            intake,
        ));
        let auth = Arc::new(AuthService::new(auth, clock));
        Self {
            window,
            applications,
            auth,
        }
    }
}

//! Yew front end: login gate and dashboard.

use std::rc::Rc;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::config::GatewayConfig;
use crate::gateway::RestGateway;
use crate::model::Profile;
use crate::session::{AuthStatus, BrowserStorage, SessionManager};

mod dashboard;
mod login;
mod modals;

use dashboard::Dashboard;
use login::LoginScreen;

/// Long-lived collaborators shared by every screen.
#[derive(Clone)]
pub struct Services {
    pub gateway: Rc<RestGateway>,
    pub sessions: Rc<SessionManager<BrowserStorage>>,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    pub fn browser() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        Self {
            gateway: Rc::new(RestGateway::new(GatewayConfig::from_build_env())),
            sessions: Rc::new(SessionManager::new(BrowserStorage::default(), clock.clone())),
            clock,
        }
    }
}

impl PartialEq for Services {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.gateway, &other.gateway) && Rc::ptr_eq(&self.sessions, &other.sessions)
    }
}

fn splash(message: &'static str) -> Html {
    html! {
        <div class="min-h-screen flex items-center justify-center bg-gradient-to-br from-blue-600 to-blue-800">
            <div class="text-center">
                <img class="w-20 h-20 mx-auto mb-4 animate-bounce" src="/icon.svg" alt="Fundlove" />
                <p class="text-white font-semibold text-lg">{ message }</p>
            </div>
        </div>
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let services = use_state(Services::browser);
    let auth_status = use_state(|| AuthStatus::Validating);

    {
        let services = (*services).clone();
        let auth_status = auth_status.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    let status = services.sessions.restore(services.gateway.as_ref()).await;
                    auth_status.set(status);
                });
                || ()
            },
            (),
        );
    }

    let on_login = {
        let auth_status = auth_status.clone();
        Callback::from(move |profile: Profile| auth_status.set(AuthStatus::Authenticated(profile)))
    };

    let on_logout = {
        let auth_status = auth_status.clone();
        let services = (*services).clone();
        Callback::from(move |_: ()| {
            services.sessions.logout();
            auth_status.set(AuthStatus::Unauthenticated);
        })
    };

    match &*auth_status {
        AuthStatus::Validating => splash("Checking session..."),
        AuthStatus::Unauthenticated => html! {
            <LoginScreen services={(*services).clone()} on_login={on_login} />
        },
        AuthStatus::Authenticated(profile) => html! {
            <Dashboard
                key={profile.id.to_string()}
                services={(*services).clone()}
                profile={profile.clone()}
                on_logout={on_logout}
            />
        },
    }
}

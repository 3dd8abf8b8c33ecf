use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::{splash, Services};
use crate::gateway::DataGateway;
use crate::model::{Profile, ProfileId};

#[derive(Properties, PartialEq)]
pub struct LoginScreenProps {
    pub services: Services,
    pub on_login: Callback<Profile>,
}

#[function_component(LoginScreen)]
pub fn login_screen(props: &LoginScreenProps) -> Html {
    let profiles = use_state(Vec::<Profile>::new);
    let loading = use_state(|| true);
    let selected = use_state(|| None::<ProfileId>);
    let submitting = use_state(|| false);
    let error = use_state(|| None::<String>);

    {
        let gateway = props.services.gateway.clone();
        let profiles = profiles.clone();
        let loading = loading.clone();
        let error = error.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    match gateway.list_profiles().await {
                        Ok(list) => profiles.set(list),
                        Err(err) => {
                            log::error!("failed to load profiles: {err}");
                            error.set(Some("Could not load the profile list.".to_string()));
                        }
                    }
                    loading.set(false);
                });
                || ()
            },
            (),
        );
    }

    let on_submit = {
        let services = props.services.clone();
        let on_login = props.on_login.clone();
        let selected = selected.clone();
        let submitting = submitting.clone();
        let error = error.clone();
        Callback::from(move |_: MouseEvent| {
            if *submitting {
                return;
            }
            let services = services.clone();
            let on_login = on_login.clone();
            let choice = (*selected).clone();
            let submitting = submitting.clone();
            let error = error.clone();

            submitting.set(true);
            error.set(None);
            spawn_local(async move {
                let result = services
                    .sessions
                    .login(services.gateway.as_ref(), choice.as_ref())
                    .await;
                submitting.set(false);
                match result {
                    Ok(profile) => on_login.emit(profile),
                    Err(err) => error.set(Some(format!("Login failed: {err}"))),
                }
            });
        })
    };

    if *loading {
        return splash("Loading...");
    }

    html! {
        <div class="min-h-screen bg-gradient-to-br from-blue-600 to-blue-800 flex items-center justify-center p-4">
            <div class="w-full max-w-md">
                <div class="text-center mb-8">
                    <img class="w-20 h-20 mx-auto" src="/icon.svg" alt="Fundlove" />
                    <h1 class="text-2xl font-bold text-white mb-2">{"Fundlove"}</h1>
                    <p class="text-white/80 text-sm">{"Shared savings for the end of the semester"}</p>
                </div>

                if let Some(msg) = &*error {
                    <div class="bg-red-500/20 border border-red-500/30 rounded-xl p-4 mb-6">
                        <p class="text-red-200 text-sm text-center">{ msg.clone() }</p>
                    </div>
                }

                <div class="bg-white/10 rounded-2xl p-4 mb-6 shadow-xl space-y-3">
                    <h2 class="text-white text-lg font-semibold text-center">{"Choose a profile"}</h2>
                    { for profiles.iter().map(|profile| {
                        let is_selected = (*selected).as_ref() == Some(&profile.id);
                        let onclick = {
                            let selected = selected.clone();
                            let id = profile.id.clone();
                            Callback::from(move |_: MouseEvent| selected.set(Some(id.clone())))
                        };
                        let row_class = if is_selected {
                            "w-full p-3 rounded-xl flex items-center space-x-3 bg-white text-gray-800 shadow-lg"
                        } else {
                            "w-full p-3 rounded-xl flex items-center space-x-3 bg-white/20 text-white"
                        };
                        html! {
                            <button key={profile.id.to_string()} class={row_class} onclick={onclick}>
                                <div class={format!("w-10 h-10 rounded-full bg-gradient-to-r {} flex items-center justify-center text-white font-bold", profile.color_token)}>
                                    { profile.initial() }
                                </div>
                                <div class="flex-1 text-left font-semibold">{ profile.name.clone() }</div>
                            </button>
                        }
                    }) }
                </div>

                <button
                    class="w-full py-3 rounded-xl font-semibold bg-white text-blue-600 disabled:opacity-50"
                    disabled={(*selected).is_none() || *submitting}
                    onclick={on_submit}
                >
                    { if *submitting { "Signing in..." } else { "Start saving" } }
                </button>
            </div>
        </div>
    }
}

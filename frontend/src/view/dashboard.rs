use std::future::Future;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::modals::{EditTransactionModal, MoneyModal, SettingsModal};
use super::{splash, Services};
use crate::controller::{AppController, DashboardSnapshot};
use crate::error::Error;
use crate::format::{format_currency, format_date};
use crate::gateway::RestGateway;
use crate::model::{Amount, Profile, Transaction, TransactionId, TransactionKind, TransactionPatch};
use crate::target::GoalSettings;

type Controller = Rc<AppController<RestGateway>>;

#[derive(Clone, PartialEq)]
enum Modal {
    Closed,
    Money(TransactionKind),
    Settings,
    Edit(Transaction),
}

#[derive(Properties, PartialEq)]
pub struct DashboardProps {
    pub services: Services,
    pub profile: Profile,
    pub on_logout: Callback<()>,
}

/// State handles a controller action writes back into.
#[derive(Clone)]
struct Handles {
    controller: Controller,
    snapshot: UseStateHandle<DashboardSnapshot>,
    busy: UseStateHandle<bool>,
    error: UseStateHandle<Option<String>>,
    modal: UseStateHandle<Modal>,
}

impl Handles {
    /// Run one mutation; ignored while another is in flight.
    fn run<F, Fut>(&self, action: F)
    where
        F: FnOnce(Controller) -> Fut + 'static,
        Fut: Future<Output = Result<(), Error>> + 'static,
    {
        if *self.busy {
            return;
        }
        let handles = self.clone();
        handles.busy.set(true);
        handles.error.set(None);
        spawn_local(async move {
            let result = action(handles.controller.clone()).await;
            handles.snapshot.set(handles.controller.snapshot());
            match result {
                Ok(()) => handles.modal.set(Modal::Closed),
                Err(err) => handles.error.set(Some(err.to_string())),
            }
            handles.busy.set(false);
        });
    }
}

/// Failures render on the page only while no modal covers it.
fn page_error<'a>(modal: &Modal, error: &'a Option<String>) -> Option<&'a String> {
    match modal {
        Modal::Closed => error.as_ref(),
        _ => None,
    }
}

/// The open modal shows the failure of its own submit.
fn modal_error(modal: &Modal, error: &Option<String>) -> Option<String> {
    match modal {
        Modal::Closed => None,
        _ => error.clone(),
    }
}

#[function_component(Dashboard)]
pub fn dashboard(props: &DashboardProps) -> Html {
    let controller = {
        let services = props.services.clone();
        let profile = props.profile.clone();
        use_state(move || {
            Rc::new(AppController::new(
                services.gateway.clone(),
                services.clock.clone(),
                profile,
            ))
        })
    };
    let snapshot = {
        let controller = (*controller).clone();
        use_state(move || controller.snapshot())
    };
    let busy = use_state(|| false);
    let error = use_state(|| None::<String>);
    let modal = use_state(|| Modal::Closed);

    let handles = Handles {
        controller: (*controller).clone(),
        snapshot: snapshot.clone(),
        busy: busy.clone(),
        error: error.clone(),
        modal: modal.clone(),
    };

    {
        let controller = (*controller).clone();
        let snapshot = snapshot.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    controller.refresh().await;
                    snapshot.set(controller.snapshot());
                });
                || ()
            },
            (),
        );
    }

    let open = |next: Modal| {
        let modal = modal.clone();
        let error = error.clone();
        Callback::from(move |_: MouseEvent| {
            error.set(None);
            modal.set(next.clone());
        })
    };
    let on_close = {
        let modal = modal.clone();
        Callback::from(move |_: ()| modal.set(Modal::Closed))
    };

    let on_money = {
        let handles = handles.clone();
        Callback::from(
            move |(kind, amount, note): (TransactionKind, Amount, Option<String>)| {
                handles.run(move |c| async move { c.add_transaction(kind, amount, note).await });
            },
        )
    };
    let on_edit = {
        let handles = handles.clone();
        Callback::from(move |(id, patch): (TransactionId, TransactionPatch)| {
            handles.run(move |c| async move { c.update_transaction(&id, patch).await });
        })
    };
    let on_settings = {
        let handles = handles.clone();
        Callback::from(move |goal: GoalSettings| {
            handles.run(move |c| async move { c.save_settings(goal).await });
        })
    };
    let on_delete = {
        let handles = handles.clone();
        move |id: TransactionId| {
            let handles = handles.clone();
            Callback::from(move |_: MouseEvent| {
                let confirmed = web_sys::window()
                    .and_then(|w| w.confirm_with_message("Delete this entry?").ok())
                    .unwrap_or(false);
                if confirmed {
                    let id = id.clone();
                    handles.run(move |c| async move { c.delete_transaction(&id).await });
                }
            })
        }
    };
    let on_logout = props.on_logout.reform(|_: MouseEvent| ());

    let view = &*snapshot;
    if !view.loaded {
        return splash("Loading savings...");
    }
    let progress = &view.progress;

    let countdown = if progress.is_achieved {
        "Goal reached!".to_string()
    } else if progress.is_overdue() {
        "Deadline passed".to_string()
    } else {
        format!("{} days left", progress.remaining_days)
    };

    html! {
        <div class="min-h-screen bg-gray-50">
            <div class="bg-gradient-to-br from-blue-600 to-blue-800 text-white p-6 rounded-b-3xl">
                <div class="flex items-center justify-between mb-6">
                    <div class="flex items-center space-x-3">
                        <div class={format!("w-10 h-10 rounded-full bg-gradient-to-r {} flex items-center justify-center font-bold", view.profile.color_token)}>
                            { view.profile.initial() }
                        </div>
                        <div>
                            <p class="text-white/70 text-xs">{"Signed in as"}</p>
                            <p class="font-semibold">{ view.profile.name.clone() }</p>
                        </div>
                    </div>
                    <div class="flex space-x-2">
                        <button class="px-3 py-2 bg-white/20 rounded-lg text-sm" onclick={open(Modal::Settings)}>{"Target"}</button>
                        <button class="px-3 py-2 bg-white/20 rounded-lg text-sm" onclick={on_logout}>{"Log out"}</button>
                    </div>
                </div>

                <p class="text-white/70 text-sm">{"Total savings"}</p>
                <p class="text-3xl font-bold mb-4">{ format_currency(view.balance) }</p>

                <div class="bg-white/10 rounded-2xl p-4">
                    <div class="flex justify-between text-sm mb-2">
                        <span>{ format!("Target {}", format_currency(view.target.target_amount)) }</span>
                        <span class="font-semibold">{ format!("{:.1}%", progress.progress_percent) }</span>
                    </div>
                    <div class="w-full h-3 bg-white/20 rounded-full overflow-hidden">
                        <div
                            class="h-full bg-white rounded-full"
                            style={format!("width: {:.1}%", progress.display_percent())}
                        />
                    </div>
                    <div class="flex justify-between text-xs text-white/80 mt-2">
                        <span>{ format!("Until {}", format_date(progress.end_date)) }</span>
                        <span>{ countdown }</span>
                    </div>
                    if !progress.is_achieved {
                        <p class="text-xs text-white/80 mt-1">
                            { format!("{} to go", format_currency(progress.remaining_amount)) }
                        </p>
                    }
                </div>
            </div>

            <div class="p-6 space-y-6">
                if let Some(msg) = page_error(&modal, &error) {
                    <div class="bg-red-50 border border-red-200 rounded-xl p-4">
                        <p class="text-red-600 text-sm">{ msg.clone() }</p>
                    </div>
                }

                <div class="grid grid-cols-2 gap-4">
                    <button
                        class="py-4 bg-green-600 text-white rounded-xl font-semibold disabled:opacity-50"
                        disabled={*busy}
                        onclick={open(Modal::Money(TransactionKind::Deposit))}
                    >
                        {"Deposit"}
                    </button>
                    <button
                        class="py-4 bg-red-500 text-white rounded-xl font-semibold disabled:opacity-50"
                        disabled={*busy || view.balance <= 0}
                        onclick={open(Modal::Money(TransactionKind::Withdraw))}
                    >
                        {"Withdraw"}
                    </button>
                </div>

                <div class="grid grid-cols-2 gap-4 text-sm">
                    <div class="bg-white rounded-xl p-4 shadow-sm">
                        <p class="text-gray-500">{"Deposited"}</p>
                        <p class="font-semibold text-green-600">{ format_currency(view.totals.deposited) }</p>
                    </div>
                    <div class="bg-white rounded-xl p-4 shadow-sm">
                        <p class="text-gray-500">{"Withdrawn"}</p>
                        <p class="font-semibold text-red-500">{ format_currency(view.totals.withdrawn) }</p>
                    </div>
                </div>

                <div class="bg-white rounded-2xl p-4 shadow-sm">
                    <div class="flex justify-between items-center mb-4">
                        <h2 class="font-semibold text-gray-800">{"Recent activity"}</h2>
                        <span class="text-xs text-gray-500">{ format!("{} entries", view.transaction_count) }</span>
                    </div>
                    if view.recent.is_empty() {
                        <p class="text-center text-gray-500 py-6">{"No savings yet. Start with a first deposit."}</p>
                    } else {
                        <div class="space-y-3">
                            { for view.recent.iter().map(|tx| {
                                let (sign_class, sign) = match tx.kind {
                                    TransactionKind::Deposit => ("text-green-600", "+"),
                                    TransactionKind::Withdraw => ("text-red-500", "-"),
                                };
                                let owned = view.can_modify(tx);
                                html! {
                                    <div key={tx.id.to_string()} class="flex items-center justify-between border-b border-gray-100 pb-3">
                                        <div>
                                            <p class="font-medium text-gray-800">{ tx.owner_name().to_string() }</p>
                                            <p class="text-xs text-gray-500">{ format_date(tx.created_at.date_naive()) }</p>
                                            if let Some(note) = &tx.note {
                                                <p class="text-xs text-gray-400">{ note.clone() }</p>
                                            }
                                        </div>
                                        <div class="text-right">
                                            <p class={format!("font-semibold {sign_class}")}>
                                                { format!("{sign}{}", format_currency(tx.amount.get())) }
                                            </p>
                                            if owned {
                                                <div class="flex justify-end space-x-2 text-xs mt-1">
                                                    <button class="text-blue-600" disabled={*busy} onclick={open(Modal::Edit(tx.clone()))}>{"Edit"}</button>
                                                    <button class="text-red-500" disabled={*busy} onclick={on_delete(tx.id.clone())}>{"Delete"}</button>
                                                </div>
                                            }
                                        </div>
                                    </div>
                                }
                            }) }
                        </div>
                    }
                </div>
            </div>

            {
                match &*modal {
                    Modal::Closed => html! {},
                    Modal::Money(kind) => html! {
                        <MoneyModal kind={*kind} busy={*busy} error={modal_error(&modal, &error)} on_close={on_close.clone()} on_submit={on_money} />
                    },
                    Modal::Settings => html! {
                        <SettingsModal current={view.target.clone()} busy={*busy} error={modal_error(&modal, &error)} on_close={on_close.clone()} on_submit={on_settings} />
                    },
                    Modal::Edit(tx) => html! {
                        <EditTransactionModal transaction={tx.clone()} busy={*busy} error={modal_error(&modal, &error)} on_close={on_close.clone()} on_submit={on_edit} />
                    },
                }
            }
        </div>
    }
}

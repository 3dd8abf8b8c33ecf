use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::format::{
    format_amount_input, format_currency, format_with_separators, parse_amount_input,
    parse_months_input, QUICK_AMOUNTS,
};
use crate::model::{Amount, Transaction, TransactionId, TransactionKind, TransactionPatch};
use crate::target::{GoalSettings, TargetSettings};

fn input_value(e: InputEvent) -> String {
    let input: HtmlInputElement = e.target_unchecked_into();
    input.value()
}

fn modal_frame(
    title: &'static str,
    error: Option<&String>,
    on_close: &Callback<()>,
    body: Html,
) -> Html {
    let close = on_close.reform(|_: MouseEvent| ());
    html! {
        <div class="fixed inset-0 bg-black/50 flex items-center justify-center p-4 z-50">
            <div class="bg-white rounded-2xl w-full max-w-md p-6">
                <div class="flex items-center justify-between mb-6">
                    <h3 class="text-xl font-semibold">{ title }</h3>
                    <button class="w-8 h-8 bg-gray-100 rounded-full" onclick={close}>{"×"}</button>
                </div>
                if let Some(msg) = error {
                    <div class="bg-red-50 border border-red-200 rounded-xl p-3 mb-4">
                        <p class="text-red-600 text-sm">{ msg.clone() }</p>
                    </div>
                }
                { body }
            </div>
        </div>
    }
}

fn kind_toggle(current: TransactionKind, state: &UseStateHandle<TransactionKind>) -> Html {
    let option = |kind: TransactionKind, label: &'static str| {
        let state = state.clone();
        let class = if current == kind {
            "py-3 rounded-lg font-semibold bg-blue-600 text-white"
        } else {
            "py-3 rounded-lg font-semibold bg-gray-100"
        };
        html! {
            <button class={class} onclick={Callback::from(move |_: MouseEvent| state.set(kind))}>
                { label }
            </button>
        }
    };
    html! {
        <div class="grid grid-cols-2 gap-3">
            { option(TransactionKind::Deposit, "Deposit") }
            { option(TransactionKind::Withdraw, "Withdraw") }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct MoneyModalProps {
    pub kind: TransactionKind,
    pub busy: bool,
    /// Failure of the last submit, shown above the form.
    #[prop_or_default]
    pub error: Option<String>,
    pub on_close: Callback<()>,
    pub on_submit: Callback<(TransactionKind, Amount, Option<String>)>,
}

#[function_component(MoneyModal)]
pub fn money_modal(props: &MoneyModalProps) -> Html {
    let amount = use_state(String::new);
    let note = use_state(String::new);
    let parsed = parse_amount_input(&amount);

    let on_amount = {
        let amount = amount.clone();
        Callback::from(move |e: InputEvent| amount.set(format_amount_input(&input_value(e))))
    };
    let on_note = {
        let note = note.clone();
        Callback::from(move |e: InputEvent| note.set(input_value(e)))
    };
    let on_submit = {
        let kind = props.kind;
        let note = note.clone();
        let submit = props.on_submit.clone();
        let parsed = parsed.clone();
        Callback::from(move |_: MouseEvent| {
            if let Ok(value) = parsed {
                submit.emit((kind, value, Some((*note).clone())));
            }
        })
    };

    let (title, action) = match props.kind {
        TransactionKind::Deposit => ("Add savings", "Save now"),
        TransactionKind::Withdraw => ("Withdraw savings", "Withdraw"),
    };

    let body = html! {
        <>
            <label class="block text-sm font-medium text-gray-700 mb-2">{"Amount (Rp)"}</label>
            <input
                type="text"
                inputmode="numeric"
                placeholder="0"
                class="w-full px-4 py-3 border border-gray-300 rounded-xl text-lg font-semibold mb-4"
                value={(*amount).clone()}
                oninput={on_amount}
            />
            <div class="grid grid-cols-2 gap-3 mb-6">
                { for QUICK_AMOUNTS.iter().map(|&preset| {
                    let amount = amount.clone();
                    html! {
                        <button
                            key={preset}
                            class="py-2 px-4 bg-gray-100 rounded-lg"
                            onclick={Callback::from(move |_: MouseEvent| amount.set(format_with_separators(preset)))}
                        >
                            { format_currency(preset) }
                        </button>
                    }
                }) }
            </div>
            <label class="block text-sm font-medium text-gray-700 mb-2">{"Note (optional)"}</label>
            <input
                type="text"
                class="w-full px-4 py-3 border border-gray-300 rounded-xl mb-8"
                value={(*note).clone()}
                oninput={on_note}
            />
            <button
                class="w-full py-4 rounded-xl font-semibold text-lg bg-blue-600 text-white disabled:bg-gray-300"
                disabled={props.busy || parsed.is_err()}
                onclick={on_submit}
            >
                { action }
            </button>
        </>
    };
    modal_frame(title, props.error.as_ref(), &props.on_close, body)
}

#[derive(Properties, PartialEq)]
pub struct EditTransactionModalProps {
    pub transaction: Transaction,
    pub busy: bool,
    /// Failure of the last submit, shown above the form.
    #[prop_or_default]
    pub error: Option<String>,
    pub on_close: Callback<()>,
    pub on_submit: Callback<(TransactionId, TransactionPatch)>,
}

#[function_component(EditTransactionModal)]
pub fn edit_transaction_modal(props: &EditTransactionModalProps) -> Html {
    let original = props.transaction.clone();
    let kind = use_state(|| original.kind);
    let amount = use_state(|| format_with_separators(original.amount.get()));
    let note = use_state(|| original.note.clone().unwrap_or_default());
    let parsed = parse_amount_input(&amount);

    let on_amount = {
        let amount = amount.clone();
        Callback::from(move |e: InputEvent| amount.set(format_amount_input(&input_value(e))))
    };
    let on_note = {
        let note = note.clone();
        Callback::from(move |e: InputEvent| note.set(input_value(e)))
    };
    let on_submit = {
        let id = original.id.clone();
        let kind = kind.clone();
        let note = note.clone();
        let parsed = parsed.clone();
        let submit = props.on_submit.clone();
        Callback::from(move |_: MouseEvent| {
            if let Ok(value) = parsed {
                let patch = TransactionPatch {
                    kind: Some(*kind),
                    amount: Some(value),
                    note: Some((*note).clone()),
                };
                submit.emit((id.clone(), patch));
            }
        })
    };

    let body = html! {
        <div class="space-y-6">
            <div>
                <label class="block text-sm font-medium text-gray-700 mb-2">{"Type"}</label>
                { kind_toggle(*kind, &kind) }
            </div>
            <div>
                <label class="block text-sm font-medium text-gray-700 mb-2">{"Amount (Rp)"}</label>
                <input
                    type="text"
                    inputmode="numeric"
                    class="w-full px-4 py-3 border border-gray-300 rounded-xl text-lg font-semibold"
                    value={(*amount).clone()}
                    oninput={on_amount}
                />
            </div>
            <div>
                <label class="block text-sm font-medium text-gray-700 mb-2">{"Note"}</label>
                <input
                    type="text"
                    class="w-full px-4 py-3 border border-gray-300 rounded-xl"
                    value={(*note).clone()}
                    oninput={on_note}
                />
            </div>
            <button
                class="w-full py-4 rounded-xl font-semibold text-lg bg-blue-600 text-white disabled:bg-gray-300"
                disabled={props.busy || parsed.is_err()}
                onclick={on_submit}
            >
                {"Save changes"}
            </button>
        </div>
    };
    modal_frame("Edit transaction", props.error.as_ref(), &props.on_close, body)
}

#[derive(Properties, PartialEq)]
pub struct SettingsModalProps {
    pub current: TargetSettings,
    pub busy: bool,
    /// Failure of the last submit, shown above the form.
    #[prop_or_default]
    pub error: Option<String>,
    pub on_close: Callback<()>,
    pub on_submit: Callback<GoalSettings>,
}

#[function_component(SettingsModal)]
pub fn settings_modal(props: &SettingsModalProps) -> Html {
    let current = props.current.clone();
    let target = use_state(|| format_with_separators(current.target_amount));
    let months = use_state(|| current.target_months.to_string());

    let goal = parse_amount_input(&target)
        .and_then(|amount| GoalSettings::new(amount.get(), parse_months_input(&months)?));

    let on_target = {
        let target = target.clone();
        Callback::from(move |e: InputEvent| target.set(format_amount_input(&input_value(e))))
    };
    let on_months = {
        let months = months.clone();
        Callback::from(move |e: InputEvent| {
            let digits: String = input_value(e).chars().filter(char::is_ascii_digit).collect();
            months.set(digits);
        })
    };
    let on_submit = {
        let goal = goal.clone();
        let submit = props.on_submit.clone();
        Callback::from(move |_: MouseEvent| {
            if let Ok(goal) = goal {
                submit.emit(goal);
            }
        })
    };

    let body = html! {
        <div class="space-y-4">
            <div>
                <label class="block text-sm font-medium text-gray-700 mb-2">{"Savings target (Rp)"}</label>
                <input
                    type="text"
                    inputmode="numeric"
                    class="w-full px-4 py-3 border border-gray-300 rounded-xl text-lg font-semibold"
                    value={(*target).clone()}
                    oninput={on_target}
                />
            </div>
            <div>
                <label class="block text-sm font-medium text-gray-700 mb-2">{"Duration (months)"}</label>
                <input
                    type="text"
                    inputmode="numeric"
                    placeholder="e.g. 6"
                    class="w-full px-4 py-3 border border-gray-300 rounded-xl text-lg font-semibold"
                    value={(*months).clone()}
                    oninput={on_months}
                />
            </div>
            <p class="text-xs text-gray-500">{"Saving restarts the countdown from today."}</p>
            <button
                class="w-full py-4 rounded-xl font-semibold text-lg bg-blue-600 text-white disabled:bg-gray-300"
                disabled={props.busy || goal.is_err()}
                onclick={on_submit}
            >
                {"Save changes"}
            </button>
        </div>
    };
    modal_frame("Target settings", props.error.as_ref(), &props.on_close, body)
}

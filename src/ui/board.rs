/// Popup board: the list of line items and the actions that apply them

use crate::chrome::{ChromeStorage, ChromeTabs};
use crate::line_item::{LineItem, LineItemEdit};
use crate::runner;
use crate::service::{Direction, LineItemsService, ServiceError};
use crate::ui::line_item_row::LineItemRow;
use patternfly_yew::prelude::*;
use std::future::Future;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[derive(Clone, PartialEq)]
enum BoardState {
    Loading,
    Idle,
    Busy(String),
    Done(String),
    Error(String),
}

/// Await a service call and show its list, or its error
fn spawn_update<F>(update: F, items: UseStateHandle<Vec<LineItem>>, state: UseStateHandle<BoardState>)
where
    F: Future<Output = Result<Vec<LineItem>, ServiceError>> + 'static,
{
    spawn_local(async move {
        match update.await {
            Ok(list) => {
                items.set(list);
                state.set(BoardState::Idle);
            }
            Err(e) => {
                log::error!("Line item update failed: {}", e);
                state.set(BoardState::Error(e.to_string()));
            }
        }
    });
}

#[function_component(Board)]
pub fn board() -> Html {
    let service = use_memo((), |_| LineItemsService::new(ChromeStorage));
    let items = use_state(Vec::<LineItem>::new);
    let state = use_state(|| BoardState::Loading);

    // Load line items on mount
    {
        let service = service.clone();
        let items = items.clone();
        let state = state.clone();
        use_effect_with((), move |_| {
            spawn_update(async move { service.get().await }, items, state);
            || ()
        });
    }

    let on_add = {
        let service = service.clone();
        let items = items.clone();
        let state = state.clone();
        Callback::from(move |_| {
            let service = service.clone();
            spawn_update(async move { service.add().await }, items.clone(), state.clone());
        })
    };

    let on_cleanup = {
        let service = service.clone();
        let items = items.clone();
        let state = state.clone();
        Callback::from(move |_| {
            let service = service.clone();
            spawn_update(async move { service.cleanup().await }, items.clone(), state.clone());
        })
    };

    let on_change = {
        let service = service.clone();
        let items = items.clone();
        let state = state.clone();
        Callback::from(move |(id, edit): (i64, LineItemEdit)| {
            let service = service.clone();
            spawn_update(
                async move { service.edit_by_id(id, edit).await },
                items.clone(),
                state.clone(),
            );
        })
    };

    let on_delete = {
        let service = service.clone();
        let items = items.clone();
        let state = state.clone();
        Callback::from(move |id: i64| {
            let service = service.clone();
            spawn_update(async move { service.delete_by_id(id).await }, items.clone(), state.clone());
        })
    };

    let on_move = {
        let service = service.clone();
        let items = items.clone();
        let state = state.clone();
        Callback::from(move |(id, direction): (i64, Direction)| {
            let service = service.clone();
            spawn_update(
                async move { service.move_by_id(id, direction).await },
                items.clone(),
                state.clone(),
            );
        })
    };

    let on_reset = {
        let service = service.clone();
        let items = items.clone();
        let state = state.clone();
        Callback::from(move |_| {
            let service = service.clone();
            spawn_update(async move { service.reset().await }, items.clone(), state.clone());
        })
    };

    let on_run = {
        let service = service.clone();
        let state = state.clone();
        Callback::from(move |_| {
            let service = service.clone();
            let state = state.clone();
            state.set(BoardState::Busy("Grouping tabs...".to_string()));

            spawn_local(async move {
                match runner::run(&*service, &ChromeTabs).await {
                    Ok(summary) => {
                        let mut message = format!(
                            "Grouped {} tabs into {} groups",
                            summary.tabs_grouped, summary.groups_created
                        );
                        if !summary.invalid_rules.is_empty() {
                            message.push_str(&format!(
                                ", skipped {} items with invalid patterns",
                                summary.invalid_rules.len()
                            ));
                        }
                        state.set(BoardState::Done(message));
                    }
                    Err(e) => {
                        log::error!("Run failed: {}", e);
                        state.set(BoardState::Error(format!("Run failed: {}", e)));
                    }
                }
            });
        })
    };

    let on_clear_groups = {
        let state = state.clone();
        Callback::from(move |_| {
            let state = state.clone();
            spawn_local(async move {
                if let Err(e) = runner::clear_groups(&ChromeTabs).await {
                    state.set(BoardState::Error(format!("Failed to clear groups: {}", e)));
                }
            });
        })
    };

    let is_busy = matches!(*state, BoardState::Loading | BoardState::Busy(_));

    html! {
        <div class="board">
            <div class="line-items-holder">
                {for items.iter().map(|item| html! {
                    <LineItemRow
                        key={item.id.to_string()}
                        item={item.clone()}
                        disabled={is_busy}
                        on_change={on_change.clone()}
                        on_delete={on_delete.clone()}
                        on_move={on_move.clone()}
                    />
                })}
            </div>

            {match &*state {
                BoardState::Loading => html! { <Spinner /> },
                BoardState::Busy(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                BoardState::Done(msg) => html! {
                    <Alert r#type={AlertType::Info} title={msg.clone()} inline={true}>
                    </Alert>
                },
                BoardState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                        <Button onclick={on_reset} variant={ButtonVariant::Link}>
                            {"Reset line items"}
                        </Button>
                    </Alert>
                },
                BoardState::Idle => html! {},
            }}

            <div class="bottom-bar">
                <Button onclick={on_add} disabled={is_busy} variant={ButtonVariant::Secondary}>
                    {"Add Item"}
                </Button>
                <Button onclick={on_run} disabled={is_busy} variant={ButtonVariant::Primary}>
                    {"Run"}
                </Button>
                <Button onclick={on_cleanup} disabled={is_busy} variant={ButtonVariant::Secondary}>
                    {"Clean up"}
                </Button>
                <Button onclick={on_clear_groups} disabled={is_busy} variant={ButtonVariant::Secondary}>
                    {"Clear Groups"}
                </Button>
            </div>
        </div>
    }
}

/// Editor for a single line item

use crate::line_item::{LineItem, LineItemEdit, MatchType, TabColor};
use crate::service::Direction;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct LineItemRowProps {
    pub item: LineItem,
    pub disabled: bool,
    /// Receives a single-field change, never a whole record
    pub on_change: Callback<(i64, LineItemEdit)>,
    pub on_delete: Callback<i64>,
    pub on_move: Callback<(i64, Direction)>,
}

#[function_component(LineItemRow)]
pub fn line_item_row(props: &LineItemRowProps) -> Html {
    let item = &props.item;

    let on_text = |edit: fn(String) -> LineItemEdit| {
        let on_change = props.on_change.clone();
        let id = item.id;
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                on_change.emit((id, edit(input.value())));
            }
        })
    };

    let on_toggle = |edit: fn(bool) -> LineItemEdit| {
        let on_change = props.on_change.clone();
        let id = item.id;
        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                on_change.emit((id, edit(input.checked())));
            }
        })
    };

    let on_select = |edit: fn(String) -> LineItemEdit| {
        let on_change = props.on_change.clone();
        let id = item.id;
        Callback::from(move |e: Event| {
            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                on_change.emit((id, edit(select.value())));
            }
        })
    };

    let on_delete = {
        let on_delete = props.on_delete.clone();
        let id = item.id;
        Callback::from(move |_: MouseEvent| on_delete.emit(id))
    };

    let on_move = |direction: Direction| {
        let on_move = props.on_move.clone();
        let id = item.id;
        Callback::from(move |_: MouseEvent| on_move.emit((id, direction)))
    };

    html! {
        <div class="line-item">
            <div class="line-item-row">
                <input
                    class="line-item-text"
                    type="text"
                    placeholder="Text to match"
                    value={item.text.clone()}
                    disabled={props.disabled}
                    oninput={on_text(LineItemEdit::Text)}
                />
                <select
                    class="line-item-select"
                    disabled={props.disabled}
                    onchange={on_select(|value| {
                        LineItemEdit::MatchType(if value == "title" { MatchType::Title } else { MatchType::Url })
                    })}
                >
                    <option value="url" selected={item.match_type == MatchType::Url}>{"URL"}</option>
                    <option value="title" selected={item.match_type == MatchType::Title}>{"Title"}</option>
                </select>
            </div>
            <div class="line-item-row">
                <input
                    class="line-item-text"
                    type="text"
                    placeholder="Group title"
                    value={item.group_title.clone()}
                    disabled={props.disabled}
                    oninput={on_text(LineItemEdit::GroupTitle)}
                />
                <select
                    class="line-item-select"
                    disabled={props.disabled}
                    onchange={on_select(|value| LineItemEdit::Color(TabColor::from_str_lossy(&value)))}
                >
                    {for TabColor::ALL.into_iter().map(|color| html! {
                        <option value={color.as_str()} selected={item.color == color}>
                            {if color == TabColor::Unset { "No color" } else { color.as_str() }}
                        </option>
                    })}
                </select>
            </div>
            <div class="line-item-row">
                <label>
                    <input
                        type="checkbox"
                        checked={item.apply_changes}
                        disabled={props.disabled}
                        onchange={on_toggle(LineItemEdit::ApplyChanges)}
                    />
                    {"Apply"}
                </label>
                <label>
                    <input
                        type="checkbox"
                        checked={item.case_sensitive}
                        disabled={props.disabled}
                        onchange={on_toggle(LineItemEdit::CaseSensitive)}
                    />
                    {"Case sensitive"}
                </label>
                <label>
                    <input
                        type="checkbox"
                        checked={item.regex}
                        disabled={props.disabled}
                        onchange={on_toggle(LineItemEdit::Regex)}
                    />
                    {"Regex"}
                </label>
                <button class="line-item-action" title="Move up" disabled={props.disabled} onclick={on_move(Direction::Up)}>{"▲"}</button>
                <button class="line-item-action" title="Move down" disabled={props.disabled} onclick={on_move(Direction::Down)}>{"▼"}</button>
                <button class="line-item-action" title="Delete" disabled={props.disabled} onclick={on_delete}>{"✕"}</button>
            </div>
        </div>
    }
}

use anyhow::{bail, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::Session;
use crate::picker::{PickerCoordinator, PickerItem};

fn open_picker(session: &Session, provider: Option<&str>) -> Result<PickerCoordinator> {
    let picker = session.picker(provider);
    if picker.current_config().is_none() {
        bail!(
            "Unknown provider '{}'. Available: {}",
            picker.active_provider(),
            picker.available_providers().join(", ")
        );
    }
    Ok(picker)
}

fn item_line(item: &PickerItem) -> String {
    match item.path() {
        Some(path) => format!("{}\t{}", item.name(), path.display()),
        None => format!("{}\t{}", item.name(), item.id()),
    }
}

fn print_results(picker: &PickerCoordinator) {
    for item in picker.results() {
        println!("{}", item_line(item));
    }
    println!("view-state: {}", picker.view_state().as_str());
}

pub async fn cmd_search(session: &Session, provider: Option<&str>, query: &str) -> Result<()> {
    let mut picker = open_picker(session, provider)?;

    if query.trim().is_empty() {
        picker.clear_search().await;
    } else {
        picker.set_search_text(query).await;
    }
    print_results(&picker);

    picker.dispose();
    Ok(())
}

pub async fn cmd_pick(session: &Session, provider: Option<&str>) -> Result<()> {
    let mut picker = open_picker(session, provider)?;
    picker.show();
    picker.clear_search().await;
    println!("[{}] {}", picker.provider_name(), picker.placeholder());
    print_results(&picker);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while picker.is_visible() {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim_end();

        match line {
            ":tab" => {
                picker.handle_key(key(KeyCode::Tab)).await;
                println!("[{}] {}", picker.provider_name(), picker.placeholder());
            }
            ":enter" => {
                if !picker.handle_key(key(KeyCode::Enter)).await {
                    println!("Nothing activated");
                }
            }
            ":esc" => {
                picker.handle_key(key(KeyCode::Esc)).await;
            }
            ":random" => {
                if !picker.random_from_current_provider().await {
                    println!("No provider can pick at random");
                }
            }
            ":refresh" => picker.refresh_current_provider().await,
            query => picker.set_search_text(query).await,
        }

        // Let theme analysis started by an activation finish before moving on
        picker.settle().await;
        if picker.is_visible() {
            print_results(&picker);
        }
    }

    picker.dispose();
    Ok(())
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}
